// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Blackjack round rules.
use serde::{Deserialize, Serialize};
use std::fmt;

/// The highest total that is not bust.
pub const BLACKJACK: u32 = 21;

/// The dealer stops drawing at this total.
pub const DEALER_STANDS_ON: u32 = 17;

/// A round outcome from the player point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Outcome {
    /// Player and dealer have the same total.
    Tie = 1,
    /// The dealer won.
    Loss = 2,
    /// The player won.
    Win = 3,
}

impl Outcome {
    /// Converts a wire result code to an outcome.
    pub fn from_code(code: u8) -> Option<Outcome> {
        match code {
            1 => Some(Outcome::Tie),
            2 => Some(Outcome::Loss),
            3 => Some(Outcome::Win),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Tie => "tie",
            Outcome::Loss => "loss",
            Outcome::Win => "win",
        };

        write!(f, "{s}")
    }
}

/// Settles a round given the final totals.
///
/// A player bust is a loss even when the dealer busts with the same total.
/// Otherwise the player wins when beating the dealer or when the dealer busts,
/// equal totals are a tie, anything else is a loss.
pub fn settle(player_total: u32, dealer_total: u32) -> Outcome {
    if player_total > BLACKJACK {
        Outcome::Loss
    } else if dealer_total > BLACKJACK || player_total > dealer_total {
        Outcome::Win
    } else if player_total == dealer_total {
        Outcome::Tie
    } else {
        Outcome::Loss
    }
}

/// Checks if the dealer must draw another card.
pub fn dealer_draws(dealer_total: u32) -> bool {
    dealer_total < DEALER_STANDS_ON
}

/// Win, loss, and tie counters for a number of rounds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Rounds won by the player.
    pub wins: u32,
    /// Rounds lost by the player.
    pub losses: u32,
    /// Rounds tied.
    pub ties: u32,
}

impl Stats {
    /// Counts an outcome.
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
    }

    /// The number of rounds counted.
    pub fn rounds(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// The fraction of rounds won.
    pub fn win_rate(&self) -> f64 {
        match self.rounds() {
            0 => 0.0,
            n => self.wins as f64 / n as f64,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rounds: {} won, {} lost, {} tied ({:.1}% win rate)",
            self.rounds(),
            self.wins,
            self.losses,
            self.ties,
            self.win_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settlement() {
        assert_eq!(settle(20, 22), Outcome::Win);
        assert_eq!(settle(21, 21), Outcome::Tie);
        assert_eq!(settle(18, 19), Outcome::Loss);
        assert_eq!(settle(20, 17), Outcome::Win);
        assert_eq!(settle(17, 20), Outcome::Loss);

        // A player bust is a loss whatever the dealer has.
        for dealer in 2..=32 {
            assert_eq!(settle(22, dealer), Outcome::Loss, "dealer {dealer}");
        }
    }

    #[test]
    fn dealer_stops_at_17() {
        assert!(dealer_draws(2));
        assert!(dealer_draws(16));
        assert!(!dealer_draws(17));
        assert!(!dealer_draws(21));
        assert!(!dealer_draws(26));
    }

    #[test]
    fn outcome_codes() {
        for outcome in [Outcome::Tie, Outcome::Loss, Outcome::Win] {
            assert_eq!(Outcome::from_code(outcome as u8), Some(outcome));
        }

        assert_eq!(Outcome::from_code(0), None);
        assert_eq!(Outcome::from_code(4), None);
    }

    #[test]
    fn stats_formatting() {
        let mut stats = Stats::default();
        assert_eq!(stats.win_rate(), 0.0);

        stats.record(Outcome::Win);
        stats.record(Outcome::Loss);
        stats.record(Outcome::Win);
        stats.record(Outcome::Tie);

        assert_eq!(stats.rounds(), 4);
        assert_eq!(
            stats.to_string(),
            "4 rounds: 2 won, 1 lost, 1 tied (50.0% win rate)"
        );
    }
}
