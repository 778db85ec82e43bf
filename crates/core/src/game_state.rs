// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Client round state types.
use twentyone_cards::{AceRule, Card, Hand};

use crate::{
    error::{Error, Result},
    game::Outcome,
    message::PayloadEvent,
};

/// The round phase as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the two player cards and the dealer up card.
    InitialDeal,
    /// The player decides to hit or stand.
    PlayerTurn,
    /// The player stood, the dealer reveals and draws.
    DealerTurn,
    /// The round has ended.
    Over(Outcome),
}

/// What changed after applying a server event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundUpdate {
    /// A card was dealt to the player.
    PlayerCard(Card),
    /// The dealer face up card.
    DealerUpCard(Card),
    /// The dealer revealed the hidden card.
    DealerReveal(Card),
    /// The dealer drew a card.
    DealerCard(Card),
    /// The round has ended.
    Finished(Outcome),
}

/// The state of one round from the client point of view.
#[derive(Debug, Clone)]
pub struct RoundState {
    rule: AceRule,
    phase: Phase,
    player: Hand,
    dealer: Hand,
}

impl RoundState {
    /// Creates the state for a new round.
    pub fn new(rule: AceRule) -> Self {
        Self {
            rule,
            phase: Phase::InitialDeal,
            player: Hand::default(),
            dealer: Hand::default(),
        }
    }

    /// Applies a server event to this round.
    pub fn apply(&mut self, event: PayloadEvent) -> Result<RoundUpdate> {
        match (self.phase, event) {
            (Phase::InitialDeal, PayloadEvent::Card(card)) => {
                if self.player.len() < 2 {
                    self.player.push(card);
                    Ok(RoundUpdate::PlayerCard(card))
                } else {
                    self.dealer.push(card);
                    self.phase = Phase::PlayerTurn;
                    Ok(RoundUpdate::DealerUpCard(card))
                }
            }
            (Phase::PlayerTurn, PayloadEvent::Card(card)) => {
                self.player.push(card);
                Ok(RoundUpdate::PlayerCard(card))
            }
            (Phase::DealerTurn, PayloadEvent::Card(card)) => {
                self.dealer.push(card);
                if self.dealer.len() == 2 {
                    Ok(RoundUpdate::DealerReveal(card))
                } else {
                    Ok(RoundUpdate::DealerCard(card))
                }
            }
            (Phase::PlayerTurn | Phase::DealerTurn, PayloadEvent::Outcome(outcome)) => {
                self.phase = Phase::Over(outcome);
                Ok(RoundUpdate::Finished(outcome))
            }
            (phase, event) => Err(Error::UnexpectedEvent(format!("{event:?} in {phase:?}"))),
        }
    }

    /// The player stands, the dealer plays next.
    pub fn stand(&mut self) -> Result<()> {
        if self.phase != Phase::PlayerTurn {
            return Err(Error::UnexpectedEvent(format!("stand in {:?}", self.phase)));
        }

        self.phase = Phase::DealerTurn;
        Ok(())
    }

    /// Checks if the server is waiting for a player decision.
    ///
    /// The server stops reading decisions once the player is bust.
    pub fn awaits_decision(&self) -> bool {
        self.phase == Phase::PlayerTurn && !self.player.is_bust(self.rule)
    }

    /// The round phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The round outcome if the round is over.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Over(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// The player cards.
    pub fn player(&self) -> &Hand {
        &self.player
    }

    /// The dealer cards seen so far.
    pub fn dealer(&self) -> &Hand {
        &self.dealer
    }

    /// The player total.
    pub fn player_total(&self) -> u32 {
        self.player.total(self.rule)
    }

    /// The total of the dealer cards seen so far.
    pub fn dealer_total(&self) -> u32 {
        self.dealer.total(self.rule)
    }
}
