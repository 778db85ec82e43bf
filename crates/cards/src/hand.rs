// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Blackjack hand types.
use serde::{Deserialize, Serialize};
use std::{fmt, slice};

use crate::{Card, Rank};

/// The total above which a hand is bust.
const BLACKJACK: u32 = 21;

/// How aces are valued when computing a hand total.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AceRule {
    /// An ace is always 11, two aces and a ten total 32.
    #[default]
    Fixed,
    /// An ace is 11 unless that busts the hand, then it counts as 1.
    Soft,
}

impl AceRule {
    /// Computes the total of the given cards.
    pub fn total(self, cards: &[Card]) -> u32 {
        let total = cards.iter().map(Card::value).sum::<u32>();
        match self {
            AceRule::Fixed => total,
            AceRule::Soft => {
                let aces = cards.iter().filter(|c| c.rank() == Rank::Ace).count();
                (0..aces).fold(total, |total, _| {
                    if total > BLACKJACK { total - 10 } else { total }
                })
            }
        }
    }
}

/// The cards held by the player or the dealer for one round.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    /// Adds a card to this hand.
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// The hand total given an ace rule.
    pub fn total(&self, rule: AceRule) -> u32 {
        rule.total(&self.cards)
    }

    /// Checks if this hand total is over 21.
    pub fn is_bust(&self, rule: AceRule) -> bool {
        self.total(rule) > BLACKJACK
    }

    /// The number of cards in this hand.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Checks if the hand has no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterates the cards in dealing order.
    pub fn iter(&self) -> slice::Iter<'_, Card> {
        self.cards.iter()
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<T: IntoIterator<Item = Card>>(iter: T) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, card) in self.cards.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{card}")?;
        }

        Ok(())
    }
}
