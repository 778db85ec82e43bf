// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Blackjack cards definitions.
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A blackjack card.
///
/// A card is identified by its rank and suit only, on the wire the rank is
/// encoded as 1 (ace) to 13 (king) and the suit as 0 (hearts) to 3 (spades).
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    /// Create a card given a rank and suit.
    pub const fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    /// Create a card from its wire rank and suit numbers.
    ///
    /// Returns None if either value is out of range.
    pub fn from_wire(rank: u16, suit: u8) -> Option<Card> {
        let rank = u8::try_from(rank).ok().and_then(Rank::from_number)?;
        let suit = Suit::from_number(suit)?;
        Some(Card::new(rank, suit))
    }

    /// Returns the card rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Returns the card suit.
    pub fn suit(&self) -> Suit {
        self.suit
    }

    /// The blackjack value of this card.
    ///
    /// An ace is 11, a face card is 10, any other card is its rank number.
    pub fn value(&self) -> u32 {
        match self.rank {
            Rank::Ace => 11,
            Rank::Jack | Rank::Queen | Rank::King => 10,
            rank => rank.number() as u32,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Card({}{})", self.rank, self.suit)
    }
}

/// Card rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Ace
    Ace = 1,
    /// Deuce
    Deuce,
    /// Trey
    Trey,
    /// Four
    Four,
    /// Five
    Five,
    /// Six
    Six,
    /// Seven
    Seven,
    /// Eight
    Eight,
    /// Nine
    Nine,
    /// Ten
    Ten,
    /// Jack
    Jack,
    /// Queen
    Queen,
    /// King
    King,
}

impl Rank {
    /// Returns all ranks.
    pub fn ranks() -> impl DoubleEndedIterator<Item = Rank> {
        use Rank::*;
        [
            Ace, Deuce, Trey, Four, Five, Six, Seven, Eight, Nine, Ten, Jack, Queen, King,
        ]
        .into_iter()
    }

    /// The rank number, 1 for an ace up to 13 for a king.
    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Converts a rank number to a rank.
    pub fn from_number(n: u8) -> Option<Rank> {
        Rank::ranks().find(|r| r.number() == n)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rank = match self {
            Rank::Ace => 'A',
            Rank::Deuce => '2',
            Rank::Trey => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
        };

        write!(f, "{rank}")
    }
}

/// Card suit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    /// Hearts suit.
    Hearts = 0,
    /// Diamonds suit.
    Diamonds = 1,
    /// Clubs suit.
    Clubs = 2,
    /// Spades suit.
    Spades = 3,
}

impl Suit {
    /// Returns all suits.
    pub fn suits() -> impl DoubleEndedIterator<Item = Suit> {
        [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades].into_iter()
    }

    /// The suit wire number.
    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Converts a suit wire number to a suit.
    pub fn from_number(n: u8) -> Option<Suit> {
        Suit::suits().find(|s| s.number() == n)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suit = match self {
            Suit::Hearts => 'H',
            Suit::Diamonds => 'D',
            Suit::Clubs => 'C',
            Suit::Spades => 'S',
        };

        write!(f, "{suit}")
    }
}

/// Error returned when dealing from an exhausted deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deck is empty")]
pub struct EmptyDeck;

/// A cards Deck
#[derive(Debug, Clone)]
pub struct Deck {
    // Cards are dealt from the back.
    cards: Vec<Card>,
}

impl Deck {
    /// The number of cards in the deck.
    pub const SIZE: usize = 52;

    /// Creates a new shuffled deck.
    pub fn new_and_shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = Self::ordered_cards();
        cards.shuffle(rng);
        Self { cards }
    }

    /// Creates a deck that deals the given cards in order.
    pub fn from_cards<I>(cards: I) -> Self
    where
        I: IntoIterator<Item = Card>,
    {
        let mut cards = cards.into_iter().collect::<Vec<_>>();
        cards.reverse();
        Self { cards }
    }

    /// Deals a card from the deck.
    pub fn deal(&mut self) -> Result<Card, EmptyDeck> {
        self.cards.pop().ok_or(EmptyDeck)
    }

    /// The number of cards left in the deck.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Checks if the deck is empty.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn ordered_cards() -> Vec<Card> {
        Suit::suits()
            .flat_map(|s| Rank::ranks().map(move |r| Card::new(r, s)))
            .collect()
    }
}
