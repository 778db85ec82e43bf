// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Twentyone blackjack cards types.
//!
//! This crate define types to create cards:
//!
//! ```
//! # use twentyone_cards::{Card, Rank, Suit};
//! let ah = Card::new(Rank::Ace, Suit::Hearts);
//! assert_eq!(ah.value(), 11);
//! assert_eq!(ah.to_string(), "AH");
//! ```
//!
//! a [Deck] type for shuffling and dealing cards:
//!
//! ```
//! # use twentyone_cards::Deck;
//! let mut deck = Deck::new_and_shuffled(&mut rand::rng());
//! assert_eq!(deck.len(), Deck::SIZE);
//!
//! let card = deck.deal().unwrap();
//! assert_eq!(deck.len(), Deck::SIZE - 1);
//! ```
//!
//! and a [Hand] type that computes totals using an [AceRule], the default
//! rule counts an ace as 11 no matter what:
//!
//! ```
//! # use twentyone_cards::{AceRule, Card, Hand, Rank, Suit};
//! let mut hand = Hand::default();
//! hand.push(Card::new(Rank::Ace, Suit::Hearts));
//! hand.push(Card::new(Rank::Ace, Suit::Spades));
//! hand.push(Card::new(Rank::Ten, Suit::Clubs));
//!
//! assert_eq!(hand.total(AceRule::Fixed), 32);
//! assert_eq!(hand.total(AceRule::Soft), 12);
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

mod deck;
pub use deck::{Card, Deck, EmptyDeck, Rank, Suit};

mod hand;
pub use hand::{AceRule, Hand};
