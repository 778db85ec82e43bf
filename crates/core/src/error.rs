// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Protocol errors.
use thiserror::Error;

use twentyone_cards::EmptyDeck;

/// A protocol error.
#[derive(Debug, Error)]
pub enum Error {
    /// A message didn't start with the protocol cookie.
    #[error("bad cookie 0x{0:08x}")]
    BadCookie(u32),
    /// A message type tag is not valid in this context.
    #[error("unknown message type 0x{0:02x}")]
    UnknownType(u8),
    /// A message has the wrong length.
    #[error("malformed message expected {expected} bytes got {actual}")]
    MalformedMessage {
        /// The expected message length.
        expected: usize,
        /// The received message length.
        actual: usize,
    },
    /// A payload carries values that are not a card or an outcome.
    #[error("invalid payload {0}")]
    InvalidPayload(String),
    /// The first message on a connection is not a valid request.
    #[error("invalid request: {0}")]
    InvalidRequest(#[source] Box<Error>),
    /// The peer closed the connection, a read timed out, or a socket failed.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    /// Tried to deal from an empty deck.
    #[error(transparent)]
    EmptyDeck(#[from] EmptyDeck),
    /// A payload arrived when the round state didn't expect it.
    #[error("unexpected event {0}")]
    UnexpectedEvent(String),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;
