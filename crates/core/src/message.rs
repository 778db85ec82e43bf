// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Fixed layout binary messages between the client and server.
//!
//! Every message starts with the 4 bytes [MAGIC_COOKIE] followed by a one byte
//! type tag, all integers are big endian:
//!
//! ```text
//!   Offer    cookie(4) type=0x2(1) tcp_port(2) server_name(32)            39 bytes
//!   Request  cookie(4) type=0x3(1) rounds(1) client_name(32)              38 bytes
//!   Decision cookie(4) type=0x4(1) decision(5)                            10 bytes
//!   Payload  cookie(4) type=0x4(1) echo(5) result(1) rank(2) suit(1)      14 bytes
//! ```
//!
//! Names are NUL padded UTF-8, a name longer than [NAME_LEN] bytes is cut.
use serde::{Deserialize, Serialize};

use twentyone_cards::Card;

use crate::{
    error::{Error, Result},
    game::Outcome,
};

/// The protocol magic cookie.
pub const MAGIC_COOKIE: u32 = 0xABCD_DCBA;

/// The well known UDP port for server offers.
pub const DISCOVERY_PORT: u16 = 13122;

/// The width of name fields.
pub const NAME_LEN: usize = 32;

/// Cookie and type tag.
const HEADER_LEN: usize = 5;

/// Offer type tag.
pub const OFFER_TYPE: u8 = 0x2;

/// Request type tag.
pub const REQUEST_TYPE: u8 = 0x3;

/// Decision and payload type tag.
pub const PAYLOAD_TYPE: u8 = 0x4;

/// Payload result code for a card dealt while the round is in progress.
pub const RESULT_NOT_OVER: u8 = 0x0;

/// A server announcement broadcast on the discovery port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// The server TCP listening port.
    pub tcp_port: u16,
    /// The server display name.
    pub server_name: String,
}

impl Offer {
    /// The encoded length.
    pub const LEN: usize = HEADER_LEN + 2 + NAME_LEN;

    /// Encodes this offer.
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        write_header(&mut buf, OFFER_TYPE);
        buf[5..7].copy_from_slice(&self.tcp_port.to_be_bytes());
        write_name(&mut buf[7..], &self.server_name);
        buf
    }

    /// Decodes an offer.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_header(buf, Self::LEN, OFFER_TYPE)?;
        Ok(Self {
            tcp_port: u16::from_be_bytes([buf[5], buf[6]]),
            server_name: read_name(&buf[7..]),
        })
    }
}

/// The client request that starts a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The number of rounds to play.
    pub rounds: u8,
    /// The client display name.
    pub client_name: String,
}

impl Request {
    /// The encoded length.
    pub const LEN: usize = HEADER_LEN + 1 + NAME_LEN;

    /// Encodes this request.
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        write_header(&mut buf, REQUEST_TYPE);
        buf[5] = self.rounds;
        write_name(&mut buf[6..], &self.client_name);
        buf
    }

    /// Decodes a request.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_header(buf, Self::LEN, REQUEST_TYPE)?;
        Ok(Self {
            rounds: buf[5],
            client_name: read_name(&buf[6..]),
        })
    }
}

/// A player decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Draw another card.
    Hit,
    /// End the player turn.
    Stand,
}

impl Decision {
    /// The encoded length.
    pub const LEN: usize = HEADER_LEN + 5;

    const HIT: &'static [u8; 5] = b"Hittt";
    const STAND: &'static [u8; 5] = b"Stand";

    /// Encodes this decision.
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        write_header(&mut buf, PAYLOAD_TYPE);
        let field = match self {
            Decision::Hit => Self::HIT,
            Decision::Stand => Self::STAND,
        };
        buf[5..].copy_from_slice(field);
        buf
    }

    /// Decodes a decision, anything that is not a hit is a stand.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_header(buf, Self::LEN, PAYLOAD_TYPE)?;
        if &buf[5..] == Self::HIT {
            Ok(Decision::Hit)
        } else {
            Ok(Decision::Stand)
        }
    }
}

/// A server event, either a dealt card or the round outcome.
///
/// The fields are the raw wire values, use [Payload::event] to validate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    /// Decision echo, not used by clients.
    pub echo: [u8; 5],
    /// The result code, 0 if the round is not over.
    pub result: u8,
    /// The card rank, 0 for an outcome.
    pub rank: u16,
    /// The card suit, 0 for an outcome.
    pub suit: u8,
}

/// A validated [Payload].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEvent {
    /// A card was dealt and the round continues.
    Card(Card),
    /// The round is over.
    Outcome(Outcome),
}

impl Payload {
    /// The encoded length.
    pub const LEN: usize = HEADER_LEN + 5 + 1 + 2 + 1;

    /// The echo sent by the server.
    pub const ECHO: [u8; 5] = *b"-----";

    /// A payload for a dealt card.
    pub fn card(card: Card) -> Self {
        Self {
            echo: Self::ECHO,
            result: RESULT_NOT_OVER,
            rank: card.rank().number() as u16,
            suit: card.suit().number(),
        }
    }

    /// A payload for a round outcome.
    pub fn outcome(outcome: Outcome) -> Self {
        Self {
            echo: Self::ECHO,
            result: outcome as u8,
            rank: 0,
            suit: 0,
        }
    }

    /// Encodes this payload.
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        write_header(&mut buf, PAYLOAD_TYPE);
        buf[5..10].copy_from_slice(&self.echo);
        buf[10] = self.result;
        buf[11..13].copy_from_slice(&self.rank.to_be_bytes());
        buf[13] = self.suit;
        buf
    }

    /// Decodes a payload.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_header(buf, Self::LEN, PAYLOAD_TYPE)?;
        Ok(Self {
            echo: [buf[5], buf[6], buf[7], buf[8], buf[9]],
            result: buf[10],
            rank: u16::from_be_bytes([buf[11], buf[12]]),
            suit: buf[13],
        })
    }

    /// Interprets this payload as a card or an outcome.
    pub fn event(&self) -> Result<PayloadEvent> {
        if self.result == RESULT_NOT_OVER {
            Card::from_wire(self.rank, self.suit)
                .map(PayloadEvent::Card)
                .ok_or_else(|| {
                    Error::InvalidPayload(format!("card rank {} suit {}", self.rank, self.suit))
                })
        } else {
            Outcome::from_code(self.result)
                .map(PayloadEvent::Outcome)
                .ok_or_else(|| Error::InvalidPayload(format!("result code {}", self.result)))
        }
    }
}

/// Any protocol message keyed by its wire type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A server offer.
    Offer(Offer),
    /// A client request.
    Request(Request),
    /// A client decision.
    Decision(Decision),
    /// A server payload.
    Payload(Payload),
}

impl Message {
    /// Encodes this message.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Offer(m) => m.encode().to_vec(),
            Message::Request(m) => m.encode().to_vec(),
            Message::Decision(m) => m.encode().to_vec(),
            Message::Payload(m) => m.encode().to_vec(),
        }
    }

    /// Decodes any message.
    ///
    /// Decisions and payloads share a type tag so they are told apart by
    /// their length.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(Error::MalformedMessage {
                expected: HEADER_LEN,
                actual: buf.len(),
            });
        }

        match buf[4] {
            OFFER_TYPE => Offer::decode(buf).map(Message::Offer),
            REQUEST_TYPE => Request::decode(buf).map(Message::Request),
            PAYLOAD_TYPE if buf.len() == Decision::LEN => {
                Decision::decode(buf).map(Message::Decision)
            }
            PAYLOAD_TYPE => Payload::decode(buf).map(Message::Payload),
            ty => {
                check_cookie(buf)?;
                Err(Error::UnknownType(ty))
            }
        }
    }
}

impl From<Offer> for Message {
    fn from(msg: Offer) -> Self {
        Message::Offer(msg)
    }
}

impl From<Request> for Message {
    fn from(msg: Request) -> Self {
        Message::Request(msg)
    }
}

impl From<Decision> for Message {
    fn from(msg: Decision) -> Self {
        Message::Decision(msg)
    }
}

impl From<Payload> for Message {
    fn from(msg: Payload) -> Self {
        Message::Payload(msg)
    }
}

fn write_header(buf: &mut [u8], ty: u8) {
    buf[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
    buf[4] = ty;
}

fn check_cookie(buf: &[u8]) -> Result<()> {
    let cookie = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if cookie != MAGIC_COOKIE {
        return Err(Error::BadCookie(cookie));
    }

    Ok(())
}

fn check_header(buf: &[u8], len: usize, ty: u8) -> Result<()> {
    if buf.len() != len {
        return Err(Error::MalformedMessage {
            expected: len,
            actual: buf.len(),
        });
    }

    check_cookie(buf)?;

    if buf[4] != ty {
        return Err(Error::UnknownType(buf[4]));
    }

    Ok(())
}

/// Writes a name into a NUL padded field, cutting it on a char boundary.
fn write_name(field: &mut [u8], name: &str) {
    let mut end = name.len().min(field.len());
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    field[..end].copy_from_slice(&name.as_bytes()[..end]);
    field[end..].fill(0);
}

fn read_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
