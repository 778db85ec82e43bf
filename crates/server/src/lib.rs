// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Twentyone blackjack server.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

pub mod discovery;
pub mod server;
pub use server::{Config, Server, run};
pub mod session;
