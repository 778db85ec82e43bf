// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Twentyone blackjack client.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
use anyhow::Result;
use log::info;
use std::time::Duration;
use tokio::{signal, sync::broadcast};

use twentyone_cards::AceRule;
use twentyone_core::message::DISCOVERY_PORT;

pub mod client;
pub use client::{Client, ClientState, StandOn, Strategy};
pub mod discovery;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The name sent to servers.
    pub name: String,
    /// Rounds to play in each session.
    pub rounds: u8,
    /// The port to listen to for offers.
    pub discovery_port: u16,
    /// How aces are counted, it must match the server rule.
    pub ace_rule: AceRule,
    /// How long to wait for a server message.
    pub read_timeout: Duration,
    /// Stop after this many sessions, `None` plays forever.
    pub sessions: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
            rounds: 1,
            discovery_port: DISCOVERY_PORT,
            ace_rule: AceRule::Fixed,
            read_timeout: Duration::from_secs(10),
            sessions: None,
        }
    }
}

/// Runs a client with the given strategy until Ctrl-C or the sessions limit.
pub async fn run<S: Strategy>(config: Config, strategy: S) -> Result<()> {
    let listener = discovery::OfferListener::bind(config.discovery_port)?;
    info!(
        "Client {} listening for offers on {}",
        config.name,
        listener.local_addr()?
    );

    let (shutdown_broadcast_tx, shutdown_broadcast_rx) = broadcast::channel(1);
    let mut client = Client::new(config, listener, strategy);
    let mut task = tokio::spawn(async move { client.run(shutdown_broadcast_rx).await });

    tokio::select! {
        res = &mut task => return res?,
        _ = signal::ctrl_c() => info!("Received Ctrl-c signal"),
    }

    // Signal the client to shutdown and wait for it to complete.
    drop(shutdown_broadcast_tx);
    task.await?
}
