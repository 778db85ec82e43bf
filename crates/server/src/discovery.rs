// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Server offers broadcast.
use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use std::net::SocketAddr;
use tokio::{
    net::UdpSocket,
    sync::broadcast,
    time::{self, Duration, MissedTickBehavior},
};

use twentyone_core::message::Offer;

/// The announcer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncerState {
    /// Sending offers.
    Running,
    /// Not sending offers.
    Stopped,
}

/// Periodically broadcasts an [Offer] so that clients can find the server.
#[derive(Debug)]
pub struct Announcer {
    socket: UdpSocket,
    target: SocketAddr,
    offer: [u8; Offer::LEN],
    interval: Duration,
    state: AnnouncerState,
    sent: u64,
}

impl Announcer {
    /// Creates an announcer that sends the offer to the target address.
    pub async fn bind(offer: &Offer, target: SocketAddr, interval: Duration) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| anyhow!("Udp socket bind error: {e}"))?;
        socket.set_broadcast(true)?;

        Ok(Self {
            socket,
            target,
            offer: offer.encode(),
            interval,
            state: AnnouncerState::Stopped,
            sent: 0,
        })
    }

    /// Sends offers until the shutdown channel is closed.
    ///
    /// Shutdown interrupts both the wait for the next tick and a pending send.
    pub async fn run(&mut self, mut shutdown_broadcast_rx: broadcast::Receiver<()>) {
        info!("Broadcasting offers to {} every {:?}", self.target, self.interval);
        self.state = AnnouncerState::Running;

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_broadcast_rx.recv() => break,
                _ = async {
                    ticker.tick().await;
                    self.announce().await;
                } => {}
            }
        }

        self.state = AnnouncerState::Stopped;
        info!("Stopped broadcasting offers after {} sends", self.sent);
    }

    /// The announcer state.
    pub fn state(&self) -> AnnouncerState {
        self.state
    }

    /// The number of offers sent.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    async fn announce(&mut self) {
        match self.socket.send_to(&self.offer, self.target).await {
            Ok(_) => {
                self.sent += 1;
                debug!("Offer sent to {}", self.target);
            }
            // Keep advertising, the network may come back.
            Err(e) => warn!("Offer send to {} failed: {e}", self.target),
        }
    }
}
