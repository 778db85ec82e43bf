// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Blackjack client controller.
use anyhow::Result;
use log::{debug, error, info};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::broadcast,
};

use twentyone_core::{
    Error,
    connection::{self, Connection},
    game::{Outcome, Stats},
    game_state::{RoundState, RoundUpdate},
    message::{Decision, Request},
};

use crate::{
    Config,
    discovery::{OfferListener, ServerInfo},
};

/// A player strategy.
pub trait Strategy: Send + 'static {
    /// Decides to hit or stand given the round state.
    fn decide(&mut self, round: &RoundState) -> Decision;
}

/// Hits while the player total is below a threshold.
#[derive(Debug, Clone, Copy)]
pub struct StandOn(pub u32);

impl Default for StandOn {
    fn default() -> Self {
        Self(17)
    }
}

impl Strategy for StandOn {
    fn decide(&mut self, round: &RoundState) -> Decision {
        if round.player_total() < self.0 {
            Decision::Hit
        } else {
            Decision::Stand
        }
    }
}

/// The client controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Waiting for a server offer.
    Listening,
    /// Connecting to a server.
    Connecting,
    /// Playing a session.
    Playing,
    /// The session is over.
    Disconnected,
}

/// A client that finds servers and plays sessions with them.
#[derive(Debug)]
pub struct Client<S> {
    config: Config,
    strategy: S,
    listener: OfferListener,
    state: ClientState,
    sessions: usize,
    stats: Stats,
}

impl<S: Strategy> Client<S> {
    /// Creates a new client that gets offers from the given listener.
    pub fn new(config: Config, listener: OfferListener, strategy: S) -> Self {
        Self {
            config,
            strategy,
            listener,
            state: ClientState::Disconnected,
            sessions: 0,
            stats: Stats::default(),
        }
    }

    /// Plays sessions until shutdown or until the sessions limit is reached.
    pub async fn run(&mut self, mut shutdown_broadcast_rx: broadcast::Receiver<()>) -> Result<()> {
        loop {
            if self.config.sessions.is_some_and(|max| self.sessions >= max) {
                break;
            }

            self.state = ClientState::Listening;
            info!("Client {} waiting for offers...", self.config.name);

            let server = tokio::select! {
                res = self.listener.next_offer() => res?,
                _ = shutdown_broadcast_rx.recv() => break,
            };

            let res = tokio::select! {
                res = self.play_session(&server) => res,
                _ = shutdown_broadcast_rx.recv() => break,
            };

            self.state = ClientState::Disconnected;
            self.sessions += 1;

            match res {
                Ok(stats) => info!("Session with {} {stats}", server.name),
                Err(err) => error!("Session with {} at {} aborted: {err}", server.name, server.addr),
            }
        }

        self.state = ClientState::Disconnected;
        info!(
            "Client {} played {} sessions, {}",
            self.config.name, self.sessions, self.stats
        );

        Ok(())
    }

    /// The controller state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// The number of sessions played so far.
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    /// The outcomes of all rounds played so far.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    async fn play_session(&mut self, server: &ServerInfo) -> Result<Stats, Error> {
        self.state = ClientState::Connecting;
        let mut conn = connection::connect_async(server.addr)
            .await?
            .with_read_timeout(self.config.read_timeout);

        self.state = ClientState::Playing;
        info!(
            "Connected to {} at {}, playing {} rounds",
            server.name, server.addr, self.config.rounds
        );

        let res = self.play_rounds(&mut conn).await;
        conn.close().await;
        res
    }

    async fn play_rounds<T>(
        &mut self,
        conn: &mut Connection<T>,
    ) -> Result<Stats, Error>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        conn.send(Request {
            rounds: self.config.rounds,
            client_name: self.config.name.clone(),
        })
        .await?;

        let mut stats = Stats::default();
        for round in 1..=self.config.rounds {
            let outcome = self.play_round(conn, round).await?;
            stats.record(outcome);
            self.stats.record(outcome);
        }

        Ok(stats)
    }

    async fn play_round<T>(
        &mut self,
        conn: &mut Connection<T>,
        round: u8,
    ) -> Result<Outcome, Error>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let mut state = RoundState::new(self.config.ace_rule);

        loop {
            if state.awaits_decision() {
                let decision = self.strategy.decide(&state);
                debug!("Round {round} {decision:?} on {}", state.player_total());

                conn.send(decision).await?;
                if decision == Decision::Stand {
                    state.stand()?;
                }
            }

            let event = conn.recv_payload().await?.event()?;
            match state.apply(event)? {
                RoundUpdate::PlayerCard(card) => {
                    debug!("Round {round} player card {card} ({})", state.player_total());
                }
                RoundUpdate::DealerUpCard(card) => {
                    debug!("Round {round} dealer shows {card}");
                }
                RoundUpdate::DealerReveal(card) => {
                    debug!("Round {round} dealer reveals {card} ({})", state.dealer_total());
                }
                RoundUpdate::DealerCard(card) => {
                    debug!("Round {round} dealer draws {card} ({})", state.dealer_total());
                }
                RoundUpdate::Finished(outcome) => {
                    info!(
                        "Round {round} {outcome}: player [{}] {} dealer [{}] {}",
                        state.player(),
                        state.player_total(),
                        state.dealer(),
                        state.dealer_total()
                    );
                    return Ok(outcome);
                }
            }
        }
    }
}
