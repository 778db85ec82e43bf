// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Twentyone server entry point.
use anyhow::{Result, anyhow};
use log::{error, info, warn};
use std::{
    future::Future,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::{
    net::{TcpListener, TcpStream},
    signal,
    sync::{broadcast, mpsc},
    time::{self, Duration},
};

use twentyone_cards::AceRule;
use twentyone_core::{
    Error,
    connection::Connection,
    message::{DISCOVERY_PORT, Offer},
};

use crate::{discovery::Announcer, session::Session};

/// Server config.
#[derive(Debug, Clone)]
pub struct Config {
    /// The server listening address.
    pub address: String,
    /// The server listening port, 0 lets the system pick one.
    pub port: u16,
    /// The server name sent in offers.
    pub name: String,
    /// The port clients listen to for offers.
    pub discovery_port: u16,
    /// The address offers are sent to.
    pub broadcast_address: Ipv4Addr,
    /// The time between offers.
    pub announce_interval: Duration,
    /// How long a session waits for a client message.
    pub read_timeout: Duration,
    /// How aces are counted.
    pub ace_rule: AceRule,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 0,
            name: "Twentyone".to_string(),
            discovery_port: DISCOVERY_PORT,
            broadcast_address: Ipv4Addr::BROADCAST,
            announce_interval: Duration::from_secs(1),
            read_timeout: Duration::from_secs(10),
            ace_rule: AceRule::Fixed,
        }
    }
}

/// The server that accepts connections and broadcasts offers.
#[derive(Debug)]
pub struct Server {
    /// Read only config shared by all connections.
    config: Arc<Config>,
    /// The server listener.
    listener: TcpListener,
    /// The listener bound address.
    local_addr: SocketAddr,
}

/// Channels cloned by each task to coordinate shutdown.
struct Shutdown {
    /// Shutdown notification channel.
    broadcast_tx: broadcast::Sender<()>,
    /// Shutdown sender cloned by each task.
    complete_tx: mpsc::Sender<()>,
}

/// Client connection handler.
struct Handler {
    /// The server config.
    config: Arc<Config>,
    /// Channel for listening shutdown notification.
    shutdown_broadcast_rx: broadcast::Receiver<()>,
    /// Sender that drops when this connection is done.
    _shutdown_complete_tx: mpsc::Sender<()>,
}

/// Server entry point, runs until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let server = Server::bind(config).await?;
    server.serve(signal::ctrl_c()).await
}

impl Server {
    /// Binds the server listener.
    pub async fn bind(config: Config) -> Result<Self> {
        let addr = format!("{}:{}", config.address, config.port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow!("Tcp listener bind error: {e}"))?;
        let local_addr = listener.local_addr()?;

        info!(
            "Server {} started, listening on {local_addr}",
            config.name
        );

        Ok(Self {
            config: Arc::new(config),
            listener,
            local_addr,
        })
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Broadcasts offers and serves connections until the shutdown future
    /// completes, then waits for all connections to terminate.
    pub async fn serve<F: Future>(self, shutdown_signal: F) -> Result<()> {
        let (broadcast_tx, _) = broadcast::channel(1);
        let (complete_tx, mut complete_rx) = mpsc::channel(1);
        let shutdown = Shutdown {
            broadcast_tx,
            complete_tx,
        };

        self.start_announcer(&shutdown).await?;

        tokio::select! {
            res = self.accept_loop(&shutdown) => {
                res.map_err(|e| anyhow!("Tcp listener accept error: {e}"))?;
            }
            _ = shutdown_signal => {
                info!("Received shutdown signal...");
            }
        }

        // Notify all tasks to start shutdown then wait for all tasks to
        // terminate and drop their shutdown channel.
        drop(self);
        drop(shutdown);
        let _ = complete_rx.recv().await;

        Ok(())
    }

    /// Spawns the offers broadcast task.
    async fn start_announcer(&self, shutdown: &Shutdown) -> Result<()> {
        let offer = Offer {
            tcp_port: self.local_addr.port(),
            server_name: self.config.name.clone(),
        };

        let target = SocketAddr::from((self.config.broadcast_address, self.config.discovery_port));
        let mut announcer = Announcer::bind(&offer, target, self.config.announce_interval).await?;

        let shutdown_broadcast_rx = shutdown.broadcast_tx.subscribe();
        let shutdown_complete_tx = shutdown.complete_tx.clone();
        tokio::spawn(async move {
            announcer.run(shutdown_broadcast_rx).await;
            drop(shutdown_complete_tx);
        });

        Ok(())
    }

    /// Accepts connections and spawns a session for each one.
    async fn accept_loop(&self, shutdown: &Shutdown) -> Result<()> {
        loop {
            let (socket, addr) = self.accept_with_retry().await?;
            info!("Accepted connection from {addr}");

            let mut handler = Handler {
                config: self.config.clone(),
                shutdown_broadcast_rx: shutdown.broadcast_tx.subscribe(),
                _shutdown_complete_tx: shutdown.complete_tx.clone(),
            };

            // Spawn a task to handle the connection session.
            tokio::spawn(async move {
                if let Err(err) = handler.run(socket, addr).await {
                    error!("Connection to {addr} {err}");
                }

                info!("Connection to {addr} closed");
            });
        }
    }

    /// Accepts a connection with retries.
    async fn accept_with_retry(&self) -> Result<(TcpStream, SocketAddr)> {
        let mut retry = 0;
        loop {
            match self.listener.accept().await {
                Ok((socket, addr)) => {
                    return Ok((socket, addr));
                }
                Err(err) => {
                    if retry == 5 {
                        return Err(err.into());
                    }

                    warn!("Accept error {err} retry {retry}");
                }
            }

            time::sleep(Duration::from_secs(1 << retry)).await;
            retry += 1;
        }
    }
}

impl Handler {
    /// Plays a session on this connection.
    async fn run(&mut self, socket: TcpStream, addr: SocketAddr) -> Result<()> {
        let mut conn = Connection::new(socket).with_read_timeout(self.config.read_timeout);
        let mut session = Session::from_entropy(self.config.ace_rule);

        let res = tokio::select! {
            res = session.run(&mut conn) => res,
            _ = self.shutdown_broadcast_rx.recv() => Ok(()),
        };

        conn.close().await;

        match res {
            Ok(()) => {
                if session.stats().rounds() > 0 {
                    info!("{} at {addr} {}", session.client_name(), session.stats());
                }
                Ok(())
            }
            // Invalid requests are dropped without a response.
            Err(err @ Error::InvalidRequest(_)) => {
                warn!("Dropping {addr}: {err}");
                Ok(())
            }
            Err(err) => Err(anyhow!("session {} aborted: {err}", session.client_name())),
        }
    }
}
