// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Server offers listener.
use anyhow::{Result, anyhow};
use log::{debug, info};
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
};
use tokio::net::UdpSocket;

use twentyone_core::message::Offer;

/// A server found by its offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// The server name.
    pub name: String,
    /// The server TCP address.
    pub addr: SocketAddr,
}

/// Listens for server [Offer]s on the discovery port.
#[derive(Debug)]
pub struct OfferListener {
    socket: UdpSocket,
}

impl OfferListener {
    /// Binds the listener on all interfaces at the given port.
    ///
    /// The port can be shared so that many clients on the same host receive
    /// the server offers. Must be called from within a tokio runtime.
    pub fn bind(port: u16) -> Result<Self> {
        let socket = bind_shared(port)
            .map_err(|e| anyhow!("Udp socket bind on port {port} error: {e}"))?;
        Ok(Self::from_socket(socket))
    }

    /// Creates a listener from a bound socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self { socket }
    }

    /// The listener bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Waits for the next valid offer.
    ///
    /// The server address is the offer sender IP with the advertised TCP port.
    /// Datagrams that are not offers are skipped.
    pub async fn next_offer(&self) -> Result<ServerInfo> {
        // Larger than an offer so oversized datagrams fail the length check.
        let mut buf = [0u8; 64];

        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            match Offer::decode(&buf[..len]) {
                Ok(offer) => {
                    let addr = SocketAddr::new(from.ip(), offer.tcp_port);
                    info!("Received offer from {} at {addr}", offer.server_name);
                    return Ok(ServerInfo {
                        name: offer.server_name,
                        addr,
                    });
                }
                Err(e) => debug!("Ignoring datagram from {from}: {e}"),
            }
        }
    }
}

fn bind_shared(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;
    UdpSocket::from_std(socket.into())
}
