// Copyright (C) 2025  Vince Vasta.
// SPDX-License-Identifier: Apache-2.0

//! Fixed length message framing over a byte stream.
use std::{net::SocketAddr, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time,
};

use crate::{
    error::{Error, Result},
    message::{Decision, Message, Payload, Request},
};

/// A connection that sends and receives protocol [Message]s.
///
/// Each message kind has a fixed length so the reader must know which kind
/// comes next, a failed or short read is reported as [Error::ConnectionLost].
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    read_timeout: Option<Duration>,
}

/// A connection over TCP.
pub type TcpConnection = Connection<TcpStream>;

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection with no read timeout.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_timeout: None,
        }
    }

    /// Sets the time a read can wait for data before the connection is dropped.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Sends a message.
    pub async fn send(&mut self, msg: impl Into<Message>) -> Result<()> {
        let buf = msg.into().encode();
        self.stream
            .write_all(&buf)
            .await
            .map_err(|e| Error::ConnectionLost(format!("write error {e}")))
    }

    /// Waits for the request that opens a session.
    ///
    /// A short read counts as a malformed request.
    pub async fn recv_request(&mut self) -> Result<Request> {
        self.read_frame::<{ Request::LEN }>()
            .await
            .and_then(|buf| Request::decode(&buf))
            .map_err(|e| Error::InvalidRequest(Box::new(e)))
    }

    /// Waits for a player decision.
    pub async fn recv_decision(&mut self) -> Result<Decision> {
        let buf = self.read_frame::<{ Decision::LEN }>().await?;
        Decision::decode(&buf)
    }

    /// Waits for a server payload.
    pub async fn recv_payload(&mut self) -> Result<Payload> {
        let buf = self.read_frame::<{ Payload::LEN }>().await?;
        Payload::decode(&buf)
    }

    /// Flushes and shuts down the write side of this connection.
    pub async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }

    async fn read_frame<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        let read = self.stream.read_exact(&mut buf);

        let res = match self.read_timeout {
            Some(timeout) => time::timeout(timeout, read)
                .await
                .map_err(|_| Error::ConnectionLost(format!("no data for {timeout:?}")))?,
            None => read.await,
        };

        res.map_err(|e| Error::ConnectionLost(format!("read error {e}")))?;
        Ok(buf)
    }
}

/// Connects to a server.
pub async fn connect_async(addr: SocketAddr) -> Result<TcpConnection> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| Error::ConnectionLost(format!("connect to {addr} failed {e}")))?;
    Ok(Connection::new(stream))
}
