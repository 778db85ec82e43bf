// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0
use clap::{Parser, ValueEnum};
use log::error;
use std::{net::Ipv4Addr, time::Duration};

use twentyone_cards::AceRule;
use twentyone_core::message::DISCOVERY_PORT;
use twentyone_server::server;

/// How aces are counted.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Aces {
    /// An ace is always 11.
    Fixed,
    /// An ace is 1 when 11 would bust the hand.
    Soft,
}

#[derive(Debug, Parser)]
struct Cli {
    /// The server name sent in offers.
    #[clap(long, short, default_value = "Twentyone")]
    name: String,
    /// The server listening address.
    #[clap(long, short, default_value = "0.0.0.0")]
    address: String,
    /// The server listening port, 0 picks a free port.
    #[clap(long, short, default_value_t = 0)]
    port: u16,
    /// The UDP port clients listen to for offers.
    #[clap(long, default_value_t = DISCOVERY_PORT)]
    discovery_port: u16,
    /// The address offers are sent to.
    #[clap(long, default_value_t = Ipv4Addr::BROADCAST)]
    broadcast: Ipv4Addr,
    /// Seconds between offers.
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=60))]
    interval: u64,
    /// Seconds a session waits for a client message.
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=600))]
    timeout: u64,
    /// How aces are counted.
    #[clap(long, value_enum, default_value_t = Aces::Fixed)]
    aces: Aces,
}

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = twentyone_server::Config {
        address: cli.address,
        port: cli.port,
        name: cli.name,
        discovery_port: cli.discovery_port,
        broadcast_address: cli.broadcast,
        announce_interval: Duration::from_secs(cli.interval),
        read_timeout: Duration::from_secs(cli.timeout),
        ace_rule: match cli.aces {
            Aces::Fixed => AceRule::Fixed,
            Aces::Soft => AceRule::Soft,
        },
    };

    if let Err(e) = server::run(config).await {
        error!("{e}");
    }
}
