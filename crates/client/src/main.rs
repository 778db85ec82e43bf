// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0
use clap::{Parser, ValueEnum};
use log::error;
use std::{
    io::{self, BufRead, Write},
    time::Duration,
};

use twentyone_cards::AceRule;
use twentyone_client::{StandOn, Strategy};
use twentyone_core::{
    game_state::RoundState,
    message::{DISCOVERY_PORT, Decision},
};

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
    /// The name sent to servers.
    #[clap(long, short, default_value = "Player")]
    name: String,
    /// Rounds to play in each session.
    #[clap(long, short, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..))]
    rounds: u8,
    /// Stop after this many sessions.
    #[clap(long, short)]
    sessions: Option<usize>,
    /// The UDP port to listen to for offers.
    #[clap(long, default_value_t = DISCOVERY_PORT)]
    discovery_port: u16,
    /// Seconds to wait for a server message.
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=600))]
    timeout: u64,
    /// How aces are counted, it must match the server.
    #[clap(long, value_enum, default_value_t = Aces::Fixed)]
    aces: Aces,
    /// Play automatically, hitting below this total.
    #[clap(long, value_parser = clap::value_parser!(u32).range(2..=21))]
    auto: Option<u32>,
}

/// Asks the player on the terminal.
struct Interactive;

impl Strategy for Interactive {
    fn decide(&mut self, round: &RoundState) -> Decision {
        println!(
            "Dealer [{}] {}, you [{}] {}",
            round.dealer(),
            round.dealer_total(),
            round.player(),
            round.player_total()
        );

        // Blocking reads must not stall the runtime workers.
        tokio::task::block_in_place(|| {
            let stdin = io::stdin();
            let mut line = String::new();
            loop {
                print!("(h)it or (s)tand? ");
                let _ = io::stdout().flush();

                line.clear();
                match stdin.lock().read_line(&mut line) {
                    // Stand when the input is closed.
                    Ok(0) | Err(_) => return Decision::Stand,
                    Ok(_) => match line.trim() {
                        "h" | "hit" => return Decision::Hit,
                        "s" | "stand" => return Decision::Stand,
                        _ => continue,
                    },
                }
            }
        })
    }
}

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = twentyone_client::Config {
        name: cli.name,
        rounds: cli.rounds,
        discovery_port: cli.discovery_port,
        ace_rule: match cli.aces {
            Aces::Fixed => AceRule::Fixed,
            Aces::Soft => AceRule::Soft,
        },
        read_timeout: Duration::from_secs(cli.timeout),
        sessions: cli.sessions,
    };

    let res = match cli.auto {
        Some(total) => twentyone_client::run(config, StandOn(total)).await,
        None => twentyone_client::run(config, Interactive).await,
    };

    if let Err(e) = res {
        error!("{e}");
    }
}
