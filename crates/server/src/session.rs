// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Per connection game session.
use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use tokio::io::{AsyncRead, AsyncWrite};

use twentyone_cards::{AceRule, Card, Deck, Hand};
use twentyone_core::{
    connection::Connection,
    error::Result,
    game::{self, Outcome, Stats},
    message::{Decision, Payload},
};

/// Source of a fresh deck for each round.
pub trait Shuffle: Send + 'static {
    /// Returns a new shuffled deck.
    fn shuffled_deck(&mut self) -> Deck;
}

impl Shuffle for StdRng {
    fn shuffled_deck(&mut self) -> Deck {
        Deck::new_and_shuffled(self)
    }
}

/// The session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the client request.
    AwaitRequest,
    /// Dealing the initial cards.
    Dealing,
    /// Reading player decisions.
    PlayerTurn,
    /// The dealer reveals and draws.
    DealerTurn,
    /// Sending the round outcome.
    Settlement,
    /// All rounds have been played.
    Done,
}

/// Plays the rounds requested by one client.
#[derive(Debug)]
pub struct Session<S> {
    shuffle: S,
    rule: AceRule,
    state: SessionState,
    client_name: String,
    stats: Stats,
}

impl<S: Shuffle> Session<S> {
    /// Creates a new session.
    pub fn new(shuffle: S, rule: AceRule) -> Self {
        Self {
            shuffle,
            rule,
            state: SessionState::AwaitRequest,
            client_name: String::new(),
            stats: Stats::default(),
        }
    }

    /// Runs the session until all rounds are played or the connection fails.
    ///
    /// Any error aborts the session, nothing is sent back for an invalid
    /// request.
    pub async fn run<T>(&mut self, conn: &mut Connection<T>) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        self.state = SessionState::AwaitRequest;
        let req = conn.recv_request().await?;
        self.client_name = req.client_name;
        info!("{} requested {} rounds", self.client_name, req.rounds);

        for round in 1..=req.rounds {
            let outcome = self.play_round(conn).await?;
            self.stats.record(outcome);
            debug!("{} round {round} {outcome}", self.client_name);
        }

        self.state = SessionState::Done;
        Ok(())
    }

    /// The session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The client name from the request.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// The rounds played so far.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    async fn play_round<T>(&mut self, conn: &mut Connection<T>) -> Result<Outcome>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        self.state = SessionState::Dealing;
        let mut deck = self.shuffle.shuffled_deck();
        let mut player = Hand::default();
        let mut dealer = Hand::default();

        player.push(deck.deal()?);
        player.push(deck.deal()?);
        dealer.push(deck.deal()?);
        let hole_card = deck.deal()?;
        dealer.push(hole_card);

        // The hole card is sent only when the dealer plays.
        for card in player.iter().chain(dealer.iter().take(1)) {
            send_card(conn, *card).await?;
        }

        self.state = SessionState::PlayerTurn;
        while !player.is_bust(self.rule) {
            match conn.recv_decision().await? {
                Decision::Hit => {
                    let card = deck.deal()?;
                    player.push(card);
                    send_card(conn, card).await?;
                }
                Decision::Stand => break,
            }
        }

        if !player.is_bust(self.rule) {
            self.state = SessionState::DealerTurn;
            send_card(conn, hole_card).await?;

            while game::dealer_draws(dealer.total(self.rule)) {
                let card = deck.deal()?;
                dealer.push(card);
                send_card(conn, card).await?;
            }
        }

        self.state = SessionState::Settlement;
        let outcome = game::settle(player.total(self.rule), dealer.total(self.rule));
        debug!(
            "{} player [{player}] dealer [{dealer}] {outcome}",
            self.client_name
        );
        conn.send(Payload::outcome(outcome)).await?;

        Ok(outcome)
    }
}

impl Session<StdRng> {
    /// Creates a session seeded from the operating system.
    pub fn from_entropy(rule: AceRule) -> Self {
        Self::new(StdRng::from_os_rng(), rule)
    }
}

async fn send_card<T>(conn: &mut Connection<T>, card: Card) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    conn.send(Payload::card(card)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};
    use twentyone_cards::{Rank, Suit};
    use twentyone_core::{
        error::Error,
        message::{PayloadEvent, Request},
    };

    /// Deals prepared decks, one per round.
    struct Stacked(VecDeque<Deck>);

    impl Shuffle for Stacked {
        fn shuffled_deck(&mut self) -> Deck {
            self.0.pop_front().expect("a deck for each round")
        }
    }

    fn stacked(decks: &[&[(Rank, Suit)]]) -> Stacked {
        Stacked(
            decks
                .iter()
                .map(|cards| Deck::from_cards(cards.iter().map(|&(r, s)| Card::new(r, s))))
                .collect(),
        )
    }

    fn request(rounds: u8) -> Request {
        Request {
            rounds,
            client_name: "Alice".to_string(),
        }
    }

    type SessionTask<S> = tokio::task::JoinHandle<(Session<S>, Result<()>)>;

    /// Spawns a session and returns the client end.
    fn spawn<S: Shuffle>(shuffle: S) -> (Connection<DuplexStream>, SessionTask<S>) {
        spawn_with_rule(shuffle, AceRule::Fixed)
    }

    fn spawn_with_rule<S: Shuffle>(
        shuffle: S,
        rule: AceRule,
    ) -> (Connection<DuplexStream>, SessionTask<S>) {
        let (client, server) = duplex(1024);
        let task = tokio::spawn(async move {
            let mut conn = Connection::new(server);
            let mut session = Session::new(shuffle, rule);
            let res = session.run(&mut conn).await;
            conn.close().await;
            (session, res)
        });

        (Connection::new(client), task)
    }

    async fn recv_event(conn: &mut Connection<DuplexStream>) -> PayloadEvent {
        conn.recv_payload().await.unwrap().event().unwrap()
    }

    async fn recv_card(conn: &mut Connection<DuplexStream>) -> Card {
        match recv_event(conn).await {
            PayloadEvent::Card(card) => card,
            event => panic!("Expected card got {event:?}"),
        }
    }

    use Rank::*;
    use Suit::*;

    // Player TD 9C, dealer 7S up and 6H in the hole.
    const STAND_ON_19: [(Rank, Suit); 4] =
        [(Ten, Diamonds), (Nine, Clubs), (Seven, Spades), (Six, Hearts)];

    #[tokio::test]
    async fn dealer_draws_to_20() {
        let mut deck = STAND_ON_19.to_vec();
        deck.push((Seven, Hearts));
        deck.push((King, Clubs));

        let (mut client, task) = spawn(stacked(&[&deck]));
        client.send(request(1)).await.unwrap();

        assert_eq!(recv_card(&mut client).await, Card::new(Ten, Diamonds));
        assert_eq!(recv_card(&mut client).await, Card::new(Nine, Clubs));
        assert_eq!(recv_card(&mut client).await, Card::new(Seven, Spades));

        client.send(Decision::Stand).await.unwrap();

        // Reveal the hole card then draw to 20 and stop.
        assert_eq!(recv_card(&mut client).await, Card::new(Six, Hearts));
        assert_eq!(recv_card(&mut client).await, Card::new(Seven, Hearts));
        assert_eq!(
            recv_event(&mut client).await,
            PayloadEvent::Outcome(Outcome::Loss)
        );

        let (session, res) = task.await.unwrap();
        assert!(res.is_ok());
        assert_eq!(session.state(), SessionState::Done);
        assert_eq!(session.client_name(), "Alice");
        assert_eq!(session.stats().losses, 1);
    }

    #[tokio::test]
    async fn dealer_busts() {
        let mut deck = STAND_ON_19.to_vec();
        deck.push((Deuce, Hearts));
        deck.push((King, Clubs));

        let (mut client, task) = spawn(stacked(&[&deck]));
        client.send(request(1)).await.unwrap();

        for _ in 0..3 {
            recv_card(&mut client).await;
        }
        client.send(Decision::Stand).await.unwrap();

        // 7 + 6 + 2 = 15 draws again, 25 is bust.
        assert_eq!(recv_card(&mut client).await, Card::new(Six, Hearts));
        assert_eq!(recv_card(&mut client).await, Card::new(Deuce, Hearts));
        assert_eq!(recv_card(&mut client).await, Card::new(King, Clubs));
        assert_eq!(
            recv_event(&mut client).await,
            PayloadEvent::Outcome(Outcome::Win)
        );

        let (session, res) = task.await.unwrap();
        assert!(res.is_ok());
        assert_eq!(session.stats().wins, 1);
    }

    #[tokio::test]
    async fn dealer_stands_on_17() {
        // Player 10 + 7, dealer K + 7 never draws.
        let deck = [(Ten, Hearts), (Seven, Clubs), (King, Spades), (Seven, Hearts)];

        let (mut client, task) = spawn(stacked(&[&deck]));
        client.send(request(1)).await.unwrap();

        for _ in 0..3 {
            recv_card(&mut client).await;
        }
        client.send(Decision::Stand).await.unwrap();

        assert_eq!(recv_card(&mut client).await, Card::new(Seven, Hearts));
        assert_eq!(
            recv_event(&mut client).await,
            PayloadEvent::Outcome(Outcome::Tie)
        );

        let (_, res) = task.await.unwrap();
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn player_bust_skips_dealer() {
        let deck = [
            (Ten, Diamonds),
            (Six, Clubs),
            (Seven, Spades),
            (Six, Hearts),
            (Nine, Hearts),
        ];

        let (mut client, task) = spawn(stacked(&[&deck]));
        client.send(request(1)).await.unwrap();

        for _ in 0..3 {
            recv_card(&mut client).await;
        }

        client.send(Decision::Hit).await.unwrap();
        assert_eq!(recv_card(&mut client).await, Card::new(Nine, Hearts));

        // After a bust the next payload is the outcome, the hole card is never sent.
        assert_eq!(
            recv_event(&mut client).await,
            PayloadEvent::Outcome(Outcome::Loss)
        );

        // The session has ended without reading another decision.
        let (session, res) = task.await.unwrap();
        assert!(res.is_ok());
        assert_eq!(session.state(), SessionState::Done);
        assert!(client.recv_payload().await.is_err());
    }

    #[tokio::test]
    async fn two_aces_bust_on_deal() {
        let deck = [(Ace, Diamonds), (Ace, Clubs), (Seven, Spades), (Six, Hearts)];

        let (mut client, task) = spawn(stacked(&[&deck]));
        client.send(request(1)).await.unwrap();

        for _ in 0..3 {
            recv_card(&mut client).await;
        }

        assert_eq!(
            recv_event(&mut client).await,
            PayloadEvent::Outcome(Outcome::Loss)
        );

        let (_, res) = task.await.unwrap();
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn bust_loses_against_dealer_bust() {
        // Both sides hold two aces, 22 against 22.
        let deck = [(Ace, Hearts), (Ace, Clubs), (Ace, Spades), (Ace, Diamonds)];

        let (mut client, task) = spawn(stacked(&[&deck]));
        client.send(request(1)).await.unwrap();

        for _ in 0..3 {
            recv_card(&mut client).await;
        }

        assert_eq!(
            recv_event(&mut client).await,
            PayloadEvent::Outcome(Outcome::Loss)
        );

        let (session, res) = task.await.unwrap();
        assert!(res.is_ok());
        assert_eq!(session.stats().losses, 1);
        assert_eq!(session.stats().ties, 0);
    }

    #[tokio::test]
    async fn soft_aces_keep_player_in() {
        let deck = [
            (Ace, Hearts),
            (Five, Clubs),
            (Nine, Spades),
            (Eight, Hearts),
            (Nine, Hearts),
            (Five, Diamonds),
        ];

        let (mut client, task) = spawn_with_rule(stacked(&[&deck]), AceRule::Soft);
        client.send(request(1)).await.unwrap();

        for _ in 0..3 {
            recv_card(&mut client).await;
        }

        // A + 5 + 9 is 15 with a soft ace, the session keeps reading decisions.
        client.send(Decision::Hit).await.unwrap();
        assert_eq!(recv_card(&mut client).await, Card::new(Nine, Hearts));
        client.send(Decision::Hit).await.unwrap();
        assert_eq!(recv_card(&mut client).await, Card::new(Five, Diamonds));
        client.send(Decision::Stand).await.unwrap();

        // Dealer reveals 17 and stands, 20 wins.
        assert_eq!(recv_card(&mut client).await, Card::new(Eight, Hearts));
        assert_eq!(
            recv_event(&mut client).await,
            PayloadEvent::Outcome(Outcome::Win)
        );

        let (session, res) = task.await.unwrap();
        assert!(res.is_ok());
        assert_eq!(session.stats().wins, 1);
    }

    #[tokio::test]
    async fn multiple_rounds() {
        let round1 = [(Ten, Hearts), (Queen, Clubs), (Nine, Spades), (Eight, Hearts)];
        let round2 = [(Deuce, Hearts), (Trey, Clubs), (Ten, Spades), (Nine, Hearts)];

        let (mut client, task) = spawn(stacked(&[&round1, &round2]));
        client.send(request(2)).await.unwrap();

        // Round 1: 20 against 17.
        for _ in 0..3 {
            recv_card(&mut client).await;
        }
        client.send(Decision::Stand).await.unwrap();
        assert_eq!(recv_card(&mut client).await, Card::new(Eight, Hearts));
        assert_eq!(
            recv_event(&mut client).await,
            PayloadEvent::Outcome(Outcome::Win)
        );

        // Round 2 uses a fresh deck: 5 against 19.
        assert_eq!(recv_card(&mut client).await, Card::new(Deuce, Hearts));
        recv_card(&mut client).await;
        recv_card(&mut client).await;
        client.send(Decision::Stand).await.unwrap();
        assert_eq!(recv_card(&mut client).await, Card::new(Nine, Hearts));
        assert_eq!(
            recv_event(&mut client).await,
            PayloadEvent::Outcome(Outcome::Loss)
        );

        let (session, res) = task.await.unwrap();
        assert!(res.is_ok());
        assert_eq!(session.stats().rounds(), 2);
    }

    #[tokio::test]
    async fn random_rounds_follow_rules() {
        let (mut client, task) = spawn(StdRng::seed_from_u64(42));
        client.send(request(20)).await.unwrap();

        for _ in 0..20 {
            let mut player = Hand::default();
            let mut dealer = Hand::default();
            player.push(recv_card(&mut client).await);
            player.push(recv_card(&mut client).await);
            dealer.push(recv_card(&mut client).await);

            // Hit below 15.
            while !player.is_bust(AceRule::Fixed) && player.total(AceRule::Fixed) < 15 {
                client.send(Decision::Hit).await.unwrap();
                player.push(recv_card(&mut client).await);
            }

            if !player.is_bust(AceRule::Fixed) {
                client.send(Decision::Stand).await.unwrap();
            }

            let outcome = loop {
                match recv_event(&mut client).await {
                    PayloadEvent::Card(card) => {
                        // The dealer never draws at 17 or more.
                        assert!(dealer.total(AceRule::Fixed) < 17 || dealer.len() == 1);
                        dealer.push(card);
                    }
                    PayloadEvent::Outcome(outcome) => break outcome,
                }
            };

            let expected = if player.is_bust(AceRule::Fixed) {
                Outcome::Loss
            } else {
                game::settle(player.total(AceRule::Fixed), dealer.total(AceRule::Fixed))
            };
            assert_eq!(outcome, expected);
        }

        let (_, res) = task.await.unwrap();
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn zero_rounds() {
        let (mut client, task) = spawn(stacked(&[]));
        client.send(request(0)).await.unwrap();

        let (session, res) = task.await.unwrap();
        assert!(res.is_ok());
        assert_eq!(session.stats().rounds(), 0);
        assert!(client.recv_payload().await.is_err());
    }

    #[tokio::test]
    async fn invalid_request_sends_nothing() {
        let (mut client, server) = duplex(1024);
        let task = tokio::spawn(async move {
            let mut conn = Connection::new(server);
            let mut session = Session::new(stacked(&[]), AceRule::Fixed);
            let res = session.run(&mut conn).await;
            conn.close().await;
            res
        });

        let mut buf = request(1).encode();
        buf[0] = 0;
        client.write_all(&buf).await.unwrap();

        let res = task.await.unwrap();
        assert!(matches!(res, Err(Error::InvalidRequest(_))));

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn disconnect_aborts_session() {
        let (mut client, task) = spawn(stacked(&[&STAND_ON_19]));
        client.send(request(3)).await.unwrap();

        for _ in 0..3 {
            recv_card(&mut client).await;
        }
        drop(client);

        let (session, res) = task.await.unwrap();
        assert!(matches!(res, Err(Error::ConnectionLost(_))));
        assert_eq!(session.state(), SessionState::PlayerTurn);
        assert_eq!(session.stats().rounds(), 0);
    }
}
