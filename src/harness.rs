// Copyright (C) 2020-2024 Andy Kurnia.

//! Rounds of games across servers.
//!
//! Each round runs one provisioning unit per server, concurrently. A unit
//! creates its games one after another, then walks them round-robin adding
//! one more player per game per pass until every game has its quota (or has
//! already finished). The round ends once every session of every game
//! created in it has closed; the next round starts only then.

use crate::config::{HarnessConfig, Tuning};
use crate::engine::PlayerGame;
use crate::error::ProvisionError;
use crate::game::{Game, Server};
use crate::provision::{Lobby, Player};
use crate::session;
use log::*;
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub games: usize,
    pub players: usize,
}

pub struct Harness<L> {
    config: Arc<HarnessConfig>,
    lobby: Arc<L>,
    servers: Vec<Arc<Server>>,
    rng: ChaCha20Rng,
}

impl<L: Lobby + 'static> Harness<L> {
    pub fn new(config: HarnessConfig, lobby: L) -> Self {
        let servers = config
            .servers
            .iter()
            .map(|addr| Arc::new(Server::new(addr.as_str())))
            .collect();
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_rng(&mut rand::rng()),
        };
        Self {
            config: Arc::new(config),
            lobby: Arc::new(lobby),
            servers,
            rng,
        }
    }

    pub fn servers(&self) -> &[Arc<Server>] {
        &self.servers
    }

    pub async fn run(&mut self) -> Result<Vec<RoundSummary>, ProvisionError> {
        let rounds = self.config.rounds;
        let mut summaries = Vec::with_capacity(rounds);
        for round in 1..=rounds {
            info!("Starting round {} of {}", round, rounds);
            let summary = self.run_round(round).await?;
            info!(
                "Finished round {} of {}: {} games, {} players",
                round, rounds, summary.games, summary.players
            );
            for server in &self.servers {
                info!("server {} has hosted {} games", server.addr(), server.games());
            }
            summaries.push(summary);
        }
        Ok(summaries)
    }

    async fn run_round(&mut self, round: usize) -> Result<RoundSummary, ProvisionError> {
        let mut units = JoinSet::new();
        for server in &self.servers {
            units.spawn(drive_server(
                self.config.clone(),
                self.lobby.clone(),
                server.clone(),
                round,
                ChaCha20Rng::seed_from_u64(self.rng.random()),
            ));
        }

        // wait for games to start
        tokio::time::sleep(self.config.grace).await;

        // an early return drops the set, which aborts the other units
        let mut games = Vec::new();
        while let Some(unit) = units.join_next().await {
            games.extend(unit??);
        }

        for game in &games {
            game.wait_closed().await;
            // all sockets closed counts as done, whatever the server last said
            game.mark_complete();
        }
        Ok(RoundSummary {
            games: games.len(),
            players: games.iter().map(|game| game.players()).sum(),
        })
    }
}

/// Everything one server gets in one round, strictly in sequence.
async fn drive_server<L: Lobby>(
    config: Arc<HarnessConfig>,
    lobby: Arc<L>,
    server: Arc<Server>,
    round: usize,
    mut rng: ChaCha20Rng,
) -> Result<Vec<Arc<Game>>, ProvisionError> {
    let mut games = Vec::with_capacity(config.games_per_server);
    for _ in 0..config.games_per_server {
        let (player, game_id) = lobby.create_game(&server).await?;
        let game = Arc::new(Game::new(game_id));
        info!(
            "{}/{}: Starting game {} ({}) on server {}",
            round,
            config.rounds,
            game.id(),
            server.games() + 1,
            server.addr()
        );
        join_game(&*lobby, &server, &game, player, config.tuning, &mut rng).await?;
        server.record_game();
        games.push(game);
    }

    for _ in 1..config.players_per_game {
        for (slot, game) in games.iter().enumerate() {
            if game.is_complete() {
                continue;
            }
            let player = lobby.create_player(&server, game.id()).await?;
            info!(
                "{}/{}: Player {} joining game {} ({}/{}) on server {}",
                round,
                config.rounds,
                game.players() + 1,
                game.id(),
                slot + 1,
                games.len(),
                server.addr()
            );
            join_game(&*lobby, &server, game, player, config.tuning, &mut rng).await?;
            tokio::time::sleep(config.join_pause.sample(&mut rng)).await;
        }
    }
    Ok(games)
}

/// Connects `player` to `game` and leaves a bot playing it in the
/// background. The session is registered with the game before it starts,
/// so `Game::wait_closed` covers it from here on.
pub async fn join_game<L: Lobby + ?Sized, R: Rng + ?Sized>(
    lobby: &L,
    server: &Server,
    game: &Arc<Game>,
    player: Player,
    tuning: Tuning,
    rng: &mut R,
) -> Result<(), ProvisionError> {
    let ws = lobby.connect(server, game.id(), &player).await?;
    let bot = PlayerGame::new(
        player.token(),
        tuning,
        Box::new(ChaCha20Rng::seed_from_u64(rng.random())),
    );
    let participant = game.admit();
    tokio::spawn(session::run(ws, bot, game.clone(), participant));
    Ok(())
}
