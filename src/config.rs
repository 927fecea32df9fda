// Copyright (C) 2020-2024 Andy Kurnia.

use crate::error::ConfigError;
use crate::finder::SearchOrder;
use clap::Parser;
use rand::Rng;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "setbot",
    version,
    about = "Simulate rounds of concurrent Set players against SetML servers"
)]
pub struct Args {
    /// CSV of setml game addresses
    #[arg(long, default_value = "localhost:7777", value_delimiter = ',')]
    pub addrs: Vec<String>,
    /// Number of games per server
    #[arg(long, default_value_t = 5)]
    pub games_per_server: usize,
    /// Number of players per game
    #[arg(long, default_value_t = 5)]
    pub players_per_game: usize,
    /// Number of rounds of games to simulate
    #[arg(long, default_value_t = 1)]
    pub rounds: usize,
    /// How long a round waits for games to start before watching them
    #[arg(long, default_value_t = 1000)]
    pub grace_ms: u64,
    #[arg(long, default_value_t = 250)]
    pub move_pause_min_ms: u64,
    #[arg(long, default_value_t = 750)]
    pub move_pause_max_ms: u64,
    #[arg(long, default_value_t = 1000)]
    pub join_pause_min_ms: u64,
    #[arg(long, default_value_t = 3000)]
    pub join_pause_max_ms: u64,
    /// Chance of asking for a shuffle when no set is on the board
    #[arg(long, default_value_t = 0.667)]
    pub shuffle_probability: f64,
    #[arg(long, value_enum, default_value_t = SearchOrder::Randomized)]
    pub search: SearchOrder,
    /// Seed every random decision of the run
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Inclusive range of milliseconds to wait, drawn uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseWindow {
    min_ms: u64,
    max_ms: u64,
}

impl PauseWindow {
    pub const NONE: PauseWindow = PauseWindow { min_ms: 0, max_ms: 0 };

    pub fn new(name: &'static str, min_ms: u64, max_ms: u64) -> Result<Self, ConfigError> {
        if min_ms > max_ms {
            return Err(ConfigError::InvertedWindow {
                name,
                min_ms,
                max_ms,
            });
        }
        Ok(Self { min_ms, max_ms })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }
}

/// How a bot behaves once it can see a board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub move_pause: PauseWindow,
    pub shuffle_probability: f64,
    pub search: SearchOrder,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            move_pause: PauseWindow {
                min_ms: 250,
                max_ms: 750,
            },
            shuffle_probability: 0.667,
            search: SearchOrder::Randomized,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub servers: Vec<String>,
    pub games_per_server: usize,
    pub players_per_game: usize,
    pub rounds: usize,
    pub grace: Duration,
    pub join_pause: PauseWindow,
    pub tuning: Tuning,
    pub seed: Option<u64>,
}

impl TryFrom<Args> for HarnessConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, ConfigError> {
        let servers = args
            .addrs
            .iter()
            .map(|addr| addr.trim())
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        if args.games_per_server == 0 {
            return Err(ConfigError::Zero("games-per-server"));
        }
        if args.players_per_game == 0 {
            return Err(ConfigError::Zero("players-per-game"));
        }
        if !(0.0..=1.0).contains(&args.shuffle_probability) {
            return Err(ConfigError::Probability(args.shuffle_probability));
        }
        Ok(Self {
            servers,
            games_per_server: args.games_per_server,
            players_per_game: args.players_per_game,
            rounds: args.rounds,
            grace: Duration::from_millis(args.grace_ms),
            join_pause: PauseWindow::new("join pause", args.join_pause_min_ms, args.join_pause_max_ms)?,
            tuning: Tuning {
                move_pause: PauseWindow::new(
                    "move pause",
                    args.move_pause_min_ms,
                    args.move_pause_max_ms,
                )?,
                shuffle_probability: args.shuffle_probability,
                search: args.search,
            },
            seed: args.seed,
        })
    }
}
