// Copyright (C) 2020-2024 Andy Kurnia.

//! One bot's view of one game.
//!
//! `PlayerGame` is a pure state machine: feed it decoded server events, it
//! updates its board and says what to do next. Doing it (sleeping, writing
//! to the socket, telling the game it is over) is the session's job.

use crate::card::Board;
use crate::config::Tuning;
use crate::error::DecodeError;
use crate::finder;
use crate::protocol::{self, ClientCommand, GameStatus, ServerEvent};
use log::*;
use rand::prelude::*;
use std::time::Duration;

/// Single-card updates it takes to replace a claimed set.
pub const UPDATES_PER_EVALUATION: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingBoard,
    BoardActive,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    Idle,
    /// Send right away.
    Send(ClientCommand),
    /// Think for a while, then send.
    Play { pause: Duration, command: ClientCommand },
    /// Think for a while, then do nothing.
    Pass { pause: Duration },
    /// The game is over; stop reading.
    Finished,
}

pub struct PlayerGame {
    token: String,
    board: Board,
    pending_updates: u8,
    evaluations: u64,
    phase: Phase,
    tuning: Tuning,
    rng: Box<dyn RngCore + Send>,
}

impl PlayerGame {
    pub fn new(token: impl Into<String>, tuning: Tuning, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            token: token.into(),
            board: Board::default(),
            pending_updates: 0,
            evaluations: 0,
            phase: Phase::AwaitingBoard,
            tuning,
            rng,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending_updates(&self) -> u8 {
        self.pending_updates
    }

    /// How many times this bot has looked for a set.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn handle_message(&mut self, message: &str) -> Result<Reaction, DecodeError> {
        Ok(self.handle_event(protocol::decode(message)?))
    }

    pub fn handle_event(&mut self, event: ServerEvent) -> Reaction {
        if self.phase == Phase::Complete {
            return Reaction::Finished;
        }
        match event {
            ServerEvent::Game(GameStatus::New) => Reaction::Send(ClientCommand::StartGame {
                token: self.token.clone(),
            }),
            ServerEvent::Game(GameStatus::Started(board)) => {
                self.board = board;
                self.phase = Phase::BoardActive;
                self.evaluate()
            }
            ServerEvent::BoardCard { idx, card } => {
                let Some(slot) = self.board.get_mut(idx) else {
                    warn!("board card {} is off the board", idx);
                    return Reaction::Idle;
                };
                *slot = card;
                self.pending_updates += 1;
                if self.pending_updates >= UPDATES_PER_EVALUATION {
                    self.pending_updates = 0;
                    self.evaluate()
                } else {
                    Reaction::Idle
                }
            }
            ServerEvent::Game(GameStatus::Complete) | ServerEvent::GameUpdate { complete: true } => {
                self.phase = Phase::Complete;
                Reaction::Finished
            }
            ServerEvent::GameUpdate { complete: false } | ServerEvent::Ignored => Reaction::Idle,
            ServerEvent::Unhandled(kind) => {
                warn!("Unhandled message type: {}", kind);
                Reaction::Idle
            }
        }
    }

    // claim a set if there is one, otherwise maybe ask for a shuffle
    fn evaluate(&mut self) -> Reaction {
        self.evaluations += 1;
        let found = finder::find_set(&self.board, self.tuning.search, &mut *self.rng);
        let pause = self.tuning.move_pause.sample(&mut *self.rng);
        if let Some(triple) = found {
            Reaction::Play {
                pause,
                command: ClientCommand::claim(&self.token, triple),
            }
        } else if self.rng.random_bool(self.tuning.shuffle_probability) {
            Reaction::Play {
                pause,
                command: ClientCommand::Shuffle {
                    token: self.token.clone(),
                },
            }
        } else {
            Reaction::Pass { pause }
        }
    }
}
