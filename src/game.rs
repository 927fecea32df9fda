// Copyright (C) 2020-2024 Andy Kurnia.

use crate::tracker::{CompletionTracker, Participant};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A SetML server being loaded. Lives for the whole run.
#[derive(Debug)]
pub struct Server {
    addr: String,
    games: AtomicUsize,
}

impl Server {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            games: AtomicUsize::new(0),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Games created on this server so far, across rounds.
    pub fn games(&self) -> usize {
        self.games.load(Ordering::Relaxed)
    }

    pub fn record_game(&self) -> usize {
        self.games.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// A game as seen by the harness.
///
/// Shared by the server unit that provisioned it and every session joined
/// to it. The completion flag only ever goes from false to true and the
/// player count only grows, so whoever gets there first wins.
#[derive(Debug)]
pub struct Game {
    id: String,
    complete: AtomicBool,
    players: AtomicUsize,
    sessions: CompletionTracker,
}

impl Game {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            complete: AtomicBool::new(false),
            players: AtomicUsize::new(0),
            sessions: CompletionTracker::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// True only for the call that flipped the flag.
    pub fn mark_complete(&self) -> bool {
        !self.complete.swap(true, Ordering::AcqRel)
    }

    pub fn players(&self) -> usize {
        self.players.load(Ordering::Relaxed)
    }

    /// Counts a new player in and registers its session with the game's
    /// tracker. The session must hold on to the participant until its
    /// connection is closed.
    pub fn admit(&self) -> Participant {
        self.players.fetch_add(1, Ordering::Relaxed);
        self.sessions.register()
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.outstanding()
    }

    /// Resolves once every session admitted so far has closed.
    pub async fn wait_closed(&self) {
        self.sessions.wait().await
    }
}
