// Copyright (C) 2020-2024 Andy Kurnia.

use tokio_tungstenite::tungstenite;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CardError {
    #[error("invalid card id: {0}")]
    InvalidCard(i64),
}

/// Failure to turn one inbound message into a `ServerEvent`.
/// Always local to the message; the session keeps reading.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("unrecognized game status: {0}")]
    UnknownStatus(String),
    #[error("malformed board: {0}")]
    MalformedBoard(String),
    #[error("malformed card update: {0}")]
    MalformedUpdate(String),
}

/// Anything that stops the harness from getting a player into a game.
/// These are fatal to the whole run.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("no {0} found in response")]
    MissingField(&'static str),
    #[error("bad {name} pattern: {source}")]
    Pattern {
        name: &'static str,
        source: regex::Error,
    },
    #[error("unable to build request: {0}")]
    Request(String),
    #[error("unable to join game: {0}")]
    Connect(#[from] tungstenite::Error),
    #[error("server unit failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("no server addresses given")]
    NoServers,
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("{name} window is inverted ({min_ms}ms > {max_ms}ms)")]
    InvertedWindow {
        name: &'static str,
        min_ms: u64,
        max_ms: u64,
    },
    #[error("shuffle probability {0} is outside [0, 1]")]
    Probability(f64),
}
