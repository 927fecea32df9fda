// Copyright (C) 2020-2024 Andy Kurnia.

pub mod card;
pub mod config;
pub mod engine;
pub mod error;
pub mod finder;
pub mod game;
pub mod harness;
pub mod protocol;
pub mod provision;
pub mod session;
pub mod tracker;
