// Copyright (C) 2020-2024 Andy Kurnia.

/*
  usage:
    RUST_LOG=debug cargo run --release --bin setbot -- \
      --addrs localhost:7777,localhost:7778 --games-per-server 5 \
      --players-per-game 5 --rounds 3 2>&1 | tee output.log
*/

use clap::Parser;
use log::*;
use setbot::config::{Args, HarnessConfig};
use setbot::harness::Harness;
use setbot::provision::HttpLobby;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = HarnessConfig::try_from(Args::parse())?;
    let mut harness = Harness::new(config, HttpLobby);
    if let Err(err) = harness.run().await {
        error!("{}", err);
        return Err(err.into());
    }
    Ok(())
}
