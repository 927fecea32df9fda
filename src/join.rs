// Copyright (C) 2020-2024 Andy Kurnia.

/*
  usage:
    RUST_LOG=debug cargo run --release \
      --bin setjoin -- localhost:7777 gameid 3 2>&1 | tee output.log
  adds 3 bot players to a game someone already created
*/

use log::*;
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use setbot::config::{PauseWindow, Tuning};
use setbot::game::{Game, Server};
use setbot::harness::join_game;
use setbot::provision::{HttpLobby, Lobby};

use std::str::FromStr;
use std::sync::Arc;

async fn do_it(
    addr: &str,
    game_id: &str,
    players: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = Server::new(addr);
    let game = Arc::new(Game::new(game_id));
    let join_pause = PauseWindow::new("join pause", 1000, 3000)?;
    let mut rng = ChaCha20Rng::from_rng(&mut rand::rng());

    for p in 0..players {
        let player = HttpLobby.create_player(&server, game.id()).await?;
        info!(
            "Player {} ({:?}) joining game {} on server {}",
            p + 1,
            player.id(),
            game.id(),
            server.addr()
        );
        join_game(&HttpLobby, &server, &game, player, Tuning::default(), &mut rng).await?;
        if p + 1 < players {
            tokio::time::sleep(join_pause.sample(&mut rng)).await;
        }
    }

    game.wait_closed().await;
    info!("game {} finished with {} players", game.id(), game.players());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = std::env::args().collect::<Vec<_>>();
    if args.len() <= 3 {
        println!(
            "args: localhost:7777 gameid players
  players
    number of bots to add"
        );
        Ok(())
    } else {
        let players = usize::from_str(&args[3])?;
        if let Err(err) = do_it(&args[1], &args[2], players).await {
            error!("{}", err);
            return Err(err);
        }
        Ok(())
    }
}
