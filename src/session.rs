// Copyright (C) 2020-2024 Andy Kurnia.

use crate::engine::{PlayerGame, Reaction};
use crate::game::Game;
use crate::protocol::ClientCommand;
use crate::tracker::Participant;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How often an idle session looks at whether a peer finished the game.
pub const TICK: Duration = Duration::from_millis(100);

/// Reads one player's game socket until the game is over or the socket is.
///
/// `participant` is this session's registration with the game; it is
/// released when the loop ends, however it ends.
pub async fn run<S>(mut ws: S, mut bot: PlayerGame, game: Arc<Game>, participant: Participant)
where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    let _participant = participant;
    if game.is_complete() {
        debug!("game {} already complete", game.id());
        let _ = ws.close().await;
        return;
    }

    let mut tick = tokio::time::interval(TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !game.is_complete() {
        tokio::select! {
            message = ws.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text.to_string(),
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            debug!("game {}: skipping {} bytes of binary", game.id(), data.len());
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        if closed_unexpectedly(frame.as_ref()) {
                            error!("game {}: connection closed: {:?}", game.id(), frame);
                        }
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        if !is_abnormal_closure(&err) {
                            error!("game {}: error: {}", game.id(), err);
                        }
                        break;
                    }
                    None => break,
                };
                match bot.handle_message(text.trim()) {
                    Ok(Reaction::Finished) => {
                        if game.mark_complete() {
                            info!("game {} complete", game.id());
                        }
                        break;
                    }
                    Ok(reaction) => act(&mut ws, game.id(), reaction).await,
                    Err(err) => warn!("game {}: error handling message: {}", game.id(), err),
                }
            }
            _ = tick.tick() => {}
        }
    }

    let _ = ws.close().await;
}

async fn act<S>(ws: &mut S, game_id: &str, reaction: Reaction)
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    let command = match reaction {
        Reaction::Send(command) => command,
        Reaction::Play { pause, command } => {
            tokio::time::sleep(pause).await;
            command
        }
        Reaction::Pass { pause } => {
            tokio::time::sleep(pause).await;
            return;
        }
        Reaction::Idle | Reaction::Finished => return,
    };
    if let Err(err) = send(ws, &command).await {
        // a dead socket also shows up on the next read, which ends the session
        warn!("game {}: unable to send {:?}: {}", game_id, command, err);
    }
}

async fn send<S>(
    ws: &mut S,
    command: &ClientCommand,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    let text = command.encode()?;
    debug!("send {}", text);
    ws.send(Message::text(text)).await?;
    Ok(())
}

fn closed_unexpectedly(frame: Option<&CloseFrame>) -> bool {
    match frame {
        None => false,
        Some(frame) => !matches!(
            frame.code,
            CloseCode::Normal | CloseCode::Away | CloseCode::Abnormal
        ),
    }
}

fn is_abnormal_closure(err: &WsError) -> bool {
    matches!(
        err,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}
