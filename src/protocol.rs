// Copyright (C) 2020-2024 Andy Kurnia.

//! Wire format of a SetML game socket.
//!
//! Inbound messages are JSON objects discriminated by `type`. They are
//! validated here into a `ServerEvent` so the engine never sees a
//! half-formed board. Outbound commands are the three things a player can
//! do: start the game, claim a set, ask for a shuffle.

use crate::card::{BOARD_SIZE, Board, Card};
use crate::error::DecodeError;
use crate::finder::{Pick, Triple};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    New,
    Started(Board),
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// `server_game`
    Game(GameStatus),
    /// `server_board_card`
    BoardCard { idx: usize, card: Card },
    /// `server_game_update`; only completion matters
    GameUpdate { complete: bool },
    /// presence, move log and shuffle log
    Ignored,
    Unhandled(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ServerGame {
    game_update: ServerGameStatus,
    // only `started` looks at this
    #[serde(default)]
    board_card_data: Option<Value>,
}

#[derive(Deserialize)]
struct ServerGameStatus {
    status: String,
}

#[derive(Deserialize)]
struct CardSlot {
    #[serde(deserialize_with = "whole_number")]
    idx: i64,
    #[serde(deserialize_with = "whole_number")]
    card_id: i64,
}

// servers may send 3.0 for 3
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = Number::deserialize(deserializer)?;
    number
        .as_i64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < (1u64 << 53) as f64)
                .map(|f| f as i64)
        })
        .ok_or_else(|| D::Error::custom(format!("{} is not a whole number", number)))
}

#[derive(Deserialize)]
struct ServerGameUpdate {
    status: String,
}

pub fn decode(message: &str) -> Result<ServerEvent, DecodeError> {
    let data: Value = serde_json::from_str(message)
        .map_err(|e| DecodeError::MalformedMessage(e.to_string()))?;
    let Envelope { kind } = Envelope::deserialize(&data)
        .map_err(|_| DecodeError::MalformedMessage("no type in message".into()))?;

    match kind.as_str() {
        "server_game" => {
            let game = ServerGame::deserialize(&data).map_err(|e| {
                DecodeError::MalformedMessage(format!("server_game: {}", e))
            })?;
            match game.game_update.status.as_str() {
                "new" => Ok(ServerEvent::Game(GameStatus::New)),
                "started" => {
                    let slots = game.board_card_data.ok_or_else(|| {
                        DecodeError::MalformedBoard("no board_card_data in server_game".into())
                    })?;
                    let slots = slots.as_array().ok_or_else(|| {
                        DecodeError::MalformedBoard("board_card_data is not an array".into())
                    })?;
                    Ok(ServerEvent::Game(GameStatus::Started(decode_board(slots)?)))
                }
                "complete" => Ok(ServerEvent::Game(GameStatus::Complete)),
                _ => Err(DecodeError::UnknownStatus(game.game_update.status)),
            }
        }
        "server_board_card" => {
            let (idx, card) = decode_slot(&data).map_err(DecodeError::MalformedUpdate)?;
            Ok(ServerEvent::BoardCard { idx, card })
        }
        "server_game_update" => {
            let update = ServerGameUpdate::deserialize(&data).map_err(|e| {
                DecodeError::MalformedMessage(format!("server_game_update: {}", e))
            })?;
            Ok(ServerEvent::GameUpdate {
                complete: update.status == "complete",
            })
        }
        "server_presence" | "server_move_info" | "server_shuffles" => Ok(ServerEvent::Ignored),
        _ => Ok(ServerEvent::Unhandled(kind)),
    }
}

fn decode_board(slots: &[Value]) -> Result<Board, DecodeError> {
    if slots.len() != BOARD_SIZE {
        return Err(DecodeError::MalformedBoard(format!(
            "board_card_data has {} cards, not {}",
            slots.len(),
            BOARD_SIZE
        )));
    }
    let mut board = Board::default();
    for slot in slots {
        let (idx, card) = decode_slot(slot).map_err(DecodeError::MalformedBoard)?;
        board[idx] = card;
    }
    Ok(board)
}

fn decode_slot(data: &Value) -> Result<(usize, Card), String> {
    let CardSlot { idx, card_id } =
        CardSlot::deserialize(data).map_err(|e| format!("bad card data: {}", e))?;
    let idx = usize::try_from(idx)
        .ok()
        .filter(|&idx| idx < BOARD_SIZE)
        .ok_or_else(|| format!("idx {} is off the board", idx))?;
    let card = Card::from_id(card_id).map_err(|e| e.to_string())?;
    Ok((idx, card))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardData {
    #[serde(rename = "type")]
    kind: &'static str,
    pub idx: usize,
    pub card_id: u8,
}

impl From<Pick> for CardData {
    fn from(pick: Pick) -> Self {
        Self {
            kind: "card_data",
            idx: pick.idx,
            card_id: pick.card_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    #[serde(rename = "client_start_game")]
    StartGame { token: String },
    #[serde(rename = "client_move")]
    Move {
        token: String,
        card0: CardData,
        card1: CardData,
        card2: CardData,
    },
    #[serde(rename = "client_shuffle")]
    Shuffle { token: String },
}

impl ClientCommand {
    pub fn claim(token: &str, triple: Triple) -> Self {
        let [card0, card1, card2] = triple.map(CardData::from);
        ClientCommand::Move {
            token: token.to_string(),
            card0,
            card1,
            card2,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
