use futures_util::{SinkExt, StreamExt};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde_json::{Value, json};
use setbot::card::{Card, is_set};
use setbot::config::{PauseWindow, Tuning};
use setbot::engine::PlayerGame;
use setbot::game::Game;
use setbot::session::{self, WsStream};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async, connect_async};

type ServerWs = WebSocketStream<TcpStream>;

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(300);

const WITH_SETS: [i64; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
// only attribute values 0 and 1, so nothing is all different
const SET_FREE: [i64; 12] = [0, 1, 3, 4, 9, 10, 12, 13, 27, 28, 30, 31];

async fn pair() -> (ServerWs, WsStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        accept_async(stream).await.unwrap()
    });
    let (client, _) = connect_async(format!("ws://{}/games/g1/ws", addr))
        .await
        .unwrap();
    (accept.await.unwrap(), client)
}

fn quick() -> Tuning {
    Tuning {
        move_pause: PauseWindow::NONE,
        ..Tuning::default()
    }
}

fn start(client: WsStream, tuning: Tuning) -> (Arc<Game>, JoinHandle<()>) {
    let game = Arc::new(Game::new("g1"));
    let participant = game.admit();
    let bot = PlayerGame::new("tok", tuning, Box::new(ChaCha20Rng::seed_from_u64(11)));
    let handle = tokio::spawn(session::run(client, bot, game.clone(), participant));
    (game, handle)
}

async fn push(ws: &mut ServerWs, value: Value) {
    ws.send(Message::text(value.to_string())).await.unwrap();
}

async fn next_command(ws: &mut ServerWs) -> Value {
    loop {
        let message = timeout(WAIT, ws.next())
            .await
            .expect("no command in time")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

fn started(ids: [i64; 12]) -> Value {
    let slots = ids
        .iter()
        .enumerate()
        .map(|(idx, id)| json!({ "type": "board_card_data", "idx": idx, "card_id": id }))
        .collect::<Vec<_>>();
    json!({
        "type": "server_game",
        "game_update": { "type": "game_update", "status": "started" },
        "board_card_data": slots,
    })
}

fn board_card(idx: usize, id: i64) -> Value {
    json!({ "type": "server_board_card", "idx": idx, "card_id": id })
}

async fn finished(handle: JoinHandle<()>) {
    timeout(WAIT, handle)
        .await
        .expect("session still running")
        .unwrap();
}

#[tokio::test]
async fn starts_new_games_and_stops_on_completion() {
    let (mut server, client) = pair().await;
    let (game, handle) = start(client, quick());

    push(&mut server, json!({ "type": "server_game", "game_update": { "status": "new" } })).await;
    assert_eq!(
        next_command(&mut server).await,
        json!({ "type": "client_start_game", "token": "tok" })
    );

    push(&mut server, json!({ "type": "server_game_update", "status": "complete" })).await;
    finished(handle).await;
    assert!(game.is_complete());
    assert_eq!(game.open_sessions(), 0);
}

#[tokio::test]
async fn claims_a_set_on_a_started_board() {
    let (mut server, client) = pair().await;
    let (game, handle) = start(client, quick());

    push(&mut server, started(WITH_SETS)).await;
    let command = next_command(&mut server).await;
    assert_eq!(command["type"], "client_move");
    assert_eq!(command["token"], "tok");
    let cards = ["card0", "card1", "card2"].map(|key| {
        let data = &command[key];
        assert_eq!(data["type"], "card_data");
        let idx = data["idx"].as_u64().unwrap() as usize;
        let id = data["card_id"].as_i64().unwrap();
        assert_eq!(WITH_SETS[idx], id);
        Card::from_id(id).unwrap()
    });
    assert!(is_set(&cards[0], &cards[1], &cards[2]));

    push(&mut server, json!({ "type": "server_game", "game_update": { "status": "complete" } })).await;
    finished(handle).await;
    assert!(game.is_complete());
}

#[tokio::test]
async fn three_updates_trigger_one_reaction() {
    let (mut server, client) = pair().await;
    let always_shuffle = Tuning {
        shuffle_probability: 1.0,
        ..quick()
    };
    let (_game, handle) = start(client, always_shuffle);

    push(&mut server, started(SET_FREE)).await;
    assert_eq!(
        next_command(&mut server).await,
        json!({ "type": "client_shuffle", "token": "tok" })
    );

    // still no set after these
    push(&mut server, board_card(0, 36)).await;
    push(&mut server, board_card(1, 37)).await;
    assert!(timeout(QUIET, server.next()).await.is_err());

    push(&mut server, board_card(2, 39)).await;
    assert_eq!(
        next_command(&mut server).await,
        json!({ "type": "client_shuffle", "token": "tok" })
    );
    assert!(timeout(QUIET, server.next()).await.is_err());

    push(&mut server, json!({ "type": "server_game_update", "status": "complete" })).await;
    finished(handle).await;
}

#[tokio::test]
async fn keeps_reading_after_bad_messages() {
    let (mut server, client) = pair().await;
    let (game, handle) = start(client, quick());

    server.send(Message::text("garbage")).await.unwrap();
    push(&mut server, json!({ "type": "server_board_card" })).await;
    push(&mut server, json!({ "type": "server_game", "game_update": { "status": "paused" } })).await;
    push(&mut server, json!({ "type": "server_chat", "text": "hi" })).await;
    push(&mut server, json!({ "type": "server_presence" })).await;
    push(&mut server, json!({ "type": "server_game_update", "status": "started" })).await;
    assert!(!game.is_complete());

    push(&mut server, json!({ "type": "server_game", "game_update": { "status": "new" } })).await;
    assert_eq!(next_command(&mut server).await["type"], "client_start_game");

    push(&mut server, json!({ "type": "server_game_update", "status": "complete" })).await;
    finished(handle).await;
}

#[tokio::test]
async fn binary_frames_are_read_as_text() {
    let (mut server, client) = pair().await;
    let (game, handle) = start(client, quick());

    server.send(Message::binary(vec![0xff, 0xfe])).await.unwrap();
    let new = json!({ "type": "server_game", "game_update": { "status": "new" } });
    server
        .send(Message::binary(new.to_string().into_bytes()))
        .await
        .unwrap();
    assert_eq!(next_command(&mut server).await["type"], "client_start_game");

    let over = json!({ "type": "server_game_update", "status": "complete" });
    server
        .send(Message::binary(over.to_string().into_bytes()))
        .await
        .unwrap();
    finished(handle).await;
    assert!(game.is_complete());
}

#[tokio::test]
async fn stops_when_a_peer_completes_the_game() {
    let (_server, client) = pair().await;
    let (game, handle) = start(client, quick());
    tokio::time::sleep(QUIET).await;
    assert!(!handle.is_finished());

    game.mark_complete();
    finished(handle).await;
    assert_eq!(game.open_sessions(), 0);
}

#[tokio::test]
async fn server_hangup_ends_session() {
    let (mut server, client) = pair().await;
    let (game, handle) = start(client, quick());

    server.close(None).await.unwrap();
    finished(handle).await;
    assert!(!game.is_complete());
    assert_eq!(game.open_sessions(), 0);
}

#[tokio::test]
async fn completed_game_is_left_at_once() {
    let (_server, client) = pair().await;
    let game = Arc::new(Game::new("g1"));
    game.mark_complete();
    let participant = game.admit();
    let bot = PlayerGame::new("tok", quick(), Box::new(ChaCha20Rng::seed_from_u64(1)));
    finished(tokio::spawn(session::run(client, bot, game.clone(), participant))).await;
    assert_eq!(game.open_sessions(), 0);
    assert_eq!(game.players(), 1);
}
