// Copyright (C) 2020-2024 Andy Kurnia.

//! Getting bot players into SetML games.
//!
//! The server has no bot API, so this does what a browser does: fetch the
//! page, pick the session token (and ids) out of the markup, keep the
//! cookies, then open the game socket with them.

use crate::error::ProvisionError;
use crate::game::Server;
use crate::session::WsStream;
use async_trait::async_trait;
use log::*;
use regex::Regex;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use std::sync::Arc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;

/// A player identity: its token plus the cookie-carrying client that
/// obtained it. Never shared between games.
#[derive(Debug, Clone)]
pub struct Player {
    id: Option<String>,
    token: String,
    client: reqwest::Client,
    cookies: Arc<Jar>,
}

impl Player {
    /// A fresh player with an empty cookie store and no token yet.
    fn anonymous() -> Result<Self, ProvisionError> {
        let cookies = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .build()?;
        Ok(Self {
            id: None,
            token: String::new(),
            client,
            cookies,
        })
    }

    /// A player whose token was obtained elsewhere.
    pub fn with_token(token: impl Into<String>) -> Result<Self, ProvisionError> {
        Ok(Self {
            token: token.into(),
            ..Self::anonymous()?
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        let cookies = self.cookies.cookies(url)?;
        HeaderValue::from_bytes(cookies.as_bytes()).ok()
    }
}

/// Where players and games come from.
#[async_trait]
pub trait Lobby: Send + Sync {
    /// Creates a new game on `server`, returning its creator and the game id.
    async fn create_game(&self, server: &Server) -> Result<(Player, String), ProvisionError>;

    /// Creates a player for an existing game.
    async fn create_player(&self, server: &Server, game_id: &str)
    -> Result<Player, ProvisionError>;

    /// Opens `player`'s socket to the game.
    async fn connect(
        &self,
        server: &Server,
        game_id: &str,
        player: &Player,
    ) -> Result<WsStream, ProvisionError>;
}

/// The real thing: SetML over HTTP and WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpLobby;

#[async_trait]
impl Lobby for HttpLobby {
    async fn create_game(&self, server: &Server) -> Result<(Player, String), ProvisionError> {
        let mut player = fetch_player(parse_url(format!("http://{}/", server.addr()))?).await?;

        let body = check_ok(
            player
                .client
                .post(parse_url(format!("http://{}/games", server.addr()))?)
                .form(&[("token", player.token.as_str())])
                .send()
                .await?,
        )
        .await?
        .text()
        .await?;

        let game_id = scrape(&body, &GAME_ID)?;
        player.id = Some(scrape(&body, &PLAYER_ID)?);
        debug!("created game {} on {}", game_id, server.addr());
        Ok((player, game_id))
    }

    async fn create_player(
        &self,
        server: &Server,
        game_id: &str,
    ) -> Result<Player, ProvisionError> {
        fetch_player(parse_url(format!("http://{}/games/{}", server.addr(), game_id))?).await
    }

    async fn connect(
        &self,
        server: &Server,
        game_id: &str,
        player: &Player,
    ) -> Result<WsStream, ProvisionError> {
        let path = format!("{}/games/{}/ws", server.addr(), game_id);
        let mut request = format!("ws://{}", path).into_client_request()?;
        if let Some(cookies) = player.cookie_header(&parse_url(format!("http://{}", path))?) {
            request.headers_mut().insert(COOKIE, cookies);
        }
        let (ws, _) = tokio_tungstenite::connect_async(request).await?;
        Ok(ws)
    }
}

// get a token and cookie
async fn fetch_player(url: Url) -> Result<Player, ProvisionError> {
    let mut player = Player::anonymous()?;
    let body = check_ok(player.client.get(url).send().await?)
        .await?
        .text()
        .await?;
    player.token = scrape(&body, &TOKEN)?;
    player.id = scrape(&body, &PLAYER_ID).ok();
    Ok(player)
}

async fn check_ok(resp: reqwest::Response) -> Result<reqwest::Response, ProvisionError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        let body = match resp.text().await {
            Ok(t) => t,
            Err(e) => e.to_string(),
        };
        Err(ProvisionError::Status { status, body })
    }
}

fn parse_url(url: String) -> Result<Url, ProvisionError> {
    Url::parse(&url).map_err(|e| ProvisionError::Request(format!("{}: {}", url, e)))
}

/// A value embedded in the page, captured by the first group of `pattern`.
struct Marker {
    name: &'static str,
    pattern: &'static str,
}

const TOKEN: Marker = Marker {
    name: "token",
    pattern: r#"<meta name="token" content="([0-9a-f]+)"/>"#,
};

const GAME_ID: Marker = Marker {
    name: "game id",
    pattern: "<title>SetML: ([0-9a-z]+)</title>",
};

const PLAYER_ID: Marker = Marker {
    name: "player id",
    pattern: r#"<meta name="player_id" content="([0-9]+)"/>"#,
};

/// First well-formed occurrence of `marker` in `body`.
fn scrape(body: &str, marker: &Marker) -> Result<String, ProvisionError> {
    let re = Regex::new(marker.pattern).map_err(|source| ProvisionError::Pattern {
        name: marker.name,
        source,
    })?;
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str().to_string())
        .ok_or(ProvisionError::MissingField(marker.name))
}
