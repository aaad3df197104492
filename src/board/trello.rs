//! Trello REST client — `CardApi` over `/1/cards`.
//!
//! Authenticates every call with the `key` / `token` query parameters.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Card, CardApi, NewCard};
use crate::config::TrelloConfig;
use crate::error::BoardError;

/// Card as Trello serializes it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrelloCard {
    id: String,
    id_list: String,
    #[serde(default)]
    id_board: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    desc: String,
}

impl From<TrelloCard> for Card {
    fn from(card: TrelloCard) -> Self {
        Self {
            id: card.id,
            list_id: card.id_list,
            name: card.name,
            description: card.desc,
            board_id: card.id_board,
        }
    }
}

/// Fields sent on create and update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CardFields<'a> {
    name: &'a str,
    desc: &'a str,
    id_list: &'a str,
}

/// Trello API client.
pub struct TrelloClient {
    api_url: String,
    key: SecretString,
    token: SecretString,
    client: reqwest::Client,
}

impl TrelloClient {
    pub fn new(config: &TrelloConfig) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            token: config.token.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// `/1/cards`, or `/1/cards/{id}` with the id as one encoded segment.
    fn cards_url(&self, id: Option<&str>) -> Result<reqwest::Url, BoardError> {
        if let Some(id) = id {
            if id.is_empty() || id == "." || id == ".." {
                return Err(BoardError::RequestFailed(format!("invalid card id {id:?}")));
            }
        }

        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| BoardError::RequestFailed(format!("bad Trello API url: {e}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                BoardError::RequestFailed(format!("bad Trello API url: {}", self.api_url))
            })?;
            segments.pop_if_empty().extend(["1", "cards"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn auth(&self) -> [(&'static str, &str); 2] {
        [
            ("key", self.key.expose_secret()),
            ("token", self.token.expose_secret()),
        ]
    }

    /// Send a prepared request and decode the card in the reply.
    async fn send(&self, op: &str, request: reqwest::RequestBuilder) -> Result<Card, BoardError> {
        let resp = request
            .query(&self.auth())
            .send()
            .await
            .map_err(|e| BoardError::RequestFailed(format!("{op}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BoardError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let card: TrelloCard = resp
            .json()
            .await
            .map_err(|e| BoardError::InvalidResponse(format!("{op}: {e}")))?;
        Ok(card.into())
    }
}

#[async_trait]
impl CardApi for TrelloClient {
    async fn get_card(&self, id: &str) -> Result<Card, BoardError> {
        let request = self.client.get(self.cards_url(Some(id))?);
        self.send("get_card", request).await
    }

    async fn save_card(&self, card: &Card) -> Result<Card, BoardError> {
        let fields = CardFields {
            name: &card.name,
            desc: &card.description,
            id_list: &card.list_id,
        };
        let request = self
            .client
            .put(self.cards_url(Some(&card.id))?)
            .json(&fields);
        let saved = self.send("save_card", request).await?;
        debug!(card_id = %saved.id, list_id = %saved.list_id, "Card saved on Trello");
        Ok(saved)
    }

    async fn create_card(&self, card: &NewCard) -> Result<Card, BoardError> {
        // Trello derives the board from the list.
        let fields = CardFields {
            name: &card.name,
            desc: &card.description,
            id_list: &card.list_id,
        };
        let request = self.client.post(self.cards_url(None)?).json(&fields);
        let created = self.send("create_card", request).await?;
        debug!(card_id = %created.id, board_id = %card.board_id, "Card created on Trello");
        Ok(created)
    }
}
