//! Task board — human review of photo requests on an external board.
//!
//! `TaskBoard` owns the list ids and does the moves; `CardApi` is the
//! remote side it talks to.

pub mod routes;
pub mod trello;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{BoardLists, TrelloConfig};
use crate::error::BoardError;

pub use trello::TrelloClient;

/// A card on the external board. Owned and versioned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub list_id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
}

/// Payload of a card creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub name: String,
    pub description: String,
    pub board_id: String,
    pub list_id: String,
}

/// Remote card operations.
#[async_trait]
pub trait CardApi: Send + Sync {
    /// Fetch a card by its id.
    async fn get_card(&self, id: &str) -> Result<Card, BoardError>;

    /// Persist the card's list, name and description remotely.
    async fn save_card(&self, card: &Card) -> Result<Card, BoardError>;

    /// Create a card.
    async fn create_card(&self, card: &NewCard) -> Result<Card, BoardError>;
}

/// Moves and creates triage cards on the configured board.
pub struct TaskBoard {
    api: Arc<dyn CardApi>,
    lists: BoardLists,
}

impl TaskBoard {
    pub fn new(api: Arc<dyn CardApi>, lists: BoardLists) -> Self {
        Self { api, lists }
    }

    /// Board backed by the Trello REST API.
    pub fn trello(config: TrelloConfig) -> Self {
        let api = Arc::new(TrelloClient::new(&config));
        Self::new(api, config.lists)
    }

    pub async fn find_card(&self, id: &str) -> Result<Card, BoardError> {
        self.api.get_card(id).await
    }

    /// Move the card to the approved list.
    pub async fn accept(&self, card: &mut Card) -> Result<Card, BoardError> {
        card.list_id = self.lists.approved_list_id.clone();
        let saved = self.api.save_card(card).await?;
        info!(card_id = %card.id, "Card accepted");
        Ok(saved)
    }

    /// Move the card to the rejected list.
    pub async fn reject(&self, card: &mut Card) -> Result<Card, BoardError> {
        card.list_id = self.lists.rejected_list_id.clone();
        let saved = self.api.save_card(card).await?;
        info!(card_id = %card.id, "Card rejected");
        Ok(saved)
    }

    /// Create a card in the incoming list of the triage board.
    pub async fn create_request_card(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Card, BoardError> {
        let new_card = NewCard {
            name: name.into(),
            description: description.into(),
            board_id: self.lists.board_id.clone(),
            list_id: self.lists.incoming_list_id.clone(),
        };
        let card = self.api.create_card(&new_card).await?;
        info!(card_id = %card.id, name = %card.name, "Request card created");
        Ok(card)
    }
}
