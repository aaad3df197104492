//! Triage — label a request's photo and open a review card for it.
//!
//! Nothing is written back to the request row. A request stays valid
//! whether or not its card was created.

use serde::Serialize;
use tracing::info;

use crate::board::{Card, TaskBoard};
use crate::labeler::ImageLabeler;
use crate::requests::model::Request;

/// Labels found for the photo and the card created for review.
#[derive(Debug, Clone, Serialize)]
pub struct TriageOutcome {
    pub request_id: i64,
    pub labels: Vec<String>,
    pub card: Card,
}

/// Classify the request's photo, then create a card in the incoming list.
pub async fn triage(
    request: &Request,
    labeler: &dyn ImageLabeler,
    board: &TaskBoard,
) -> crate::error::Result<TriageOutcome> {
    let labels = labeler.identify(&request.url).await?;
    let card = board
        .create_request_card(card_name(request, &labels), card_description(request, &labels))
        .await?;

    info!(
        request_id = request.id,
        card_id = %card.id,
        labels = labels.len(),
        "Request triaged"
    );

    Ok(TriageOutcome {
        request_id: request.id,
        labels,
        card,
    })
}

fn card_name(request: &Request, labels: &[String]) -> String {
    let subject = labels.first().map(String::as_str).unwrap_or("Photo");
    if request.location.trim().is_empty() {
        subject.to_string()
    } else {
        format!("{subject} at {}", request.location.trim())
    }
}

fn card_description(request: &Request, labels: &[String]) -> String {
    let labels = if labels.is_empty() {
        "(none)".to_string()
    } else {
        labels.join(", ")
    };
    format!(
        "Photo: {}\nWhere: {}\nPhone: {}\nLabels: {}",
        request.url, request.location, request.phone, labels
    )
}
