//! Telephony webhook endpoints.
//!
//! The provider posts form-encoded callbacks here. The handlers only
//! acknowledge receipt; what a call turns into is decided by the telephony
//! integration, not by this service.

use std::collections::HashMap;

use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Router};
use tracing::{info, warn};

use crate::server::AppState;

/// Build the `/calls` routes.
pub fn call_routes() -> Router<AppState> {
    Router::new()
        .route("/calls/voice", post(voice))
        .route("/calls/record", post(record))
}

type WebhookForm = Result<Form<HashMap<String, String>>, FormRejection>;

/// POST /calls/voice
async fn voice(form: WebhookForm) -> StatusCode {
    acknowledge("voice", form)
}

/// POST /calls/record
async fn record(form: WebhookForm) -> StatusCode {
    acknowledge("record", form)
}

fn acknowledge(hook: &str, form: WebhookForm) -> StatusCode {
    match form {
        Ok(Form(params)) => {
            let call_id = params.get("CallSid").map(String::as_str).unwrap_or("-");
            info!(hook, call_id, fields = params.len(), "Call webhook received");
        }
        Err(e) => warn!(hook, error = %e, "Call webhook with unreadable body"),
    }
    StatusCode::OK
}
