//! REST endpoints for the request resource.

use axum::extract::{FromRequest, Path, Request as HttpRequest, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::info;

use super::model::{NewRequest, Request, RequestChanges, RequestParams};
use crate::error::{ApiError, DatabaseError};
use crate::server::AppState;
use crate::triage;

/// Build the `/requests` routes.
pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(index).post(create))
        .route(
            "/requests/{id}",
            get(show).patch(update).put(update).delete(destroy),
        )
        .route("/requests/{id}/triage", post(triage_request))
}

fn not_found(id: i64) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "request".into(),
        id: id.to_string(),
    }
}

async fn find(state: &AppState, id: i64) -> Result<Request, ApiError> {
    state
        .db
        .get_request(id)
        .await?
        .ok_or_else(|| not_found(id).into())
}

/// Create/update body: JSON (bare or under `request`) or a web form with
/// bare or `request[field]` keys.
struct RequestBody<T>(T);

impl<S, T> FromRequest<S> for RequestBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: HttpRequest, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if !is_form {
            let Json(params) = Json::<RequestParams<T>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self(params.into_inner()));
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        serde_json::from_value(Value::Object(form_fields(pairs)))
            .map(Self)
            .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response())
    }
}

/// Flatten form pairs into fields. If any key is `request[...]`, only those
/// keys are used, so extras like `authenticity_token` are dropped.
fn form_fields(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let nested = |key: &str| {
        key.strip_prefix("request[")
            .and_then(|rest| rest.strip_suffix(']'))
            .map(str::to_string)
    };

    if pairs.iter().any(|(key, _)| nested(key).is_some()) {
        pairs
            .into_iter()
            .filter_map(|(key, value)| nested(&key).map(|field| (field, Value::String(value))))
            .collect()
    } else {
        pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect()
    }
}

/// GET /requests
async fn index(State(state): State<AppState>) -> Result<Json<Vec<Request>>, ApiError> {
    Ok(Json(state.db.list_requests().await?))
}

/// POST /requests
async fn create(
    State(state): State<AppState>,
    RequestBody(new_request): RequestBody<NewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.db.create_request(&new_request).await?;
    info!(id = request.id, "Request created");
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /requests/{id}
async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Request>, ApiError> {
    Ok(Json(find(&state, id).await?))
}

/// PATCH|PUT /requests/{id}
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequestBody(changes): RequestBody<RequestChanges>,
) -> Result<Json<Request>, ApiError> {
    let request = state
        .db
        .update_request(id, &changes)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!(id, "Request updated");
    Ok(Json(request))
}

/// DELETE /requests/{id}
async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.db.delete_request(id).await? {
        return Err(not_found(id).into());
    }
    info!(id, "Request deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /requests/{id}/triage
///
/// Labels the photo and opens a review card. Returns the labels and card.
async fn triage_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<triage::TriageOutcome>, ApiError> {
    let request = find(&state, id).await?;
    let outcome = triage::triage(&request, state.labeler.as_ref(), &state.board).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request as HttpRequest, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::board::{Card, CardApi, NewCard, TaskBoard};
    use crate::config::BoardLists;
    use crate::error::{BoardError, LabelerError};
    use crate::labeler::ImageLabeler;
    use crate::store::{Database, LibSqlBackend};

    struct NoLabels;

    #[async_trait]
    impl ImageLabeler for NoLabels {
        async fn identify(&self, _url: &str) -> Result<Vec<String>, LabelerError> {
            Ok(Vec::new())
        }
    }

    struct EchoApi;

    #[async_trait]
    impl CardApi for EchoApi {
        async fn get_card(&self, id: &str) -> Result<Card, BoardError> {
            Err(BoardError::Api {
                status: 404,
                message: format!("no card {id}"),
            })
        }

        async fn save_card(&self, card: &Card) -> Result<Card, BoardError> {
            Ok(card.clone())
        }

        async fn create_card(&self, card: &NewCard) -> Result<Card, BoardError> {
            Ok(Card {
                id: "c-9".into(),
                list_id: card.list_id.clone(),
                name: card.name.clone(),
                description: card.description.clone(),
                board_id: None,
            })
        }
    }

    async fn router() -> (Router, Arc<dyn Database>) {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let state = AppState {
            db: Arc::clone(&db),
            labeler: Arc::new(NoLabels),
            board: Arc::new(TaskBoard::new(Arc::new(EchoApi), BoardLists::default())),
        };
        (request_routes().with_state(state), db)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = HttpRequest::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        // Extractor rejections reply in plain text.
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn create_accepts_wrapped_params() {
        let (app, db) = router().await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/requests",
            Some(json!({"request": {"url": "https://img.example/a.jpg", "where": "Dock", "phone": "555"}})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["where"], "Dock");
        let id = body["id"].as_i64().unwrap();
        assert_eq!(db.get_request(id).await.unwrap().unwrap().phone, "555");
    }

    async fn post_form(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let req = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn create_accepts_rails_style_form() {
        let (app, db) = router().await;
        let (status, body) = post_form(
            &app,
            Method::POST,
            "/requests",
            "utf8=%E2%9C%93&authenticity_token=abc\
             &request%5Burl%5D=https%3A%2F%2Fimg.example%2Ff.jpg\
             &request%5Bwhere%5D=Dock&request%5Bphone%5D=555",
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let stored = db
            .get_request(body["id"].as_i64().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.url, "https://img.example/f.jpg");
        assert_eq!(stored.location, "Dock");
        assert_eq!(stored.phone, "555");
    }

    #[tokio::test]
    async fn update_accepts_bare_form_fields() {
        let (app, db) = router().await;
        let created = db
            .create_request(&NewRequest::new("https://img.example/g.jpg", "Pier", "1"))
            .await
            .unwrap();

        let (status, body) = post_form(
            &app,
            Method::PATCH,
            &format!("/requests/{}", created.id),
            "where=Quay+5",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["where"], "Quay 5");
        assert_eq!(body["phone"], "1");
    }

    #[tokio::test]
    async fn malformed_wrapped_update_is_rejected_and_changes_nothing() {
        let (app, db) = router().await;
        let created = db
            .create_request(&NewRequest::new("https://img.example/h.jpg", "w", "111"))
            .await
            .unwrap();

        let (status, _) = call(
            &app,
            Method::PATCH,
            &format!("/requests/{}", created.id),
            Some(json!({"request": {"phone": 222, "where": "Pier"}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let stored = db.get_request(created.id).await.unwrap().unwrap();
        assert_eq!(stored.phone, "111");
        assert_eq!(stored.location, "w");
        assert_eq!(stored.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn show_missing_is_404() {
        let (app, _db) = router().await;
        let (status, body) = call(&app, Method::GET, "/requests/77", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("77"));
    }

    #[tokio::test]
    async fn update_and_destroy_missing_are_404() {
        let (app, _db) = router().await;
        let (status, _) = call(&app, Method::PATCH, "/requests/5", Some(json!({"phone": "1"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::DELETE, "/requests/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_updates_like_patch() {
        let (app, db) = router().await;
        let created = db
            .create_request(&NewRequest::new("https://img.example/b.jpg", "Pier", "1"))
            .await
            .unwrap();

        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/requests/{}", created.id),
            Some(json!({"url": "https://img.example/c.jpg"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "https://img.example/c.jpg");
        assert_eq!(body["where"], "Pier");
    }

    #[tokio::test]
    async fn triage_returns_outcome() {
        let (app, db) = router().await;
        let created = db
            .create_request(&NewRequest::new("https://img.example/d.jpg", "Quay", "2"))
            .await
            .unwrap();

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/requests/{}/triage", created.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["request_id"], created.id);
        assert_eq!(body["card"]["name"], "Photo at Quay");
        assert!(body["labels"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn triage_missing_request_is_404() {
        let (app, _db) = router().await;
        let (status, _) = call(&app, Method::POST, "/requests/404/triage", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
