//! Google Cloud Vision labeler — `images:annotate` with `LABEL_DETECTION`.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ImageLabeler;
use crate::config::{VisionConfig, VisionCredentials};
use crate::error::LabelerError;

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: Image<'a>,
    features: [Feature; 1],
}

#[derive(Debug, Serialize)]
struct Image<'a> {
    source: ImageSource<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSource<'a> {
    image_uri: &'a str,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Top-level error envelope for non-2xx replies.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Status,
}

// ── VisionLabeler ───────────────────────────────────────────────────────

/// Labels images through the Cloud Vision REST API.
pub struct VisionLabeler {
    config: VisionConfig,
    client: reqwest::Client,
}

impl VisionLabeler {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn annotate_url(&self) -> String {
        format!(
            "{}/v1/images:annotate",
            self.config.api_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ImageLabeler for VisionLabeler {
    async fn identify(&self, url: &str) -> Result<Vec<String>, LabelerError> {
        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: Image {
                    source: ImageSource { image_uri: url },
                },
                features: [Feature {
                    kind: "LABEL_DETECTION",
                }],
            }],
        };

        let mut request = self
            .client
            .post(self.annotate_url())
            .header("x-goog-user-project", &self.config.project_id)
            .json(&body);

        request = match &self.config.credentials {
            VisionCredentials::ApiKey(key) => request.query(&[("key", key.expose_secret())]),
            VisionCredentials::AccessToken(token) => request.bearer_auth(token.expose_secret()),
            VisionCredentials::Anonymous => request,
        };

        let resp = request
            .send()
            .await
            .map_err(|e| LabelerError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| LabelerError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|env| env.error.message)
                .unwrap_or(text);
            return Err(LabelerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let labels = parse_labels(&text)?;
        debug!(url, count = labels.len(), "Image labeled");
        Ok(labels)
    }
}

/// Extract label descriptions from an `images:annotate` reply, in order.
fn parse_labels(body: &str) -> Result<Vec<String>, LabelerError> {
    let parsed: AnnotateResponse = serde_json::from_str(body)
        .map_err(|e| LabelerError::InvalidResponse(e.to_string()))?;

    let Some(first) = parsed.responses.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(err) = first.error {
        if err.code != 0 {
            return Err(LabelerError::Api {
                status: 200,
                message: err.message,
            });
        }
    }

    Ok(first
        .label_annotations
        .into_iter()
        .map(|a| a.description)
        .collect())
}
