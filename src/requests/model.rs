//! Request data model — a photo submission with its location and phone.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A persisted photo submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: i64,
    /// Publicly fetchable photo URL.
    pub url: String,
    /// Free-text description of where the photo was taken.
    #[serde(rename = "where")]
    pub location: String,
    /// Phone number of the submitter.
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a request. Missing fields are stored as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "where")]
    pub location: String,
    #[serde(default)]
    pub phone: String,
}

impl NewRequest {
    pub fn new(
        url: impl Into<String>,
        location: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            location: location.into(),
            phone: phone.into(),
        }
    }
}

/// Partial update of a request. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Request body accepted by create/update: either the bare fields or the
/// fields nested under a `request` key. When a `request` key is present its
/// value must hold the fields; the outer object is never read as bare fields.
#[derive(Debug)]
pub struct RequestParams<T>(T);

impl<T> RequestParams<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for RequestParams<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let fields = match value.get_mut("request") {
            Some(inner) => inner.take(),
            None => value,
        };
        serde_json::from_value(fields)
            .map(Self)
            .map_err(D::Error::custom)
    }
}
