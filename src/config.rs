//! Configuration types.
//!
//! Adapters take their configuration explicitly. Only `from_env()` touches
//! the process environment, and only the binary calls it.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Trello REST API root.
pub const DEFAULT_TRELLO_API_URL: &str = "https://api.trello.com";

/// Default Google Cloud Vision REST API root.
pub const DEFAULT_VISION_API_URL: &str = "https://vision.googleapis.com";

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Path of the SQLite database file.
    pub db_path: PathBuf,
    pub trello: TrelloConfig,
    pub vision: VisionConfig,
}

impl AppConfig {
    /// Build the full configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PHOTO_INTAKE_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PHOTO_INTAKE_PORT".into(),
                message: format!("'{raw}' is not a port number"),
            })?,
            None => 3000,
        };

        let db_path = lookup("PHOTO_INTAKE_DB_PATH")
            .unwrap_or_else(|| "./data/photo-intake.db".to_string())
            .into();

        Ok(Self {
            port,
            db_path,
            trello: TrelloConfig::from_lookup(&lookup)?,
            vision: VisionConfig::from_lookup(&lookup),
        })
    }
}

/// Identifiers of the board and lists used for triage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLists {
    pub board_id: String,
    /// New request cards land here.
    pub incoming_list_id: String,
    pub approved_list_id: String,
    pub rejected_list_id: String,
}

impl Default for BoardLists {
    fn default() -> Self {
        Self {
            board_id: "96U4Kigb".to_string(),
            incoming_list_id: "5b3a7a4972ee34864fd37c97".to_string(),
            approved_list_id: "5b3a7a4bdf81e889105993af".to_string(),
            rejected_list_id: "5b3a9bf4d268b436bc7b2f00".to_string(),
        }
    }
}

/// Trello credentials and endpoints.
#[derive(Debug, Clone)]
pub struct TrelloConfig {
    pub api_url: String,
    pub key: SecretString,
    pub token: SecretString,
    pub lists: BoardLists,
}

impl TrelloConfig {
    /// Create a config with default endpoint and list ids.
    pub fn new(key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_TRELLO_API_URL.to_string(),
            key: SecretString::from(key.into()),
            token: SecretString::from(token.into()),
            lists: BoardLists::default(),
        }
    }

    /// Read `trello_key` / `trello_token`, plus optional id overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let key =
            lookup("trello_key").ok_or_else(|| ConfigError::MissingEnvVar("trello_key".into()))?;
        let token = lookup("trello_token")
            .ok_or_else(|| ConfigError::MissingEnvVar("trello_token".into()))?;

        let mut config = Self::new(key, token);
        override_from(&mut config.api_url, lookup("TRELLO_API_URL"));

        let lists = &mut config.lists;
        override_from(&mut lists.board_id, lookup("TRELLO_BOARD_ID"));
        override_from(&mut lists.incoming_list_id, lookup("TRELLO_INCOMING_LIST_ID"));
        override_from(&mut lists.approved_list_id, lookup("TRELLO_APPROVED_LIST_ID"));
        override_from(&mut lists.rejected_list_id, lookup("TRELLO_REJECTED_LIST_ID"));

        Ok(config)
    }
}

/// How requests to the vision service are authenticated.
#[derive(Debug, Clone)]
pub enum VisionCredentials {
    /// API key passed as the `key` query parameter.
    ApiKey(SecretString),
    /// OAuth access token passed as a bearer token.
    AccessToken(SecretString),
    /// No credentials found; the service decides.
    Anonymous,
}

impl VisionCredentials {
    /// Default credential discovery: API key first, then access token.
    pub fn discover() -> Self {
        Self::discover_with(env_var)
    }

    pub fn discover_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("GOOGLE_VISION_API_KEY") {
            return Self::ApiKey(SecretString::from(key));
        }
        if let Some(token) = lookup("GOOGLE_OAUTH_ACCESS_TOKEN") {
            return Self::AccessToken(SecretString::from(token));
        }
        Self::Anonymous
    }
}

/// Google Cloud Vision settings.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_url: String,
    pub project_id: String,
    pub credentials: VisionCredentials,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_VISION_API_URL.to_string(),
            project_id: "effin-bot".to_string(),
            credentials: VisionCredentials::Anonymous,
        }
    }
}

impl VisionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            credentials: VisionCredentials::discover_with(&lookup),
            ..Self::default()
        };
        override_from(&mut config.api_url, lookup("VISION_API_URL"));
        override_from(&mut config.project_id, lookup("VISION_PROJECT_ID"));
        config
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn override_from(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            *slot = value;
        }
    }
}
