//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::requests::model::{NewRequest, Request, RequestChanges};
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run a query expected to yield at most one request row.
    async fn query_one(
        &self,
        op: &str,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Option<Request>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_request(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("{op} row: {e}"))),
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

const REQUEST_COLUMNS: &str = r#"id, url, "where", phone, created_at, updated_at"#;

/// Map a libsql Row to a Request.
///
/// Column order matches REQUEST_COLUMNS. NULL text columns read as "".
fn row_to_request(row: &libsql::Row) -> Result<Request, DatabaseError> {
    let id: i64 = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("request row id: {e}")))?;
    let created_str: String = row
        .get(4)
        .map_err(|e| DatabaseError::Query(format!("request row created_at: {e}")))?;
    let updated_str: String = row
        .get(5)
        .map_err(|e| DatabaseError::Query(format!("request row updated_at: {e}")))?;

    Ok(Request {
        id,
        url: row.get::<String>(1).unwrap_or_default(),
        location: row.get::<String>(2).unwrap_or_default(),
        phone: row.get::<String>(3).unwrap_or_default(),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn list_requests(&self) -> Result<Vec<Request>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {REQUEST_COLUMNS} FROM requests ORDER BY id ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_requests: {e}")))?;

        let mut requests = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => requests.push(row_to_request(&row)?),
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("list_requests row: {e}"))),
            }
        }
        Ok(requests)
    }

    async fn create_request(&self, new: &NewRequest) -> Result<Request, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let request = self
            .query_one(
                "create_request",
                &format!(
                    r#"INSERT INTO requests (url, "where", phone, created_at, updated_at)
                       VALUES (?1, ?2, ?3, ?4, ?5)
                       RETURNING {REQUEST_COLUMNS}"#
                ),
                params![
                    new.url.as_str(),
                    new.location.as_str(),
                    new.phone.as_str(),
                    now.as_str(),
                    now.as_str(),
                ],
            )
            .await?
            .ok_or_else(|| DatabaseError::Query("create_request: no row returned".into()))?;

        debug!(id = request.id, "Request inserted into DB");
        Ok(request)
    }

    async fn get_request(&self, id: i64) -> Result<Option<Request>, DatabaseError> {
        self.query_one(
            "get_request",
            &format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?1"),
            params![id],
        )
        .await
    }

    async fn update_request(
        &self,
        id: i64,
        changes: &RequestChanges,
    ) -> Result<Option<Request>, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let updated = self
            .query_one(
                "update_request",
                &format!(
                    r#"UPDATE requests
                       SET url = COALESCE(?1, url),
                           "where" = COALESCE(?2, "where"),
                           phone = COALESCE(?3, phone),
                           updated_at = ?4
                       WHERE id = ?5
                       RETURNING {REQUEST_COLUMNS}"#
                ),
                params![
                    changes.url.clone(),
                    changes.location.clone(),
                    changes.phone.clone(),
                    now,
                    id,
                ],
            )
            .await?;

        if updated.is_some() {
            debug!(id, "Request updated in DB");
        }
        Ok(updated)
    }

    async fn delete_request(&self, id: i64) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM requests WHERE id = ?1", params![id])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_request: {e}")))?;
        Ok(count > 0)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
