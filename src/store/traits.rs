//! `Database` trait — async interface for request persistence.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::requests::model::{NewRequest, Request, RequestChanges};

/// Backend-agnostic database trait.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// List all requests, oldest first.
    async fn list_requests(&self) -> Result<Vec<Request>, DatabaseError>;

    /// Insert a request, stamping both timestamps. Returns the stored row.
    async fn create_request(&self, new: &NewRequest) -> Result<Request, DatabaseError>;

    /// Get a request by ID.
    async fn get_request(&self, id: i64) -> Result<Option<Request>, DatabaseError>;

    /// Apply the given changes and refresh `updated_at`.
    /// Returns `None` if no such request exists.
    async fn update_request(
        &self,
        id: i64,
        changes: &RequestChanges,
    ) -> Result<Option<Request>, DatabaseError>;

    /// Delete a request. Returns whether a row was removed.
    async fn delete_request(&self, id: i64) -> Result<bool, DatabaseError>;
}
