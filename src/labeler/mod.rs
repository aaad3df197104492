//! Image labeling — turns a photo URL into textual labels.

pub mod vision;

use async_trait::async_trait;

use crate::error::LabelerError;

pub use vision::VisionLabeler;

/// Something that can describe the contents of a photo.
#[async_trait]
pub trait ImageLabeler: Send + Sync {
    /// Label the image at `url`. The URL is passed through unvalidated;
    /// fetch failures surface as whatever the service reports.
    async fn identify(&self, url: &str) -> Result<Vec<String>, LabelerError>;
}
