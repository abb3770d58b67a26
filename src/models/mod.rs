//! # Data Models
//!
//! This module contains the SeaORM entity models used throughout the
//! repolink service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod git_connector;
pub mod uploaded_file;

pub use git_connector::Entity as GitConnector;
pub use uploaded_file::Entity as UploadedFile;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "repolink".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
