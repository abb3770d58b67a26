//! Uploaded file repository for database operations
//!
//! Blob store for SSH key material. Files are stored and fetched whole by
//! id; callers decide how to treat a missing blob.

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::uploaded_file::{self, Entity as UploadedFile};

/// Repository for uploaded file blobs
#[derive(Debug, Clone)]
pub struct UploadedFileRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl UploadedFileRepository {
    /// Creates a new UploadedFileRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Stores a file blob and reads it back
    pub async fn store(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<uploaded_file::Model, DbErr> {
        let id = Uuid::new_v4();
        let active = uploaded_file::ActiveModel {
            id: Set(id),
            file_name: Set(file_name.to_string()),
            data: Set(data),
            created_at: Set(chrono::Utc::now().into()),
        };

        active.insert(&*self.db).await?;

        // For SQLite, query the record directly since we already know the ID
        let fetched = UploadedFile::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| DbErr::Custom("uploaded file not persisted".to_string()))
    }

    /// Fetches a file blob by id
    pub async fn fetch(&self, id: Uuid) -> Result<Option<uploaded_file::Model>, DbErr> {
        UploadedFile::find_by_id(id).one(&*self.db).await
    }
}
