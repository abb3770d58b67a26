//! Uploaded file entity model
//!
//! SeaORM entity for the uploaded_files table, the blob store backing SSH
//! key material referenced by git connector records.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "uploaded_files")]
pub struct Model {
    /// Unique identifier for the file (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Original file name as uploaded
    pub file_name: String,

    /// Raw file content
    pub data: Vec<u8>,

    /// Timestamp when the file was stored
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
