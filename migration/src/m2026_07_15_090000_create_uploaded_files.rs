//! Migration to create the uploaded_files table.
//!
//! Uploaded files hold raw blob content (SSH key material) referenced by
//! git connector records.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UploadedFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UploadedFiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UploadedFiles::FileName).text().not_null())
                    .col(ColumnDef::new(UploadedFiles::Data).binary().not_null())
                    .col(
                        ColumnDef::new(UploadedFiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UploadedFiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UploadedFiles {
    Table,
    Id,
    FileName,
    Data,
    CreatedAt,
}
