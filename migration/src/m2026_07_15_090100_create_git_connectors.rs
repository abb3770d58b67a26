//! Migration to create the git_connectors table.
//!
//! A git connector is a configured link to a remote Git repository, including
//! the credential material needed to reach it. Passwords are stored as
//! AES-GCM ciphertext; SSH keys are referenced by uploaded-file id.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GitConnectors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GitConnectors::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GitConnectors::Name).text().not_null())
                    .col(ColumnDef::new(GitConnectors::Description).text().null())
                    .col(
                        ColumnDef::new(GitConnectors::RepositoryUrl)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GitConnectors::RepositoryType)
                            .text()
                            .not_null()
                            .default("Public"),
                    )
                    .col(ColumnDef::new(GitConnectors::AuthType).text().null())
                    .col(ColumnDef::new(GitConnectors::Username).text().null())
                    .col(
                        ColumnDef::new(GitConnectors::PasswordCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GitConnectors::SshPublicKeyFileId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GitConnectors::SshPrivateKeyFileId)
                            .uuid()
                            .null(),
                    )
                    .col(ColumnDef::new(GitConnectors::OrgId).text().null())
                    .col(ColumnDef::new(GitConnectors::OrgName).text().null())
                    .col(
                        ColumnDef::new(GitConnectors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(GitConnectors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Indexes on the filterable columns
        manager
            .create_index(
                Index::create()
                    .name("idx_git_connectors_org_id")
                    .table(GitConnectors::Table)
                    .col(GitConnectors::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_git_connectors_repository_type")
                    .table(GitConnectors::Table)
                    .col(GitConnectors::RepositoryType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_git_connectors_repository_type")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_git_connectors_org_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(GitConnectors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GitConnectors {
    Table,
    Id,
    Name,
    Description,
    RepositoryUrl,
    RepositoryType,
    AuthType,
    Username,
    PasswordCiphertext,
    SshPublicKeyFileId,
    SshPrivateKeyFileId,
    OrgId,
    OrgName,
    CreatedAt,
    UpdatedAt,
}
