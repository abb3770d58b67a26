//! Database migrations for the repolink service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_07_15_090000_create_uploaded_files;
mod m2026_07_15_090100_create_git_connectors;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_07_15_090000_create_uploaded_files::Migration),
            Box::new(m2026_07_15_090100_create_git_connectors::Migration),
        ]
    }
}
