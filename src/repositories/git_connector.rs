//! Git connector repository for database operations
//!
//! This module provides the GitConnectorRepository struct which encapsulates
//! SeaORM operations for the git_connectors table. It is the record store
//! behind the connector registry: persistence only, no credential handling.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::git_connector::{self, Entity as GitConnector};

/// Value-set filter over connector records.
///
/// Each non-empty field is an "attribute is one of {…}" predicate; predicates
/// are AND-ed together. An empty filter matches everything.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectorFilter {
    pub names: Vec<String>,
    pub repository_types: Vec<String>,
    pub auth_types: Vec<String>,
    pub org_ids: Vec<String>,
}

impl ConnectorFilter {
    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
            && self.repository_types.is_empty()
            && self.auth_types.is_empty()
            && self.org_ids.is_empty()
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if !self.names.is_empty() {
            condition = condition.add(git_connector::Column::Name.is_in(self.names.clone()));
        }
        if !self.repository_types.is_empty() {
            condition = condition.add(
                git_connector::Column::RepositoryType.is_in(self.repository_types.clone()),
            );
        }
        if !self.auth_types.is_empty() {
            condition =
                condition.add(git_connector::Column::AuthType.is_in(self.auth_types.clone()));
        }
        if !self.org_ids.is_empty() {
            condition = condition.add(git_connector::Column::OrgId.is_in(self.org_ids.clone()));
        }
        condition
    }
}

/// Repository for git connector database operations
#[derive(Debug, Clone)]
pub struct GitConnectorRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl GitConnectorRepository {
    /// Creates a new GitConnectorRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts a new connector record and reads it back
    pub async fn insert(
        &self,
        connector: git_connector::ActiveModel,
    ) -> Result<git_connector::Model, DbErr> {
        let id = connector
            .id
            .clone()
            .take()
            .ok_or_else(|| DbErr::Custom("connector id must be set".to_string()))?;

        connector.insert(&*self.db).await?;

        // For SQLite, query the record directly since we already know the ID
        let fetched = GitConnector::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| DbErr::Custom("connector not persisted".to_string()))
    }

    /// Finds a connector by its ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<git_connector::Model>, DbErr> {
        GitConnector::find_by_id(id).one(&*self.db).await
    }

    /// Applies set fields of `update` to an existing record
    ///
    /// Returns `None` when no record with the given id exists.
    pub async fn update_by_id(
        &self,
        id: Uuid,
        update: git_connector::ActiveModel,
    ) -> Result<Option<git_connector::Model>, DbErr> {
        let Some(existing) = GitConnector::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };

        let mut model: git_connector::ActiveModel = existing.into();

        if let Some(name) = update.name.clone().take() {
            model.name = Set(name);
        }
        if let Some(description) = update.description.clone().take() {
            model.description = Set(description);
        }
        if let Some(repository_url) = update.repository_url.clone().take() {
            model.repository_url = Set(repository_url);
        }
        if let Some(repository_type) = update.repository_type.clone().take() {
            model.repository_type = Set(repository_type);
        }
        if let Some(auth_type) = update.auth_type.clone().take() {
            model.auth_type = Set(auth_type);
        }
        if let Some(username) = update.username.clone().take() {
            model.username = Set(username);
        }
        if let Some(password_ciphertext) = update.password_ciphertext.clone().take() {
            model.password_ciphertext = Set(password_ciphertext);
        }
        if let Some(public_key_id) = update.ssh_public_key_file_id.clone().take() {
            model.ssh_public_key_file_id = Set(public_key_id);
        }
        if let Some(private_key_id) = update.ssh_private_key_file_id.clone().take() {
            model.ssh_private_key_file_id = Set(private_key_id);
        }
        if let Some(org_id) = update.org_id.clone().take() {
            model.org_id = Set(org_id);
        }
        if let Some(org_name) = update.org_name.clone().take() {
            model.org_name = Set(org_name);
        }
        model.updated_at = Set(chrono::Utc::now().into());

        model.update(&*self.db).await.map(Some)
    }

    /// Deletes a connector by id; returns whether a record was removed
    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = GitConnector::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Lists connector records matching the filter, ordered by creation time then ID
    pub async fn list(&self, filter: &ConnectorFilter) -> Result<Vec<git_connector::Model>, DbErr> {
        let mut query = GitConnector::find()
            .order_by_asc(git_connector::Column::CreatedAt)
            .order_by_asc(git_connector::Column::Id);

        if !filter.is_empty() {
            query = query.filter(filter.condition());
        }

        query.all(&*self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let filter = ConnectorFilter::default();
        assert!(filter.is_empty());
    }

    #[test]
    fn filter_with_values_is_not_empty() {
        let filter = ConnectorFilter {
            org_ids: vec!["1".to_string(), "2".to_string()],
            ..ConnectorFilter::default()
        };
        assert!(!filter.is_empty());
    }
}
