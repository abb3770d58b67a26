//! # Git Connector API Handlers
//!
//! HTTP endpoints for connector CRUD and for materializing (cloning) a
//! connector's remote repository.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::OperatorAuth;
use crate::cloner::{ClonedRepository, RepositoryCloner};
use crate::error::ApiError;
use crate::models::git_connector;
use crate::registry::{ConnectorDetails, ConnectorPatch, ConnectorPayload, ConnectorRegistry};
use crate::server::AppState;

/// Query parameters for connector listing
#[derive(Debug, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListConnectorsQuery {
    /// Compound filter: `+`-separated `field:value1,value2,...` clauses,
    /// AND-ed together (e.g. `orgId:1,2+repositoryType:Private`)
    #[serde(rename = "filterBy")]
    pub filter_by: Option<String>,
}

/// Stored connector record as returned by create/update.
///
/// Mirrors what is persisted: the password is never included, only whether
/// ciphertext is stored.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRecord {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "repositoryURL")]
    pub repository_url: String,
    pub repository_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_user_name: Option<String>,
    /// Indicates whether encrypted password material is stored
    #[schema(default = false)]
    pub has_password: bool,
    #[serde(skip_serializing_if = "Option::is_none", rename = "repositorySSHPublicKeyFileId")]
    pub ssh_public_key_file_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "repositorySSHPrivateKeyFileId")]
    pub ssh_private_key_file_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<git_connector::Model> for ConnectorRecord {
    fn from(model: git_connector::Model) -> Self {
        let to_rfc3339 = |dt: sea_orm::prelude::DateTimeWithTimeZone| {
            let utc: DateTime<Utc> = dt.naive_utc().and_utc();
            utc.to_rfc3339()
        };
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            repository_url: model.repository_url,
            repository_type: model.repository_type,
            authentication_type: model.auth_type,
            repository_user_name: model.username,
            has_password: model.password_ciphertext.is_some(),
            ssh_public_key_file_id: model.ssh_public_key_file_id,
            ssh_private_key_file_id: model.ssh_private_key_file_id,
            org_id: model.org_id,
            org_name: model.org_name,
            created_at: to_rfc3339(model.created_at),
            updated_at: to_rfc3339(model.updated_at),
        }
    }
}

fn registry(state: &AppState) -> ConnectorRegistry {
    ConnectorRegistry::new(Arc::new(state.db.clone()), state.crypto_key.clone())
}

/// Create a new git connector
#[utoipa::path(
    post,
    path = "/connectors",
    security(("bearer_auth" = [])),
    request_body = ConnectorPayload,
    responses(
        (status = 201, description = "Connector created", body = ConnectorRecord, headers(
            ("Location", description = "URL of the created connector")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "connectors"
)]
pub async fn create_connector(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Json(payload): Json<ConnectorPayload>,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<ConnectorRecord>), ApiError> {
    let stored = registry(&state).create(payload).await?;

    let location = format!("/connectors/{}", stored.id);
    Ok((
        StatusCode::CREATED,
        [("Location", location)],
        Json(ConnectorRecord::from(stored)),
    ))
}

/// List git connectors, optionally filtered
#[utoipa::path(
    get,
    path = "/connectors",
    security(("bearer_auth" = [])),
    params(ListConnectorsQuery),
    responses(
        (status = 200, description = "Formatted connector list", body = [ConnectorDetails]),
        (status = 400, description = "Invalid filter expression", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "connectors"
)]
pub async fn list_connectors(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Query(query): Query<ListConnectorsQuery>,
) -> Result<Json<Vec<ConnectorDetails>>, ApiError> {
    let details = registry(&state).list(query.filter_by.as_deref()).await?;
    Ok(Json(details))
}

/// Get a formatted git connector by id
#[utoipa::path(
    get,
    path = "/connectors/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Connector UUID")),
    responses(
        (status = 200, description = "Formatted connector", body = ConnectorDetails),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Connector not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "connectors"
)]
pub async fn get_connector(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ConnectorDetails>, ApiError> {
    let details = registry(&state).get(id).await?;
    Ok(Json(details))
}

/// Update a git connector
#[utoipa::path(
    put,
    path = "/connectors/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Connector UUID")),
    request_body = ConnectorPatch,
    responses(
        (status = 200, description = "Updated connector record", body = ConnectorRecord),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Connector not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "connectors"
)]
pub async fn update_connector(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(id): Path<Uuid>,
    Json(patch): Json<ConnectorPatch>,
) -> Result<Json<ConnectorRecord>, ApiError> {
    let updated = registry(&state).update(id, patch).await?;
    Ok(Json(ConnectorRecord::from(updated)))
}

/// Delete a git connector
#[utoipa::path(
    delete,
    path = "/connectors/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Connector UUID")),
    responses(
        (status = 204, description = "Connector deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Connector not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "connectors"
)]
pub async fn delete_connector(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    registry(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Materialize a working copy of the connector's remote repository
#[utoipa::path(
    post,
    path = "/connectors/{id}/clone",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Connector UUID")),
    responses(
        (status = 200, description = "Repository cloned", body = ClonedRepository),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Connector not found", body = ApiError),
        (status = 500, description = "Clone failed", body = ApiError)
    ),
    tag = "connectors"
)]
pub async fn clone_connector(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ClonedRepository>, ApiError> {
    let cloner = RepositoryCloner::new(registry(&state), state.config.clone_root.clone());
    let cloned = cloner.materialize(id).await?;
    Ok(Json(cloned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_record_hides_ciphertext() {
        let now = chrono::Utc::now();
        let model = git_connector::Model {
            id: Uuid::new_v4(),
            name: "billing".to_string(),
            description: None,
            repository_url: "https://github.com/acme/billing.git".to_string(),
            repository_type: "Private".to_string(),
            auth_type: Some("userName".to_string()),
            username: Some("deploy".to_string()),
            password_ciphertext: Some(vec![1, 2, 3]),
            ssh_public_key_file_id: None,
            ssh_private_key_file_id: None,
            org_id: Some("1".to_string()),
            org_name: Some("Acme".to_string()),
            created_at: now.into(),
            updated_at: now.into(),
        };

        let record = ConnectorRecord::from(model);
        assert!(record.has_password);

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("ciphertext"));
        assert!(!json.contains("password\":"));
        assert!(json.contains("hasPassword"));
    }

    #[test]
    fn list_query_accepts_filter_by() {
        let query: ListConnectorsQuery =
            serde_json::from_str(r#"{"filterBy":"orgId:1,2"}"#).unwrap();
        assert_eq!(query.filter_by.as_deref(), Some("orgId:1,2"));
    }
}
