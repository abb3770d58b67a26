//! # Connector Registry
//!
//! Orchestrates CRUD over git connector records: validates incoming
//! payloads, transparently encrypts/decrypts the stored repository password
//! depending on the declared authentication mode, resolves SSH key blobs,
//! and assembles the client-safe response shape shared by get and list.
//!
//! Stored records only ever carry ciphertext; decrypted passwords and inline
//! key material exist solely in the transient [`ConnectorDetails`] value.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DbErr, Set};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::crypto::{
    CryptoError, CryptoKey, decrypt_connector_password, encrypt_connector_password,
};
use crate::models::git_connector::{
    self, AUTH_TYPE_SSH_KEY, AUTH_TYPE_USER_NAME, REPOSITORY_TYPE_PRIVATE, REPOSITORY_TYPE_PUBLIC,
};
use crate::repositories::{ConnectorFilter, GitConnectorRepository, UploadedFileRepository};

/// Errors produced by registry operations.
///
/// The HTTP layer maps `Validation` to 400, `NotFound` to 404 and the rest
/// to 500.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),
    #[error("git connector not found")]
    NotFound,
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Store(#[from] DbErr),
}

/// Incoming payload for connector creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorPayload {
    /// Display name; also seeds the derived clone directory
    #[schema(example = "billing-service")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// URL of the remote repository
    #[serde(rename = "repositoryURL")]
    #[schema(example = "https://github.com/acme/billing-service.git")]
    pub repository_url: String,
    /// `Public` or `Private`
    #[schema(example = "Private")]
    pub repository_type: String,
    /// `userName` or `sshKey`; required for private repositories, ignored
    /// for public ones
    #[serde(default)]
    pub authentication_type: Option<String>,
    #[serde(default)]
    pub repository_user_name: Option<String>,
    /// Plaintext password or token; encrypted before it ever reaches storage
    #[serde(default)]
    pub repository_password: Option<String>,
    #[serde(default, rename = "repositorySSHPublicKeyFileId")]
    pub ssh_public_key_file_id: Option<Uuid>,
    #[serde(default, rename = "repositorySSHPrivateKeyFileId")]
    pub ssh_private_key_file_id: Option<Uuid>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
}

/// Partial update for an existing connector. Absent fields keep their
/// stored values; in particular an absent password keeps the stored
/// ciphertext untouched (re-encryption happens only when the secret
/// changes).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "repositoryURL")]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub repository_type: Option<String>,
    #[serde(default)]
    pub authentication_type: Option<String>,
    #[serde(default)]
    pub repository_user_name: Option<String>,
    #[serde(default)]
    pub repository_password: Option<String>,
    #[serde(default, rename = "repositorySSHPublicKeyFileId")]
    pub ssh_public_key_file_id: Option<Uuid>,
    #[serde(default, rename = "repositorySSHPrivateKeyFileId")]
    pub ssh_private_key_file_id: Option<Uuid>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
}

/// Owning organization reference on a formatted response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrganizationRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Resolved or unresolved SSH key material on a formatted response.
///
/// `Unresolved` is the explicit marker for a blob-store failure during
/// formatting: the failure is logged and the response still returns, but the
/// caller can see which key is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KeyMaterial {
    Resolved {
        file_id: Uuid,
        file_name: String,
        data: String,
    },
    Unresolved {
        file_id: Uuid,
    },
}

/// Credential material attached to a formatted private connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode")]
pub enum ConnectorCredentials {
    /// Username/password credential; the password is decrypted plaintext and
    /// exists only in this transient shape
    #[serde(rename = "userName")]
    Basic {
        username: Option<String>,
        password: String,
    },
    /// SSH keypair credential resolved from the blob store
    #[serde(rename = "sshKey")]
    SshKeys {
        username: Option<String>,
        public_key: KeyMaterial,
        private_key: KeyMaterial,
    },
}

/// Client-safe projection of a connector record, shared by get and list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDetails {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "repositoryURL")]
    pub repository_url: String,
    pub repository_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ConnectorCredentials>,
}

/// Registry service over the record store, blob store and codec.
#[derive(Clone)]
pub struct ConnectorRegistry {
    connectors: GitConnectorRepository,
    files: UploadedFileRepository,
    crypto_key: CryptoKey,
}

impl ConnectorRegistry {
    /// Creates a registry over the given pool and crypto key.
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey) -> Self {
        Self {
            connectors: GitConnectorRepository::new(Arc::clone(&db)),
            files: UploadedFileRepository::new(db),
            crypto_key,
        }
    }

    /// Creates a connector record, encrypting the password in place when the
    /// record is `Private`/`userName`. Returns the record as persisted
    /// (password still encrypted).
    pub async fn create(
        &self,
        payload: ConnectorPayload,
    ) -> Result<git_connector::Model, RegistryError> {
        validate_payload(&payload)?;

        let id = Uuid::new_v4();
        let is_private = payload.repository_type == REPOSITORY_TYPE_PRIVATE;
        let auth_type = is_private.then_some(payload.authentication_type.clone()).flatten();

        let password_ciphertext = match payload.repository_password.as_deref() {
            Some(password)
                if is_private && auth_type.as_deref() == Some(AUTH_TYPE_USER_NAME) =>
            {
                Some(encrypt_connector_password(&self.crypto_key, id, password)?)
            }
            _ => None,
        };

        let now = chrono::Utc::now();
        let active = git_connector::ActiveModel {
            id: Set(id),
            name: Set(payload.name),
            description: Set(payload.description),
            repository_url: Set(payload.repository_url),
            repository_type: Set(payload.repository_type),
            auth_type: Set(auth_type.clone()),
            username: Set(is_private
                .then_some(payload.repository_user_name)
                .flatten()),
            password_ciphertext: Set(password_ciphertext),
            ssh_public_key_file_id: Set(
                (auth_type.as_deref() == Some(AUTH_TYPE_SSH_KEY))
                    .then_some(payload.ssh_public_key_file_id)
                    .flatten(),
            ),
            ssh_private_key_file_id: Set(
                (auth_type.as_deref() == Some(AUTH_TYPE_SSH_KEY))
                    .then_some(payload.ssh_private_key_file_id)
                    .flatten(),
            ),
            org_id: Set(payload.org_id),
            org_name: Set(payload.org_name),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let stored = self.connectors.insert(active).await?;
        tracing::info!(connector_id = %stored.id, name = %stored.name, "Created git connector");
        Ok(stored)
    }

    /// Applies a partial update, re-encrypting the password only when the
    /// patch carries one and the effective record authenticates with
    /// `userName`.
    pub async fn update(
        &self,
        id: Uuid,
        patch: ConnectorPatch,
    ) -> Result<git_connector::Model, RegistryError> {
        let existing = self
            .connectors
            .find_by_id(id)
            .await?
            .ok_or(RegistryError::NotFound)?;

        // Effective values after the patch, used for validation and for the
        // encryption rule.
        let repository_type = patch
            .repository_type
            .clone()
            .unwrap_or_else(|| existing.repository_type.clone());
        let auth_type = patch
            .authentication_type
            .clone()
            .or_else(|| existing.auth_type.clone());

        validate_effective(&repository_type, auth_type.as_deref())?;

        if let Some(ref url) = patch.repository_url {
            validate_repository_url(url)?;
        }
        if let Some(ref name) = patch.name {
            if name.trim().is_empty() {
                return Err(RegistryError::Validation(
                    "name cannot be empty".to_string(),
                ));
            }
        }

        let mut update = git_connector::ActiveModel::default();
        if let Some(name) = patch.name {
            update.name = Set(name);
        }
        if let Some(description) = patch.description {
            update.description = Set(Some(description));
        }
        if let Some(repository_url) = patch.repository_url {
            update.repository_url = Set(repository_url);
        }
        if let Some(repository_type) = patch.repository_type {
            update.repository_type = Set(repository_type.clone());
        }
        if let Some(authentication_type) = patch.authentication_type {
            update.auth_type = Set(Some(authentication_type));
        }
        if let Some(username) = patch.repository_user_name {
            update.username = Set(Some(username));
        }
        if let Some(password) = patch.repository_password {
            if repository_type == REPOSITORY_TYPE_PRIVATE
                && auth_type.as_deref() == Some(AUTH_TYPE_USER_NAME)
            {
                let ciphertext =
                    encrypt_connector_password(&self.crypto_key, id, &password)?;
                update.password_ciphertext = Set(Some(ciphertext));
            }
        }
        if let Some(file_id) = patch.ssh_public_key_file_id {
            update.ssh_public_key_file_id = Set(Some(file_id));
        }
        if let Some(file_id) = patch.ssh_private_key_file_id {
            update.ssh_private_key_file_id = Set(Some(file_id));
        }
        if let Some(org_id) = patch.org_id {
            update.org_id = Set(Some(org_id));
        }
        if let Some(org_name) = patch.org_name {
            update.org_name = Set(Some(org_name));
        }

        let updated = self
            .connectors
            .update_by_id(id, update)
            .await?
            .ok_or(RegistryError::NotFound)?;
        tracing::info!(connector_id = %updated.id, "Updated git connector");
        Ok(updated)
    }

    /// Deletes a connector record. Blob cleanup is intentionally not part of
    /// deletion.
    pub async fn delete(&self, id: Uuid) -> Result<(), RegistryError> {
        let removed = self.connectors.delete_by_id(id).await?;
        if !removed {
            return Err(RegistryError::NotFound);
        }
        tracing::info!(connector_id = %id, "Deleted git connector");
        Ok(())
    }

    /// Fetches a connector without formatting (no decryption, no blob
    /// resolution).
    pub async fn get_raw(&self, id: Uuid) -> Result<git_connector::Model, RegistryError> {
        self.connectors
            .find_by_id(id)
            .await?
            .ok_or(RegistryError::NotFound)
    }

    /// Fetches a connector and produces the formatted response.
    pub async fn get(&self, id: Uuid) -> Result<ConnectorDetails, RegistryError> {
        let model = self.get_raw(id).await?;
        self.format(&model).await
    }

    /// Lists connectors matching the optional `filterBy` expression,
    /// formatting each record. Formatting runs concurrently per record but
    /// results are gathered in store order, so the response order always
    /// matches the store's row order.
    pub async fn list(
        &self,
        filter_by: Option<&str>,
    ) -> Result<Vec<ConnectorDetails>, RegistryError> {
        let filter = match filter_by {
            Some(raw) if !raw.is_empty() => parse_filter_by(raw)?,
            _ => ConnectorFilter::default(),
        };

        let rows = self.connectors.list(&filter).await?;

        let formatted =
            futures::future::join_all(rows.iter().map(|model| self.format(model))).await;
        formatted.into_iter().collect()
    }

    /// Produces the client-safe response for one stored record.
    ///
    /// A decryption failure is a hard error; a blob-store failure is logged
    /// and marked `Unresolved` so the rest of the response still returns.
    async fn format(
        &self,
        model: &git_connector::Model,
    ) -> Result<ConnectorDetails, RegistryError> {
        let organization = model.org_id.clone().map(|org_id| OrganizationRef {
            id: org_id,
            name: model.org_name.clone(),
        });

        let credentials = if model.uses_basic_auth() {
            let ciphertext = model
                .password_ciphertext
                .as_deref()
                .ok_or(CryptoError::EmptyCiphertext)?;
            let password =
                decrypt_connector_password(&self.crypto_key, model.id, ciphertext)?;
            Some(ConnectorCredentials::Basic {
                username: model.username.clone(),
                password,
            })
        } else if model.uses_ssh_auth() {
            match (model.ssh_public_key_file_id, model.ssh_private_key_file_id) {
                (Some(public_id), Some(private_id)) => Some(ConnectorCredentials::SshKeys {
                    username: model.username.clone(),
                    public_key: self.resolve_key(model.id, public_id).await,
                    private_key: self.resolve_key(model.id, private_id).await,
                }),
                _ => {
                    tracing::warn!(
                        connector_id = %model.id,
                        "SSH connector is missing key file references"
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok(ConnectorDetails {
            id: model.id,
            name: model.name.clone(),
            description: model.description.clone(),
            repository_url: model.repository_url.clone(),
            repository_type: model.repository_type.clone(),
            organization,
            credentials,
        })
    }

    /// Resolves one SSH key blob, failing open to `Unresolved` on any blob
    /// store error.
    async fn resolve_key(&self, connector_id: Uuid, file_id: Uuid) -> KeyMaterial {
        match self.files.fetch(file_id).await {
            Ok(Some(file)) => KeyMaterial::Resolved {
                file_id,
                file_name: file.file_name,
                data: String::from_utf8_lossy(&file.data).into_owned(),
            },
            Ok(None) => {
                tracing::warn!(
                    connector_id = %connector_id,
                    file_id = %file_id,
                    "SSH key blob not found; returning unresolved key"
                );
                KeyMaterial::Unresolved { file_id }
            }
            Err(err) => {
                tracing::warn!(
                    connector_id = %connector_id,
                    file_id = %file_id,
                    error = %err,
                    "SSH key blob fetch failed; returning unresolved key"
                );
                KeyMaterial::Unresolved { file_id }
            }
        }
    }
}

/// Parses a `filterBy` expression: `+`-separated `field:value1,value2,...`
/// clauses, AND-ed together.
pub fn parse_filter_by(raw: &str) -> Result<ConnectorFilter, RegistryError> {
    let mut filter = ConnectorFilter::default();

    for clause in raw.split('+') {
        let Some((field, values_raw)) = clause.split_once(':') else {
            return Err(RegistryError::Validation(format!(
                "malformed filter clause '{}': expected field:value1,value2,...",
                clause
            )));
        };

        let values: Vec<String> = values_raw
            .split(',')
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
            .collect();
        if values.is_empty() {
            return Err(RegistryError::Validation(format!(
                "filter clause '{}' has no values",
                clause
            )));
        }

        match field {
            "name" => filter.names.extend(values),
            "repositoryType" => filter.repository_types.extend(values),
            "authenticationType" => filter.auth_types.extend(values),
            "orgId" => filter.org_ids.extend(values),
            other => {
                return Err(RegistryError::Validation(format!(
                    "unknown filter field '{}'",
                    other
                )));
            }
        }
    }

    Ok(filter)
}

fn validate_repository_url(url: &str) -> Result<(), RegistryError> {
    if url.trim().is_empty() {
        return Err(RegistryError::Validation(
            "repositoryURL is required".to_string(),
        ));
    }
    // SSH remotes commonly use the scp-like `git@host:path` shorthand, which
    // the URL parser rejects; accept it as-is.
    if url.contains('@') && !url.contains("://") {
        return Ok(());
    }
    Url::parse(url)
        .map(|_| ())
        .map_err(|e| RegistryError::Validation(format!("repositoryURL is not a valid URL: {}", e)))
}

fn validate_effective(
    repository_type: &str,
    auth_type: Option<&str>,
) -> Result<(), RegistryError> {
    match repository_type {
        REPOSITORY_TYPE_PUBLIC => Ok(()),
        REPOSITORY_TYPE_PRIVATE => match auth_type {
            Some(AUTH_TYPE_USER_NAME) | Some(AUTH_TYPE_SSH_KEY) => Ok(()),
            Some(other) => Err(RegistryError::Validation(format!(
                "unknown authenticationType '{}'",
                other
            ))),
            None => Err(RegistryError::Validation(
                "authenticationType is required for Private repositories".to_string(),
            )),
        },
        other => Err(RegistryError::Validation(format!(
            "unknown repositoryType '{}'",
            other
        ))),
    }
}

fn validate_payload(payload: &ConnectorPayload) -> Result<(), RegistryError> {
    if payload.name.trim().is_empty() {
        return Err(RegistryError::Validation("name is required".to_string()));
    }

    validate_repository_url(&payload.repository_url)?;
    validate_effective(
        &payload.repository_type,
        payload.authentication_type.as_deref(),
    )?;

    // Credential fields only matter for private repositories; public records
    // ignore them rather than rejecting them.
    if payload.repository_type == REPOSITORY_TYPE_PRIVATE {
        match payload.authentication_type.as_deref() {
            Some(AUTH_TYPE_USER_NAME) => {
                if payload
                    .repository_user_name
                    .as_deref()
                    .is_none_or(|v| v.trim().is_empty())
                {
                    return Err(RegistryError::Validation(
                        "repositoryUserName is required for userName authentication".to_string(),
                    ));
                }
                if payload
                    .repository_password
                    .as_deref()
                    .is_none_or(|v| v.is_empty())
                {
                    return Err(RegistryError::Validation(
                        "repositoryPassword is required for userName authentication".to_string(),
                    ));
                }
            }
            Some(AUTH_TYPE_SSH_KEY) => {
                if payload.ssh_public_key_file_id.is_none()
                    || payload.ssh_private_key_file_id.is_none()
                {
                    return Err(RegistryError::Validation(
                        "both SSH key file ids are required for sshKey authentication".to_string(),
                    ));
                }
            }
            _ => unreachable!("validate_effective checked the combination"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public_payload() -> ConnectorPayload {
        ConnectorPayload {
            name: "docs".to_string(),
            description: None,
            repository_url: "https://github.com/acme/docs.git".to_string(),
            repository_type: REPOSITORY_TYPE_PUBLIC.to_string(),
            authentication_type: None,
            repository_user_name: None,
            repository_password: None,
            ssh_public_key_file_id: None,
            ssh_private_key_file_id: None,
            org_id: None,
            org_name: None,
        }
    }

    #[test]
    fn parse_filter_by_compound_expression() {
        let filter = parse_filter_by("orgId:1,2+repositoryType:Private").expect("parses");

        assert_eq!(filter.org_ids, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(filter.repository_types, vec!["Private".to_string()]);
        assert!(filter.names.is_empty());
    }

    #[test]
    fn parse_filter_by_single_clause() {
        let filter = parse_filter_by("name:docs").expect("parses");
        assert_eq!(filter.names, vec!["docs".to_string()]);
    }

    #[test]
    fn parse_filter_by_rejects_unknown_field() {
        let err = parse_filter_by("color:red").unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert!(err.to_string().contains("unknown filter field"));
    }

    #[test]
    fn parse_filter_by_rejects_malformed_clause() {
        let err = parse_filter_by("repositoryType").unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn parse_filter_by_rejects_empty_values() {
        let err = parse_filter_by("orgId:").unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn validate_accepts_public_payload_without_credentials() {
        assert!(validate_payload(&public_payload()).is_ok());
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut payload = public_payload();
        payload.name = "  ".to_string();
        assert!(matches!(
            validate_payload(&payload),
            Err(RegistryError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_invalid_url() {
        let mut payload = public_payload();
        payload.repository_url = "not a url".to_string();
        assert!(matches!(
            validate_payload(&payload),
            Err(RegistryError::Validation(_))
        ));
    }

    #[test]
    fn validate_accepts_scp_style_ssh_remote() {
        let mut payload = public_payload();
        payload.repository_url = "git@github.com:acme/docs.git".to_string();
        assert!(validate_payload(&payload).is_ok());
    }

    #[test]
    fn validate_requires_password_for_basic_auth() {
        let mut payload = public_payload();
        payload.repository_type = REPOSITORY_TYPE_PRIVATE.to_string();
        payload.authentication_type = Some(AUTH_TYPE_USER_NAME.to_string());
        payload.repository_user_name = Some("deploy".to_string());

        let err = validate_payload(&payload).unwrap_err();
        assert!(err.to_string().contains("repositoryPassword"));
    }

    #[test]
    fn validate_requires_both_key_files_for_ssh_auth() {
        let mut payload = public_payload();
        payload.repository_type = REPOSITORY_TYPE_PRIVATE.to_string();
        payload.authentication_type = Some(AUTH_TYPE_SSH_KEY.to_string());
        payload.ssh_public_key_file_id = Some(Uuid::new_v4());

        let err = validate_payload(&payload).unwrap_err();
        assert!(err.to_string().contains("SSH key file ids"));
    }

    #[test]
    fn validate_rejects_private_without_auth_type() {
        let mut payload = public_payload();
        payload.repository_type = REPOSITORY_TYPE_PRIVATE.to_string();

        let err = validate_payload(&payload).unwrap_err();
        assert!(err.to_string().contains("authenticationType"));
    }

    #[test]
    fn validate_rejects_unknown_repository_type() {
        let mut payload = public_payload();
        payload.repository_type = "Internal".to_string();
        assert!(matches!(
            validate_payload(&payload),
            Err(RegistryError::Validation(_))
        ));
    }
}
