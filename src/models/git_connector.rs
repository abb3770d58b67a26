//! Git connector entity model
//!
//! This module contains the SeaORM entity model for the git_connectors
//! table, which stores configured links to remote Git repositories together
//! with their credential material. The repository password, when present, is
//! AES-GCM ciphertext; SSH keys are referenced by uploaded-file id so inline
//! key material never lands in this table.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Wire value of `repository_type` for repositories that need credentials.
pub const REPOSITORY_TYPE_PRIVATE: &str = "Private";
/// Wire value of `repository_type` for anonymously clonable repositories.
pub const REPOSITORY_TYPE_PUBLIC: &str = "Public";
/// Wire value of `auth_type` for username/password authentication.
pub const AUTH_TYPE_USER_NAME: &str = "userName";
/// Wire value of `auth_type` for SSH keypair authentication.
pub const AUTH_TYPE_SSH_KEY: &str = "sshKey";

/// Git connector entity representing one configured remote repository link
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "git_connectors")]
pub struct Model {
    /// Unique identifier for the connector (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name; also seeds the derived clone directory
    pub name: String,

    /// Free-form description (optional)
    pub description: Option<String>,

    /// URL of the remote repository
    pub repository_url: String,

    /// Repository visibility (`Public` or `Private`)
    pub repository_type: String,

    /// Authentication mode (`userName` or `sshKey`); only meaningful for
    /// private repositories
    pub auth_type: Option<String>,

    /// Username for `userName` authentication
    pub username: Option<String>,

    /// Encrypted repository password; never plaintext
    pub password_ciphertext: Option<Vec<u8>>,

    /// Uploaded-file id of the SSH public key
    pub ssh_public_key_file_id: Option<Uuid>,

    /// Uploaded-file id of the SSH private key
    pub ssh_private_key_file_id: Option<Uuid>,

    /// Owning organization id (optional)
    pub org_id: Option<String>,

    /// Owning organization display name (optional)
    pub org_name: Option<String>,

    /// Timestamp when the connector was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the connector was last updated
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// True when the connector authenticates with username/password.
    pub fn uses_basic_auth(&self) -> bool {
        self.repository_type == REPOSITORY_TYPE_PRIVATE
            && self.auth_type.as_deref() == Some(AUTH_TYPE_USER_NAME)
    }

    /// True when the connector authenticates with an SSH keypair.
    pub fn uses_ssh_auth(&self) -> bool {
        self.repository_type == REPOSITORY_TYPE_PRIVATE
            && self.auth_type.as_deref() == Some(AUTH_TYPE_SSH_KEY)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
