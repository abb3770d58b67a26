//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities: the record store for git connector
//! records and the blob store for uploaded files.

pub mod git_connector;
pub mod uploaded_file;

pub use git_connector::{ConnectorFilter, GitConnectorRepository};
pub use uploaded_file::UploadedFileRepository;
