//! Core domain logic for the mailing list directory.
//! This crate owns the store invariants and the wire types.

pub mod db;
pub mod logging;
pub mod model;
pub mod proto;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::email_entry::{normalize_email, EmailEntry, EmptyEmailError, EntryId};
pub use repo::email_repo::{
    EmailBatchQuery, EmailRepository, RepoError, RepoResult, SqliteEmailRepository,
};
pub use service::email_service::EmailService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
