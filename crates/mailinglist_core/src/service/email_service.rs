//! Mailing list use-case service.
//!
//! # Responsibility
//! - Provide the entry points the RPC layer calls per operation.
//! - Re-fetch rows after writes so callers observe the stored state.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::email_entry::EmailEntry;
use crate::repo::email_repo::{EmailBatchQuery, EmailRepository, RepoError, RepoResult};
use log::debug;

/// Use-case service wrapper for mailing list operations.
pub struct EmailService<R: EmailRepository> {
    repo: R,
}

impl<R: EmailRepository> EmailService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new address and returns the stored entry.
    ///
    /// # Contract
    /// - Fails with `RepoError::Conflict` when the address already exists,
    ///   including opted-out addresses.
    /// - Returned entry has `confirmed_at = None` and `opt_out = false`.
    pub fn create_email(&self, email: &str) -> RepoResult<EmailEntry> {
        let id = self.repo.create(email)?;
        debug!("event=email_create module=service status=ok id={id}");
        self.repo
            .get(email)?
            .ok_or_else(|| RepoError::InvalidData(format!("row {id} missing right after insert")))
    }

    /// Looks up one address. `None` when no row matches.
    pub fn get_email(&self, email: &str) -> RepoResult<Option<EmailEntry>> {
        self.repo.get(email)
    }

    /// Upserts `entry` and returns the row as stored.
    ///
    /// # Contract
    /// - Insert when the address is absent, otherwise overwrite
    ///   `confirmed_at` and `opt_out` only.
    /// - `entry.id` is ignored; the stored id never changes.
    pub fn update_email(&self, entry: &EmailEntry) -> RepoResult<Option<EmailEntry>> {
        self.repo.update(entry)?;
        self.repo.get(&entry.email)
    }

    /// Opts the address out and returns the row as stored.
    ///
    /// Returns `None` when the address was never registered; that case is not
    /// an error.
    pub fn delete_email(&self, email: &str) -> RepoResult<Option<EmailEntry>> {
        let matched = self.repo.delete(email)?;
        if !matched {
            debug!("event=email_delete module=service status=noop");
        }
        self.repo.get(email)
    }

    /// Lists one page of subscribed entries in ascending id order.
    pub fn get_email_batch(&self, query: &EmailBatchQuery) -> RepoResult<Vec<EmailEntry>> {
        self.repo.get_batch(query)
    }
}
