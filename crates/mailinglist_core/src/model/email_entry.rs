//! Email entry domain model.
//!
//! # Responsibility
//! - Define the canonical record stored per email address.
//! - Provide opt-out helpers and address normalization.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused or mutated.
//! - `confirmed_at == None` means the address has not been confirmed.
//! - `opt_out` is the source of truth for visibility in listings.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned surrogate key.
pub type EntryId = i64;

/// One mailing list subscriber record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailEntry {
    /// Assigned on creation; ignored on upsert input.
    pub id: EntryId,
    /// Unique lookup key.
    pub email: String,
    /// Unix epoch seconds. `None` until the address is confirmed.
    pub confirmed_at: Option<i64>,
    /// Logical deletion flag. Opted-out rows still block re-registration.
    pub opt_out: bool,
}

impl EmailEntry {
    /// Creates an unconfirmed, subscribed entry that has not been stored yet.
    ///
    /// `id` stays `0` until the store assigns one.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: 0,
            email: email.into(),
            confirmed_at: None,
            opt_out: false,
        }
    }

    /// Marks the address as confirmed at `epoch_secs`.
    pub fn confirm(&mut self, epoch_secs: i64) {
        self.confirmed_at = Some(epoch_secs);
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Returns whether this entry shows up in batch listings.
    pub fn is_active(&self) -> bool {
        !self.opt_out
    }
}

/// Address was empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyEmailError;

impl Display for EmptyEmailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "email address cannot be empty")
    }
}

impl Error for EmptyEmailError {}

/// Trims surrounding whitespace and rejects empty addresses.
pub fn normalize_email(raw: &str) -> Result<&str, EmptyEmailError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EmptyEmailError);
    }
    Ok(trimmed)
}
