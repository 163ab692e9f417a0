//! Domain model for mailing list entries.
//!
//! # Responsibility
//! - Define canonical data structures used by the store and the wire layer.
//!
//! # Invariants
//! - Every entry is identified externally by its unique email address.
//! - Deletion is represented by the `opt_out` flag, never by row removal.

pub mod email_entry;
