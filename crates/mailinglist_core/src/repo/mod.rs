//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contract for mailing list entries.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Lookups report a missing row as `Ok(None)`, never as an error.
//! - Duplicate inserts surface as `RepoError::Conflict`, distinct from
//!   storage faults.

pub mod email_repo;
