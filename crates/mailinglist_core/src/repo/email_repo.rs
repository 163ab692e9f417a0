//! Email repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the five store operations over the `emails` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - No path deletes rows; `delete` only sets `opt_out = 1`.
//! - Upserts never touch `id`.
//! - Batch reads only return `opt_out = 0` rows in ascending `id` order.
//! - Batch offsets are computed with checked arithmetic and never negative.

use crate::db::DbError;
use crate::model::email_entry::{normalize_email, EmailEntry, EmptyEmailError, EntryId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EMAIL_SELECT_SQL: &str = "SELECT
    id,
    email,
    confirmed_at,
    opt_out
FROM emails";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for email persistence and query operations.
///
/// A missing row is not an error; lookups return `Ok(None)` instead.
#[derive(Debug)]
pub enum RepoError {
    /// Insert hit the unique constraint on `email`.
    Conflict(String),
    /// Caller input rejected before any SQL ran.
    InvalidArgument(String),
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this error is caused by the storage engine rather than
    /// caller input.
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Db(_) | Self::InvalidData(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(email) => write!(f, "email already exists: {email}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted email data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Conflict(_) | Self::InvalidArgument(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<EmptyEmailError> for RepoError {
    fn from(value: EmptyEmailError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

/// Pagination window for batch listings.
///
/// `page` is 1-indexed; both fields must be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailBatchQuery {
    pub page: u32,
    pub count: u32,
}

impl EmailBatchQuery {
    pub fn new(page: u32, count: u32) -> Self {
        Self { page, count }
    }

    /// Validates the window and returns `(limit, offset)` for SQL binding.
    pub fn limit_offset(&self) -> RepoResult<(i64, i64)> {
        if self.page < 1 {
            return Err(RepoError::InvalidArgument(format!(
                "page must be >= 1, got {}",
                self.page
            )));
        }
        if self.count < 1 {
            return Err(RepoError::InvalidArgument(format!(
                "count must be >= 1, got {}",
                self.count
            )));
        }

        let limit = i64::from(self.count);
        let offset = i64::from(self.page - 1)
            .checked_mul(limit)
            .ok_or_else(|| {
                RepoError::InvalidArgument(format!(
                    "page {} with count {} overflows the row offset",
                    self.page, self.count
                ))
            })?;
        Ok((limit, offset))
    }
}

/// Repository interface for the mailing list store.
pub trait EmailRepository {
    /// Inserts a new unconfirmed, subscribed row and returns its id.
    fn create(&self, email: &str) -> RepoResult<EntryId>;
    fn get(&self, email: &str) -> RepoResult<Option<EmailEntry>>;
    /// Inserts the entry when its email is absent, otherwise overwrites
    /// `confirmed_at` and `opt_out`.
    fn update(&self, entry: &EmailEntry) -> RepoResult<()>;
    /// Opts the address out. Returns whether a row matched.
    fn delete(&self, email: &str) -> RepoResult<bool>;
    fn get_batch(&self, query: &EmailBatchQuery) -> RepoResult<Vec<EmailEntry>>;
}

/// SQLite-backed email repository.
pub struct SqliteEmailRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmailRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmailRepository for SqliteEmailRepository<'_> {
    fn create(&self, email: &str) -> RepoResult<EntryId> {
        let email = normalize_email(email)?;

        let inserted = self.conn.execute(
            "INSERT INTO emails (email, confirmed_at, opt_out)
             VALUES (?1, NULL, 0);",
            [email],
        );

        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(err) => {
                let err = DbError::from(err);
                if err.is_unique_violation() {
                    Err(RepoError::Conflict(email.to_string()))
                } else {
                    Err(RepoError::Db(err))
                }
            }
        }
    }

    fn get(&self, email: &str) -> RepoResult<Option<EmailEntry>> {
        let email = normalize_email(email)?;

        let mut stmt = self
            .conn
            .prepare(&format!("{EMAIL_SELECT_SQL} WHERE email = ?1;"))?;
        let entry = stmt
            .query_row([email], |row| Ok(parse_email_row(row)))
            .optional()?;

        entry.transpose()
    }

    fn update(&self, entry: &EmailEntry) -> RepoResult<()> {
        let email = normalize_email(&entry.email)?;

        self.conn.execute(
            "INSERT INTO emails (email, confirmed_at, opt_out)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO UPDATE SET
                confirmed_at = excluded.confirmed_at,
                opt_out = excluded.opt_out;",
            params![email, entry.confirmed_at, bool_to_int(entry.opt_out)],
        )?;

        Ok(())
    }

    fn delete(&self, email: &str) -> RepoResult<bool> {
        let email = normalize_email(email)?;

        let changed = self
            .conn
            .execute("UPDATE emails SET opt_out = 1 WHERE email = ?1;", [email])?;

        Ok(changed > 0)
    }

    fn get_batch(&self, query: &EmailBatchQuery) -> RepoResult<Vec<EmailEntry>> {
        let (limit, offset) = query.limit_offset()?;

        let mut stmt = self.conn.prepare(&format!(
            "{EMAIL_SELECT_SQL}
             WHERE opt_out = 0
             ORDER BY id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![limit, offset])?;
        let mut entries = Vec::with_capacity(query.count.min(256) as usize);

        while let Some(row) = rows.next()? {
            entries.push(parse_email_row(row)?);
        }

        Ok(entries)
    }
}

fn parse_email_row(row: &Row<'_>) -> RepoResult<EmailEntry> {
    let opt_out = match row.get::<_, i64>("opt_out")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid opt_out value `{other}` in emails.opt_out"
            )));
        }
    };

    Ok(EmailEntry {
        id: row.get("id")?,
        email: row.get("email")?,
        confirmed_at: row.get("confirmed_at")?,
        opt_out,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
