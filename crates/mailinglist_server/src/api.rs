//! RPC façade over the mailing list store.
//!
//! # Responsibility
//! - Translate wire requests into store calls and store results into wire
//!   responses.
//! - Bound every store call with a per-call deadline.
//!
//! # Invariants
//! - One shared SQLite connection serves all requests.
//! - A missing entry is an `Ok` response with `email_entry: None`.
//! - Request failures are returned as `ApiError`; they never panic.
//! - The deadline is a reporting timeout: a timed-out write may still commit.

use log::{info, warn};
use mailinglist_core::proto::{
    CreateEmailRequest, DeleteEmailRequest, EmailResponse, ErrorKind, GetEmailBatchRequest,
    GetEmailBatchResponse, GetEmailRequest, RpcMethod, UpdateEmailRequest,
};
use mailinglist_core::{
    EmailBatchQuery, EmailService, RepoError, RepoResult, SqliteEmailRepository,
};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Default per-call deadline.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(1);

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure surfaced to RPC callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InvalidArgument(String),
    /// Address already registered.
    Conflict(String),
    Timeout(Duration),
    Storage(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "{message}"),
            Self::Conflict(email) => write!(f, "email already exists: {email}"),
            Self::Timeout(limit) => {
                write!(f, "store call exceeded {}ms deadline", limit.as_millis())
            }
            Self::Storage(message) => write!(f, "storage failure: {message}"),
        }
    }
}

impl Error for ApiError {}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Conflict(email) => Self::Conflict(email),
            RepoError::InvalidArgument(message) => Self::InvalidArgument(message),
            other @ (RepoError::Db(_) | RepoError::InvalidData(_)) => {
                Self::Storage(other.to_string())
            }
        }
    }
}

/// Request handler for the five mailing list operations.
///
/// Cloning is cheap; clones share the same connection.
#[derive(Clone)]
pub struct MailingListApi {
    conn: Arc<Mutex<Connection>>,
    call_timeout: Duration,
}

impl MailingListApi {
    /// Wraps an opened store connection (schema already ensured).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub async fn create_email(&self, request: CreateEmailRequest) -> ApiResult<EmailResponse> {
        let entry = self
            .call(RpcMethod::CreateEmail, move |service| {
                service.create_email(&request.email_addr)
            })
            .await?;
        Ok(EmailResponse {
            email_entry: Some(entry),
        })
    }

    pub async fn get_email(&self, request: GetEmailRequest) -> ApiResult<EmailResponse> {
        let entry = self
            .call(RpcMethod::GetEmail, move |service| {
                service.get_email(&request.email_addr)
            })
            .await?;
        Ok(EmailResponse { email_entry: entry })
    }

    pub async fn update_email(&self, request: UpdateEmailRequest) -> ApiResult<EmailResponse> {
        let entry = self
            .call(RpcMethod::UpdateEmail, move |service| {
                service.update_email(&request.email_entry)
            })
            .await?;
        Ok(EmailResponse { email_entry: entry })
    }

    pub async fn delete_email(&self, request: DeleteEmailRequest) -> ApiResult<EmailResponse> {
        let entry = self
            .call(RpcMethod::DeleteEmail, move |service| {
                service.delete_email(&request.email_addr)
            })
            .await?;
        Ok(EmailResponse { email_entry: entry })
    }

    pub async fn get_email_batch(
        &self,
        request: GetEmailBatchRequest,
    ) -> ApiResult<GetEmailBatchResponse> {
        let query = batch_query_from_wire(request)?;
        let entries = self
            .call(RpcMethod::GetEmailBatch, move |service| {
                service.get_email_batch(&query)
            })
            .await?;
        Ok(GetEmailBatchResponse {
            email_entries: entries,
        })
    }

    async fn call<T, F>(&self, method: RpcMethod, f: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&EmailService<SqliteEmailRepository<'_>>) -> RepoResult<T> + Send + 'static,
    {
        let started_at = Instant::now();
        let conn = Arc::clone(&self.conn);
        let task = tokio::task::spawn_blocking(move || -> ApiResult<T> {
            let guard = conn
                .lock()
                .map_err(|_| ApiError::Storage("store connection lock poisoned".to_string()))?;
            let service = EmailService::new(SqliteEmailRepository::new(&guard));
            f(&service).map_err(ApiError::from)
        });

        let result = match tokio::time::timeout(self.call_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ApiError::Storage(format!(
                "store task failed: {join_err}"
            ))),
            Err(_) => Err(ApiError::Timeout(self.call_timeout)),
        };

        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!(
                "event=rpc_call module=api status=ok method={} duration_ms={}",
                method.name(),
                duration_ms
            ),
            Err(err) => warn!(
                "event=rpc_call module=api status=error method={} duration_ms={} error_code={} error={}",
                method.name(),
                duration_ms,
                err.kind(),
                err
            ),
        }
        result
    }
}

fn batch_query_from_wire(request: GetEmailBatchRequest) -> ApiResult<EmailBatchQuery> {
    let page = positive_u32("page", request.page)?;
    let count = positive_u32("count", request.count)?;
    Ok(EmailBatchQuery::new(page, count))
}

fn positive_u32(field: &str, value: i32) -> ApiResult<u32> {
    match u32::try_from(value) {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(ApiError::InvalidArgument(format!(
            "{field} must be >= 1, got {value}"
        ))),
    }
}
