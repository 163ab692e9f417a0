//! Blocking HTTP/JSON client for the mailing list RPC service.
//!
//! # Responsibility
//! - Mirror the five store operations as typed calls.
//! - Decode error envelopes into `ClientError::Rpc` with a stable kind.
//!
//! # Invariants
//! - An absent entry is `Ok(None)`, never an error.
//! - Every request carries the configured deadline; there are no retries.

pub mod cli;

use mailinglist_core::proto::{
    CreateEmailRequest, DeleteEmailRequest, EmailResponse, ErrorEnvelope, ErrorKind,
    GetEmailBatchRequest, GetEmailBatchResponse, GetEmailRequest, RpcMethod, UpdateEmailRequest,
};
use mailinglist_core::EmailEntry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8081";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    InvalidEndpoint(String),
    /// Connection failure or client-side deadline.
    Transport(String),
    /// Server answered with an error envelope.
    Rpc {
        status: u16,
        kind: ErrorKind,
        message: String,
    },
    /// Response body did not match the wire schema.
    Decode(String),
}

impl ClientError {
    /// Returns the server-side error kind, when the server produced one.
    pub fn rpc_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Rpc { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(message) => write!(f, "invalid endpoint: {message}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Rpc {
                status,
                kind,
                message,
            } => write!(f, "rpc error ({status} {kind}): {message}"),
            Self::Decode(message) => write!(f, "malformed response: {message}"),
        }
    }
}

impl Error for ClientError {}

/// Typed client for one mailing list server.
#[derive(Clone)]
pub struct MailingListClient {
    base_url: Url,
    agent: ureq::Agent,
}

impl MailingListClient {
    /// Creates a client for `endpoint` with the default one second deadline.
    ///
    /// Accepts `http(s)://host:port`, `host:port`, or `:port` (loopback).
    pub fn new(endpoint: &str) -> ClientResult<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> ClientResult<Self> {
        let base_url = normalize_endpoint(endpoint)?;
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self { base_url, agent })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn create_email(&self, email_addr: &str) -> ClientResult<Option<EmailEntry>> {
        let request = CreateEmailRequest {
            email_addr: email_addr.to_string(),
        };
        let response: EmailResponse = self.call(RpcMethod::CreateEmail, &request)?;
        Ok(response.email_entry)
    }

    pub fn get_email(&self, email_addr: &str) -> ClientResult<Option<EmailEntry>> {
        let request = GetEmailRequest {
            email_addr: email_addr.to_string(),
        };
        let response: EmailResponse = self.call(RpcMethod::GetEmail, &request)?;
        Ok(response.email_entry)
    }

    pub fn update_email(&self, entry: &EmailEntry) -> ClientResult<Option<EmailEntry>> {
        let request = UpdateEmailRequest {
            email_entry: entry.clone(),
        };
        let response: EmailResponse = self.call(RpcMethod::UpdateEmail, &request)?;
        Ok(response.email_entry)
    }

    pub fn delete_email(&self, email_addr: &str) -> ClientResult<Option<EmailEntry>> {
        let request = DeleteEmailRequest {
            email_addr: email_addr.to_string(),
        };
        let response: EmailResponse = self.call(RpcMethod::DeleteEmail, &request)?;
        Ok(response.email_entry)
    }

    /// Fetches page `page` (1-indexed) of at most `count` subscribed entries.
    pub fn get_email_batch(&self, count: i32, page: i32) -> ClientResult<Vec<EmailEntry>> {
        let request = GetEmailBatchRequest { count, page };
        let response: GetEmailBatchResponse = self.call(RpcMethod::GetEmailBatch, &request)?;
        Ok(response.email_entries)
    }

    fn call<T, R>(&self, method: RpcMethod, body: &T) -> ClientResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(method.path())
            .map_err(|err| ClientError::InvalidEndpoint(err.to_string()))?;

        match self.agent.post(url.as_str()).send_json(body) {
            Ok(response) => response
                .into_json::<R>()
                .map_err(|err| ClientError::Decode(err.to_string())),
            Err(ureq::Error::Status(status, response)) => Err(error_from_response(status, response)),
            Err(ureq::Error::Transport(err)) => Err(ClientError::Transport(err.to_string())),
        }
    }
}

/// Normalizes an endpoint string into a root base URL.
///
/// RPC paths are absolute, so endpoints carrying a path prefix are rejected.
pub fn normalize_endpoint(raw: &str) -> ClientResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidEndpoint(
            "endpoint cannot be empty".to_string(),
        ));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else if let Some(port) = trimmed.strip_prefix(':') {
        format!("http://127.0.0.1:{port}")
    } else {
        format!("http://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|err| ClientError::InvalidEndpoint(format!("`{trimmed}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ClientError::InvalidEndpoint(format!(
                "unsupported scheme `{other}`"
            )));
        }
    }
    if url.host_str().is_none() {
        return Err(ClientError::InvalidEndpoint(format!(
            "`{trimmed}` has no host"
        )));
    }
    if !url.path().is_empty() && url.path() != "/" {
        return Err(ClientError::InvalidEndpoint(format!(
            "`{trimmed}` must not include a path"
        )));
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn error_from_response(status: u16, response: ureq::Response) -> ClientError {
    match response.into_json::<ErrorEnvelope>() {
        Ok(envelope) => ClientError::Rpc {
            status,
            kind: envelope.error.kind,
            message: envelope.error.message,
        },
        Err(err) => ClientError::Decode(format!("status {status} without error envelope: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_endpoint, ClientError, MailingListClient};

    #[test]
    fn normalize_endpoint_fills_scheme_and_host() {
        assert_eq!(
            normalize_endpoint(":8081").unwrap().as_str(),
            "http://127.0.0.1:8081/"
        );
        assert_eq!(
            normalize_endpoint("lists.internal:9000").unwrap().as_str(),
            "http://lists.internal:9000/"
        );
        assert_eq!(
            normalize_endpoint("https://lists.example.com").unwrap().as_str(),
            "https://lists.example.com/"
        );
    }

    #[test]
    fn normalize_endpoint_drops_query_and_trailing_slash() {
        assert_eq!(
            normalize_endpoint("http://localhost:8081/?debug=1#top")
                .unwrap()
                .as_str(),
            "http://localhost:8081/"
        );
    }

    #[test]
    fn normalize_endpoint_rejects_path_prefix() {
        let err = normalize_endpoint("http://lists.internal:9000/api").unwrap_err();
        assert!(matches!(err, ClientError::InvalidEndpoint(ref message) if message.contains("path")));
    }

    #[test]
    fn client_exposes_normalized_base_url() {
        let client = MailingListClient::new(":9000").unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9000/");
        assert_eq!(
            client.base_url().join("/rpc/GetEmail").unwrap().as_str(),
            "http://127.0.0.1:9000/rpc/GetEmail"
        );
    }

    #[test]
    fn normalize_endpoint_rejects_blank_and_foreign_scheme() {
        assert!(matches!(
            normalize_endpoint("  "),
            Err(ClientError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            normalize_endpoint("ftp://host:21"),
            Err(ClientError::InvalidEndpoint(_))
        ));
    }
}
