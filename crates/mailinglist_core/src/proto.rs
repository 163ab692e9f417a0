//! JSON wire types shared by the RPC server and client.
//!
//! # Responsibility
//! - Define request/response envelopes for the five RPC operations.
//! - Define the failure envelope and its stable error kinds.
//!
//! # Invariants
//! - An absent entry is `"email_entry": null`, never an error envelope.
//! - Error kind strings are stable snake_case identifiers.

use crate::model::email_entry::EmailEntry;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// RPC operations exposed by the mailing list service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    CreateEmail,
    GetEmail,
    UpdateEmail,
    DeleteEmail,
    GetEmailBatch,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 5] = [
        RpcMethod::CreateEmail,
        RpcMethod::GetEmail,
        RpcMethod::UpdateEmail,
        RpcMethod::DeleteEmail,
        RpcMethod::GetEmailBatch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CreateEmail => "CreateEmail",
            Self::GetEmail => "GetEmail",
            Self::UpdateEmail => "UpdateEmail",
            Self::DeleteEmail => "DeleteEmail",
            Self::GetEmailBatch => "GetEmailBatch",
        }
    }

    /// HTTP path for this operation, e.g. `/rpc/GetEmail`.
    pub fn path(self) -> &'static str {
        match self {
            Self::CreateEmail => "/rpc/CreateEmail",
            Self::GetEmail => "/rpc/GetEmail",
            Self::UpdateEmail => "/rpc/UpdateEmail",
            Self::DeleteEmail => "/rpc/DeleteEmail",
            Self::GetEmailBatch => "/rpc/GetEmailBatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEmailRequest {
    pub email_addr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetEmailRequest {
    pub email_addr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEmailRequest {
    pub email_entry: EmailEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEmailRequest {
    pub email_addr: String,
}

/// `page` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetEmailBatchRequest {
    pub count: i32,
    pub page: i32,
}

/// Single-entry response shared by create/get/update/delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailResponse {
    pub email_entry: Option<EmailEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetEmailBatchResponse {
    #[serde(default)]
    pub email_entries: Vec<EmailEntry>,
}

/// Stable failure categories carried in the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller input rejected (blank address, page or count below 1).
    InvalidArgument,
    /// Address already registered.
    Conflict,
    /// Per-call deadline elapsed before the store answered.
    Timeout,
    /// Storage engine failure.
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::Conflict => "conflict",
            Self::Timeout => "timeout",
            Self::Storage => "storage",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                kind,
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RpcMethod};

    #[test]
    fn method_paths_end_with_method_name() {
        for method in RpcMethod::ALL {
            assert_eq!(method.path(), format!("/rpc/{}", method.name()));
        }
    }

    #[test]
    fn error_kind_strings_match_display() {
        assert_eq!(ErrorKind::InvalidArgument.to_string(), "invalid_argument");
        assert_eq!(ErrorKind::Storage.as_str(), "storage");
    }
}
