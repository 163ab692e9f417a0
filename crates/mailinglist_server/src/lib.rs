//! RPC façade for the mailing list store.
//!
//! `api` holds the transport-independent request handling, `rpc` serves it
//! over HTTP/JSON and `config` resolves flags and environment.

pub mod api;
pub mod config;
pub mod rpc;

pub use api::{ApiError, ApiResult, MailingListApi, DEFAULT_CALL_TIMEOUT};
pub use config::{ServerArgs, ServerConfig};
pub use rpc::{bind_listener, router, serve, serve_listener, ServeError};
