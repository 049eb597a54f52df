//! Error Types
//!
//! Gateway failures are expected and absorbed by rollback; chain errors are
//! invariant reports; config errors surface while loading settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for remote gateway calls
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Discriminated failure returned by the remote gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum GatewayError {
    #[error("{kind} {id} not found")]
    NotFound { kind: String, id: String },
    #[error("rejected by server: {0}")]
    Rejected(String),
    #[error("session is not authorized")]
    Unauthorized,
    #[error("remote unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub fn not_found(kind: &str, id: impl std::fmt::Debug) -> Self {
        GatewayError::NotFound {
            kind: kind.to_string(),
            id: format!("{:?}", id),
        }
    }
}

/// A violated chain invariant within one scope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("scope has members but no tail")]
    NoTail,
    #[error("scope has {0} tails")]
    MultipleTails(usize),
    #[error("entity {0} points at itself")]
    SelfLink(String),
    #[error("{0} is the next of more than one entity")]
    Branch(String),
    #[error("entity {0} points outside its scope")]
    DanglingNext(String),
    #[error("{0} members are not reachable from the tail")]
    Unreachable(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
