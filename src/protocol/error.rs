use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any failure raised by the Remote Item Service.
///
/// This is the only error kind surfaced into cache state. The sync layer
/// stores it as data in the per-operation error fields; nothing is rethrown
/// to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RequestError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}
