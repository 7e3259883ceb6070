//! Shared error type across typegate crates.

use thiserror::Error;

/// Stable error classification (used by operators and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Filter could not start (allow-list missing, bad pattern).
    Init,
    /// Invalid configuration.
    Config,
    /// Package descriptor unreadable or malformed.
    Descriptor,
    /// A custom policy hook failed.
    Policy,
}

impl ErrorKind {
    /// String representation used in logs and dry-run output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Init => "INIT",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Descriptor => "DESCRIPTOR",
            ErrorKind::Policy => "POLICY",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TypeGateError>;

/// Unified error type used by core and filter.
#[derive(Debug, Error)]
pub enum TypeGateError {
    #[error("init failed: {0}")]
    Init(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("descriptor: {0}")]
    Descriptor(String),
    #[error("policy {policy} failed: {msg}")]
    Policy { policy: String, msg: String },
}

impl TypeGateError {
    /// Map to the stable classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TypeGateError::Init(_) => ErrorKind::Init,
            TypeGateError::Config(_) => ErrorKind::Config,
            TypeGateError::Descriptor(_) => ErrorKind::Descriptor,
            TypeGateError::Policy { .. } => ErrorKind::Policy,
        }
    }
}
