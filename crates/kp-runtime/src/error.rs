use std::path::PathBuf;

use thiserror::Error;

use crate::prims::ValueKind;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors surfaced by the Rust API.
///
/// Primitives themselves never fail on bad program input; these cover host I/O, configuration
/// and misuse of the dynamic `invoke` entry point.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid runtime profile {value:?} (expected one of: kforth, legacy)")]
    UnknownProfile { value: String },

    #[error("read runtime config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse runtime config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("{symbol} takes {expected} argument(s), got {got}")]
    Arity {
        symbol: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{symbol}: argument {index} must be {expected}")]
    ArgKind {
        symbol: &'static str,
        index: usize,
        expected: ValueKind,
    },
}
