//! Error types for fw-migrate

use thiserror::Error;

/// fw-migrate error type
///
/// Only structural preconditions and genuine bugs ever surface through
/// this type; malformed vendor input is folded into a `Warning` on the
/// `FirewallConfig` instead (see `spec.md` §7).
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Input validation failure: missing mandatory blob, wrong extension,
    /// wrong vendor label.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A parser could not produce any IR at all (distinct from a per-line
    /// parse warning, which does not reach this type).
    #[error("parse error: {0}")]
    Parse(String),

    /// A generator could not produce any output at all.
    #[error("generate error: {0}")]
    Generate(String),

    /// I/O error reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Programming error / invariant violation that should never happen
    /// given valid IR.
    #[error("internal error: {0}")]
    Internal(String),
}

/// fw-migrate result type
pub type Result<T> = std::result::Result<T, MigrateError>;
