//! Error types for the value registry

use thiserror::Error;

use crate::value::ValueType;

/// Errors raised by registry operations and value handles.
///
/// A typed lookup that finds nothing is not an error; it is reported as
/// `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("value '{name}' is registered as {found}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("no value registered under '{0}'")]
    NotRegistered(String),

    #[error("value '{0}' was deleted")]
    Stale(String),

    #[error("lock poisoned")]
    LockPoisoned,
}

pub type RegistryResult<T> = Result<T, RegistryError>;
