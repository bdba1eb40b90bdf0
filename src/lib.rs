//! valuestore - named, typed value registry
//!
//! Lets several consumers share one backing value by name and lets host code
//! stash values for later retrieval. See [`Registry`] for the operations and
//! [`ValueRef`] for in-place access to a stored value.

pub mod config;
pub mod error;
pub mod protocol;
pub mod shell;
pub mod store;
pub mod value;

pub use config::{Config, MismatchPolicy, RegistryConfig};
pub use error::{RegistryError, RegistryResult};
pub use shell::Shell;
pub use store::Registry;
pub use value::{StoredValue, Value, ValueRef, ValueType};
