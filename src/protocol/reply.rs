use std::fmt;

use crate::error::RegistryError;
use crate::value::Value;

/// Shell reply to a single command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Command succeeded with nothing to report
    Ok,
    /// No value, e.g. a lookup that found nothing
    Nil,
    /// Counts and flags
    Integer(i64),
    /// A stored value
    Value(Value),
    /// Free text such as a type name
    Text(String),
    Error(String),
}

impl Reply {
    /// Create an error reply
    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    pub fn from_option(value: Option<Value>) -> Self {
        value.map_or(Reply::Nil, Reply::Value)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl From<RegistryError> for Reply {
    fn from(err: RegistryError) -> Self {
        Reply::error(err.to_string())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Nil => f.write_str("(nil)"),
            Reply::Integer(n) => write!(f, "{}", n),
            Reply::Value(v) => write!(f, "{}", v),
            Reply::Text(s) => f.write_str(s),
            Reply::Error(msg) => write!(f, "ERR {}", msg),
        }
    }
}
