//! Line-oriented command protocol
//!
//! One command per line: a case-insensitive verb followed by whitespace
//! separated arguments. Each command produces exactly one [`Reply`].

pub mod add;
pub mod command;
pub mod get;
pub mod reply;

pub use command::{Command, ParseError};
pub use reply::Reply;
