use thiserror::Error;

use crate::protocol::add::AddCmd;
use crate::protocol::get::GetCmd;
use crate::protocol::reply::Reply;
use crate::store::Registry;
use crate::value::{UnknownValueType, ValueType};

/// Errors for lines that do not form a valid command
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    #[error(transparent)]
    UnknownType(#[from] UnknownValueType),

    #[error("invalid {ty} component '{token}'")]
    InvalidComponent { ty: ValueType, token: String },
}

/// Shell command types
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// ADD type name components...
    Add(AddCmd),
    /// GET type name
    Get(GetCmd),
    /// VALUE name, lookup without knowing the type
    Value(String),
    /// HAS name
    Has(String),
    /// TYPE name
    Type(String),
    /// INCR name
    Incr(String),
    /// DECR name
    Decr(String),
    /// REFS name
    Refs(String),
    /// DEL name
    Del(String),
}

/// Split off the first whitespace separated token.
///
/// Returns the token and the remainder with leading whitespace removed, or
/// `None` when there is no token left.
pub(crate) fn split_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(i) => Some((&s[..i], s[i..].trim_start())),
        None => Some((s, "")),
    }
}

fn single_name(cmd: &'static str, args: &str) -> Result<String, ParseError> {
    let mut tokens = args.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(name), None) => Ok(name.to_string()),
        _ => Err(ParseError::WrongArity(cmd)),
    }
}

impl Command {
    /// Parse one line of input.
    ///
    /// Blank lines and lines starting with `#` carry no command.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let Some((verb, args)) = split_token(line) else {
            return Ok(None);
        };
        if verb.starts_with('#') {
            return Ok(None);
        }

        let cmd = match verb.to_ascii_uppercase().as_str() {
            "ADD" => Command::Add(AddCmd::parse(args)?),
            "GET" => Command::Get(GetCmd::parse(args)?),
            "VALUE" => Command::Value(single_name("value", args)?),
            "HAS" => Command::Has(single_name("has", args)?),
            "TYPE" => Command::Type(single_name("type", args)?),
            "INCR" => Command::Incr(single_name("incr", args)?),
            "DECR" => Command::Decr(single_name("decr", args)?),
            "REFS" => Command::Refs(single_name("refs", args)?),
            "DEL" => Command::Del(single_name("del", args)?),
            _ => return Err(ParseError::UnknownCommand(verb.to_string())),
        };
        Ok(Some(cmd))
    }

    /// Execute the command on the given registry and return the reply
    pub fn execute(&self, registry: &Registry) -> Reply {
        let result = match self {
            Command::Add(cmd) => return cmd.execute(registry),
            Command::Get(cmd) => return cmd.execute(registry),
            Command::Value(name) => registry.get_value(name).map(Reply::from_option),
            Command::Has(name) => registry
                .has_value(name)
                .map(|has| Reply::Integer(i64::from(has))),
            Command::Type(name) => registry
                .get_type(name)
                .map(|ty| Reply::Text(ty.to_string())),
            Command::Incr(name) => registry
                .increment_ref(name)
                .map(|count| Reply::Integer(count.into())),
            Command::Decr(name) => registry
                .decrement_ref(name)
                .map(|count| Reply::Integer(count.into())),
            Command::Refs(name) => registry
                .ref_count(name)
                .map(|count| count.map_or(Reply::Nil, |n| Reply::Integer(n.into()))),
            Command::Del(name) => registry.delete_value(name).map(|()| Reply::Ok),
        };

        result.unwrap_or_else(Reply::from)
    }
}
