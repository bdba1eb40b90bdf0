use std::str::FromStr;

use crate::protocol::command::{split_token, ParseError};
use crate::protocol::reply::Reply;
use crate::store::Registry;
use crate::value::{UnknownValueType, Value, ValueType};

/// ADD command: ADD type name components...
#[derive(Debug, Clone, PartialEq)]
pub struct AddCmd {
    pub name: String,
    pub value: Value,
}

impl AddCmd {
    /// Parse the arguments following the ADD verb
    pub fn parse(args: &str) -> Result<Self, ParseError> {
        let (ty, rest) = split_token(args).ok_or(ParseError::WrongArity("add"))?;
        let ty: ValueType = ty.parse()?;
        let (name, rest) = split_token(rest).ok_or(ParseError::WrongArity("add"))?;

        Ok(Self {
            name: name.to_string(),
            value: parse_value(ty, rest)?,
        })
    }

    pub fn execute(&self, registry: &Registry) -> Reply {
        match registry.add_value(&self.name, self.value.clone()) {
            Ok(()) => Reply::Ok,
            Err(e) => e.into(),
        }
    }
}

fn parse_one<T: FromStr>(ty: ValueType, token: &str) -> Result<T, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidComponent {
        ty,
        token: token.to_string(),
    })
}

fn parse_array<T: FromStr, const N: usize>(
    ty: ValueType,
    tokens: &[&str],
) -> Result<[T; N], ParseError> {
    let items = tokens
        .iter()
        .map(|token| parse_one(ty, token))
        .collect::<Result<Vec<T>, _>>()?;
    items.try_into().map_err(|_| ParseError::WrongArity("add"))
}

/// Parse the text form of a `ty` value.
///
/// Strings take the whole remaining text; every other type takes exactly
/// as many whitespace separated components as it has.
pub fn parse_value(ty: ValueType, text: &str) -> Result<Value, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match ty.components() {
        Some(n) if n != tokens.len() => return Err(ParseError::WrongArity("add")),
        _ => {}
    }

    let value = match ty {
        ValueType::None => return Err(UnknownValueType(ty.to_string()).into()),
        ValueType::Int => Value::Int(parse_one(ty, tokens[0])?),
        ValueType::Int2 => Value::Int2(parse_array(ty, &tokens)?),
        ValueType::Int3 => Value::Int3(parse_array(ty, &tokens)?),
        ValueType::Int4 => Value::Int4(parse_array(ty, &tokens)?),
        ValueType::Float => Value::Float(parse_one(ty, tokens[0])?),
        ValueType::Float2 => Value::Float2(parse_array(ty, &tokens)?),
        ValueType::Float3 => Value::Float3(parse_array(ty, &tokens)?),
        ValueType::Float4 => Value::Float4(parse_array(ty, &tokens)?),
        ValueType::Bool => Value::Bool(parse_one(ty, tokens[0])?),
        ValueType::String => Value::String(text.trim_end().to_string()),
    };
    Ok(value)
}
