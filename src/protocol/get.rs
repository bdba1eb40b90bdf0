use crate::error::RegistryResult;
use crate::protocol::command::ParseError;
use crate::protocol::reply::Reply;
use crate::store::Registry;
use crate::value::{StoredValue, UnknownValueType, Value, ValueType};

/// GET command: GET type name
#[derive(Debug, Clone, PartialEq)]
pub struct GetCmd {
    pub ty: ValueType,
    pub name: String,
}

impl GetCmd {
    /// Create a new GET command
    pub fn new(ty: ValueType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }

    /// Parse the arguments following the GET verb
    pub fn parse(args: &str) -> Result<Self, ParseError> {
        let mut tokens = args.split_whitespace();
        let (Some(ty), Some(name), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(ParseError::WrongArity("get"));
        };

        let ty: ValueType = ty.parse()?;
        if ty == ValueType::None {
            return Err(UnknownValueType(ty.to_string()).into());
        }
        Ok(Self::new(ty, name))
    }

    /// Look the name up in the mapping for `ty` only
    pub fn execute(&self, registry: &Registry) -> Reply {
        let name = self.name.as_str();
        let found = match self.ty {
            ValueType::None => Ok(None),
            ValueType::Int => fetch::<i32>(registry, name),
            ValueType::Int2 => fetch::<[i32; 2]>(registry, name),
            ValueType::Int3 => fetch::<[i32; 3]>(registry, name),
            ValueType::Int4 => fetch::<[i32; 4]>(registry, name),
            ValueType::Float => fetch::<f32>(registry, name),
            ValueType::Float2 => fetch::<[f32; 2]>(registry, name),
            ValueType::Float3 => fetch::<[f32; 3]>(registry, name),
            ValueType::Float4 => fetch::<[f32; 4]>(registry, name),
            ValueType::Bool => fetch::<bool>(registry, name),
            ValueType::String => fetch::<String>(registry, name),
        };

        match found {
            Ok(value) => Reply::from_option(value),
            Err(e) => e.into(),
        }
    }
}

fn fetch<T: StoredValue>(registry: &Registry, name: &str) -> RegistryResult<Option<Value>> {
    registry
        .get::<T>(name)?
        .map(|handle| handle.read().map(T::into_value))
        .transpose()
}
