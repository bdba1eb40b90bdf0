//! The ten typed mappings and the per-type selection of them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{StoredValue, Value, ValueType};
use crate::error::{RegistryError, RegistryResult};

/// Storage cell of one named value. Its address is fixed for its lifetime.
pub type Slot<T> = Arc<RwLock<T>>;

pub type Slots<T> = HashMap<String, Slot<T>>;

/// Name to slot mappings, one per storable shape.
#[derive(Default)]
pub struct TypedMaps {
    ints: Slots<i32>,
    int2s: Slots<[i32; 2]>,
    int3s: Slots<[i32; 3]>,
    int4s: Slots<[i32; 4]>,
    floats: Slots<f32>,
    float2s: Slots<[f32; 2]>,
    float3s: Slots<[f32; 3]>,
    float4s: Slots<[f32; 4]>,
    bools: Slots<bool>,
    strings: Slots<String>,
}

pub trait Sealed: Sized {
    fn slots(maps: &TypedMaps) -> &Slots<Self>;
    fn slots_mut(maps: &mut TypedMaps) -> &mut Slots<Self>;
}

macro_rules! impl_stored {
    ($($ty:ty => $tag:ident, $field:ident;)*) => {
        $(
            impl Sealed for $ty {
                fn slots(maps: &TypedMaps) -> &Slots<Self> {
                    &maps.$field
                }

                fn slots_mut(maps: &mut TypedMaps) -> &mut Slots<Self> {
                    &mut maps.$field
                }
            }

            impl StoredValue for $ty {
                const TYPE: ValueType = ValueType::$tag;

                fn into_value(self) -> Value {
                    Value::$tag(self)
                }
            }
        )*
    };
}

impl_stored! {
    i32 => Int, ints;
    [i32; 2] => Int2, int2s;
    [i32; 3] => Int3, int3s;
    [i32; 4] => Int4, int4s;
    f32 => Float, floats;
    [f32; 2] => Float2, float2s;
    [f32; 3] => Float3, float3s;
    [f32; 4] => Float4, float4s;
    bool => Bool, bools;
    String => String, strings;
}

/// A slot of any type, read back as a [`Value`].
pub(crate) trait AnySlot: Send + Sync {
    fn load(&self) -> RegistryResult<Value>;
}

impl<T: StoredValue> AnySlot for RwLock<T> {
    fn load(&self) -> RegistryResult<Value> {
        let value = self.read().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(value.clone().into_value())
    }
}

fn any_slot<T: StoredValue>(maps: &TypedMaps, name: &str) -> Option<Arc<dyn AnySlot>> {
    T::slots(maps)
        .get(name)
        .map(|slot| Arc::clone(slot) as Arc<dyn AnySlot>)
}

impl TypedMaps {
    /// Slot of `name` in the mapping selected by `ty`.
    ///
    /// The slot is returned unlocked so callers can release the registry
    /// before reading it.
    pub(crate) fn any_slot(&self, ty: ValueType, name: &str) -> Option<Arc<dyn AnySlot>> {
        match ty {
            ValueType::None => None,
            ValueType::Int => any_slot::<i32>(self, name),
            ValueType::Int2 => any_slot::<[i32; 2]>(self, name),
            ValueType::Int3 => any_slot::<[i32; 3]>(self, name),
            ValueType::Int4 => any_slot::<[i32; 4]>(self, name),
            ValueType::Float => any_slot::<f32>(self, name),
            ValueType::Float2 => any_slot::<[f32; 2]>(self, name),
            ValueType::Float3 => any_slot::<[f32; 3]>(self, name),
            ValueType::Float4 => any_slot::<[f32; 4]>(self, name),
            ValueType::Bool => any_slot::<bool>(self, name),
            ValueType::String => any_slot::<String>(self, name),
        }
    }

    /// Erases `name` from the mapping selected by `ty`.
    pub(crate) fn remove(&mut self, ty: ValueType, name: &str) -> bool {
        match ty {
            ValueType::None => false,
            ValueType::Int => self.ints.remove(name).is_some(),
            ValueType::Int2 => self.int2s.remove(name).is_some(),
            ValueType::Int3 => self.int3s.remove(name).is_some(),
            ValueType::Int4 => self.int4s.remove(name).is_some(),
            ValueType::Float => self.floats.remove(name).is_some(),
            ValueType::Float2 => self.float2s.remove(name).is_some(),
            ValueType::Float3 => self.float3s.remove(name).is_some(),
            ValueType::Float4 => self.float4s.remove(name).is_some(),
            ValueType::Bool => self.bools.remove(name).is_some(),
            ValueType::String => self.strings.remove(name).is_some(),
        }
    }
}
