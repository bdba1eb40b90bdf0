//! Named value registry
//!
//! Maps names to typed values so that several widgets can share one backing
//! value and host code can stash values for later retrieval. Every name is
//! registered under exactly one [`ValueType`] and lives in the typed mapping
//! for that type. A caller-maintained reference count is kept per name.
//!
//! Reference counts never drive deletion: a count may reach zero while the
//! value stays registered, and only [`Registry::delete_value`] frees a value.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::config::{MismatchPolicy, RegistryConfig};
use crate::error::{RegistryError, RegistryResult};
use crate::value::{StoredValue, TypedMaps, Value, ValueRef, ValueType};

struct Inner {
    /// Registered names, whatever their type
    items: HashSet<String>,
    types: HashMap<String, ValueType>,
    refs: HashMap<String, u32>,
    maps: TypedMaps,
}

impl Inner {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            items: HashSet::with_capacity(capacity),
            types: HashMap::with_capacity(capacity),
            refs: HashMap::with_capacity(capacity),
            maps: TypedMaps::default(),
        }
    }

    fn insert<T: StoredValue>(&mut self, name: &str, value: T) -> ValueRef<T> {
        let slot = Arc::new(RwLock::new(value));
        let handle = ValueRef::new(name, &slot);

        self.items.insert(name.to_string());
        self.types.insert(name.to_string(), T::TYPE);
        self.refs.insert(name.to_string(), 1);
        T::slots_mut(&mut self.maps).insert(name.to_string(), slot);

        handle
    }

    fn remove(&mut self, name: &str) -> bool {
        if !self.items.remove(name) {
            return false;
        }
        self.refs.remove(name);
        if let Some(ty) = self.types.remove(name) {
            self.maps.remove(ty, name);
        }
        true
    }

    fn ref_mut(&mut self, name: &str) -> RegistryResult<&mut u32> {
        self.refs
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }
}

/// Registry of named, typed values.
///
/// All state sits behind a single lock taken once per operation. Share it
/// between components with an `Arc<Registry>`.
pub struct Registry {
    inner: RwLock<Inner>,
    policy: MismatchPolicy,
}

impl Registry {
    /// Create an empty registry with default configuration
    pub fn new() -> Self {
        Self::with_config(&RegistryConfig::default())
    }

    pub fn with_config(config: &RegistryConfig) -> Self {
        Self {
            inner: RwLock::new(Inner::with_capacity(config.initial_capacity)),
            policy: config.mismatch_policy,
        }
    }

    pub fn mismatch_policy(&self) -> MismatchPolicy {
        self.policy
    }

    fn read(&self) -> RegistryResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write(&self) -> RegistryResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| RegistryError::LockPoisoned)
    }

    /// Store `value` under `name` and return a handle to it.
    ///
    /// A new name starts with a reference count of 1. Adding to a name that
    /// already holds a `T` overwrites the value in place, keeping both the
    /// slot and the reference count. A name holding another type is handled
    /// according to the configured [`MismatchPolicy`].
    ///
    /// An overwrite releases the registry lock before locking the slot, so
    /// it waits for handle closures on that value without blocking others.
    /// If the name is deleted meanwhile, the write lands in the detached
    /// slot and the returned handle is already stale.
    pub fn add<T: StoredValue>(&self, name: &str, value: T) -> RegistryResult<ValueRef<T>> {
        let mut inner = self.write()?;

        if let Some(slot) = T::slots(&inner.maps).get(name).cloned() {
            drop(inner);
            *slot.write().map_err(|_| RegistryError::LockPoisoned)? = value;
            debug!(name, ty = %T::TYPE, "value overwritten");
            return Ok(ValueRef::new(name, &slot));
        }

        if let Some(&found) = inner.types.get(name) {
            match self.policy {
                MismatchPolicy::Reject => {
                    warn!(name, expected = %T::TYPE, %found, "rejected add with mismatched type");
                    return Err(RegistryError::TypeMismatch {
                        name: name.to_string(),
                        expected: T::TYPE,
                        found,
                    });
                }
                MismatchPolicy::Replace => {
                    debug!(name, from = %found, to = %T::TYPE, "replacing value type");
                    inner.remove(name);
                }
            }
        }

        debug!(name, ty = %T::TYPE, "value created");
        Ok(inner.insert(name, value))
    }

    /// Handle to the `T` stored under `name`.
    ///
    /// Returns `None` if the name is unknown or holds another type. The
    /// reference count is left untouched.
    pub fn get<T: StoredValue>(&self, name: &str) -> RegistryResult<Option<ValueRef<T>>> {
        let inner = self.read()?;
        Ok(T::slots(&inner.maps)
            .get(name)
            .map(|slot| ValueRef::new(name, slot)))
    }

    pub fn has_value(&self, name: &str) -> RegistryResult<bool> {
        Ok(self.read()?.items.contains(name))
    }

    /// Type tag of `name`, [`ValueType::None`] when unregistered
    pub fn get_type(&self, name: &str) -> RegistryResult<ValueType> {
        Ok(self.read()?.types.get(name).copied().unwrap_or_default())
    }

    pub fn ref_count(&self, name: &str) -> RegistryResult<Option<u32>> {
        Ok(self.read()?.refs.get(name).copied())
    }

    /// Add one to the reference count, returning the new count
    pub fn increment_ref(&self, name: &str) -> RegistryResult<u32> {
        let mut inner = self.write()?;
        let count = inner.ref_mut(name)?;
        *count = count.saturating_add(1);
        debug!(name, count = *count, "reference added");
        Ok(*count)
    }

    /// Subtract one from the reference count, returning the new count.
    ///
    /// The count stops at zero and the value is never deleted here.
    pub fn decrement_ref(&self, name: &str) -> RegistryResult<u32> {
        let mut inner = self.write()?;
        let count = inner.ref_mut(name)?;
        if *count == 0 {
            warn!(name, "reference count already zero");
        } else {
            *count -= 1;
            debug!(name, count = *count, "reference dropped");
        }
        Ok(*count)
    }

    /// Remove `name` and free its value. Existing handles become stale.
    pub fn delete_value(&self, name: &str) -> RegistryResult<()> {
        let mut inner = self.write()?;
        if !inner.remove(name) {
            return Err(RegistryError::NotRegistered(name.to_string()));
        }
        debug!(name, "value deleted");
        Ok(())
    }

    /// Store a value whose type is only known at runtime
    pub fn add_value(&self, name: &str, value: Value) -> RegistryResult<()> {
        debug!(name, ty = %value.value_type(), "adding runtime-typed value");
        match value {
            Value::Int(v) => self.add(name, v).map(drop),
            Value::Int2(v) => self.add(name, v).map(drop),
            Value::Int3(v) => self.add(name, v).map(drop),
            Value::Int4(v) => self.add(name, v).map(drop),
            Value::Float(v) => self.add(name, v).map(drop),
            Value::Float2(v) => self.add(name, v).map(drop),
            Value::Float3(v) => self.add(name, v).map(drop),
            Value::Float4(v) => self.add(name, v).map(drop),
            Value::Bool(v) => self.add(name, v).map(drop),
            Value::String(v) => self.add(name, v).map(drop),
        }
    }

    /// Copy of the value under `name`, whatever its type
    pub fn get_value(&self, name: &str) -> RegistryResult<Option<Value>> {
        let slot = {
            let inner = self.read()?;
            match inner.types.get(name) {
                Some(&ty) => inner.maps.any_slot(ty, name),
                None => None,
            }
        };
        slot.map(|slot| slot.load()).transpose()
    }

    pub fn add_string(&self, name: &str, value: impl Into<String>) -> RegistryResult<ValueRef<String>> {
        self.add(name, value.into())
    }

    pub fn get_string(&self, name: &str) -> RegistryResult<Option<ValueRef<String>>> {
        self.get(name)
    }
}

macro_rules! typed_accessors {
    ($($add:ident, $get:ident => $ty:ty;)*) => {
        impl Registry {
            $(
                pub fn $add(&self, name: &str, value: $ty) -> RegistryResult<ValueRef<$ty>> {
                    self.add(name, value)
                }

                pub fn $get(&self, name: &str) -> RegistryResult<Option<ValueRef<$ty>>> {
                    self.get(name)
                }
            )*
        }
    };
}

typed_accessors! {
    add_int, get_int => i32;
    add_int2, get_int2 => [i32; 2];
    add_int3, get_int3 => [i32; 3];
    add_int4, get_int4 => [i32; 4];
    add_float, get_float => f32;
    add_float2, get_float2 => [f32; 2];
    add_float3, get_float3 => [f32; 3];
    add_float4, get_float4 => [f32; 4];
    add_bool, get_bool => bool;
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    /// Every type under which a typed get finds `name`
    fn found_types(registry: &Registry, name: &str) -> Vec<ValueType> {
        let mut found = Vec::new();
        let mut check = |ty, hit: bool| {
            if hit {
                found.push(ty);
            }
        };
        check(ValueType::Int, registry.get_int(name).unwrap().is_some());
        check(ValueType::Int2, registry.get_int2(name).unwrap().is_some());
        check(ValueType::Int3, registry.get_int3(name).unwrap().is_some());
        check(ValueType::Int4, registry.get_int4(name).unwrap().is_some());
        check(ValueType::Float, registry.get_float(name).unwrap().is_some());
        check(ValueType::Float2, registry.get_float2(name).unwrap().is_some());
        check(ValueType::Float3, registry.get_float3(name).unwrap().is_some());
        check(ValueType::Float4, registry.get_float4(name).unwrap().is_some());
        check(ValueType::Bool, registry.get_bool(name).unwrap().is_some());
        check(ValueType::String, registry.get_string(name).unwrap().is_some());
        found
    }

    #[test]
    fn test_unknown_name() {
        let registry = Registry::new();
        assert!(!registry.has_value("missing").unwrap());
        assert_eq!(registry.get_type("missing").unwrap(), ValueType::None);
        assert_eq!(registry.ref_count("missing").unwrap(), None);
        assert_eq!(registry.get_value("missing").unwrap(), None);
        assert!(found_types(&registry, "missing").is_empty());
    }

    #[test]
    fn test_scenario_int_int2_string() {
        let registry = Registry::new();

        registry.add_int("x", 5).unwrap();
        assert_eq!(registry.get_int("x").unwrap().unwrap().read(), Ok(5));

        registry.add_int2("y", [1, 2]).unwrap();
        assert_eq!(registry.get_int2("y").unwrap().unwrap().read(), Ok([1, 2]));

        registry.add_string("s", "hi").unwrap();
        registry.delete_value("s").unwrap();
        assert!(!registry.has_value("s").unwrap());
        assert!(registry.get_string("s").unwrap().is_none());
    }

    #[test]
    fn test_add_registers_under_one_type() {
        let registry = Registry::new();
        registry.add_float3("color", [0.1, 0.2, 0.3]).unwrap();

        assert!(registry.has_value("color").unwrap());
        assert_eq!(registry.get_type("color").unwrap(), ValueType::Float3);
        assert_eq!(
            registry.get_float3("color").unwrap().unwrap().read(),
            Ok([0.1, 0.2, 0.3])
        );
        assert_eq!(found_types(&registry, "color"), vec![ValueType::Float3]);
    }

    #[test]
    fn test_each_type_found_only_by_its_own_get() {
        let registry = Registry::new();
        let values = [
            Value::Int(7),
            Value::Int2([1, 2]),
            Value::Int3([1, 2, 3]),
            Value::Int4([1, 2, 3, 4]),
            Value::Float(0.5),
            Value::Float2([0.5, 1.5]),
            Value::Float3([0.5, 1.5, 2.5]),
            Value::Float4([0.5, 1.5, 2.5, 3.5]),
            Value::Bool(true),
            Value::String("text".to_string()),
        ];

        for (i, value) in values.into_iter().enumerate() {
            let name = format!("v{}", i);
            let ty = value.value_type();
            registry.add_value(&name, value.clone()).unwrap();

            assert!(registry.has_value(&name).unwrap());
            assert_eq!(registry.get_type(&name).unwrap(), ty);
            assert_eq!(found_types(&registry, &name), vec![ty]);
            assert_eq!(registry.get_value(&name).unwrap(), Some(value));
        }
    }

    #[test]
    fn test_overwrite_keeps_slot_and_count() {
        let registry = Registry::new();
        let first = registry.add_float("volume", 0.5).unwrap();
        registry.increment_ref("volume").unwrap();

        let second = registry.add_float("volume", 0.75).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(first.read(), Ok(0.75));
        assert_eq!(registry.ref_count("volume").unwrap(), Some(2));

        let a = registry.get_float("volume").unwrap().unwrap();
        let b = registry.get_float("volume").unwrap().unwrap();
        assert!(a.ptr_eq(&b));
        assert!(a.ptr_eq(&first));
    }

    #[test]
    fn test_widgets_share_backing_value() {
        let registry = Registry::new();
        let slider = registry.add_float("gain", 1.0).unwrap();
        let label = registry.get_float("gain").unwrap().unwrap();

        slider.set(2.5).unwrap();
        assert_eq!(label.read(), Ok(2.5));
    }

    #[test]
    fn test_other_names_do_not_move_slots() {
        let registry = Registry::new();
        let handle = registry.add_int("stable", 1).unwrap();
        for i in 0..1000 {
            registry.add_int(&format!("n{}", i), i).unwrap();
        }
        for i in (0..1000).step_by(2) {
            registry.delete_value(&format!("n{}", i)).unwrap();
        }

        let again = registry.get_int("stable").unwrap().unwrap();
        assert!(handle.ptr_eq(&again));
        assert_eq!(handle.read(), Ok(1));
    }

    #[test]
    fn test_ref_counting() {
        let registry = Registry::new();
        registry.add_bool("flag", true).unwrap();
        assert_eq!(registry.ref_count("flag").unwrap(), Some(1));

        assert_eq!(registry.increment_ref("flag").unwrap(), 2);
        assert_eq!(registry.decrement_ref("flag").unwrap(), 1);
        assert_eq!(registry.decrement_ref("flag").unwrap(), 0);

        // zero does not delete, and the count stays at zero
        assert_eq!(registry.decrement_ref("flag").unwrap(), 0);
        assert!(registry.has_value("flag").unwrap());
        assert_eq!(registry.get_bool("flag").unwrap().unwrap().read(), Ok(true));
    }

    #[test]
    fn test_ref_ops_on_unknown_name() {
        let registry = Registry::new();
        let not_registered = RegistryError::NotRegistered("ghost".to_string());
        assert_eq!(registry.increment_ref("ghost"), Err(not_registered.clone()));
        assert_eq!(registry.decrement_ref("ghost"), Err(not_registered.clone()));
        assert_eq!(registry.delete_value("ghost"), Err(not_registered));
        assert!(!registry.has_value("ghost").unwrap());
    }

    #[test]
    fn test_delete_then_recreate() {
        let registry = Registry::new();
        let old = registry.add_int4("rect", [0, 0, 10, 10]).unwrap();
        registry.increment_ref("rect").unwrap();
        registry.delete_value("rect").unwrap();

        assert!(!registry.has_value("rect").unwrap());
        assert_eq!(registry.get_type("rect").unwrap(), ValueType::None);
        assert_eq!(registry.ref_count("rect").unwrap(), None);
        assert_eq!(old.read(), Err(RegistryError::Stale("rect".to_string())));

        let new = registry.add_string("rect", "now a string").unwrap();
        assert_eq!(registry.get_type("rect").unwrap(), ValueType::String);
        assert_eq!(registry.ref_count("rect").unwrap(), Some(1));
        assert_eq!(new.read(), Ok("now a string".to_string()));
        assert!(!old.is_live());
    }

    #[test]
    fn test_type_isolation() {
        let registry = Registry::new();
        registry.add_int("n", 1).unwrap();
        registry.add_string("m", "text").unwrap();

        assert!(registry.get_int("m").unwrap().is_none());
        assert!(registry.get_string("n").unwrap().is_none());
        assert_eq!(registry.get_value("n").unwrap(), Some(Value::Int(1)));
        assert_eq!(
            registry.get_value("m").unwrap(),
            Some(Value::String("text".to_string()))
        );
    }

    #[test]
    fn test_mismatch_rejected_by_default() {
        let registry = Registry::new();
        assert_eq!(registry.mismatch_policy(), MismatchPolicy::Reject);
        let handle = registry.add_int("v", 3).unwrap();

        let err = registry.add_float("v", 3.0).unwrap_err();
        assert_eq!(
            err,
            RegistryError::TypeMismatch {
                name: "v".to_string(),
                expected: ValueType::Float,
                found: ValueType::Int,
            }
        );
        assert_eq!(registry.get_type("v").unwrap(), ValueType::Int);
        assert_eq!(handle.read(), Ok(3));
        assert!(registry.get_float("v").unwrap().is_none());
    }

    #[test]
    fn test_mismatch_replaced_when_configured() {
        let config = RegistryConfig {
            mismatch_policy: MismatchPolicy::Replace,
            ..RegistryConfig::default()
        };
        let registry = Registry::with_config(&config);
        assert_eq!(registry.mismatch_policy(), MismatchPolicy::Replace);
        let old = registry.add_int("v", 3).unwrap();
        registry.increment_ref("v").unwrap();

        let new = registry.add_bool("v", false).unwrap();
        assert_eq!(registry.get_type("v").unwrap(), ValueType::Bool);
        assert_eq!(registry.ref_count("v").unwrap(), Some(1));
        assert!(registry.get_int("v").unwrap().is_none());
        assert!(!old.is_live());
        assert_eq!(new.read(), Ok(false));
    }

    #[test]
    fn test_dynamic_values() {
        let registry = Registry::new();
        registry.add_value("pos", Value::Float2([1.0, 2.0])).unwrap();
        assert_eq!(registry.get_type("pos").unwrap(), ValueType::Float2);
        assert_eq!(registry.get_float2("pos").unwrap().unwrap().read(), Ok([1.0, 2.0]));

        registry.add_value("pos", Value::Float2([3.0, 4.0])).unwrap();
        assert_eq!(registry.get_value("pos").unwrap(), Some(Value::Float2([3.0, 4.0])));

        assert!(registry.add_value("pos", Value::Int(1)).is_err());
    }

    #[test]
    fn test_shared_across_threads() {
        let registry = Arc::new(Registry::new());
        registry.add_int("counter", 0).unwrap();

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry.increment_ref("counter").unwrap();
                    let handle = registry.get_int("counter").unwrap().unwrap();
                    handle.with_mut(|v| *v += 1).unwrap();
                    registry.add_int(&format!("worker{}", i), i).unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(registry.get_int("counter").unwrap().unwrap().read(), Ok(8));
        assert_eq!(registry.ref_count("counter").unwrap(), Some(9));
        for i in 0..8 {
            assert_eq!(registry.get_type(&format!("worker{}", i)).unwrap(), ValueType::Int);
        }
    }

    #[test]
    fn test_handle_closure_adds_while_its_name_is_overwritten() {
        let registry = Arc::new(Registry::new());
        let x = registry.add_int("x", 0).unwrap();
        let barrier = Arc::new(Barrier::new(2));
        let (done_tx, done_rx) = mpsc::channel();

        let holder = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            let done = done_tx.clone();
            thread::spawn(move || {
                x.with(|_| {
                    barrier.wait();
                    thread::sleep(Duration::from_millis(200));
                    registry.add_int("y", 1).unwrap();
                })
                .unwrap();
                done.send(()).unwrap();
            })
        };
        let writer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                barrier.wait();
                registry.add_int("x", 5).unwrap();
                done_tx.send(()).unwrap();
            })
        };

        for _ in 0..2 {
            done_rx
                .recv_timeout(Duration::from_secs(3))
                .expect("registry and slot locks deadlocked");
        }
        holder.join().unwrap();
        writer.join().unwrap();

        assert_eq!(registry.get_int("x").unwrap().unwrap().read(), Ok(5));
        assert_eq!(registry.get_int("y").unwrap().unwrap().read(), Ok(1));
    }

    #[test]
    fn test_handle_closure_adds_while_its_value_is_read() {
        let registry = Arc::new(Registry::new());
        let x = registry.add_float("x", 1.5).unwrap();
        let barrier = Arc::new(Barrier::new(2));
        let (done_tx, done_rx) = mpsc::channel();

        let holder = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            let done = done_tx.clone();
            thread::spawn(move || {
                x.with_mut(|v| {
                    barrier.wait();
                    thread::sleep(Duration::from_millis(200));
                    *v = 2.5;
                    registry.add_bool("y", true).unwrap();
                })
                .unwrap();
                done.send(()).unwrap();
            })
        };
        let reader = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                barrier.wait();
                let value = registry.get_value("x").unwrap();
                done_tx.send(()).unwrap();
                value
            })
        };

        for _ in 0..2 {
            done_rx
                .recv_timeout(Duration::from_secs(3))
                .expect("registry and slot locks deadlocked");
        }
        holder.join().unwrap();
        assert_eq!(reader.join().unwrap(), Some(Value::Float(2.5)));
        assert_eq!(registry.get_value("y").unwrap(), Some(Value::Bool(true)));
    }
}
