//! The shared namespace fixtures and tests use to hand values to each other.
//!
//! Every root group gets a fresh [`Context`] when the executor enters it.
//! Setups store values, descendant setups, tests and teardowns read or mutate
//! them. The context is passed explicitly as `&mut Context`, so there is no
//! global state and two trees can never see each other's values.

use std::{
    any::{Any, type_name},
    borrow::Cow,
    collections::HashMap,
    fmt::Debug,
};

use thiserror::Error;

/// Error returned when a required namespace value is missing or has another type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ContextError {
    #[error("no value named {key:?} in the group context")]
    Missing { key: String },

    #[error("value {key:?} is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

#[derive(Default)]
pub struct Context {
    values: HashMap<Cow<'static, str>, Box<dyn Any>>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Context").field("keys", &keys).finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, returning the previous value if it had the same type.
    pub fn set<T: Any>(&mut self, key: impl Into<Cow<'static, str>>, value: T) -> Option<T> {
        self.values
            .insert(key.into(), Box::new(value))?
            .downcast()
            .ok()
            .map(|b| *b)
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut()
    }

    /// Like [`get`](Self::get), but explains what went wrong.
    pub fn require<T: Any>(&self, key: &str) -> Result<&T, ContextError> {
        self.values
            .get(key)
            .ok_or_else(|| ContextError::Missing { key: key.into() })?
            .downcast_ref()
            .ok_or_else(|| ContextError::TypeMismatch {
                key: key.into(),
                expected: type_name::<T>(),
            })
    }

    pub fn require_mut<T: Any>(&mut self, key: &str) -> Result<&mut T, ContextError> {
        self.values
            .get_mut(key)
            .ok_or_else(|| ContextError::Missing { key: key.into() })?
            .downcast_mut()
            .ok_or_else(|| ContextError::TypeMismatch {
                key: key.into(),
                expected: type_name::<T>(),
            })
    }

    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        self.values.remove(key)?.downcast().ok().map(|b| *b)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip_by_type() {
        let mut ctx = Context::new();
        assert_eq!(ctx.set("value", 1_i32), None);
        *ctx.get_mut::<i32>("value").unwrap() += 2;
        assert_eq!(ctx.get::<i32>("value"), Some(&3));
        assert_eq!(ctx.get::<u8>("value"), None);
        assert_eq!(ctx.set("value", 7_i32), Some(3));
    }

    #[test]
    fn require_explains_failures() {
        let mut ctx = Context::new();
        ctx.set("name", String::from("grove"));

        assert_eq!(
            ctx.require::<i32>("missing"),
            Err(ContextError::Missing {
                key: "missing".into()
            })
        );
        assert!(matches!(
            ctx.require::<i32>("name"),
            Err(ContextError::TypeMismatch { .. })
        ));
        assert_eq!(ctx.require::<String>("name").unwrap(), "grove");
    }

    #[test]
    fn remove_takes_ownership() {
        let mut ctx = Context::new();
        ctx.set("list", vec![1, 2, 3]);
        assert!(ctx.contains("list"));
        assert_eq!(ctx.remove::<Vec<i32>>("list"), Some(vec![1, 2, 3]));
        assert!(ctx.is_empty());
    }
}
