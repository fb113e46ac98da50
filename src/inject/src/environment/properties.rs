//! [`EnvironmentProperties`]: the scoped, queryable result of walking one
//! composite level of the cascaded property tree (spec.md §4.10).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::InjectError;
use crate::key::{BindingKey, MetaType};
use crate::managed::Managed;
use crate::util::any::{AsAny, Downcast};

enum Entry {
    Value(Box<dyn Managed>),
    /// Rebuilds a fresh boxed instance on every `get_unique` call, the
    /// same "clone the prototype" contract [`crate::binding::ClonedUniqueBinding`]
    /// gives a sealed injector.
    UniqueFactory(Box<dyn Fn() -> Box<dyn Managed> + Send + Sync>),
    Composite(Arc<EnvironmentProperties>),
}

/// Backed by a `BindingKey → Entry` map scoped to one tree level, the way
/// a sealed injector is backed by `BindingKey → Binding` — but every entry
/// here was already resolved during builder synthesis, so lookups never
/// need to thread an `&dyn Injector` through a construction call that
/// could never use it.
pub struct EnvironmentProperties {
    entries: HashMap<BindingKey, Entry>,
    child_order: Vec<String>,
}

impl fmt::Debug for EnvironmentProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentProperties")
            .field("children", &self.child_order)
            .finish_non_exhaustive()
    }
}

impl Default for EnvironmentProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentProperties {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            child_order: Vec::new(),
        }
    }

    fn note_child(&mut self, name: &str) {
        if !self.child_order.iter().any(|n| n == name) {
            self.child_order.push(name.to_string());
        }
    }

    pub(crate) fn insert_value<T: Managed>(&mut self, name: &str, value: T) {
        self.note_child(name);
        self.entries
            .insert(BindingKey::new::<T>(MetaType::Value, name), Entry::Value(Box::new(value)));
    }

    pub(crate) fn insert_unique<T: Managed + Clone>(&mut self, name: &str, prototype: T) {
        self.note_child(name);
        let factory = move || -> Box<dyn Managed> { Box::new(prototype.clone()) };
        self.entries.insert(
            BindingKey::new::<T>(MetaType::Unique, name),
            Entry::UniqueFactory(Box::new(factory)),
        );
    }

    pub(crate) fn insert_composite(&mut self, name: &str, composite: EnvironmentProperties) {
        self.note_child(name);
        self.entries.insert(
            BindingKey::new::<EnvironmentProperties>(MetaType::Shared, name),
            Entry::Composite(Arc::new(composite)),
        );
    }

    pub fn has_value<T: Managed>(&self, name: &str) -> bool {
        self.entries.contains_key(&BindingKey::new::<T>(MetaType::Value, name))
    }

    pub fn get_value<T: Managed + Clone>(&self, name: &str, default: Option<T>) -> Result<T, InjectError> {
        let key = BindingKey::new::<T>(MetaType::Value, name);
        match self.entries.get(&key) {
            Some(Entry::Value(value)) => Ok(value
                .as_any()
                .downcast_ref::<T>()
                .expect("entry stored under its own type's key")
                .clone()),
            _ => default.ok_or(InjectError::NoBinding { key }),
        }
    }

    pub fn has_unique<T: Managed>(&self, name: &str) -> bool {
        self.entries.contains_key(&BindingKey::new::<T>(MetaType::Unique, name))
    }

    pub fn get_unique<T: Managed>(&self, name: &str, default: Option<Box<T>>) -> Result<Box<T>, InjectError> {
        let key = BindingKey::new::<T>(MetaType::Unique, name);
        match self.entries.get(&key) {
            Some(Entry::UniqueFactory(factory)) => Ok(factory()
                .downcast::<T>()
                .unwrap_or_else(|_| unreachable!("entry stored under its own type's key"))),
            _ => default.ok_or(InjectError::NoBinding { key }),
        }
    }

    pub fn has_composite(&self, name: &str) -> bool {
        self.entries
            .contains_key(&BindingKey::new::<EnvironmentProperties>(MetaType::Shared, name))
    }

    pub fn get_composite(&self, name: &str) -> Result<Arc<EnvironmentProperties>, InjectError> {
        let key = BindingKey::new::<EnvironmentProperties>(MetaType::Shared, name);
        match self.entries.get(&key) {
            Some(Entry::Composite(composite)) => Ok(Arc::clone(composite)),
            _ => Err(InjectError::NoBinding { key }),
        }
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.child_order.iter().map(|name| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_lookup_round_trips_and_falls_back_to_default() {
        let mut props = EnvironmentProperties::new();
        props.insert_value::<i32>("port", 8080);

        assert_eq!(props.get_value::<i32>("port", None).unwrap(), 8080);
        assert_eq!(props.get_value::<i32>("missing", Some(1)).unwrap(), 1);
        assert!(props.get_value::<i32>("missing", None).is_err());
    }

    #[test]
    fn unique_lookup_yields_a_fresh_clone_each_time() {
        let mut props = EnvironmentProperties::new();
        props.insert_unique::<String>("name", "balau".to_string());

        let a = props.get_unique::<String>("name", None).unwrap();
        let b = props.get_unique::<String>("name", None).unwrap();
        assert_eq!(*a, "balau");
        assert_eq!(*b, "balau");
    }

    #[test]
    fn composite_nesting_and_child_order_are_preserved() {
        let mut child = EnvironmentProperties::new();
        child.insert_value::<i32>("port", 5432);

        let mut root = EnvironmentProperties::new();
        root.insert_value::<i32>("timeout", 30);
        root.insert_composite("db", child);

        assert_eq!(root.child_names().collect::<Vec<_>>(), vec!["timeout", "db"]);
        assert!(root.has_composite("db"));
        assert_eq!(root.get_composite("db").unwrap().get_value::<i32>("port", None).unwrap(), 5432);
    }
}
