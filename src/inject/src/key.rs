//! Binding keys: the `(meta-type, type identity, name)` triple that
//! identifies every binding in the registry.

use std::any::{self, TypeId};
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// The ownership contract a query returns to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaType {
    Value,
    Unique,
    Reference,
    Shared,
}

impl Display for MetaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Value => "value",
            Self::Unique => "unique",
            Self::Reference => "reference",
            Self::Shared => "shared",
        };
        f.write_str(name)
    }
}

/// Identifies a binding by `(meta-type, type, name)`.
///
/// A key constructed with [`BindingKey::weak`] has no meta-type yet; it is
/// assigned one (via [`BindingKey::with_meta_type`] or
/// [`BindingKey::promote`]) before the key is used to index any map. Two
/// keys that differ only in meta-type are different keys: this is what lets
/// a single user type carry both a `Value` and a `Shared` binding at once.
#[derive(Clone)]
pub struct BindingKey {
    meta_type: Option<MetaType>,
    type_id: TypeId,
    type_name: &'static str,
    name: String,
}

impl BindingKey {
    /// A key with no meta-type assigned yet.
    pub fn weak<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            meta_type: None,
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
            name: name.into(),
        }
    }

    /// A fully-qualified key, ready for map insertion or lookup.
    pub fn new<T: 'static>(meta_type: MetaType, name: impl Into<String>) -> Self {
        Self {
            meta_type: Some(meta_type),
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
            name: name.into(),
        }
    }

    pub fn meta_type(&self) -> Option<MetaType> {
        self.meta_type
    }

    pub fn is_weak(&self) -> bool {
        self.meta_type.is_none()
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Assigns a meta-type in place, completing a weak key.
    pub fn assign_meta_type(&mut self, meta_type: MetaType) {
        self.meta_type = Some(meta_type);
    }

    /// Returns a copy of this key promoted to `meta_type`. Used by the
    /// injector when a `Value`/`Unique`/`Reference` dependency is actually
    /// satisfied by a `Shared` binding.
    pub fn promoted(&self, meta_type: MetaType) -> Self {
        Self {
            meta_type: Some(meta_type),
            ..self.clone()
        }
    }
}

impl PartialEq for BindingKey {
    fn eq(&self, other: &Self) -> bool {
        self.meta_type == other.meta_type && self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for BindingKey {}

impl Hash for BindingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.meta_type.hash(state);
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl Debug for BindingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingKey")
            .field("meta_type", &self.meta_type)
            .field("type", &self.type_name)
            .field("name", &self.name)
            .finish()
    }
}

impl Display for BindingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let meta = self
            .meta_type
            .map(|mt| mt.to_string())
            .unwrap_or_else(|| "weak".to_string());
        if self.name.is_empty() {
            write!(f, "{meta} {}", self.type_name)
        } else {
            write!(f, "{meta} {} \"{}\"", self.type_name, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_identical_fields_are_equal_and_hash_equal() {
        use std::collections::hash_map::DefaultHasher;

        let a = BindingKey::new::<i32>(MetaType::Value, "n");
        let b = BindingKey::new::<i32>(MetaType::Value, "n");
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn keys_differing_in_any_field_are_not_equal() {
        let value = BindingKey::new::<i32>(MetaType::Value, "n");
        let shared = BindingKey::new::<i32>(MetaType::Shared, "n");
        assert_ne!(value, shared);

        let other_name = BindingKey::new::<i32>(MetaType::Value, "m");
        assert_ne!(value, other_name);

        let other_type = BindingKey::new::<i64>(MetaType::Value, "n");
        assert_ne!(value, other_type);
    }

    #[test]
    fn promoted_key_changes_only_meta_type() {
        let weak = BindingKey::weak::<i32>("n");
        let promoted = weak.promoted(MetaType::Shared);
        assert_eq!(promoted.meta_type(), Some(MetaType::Shared));
        assert_eq!(promoted.name(), "n");
        assert_eq!(promoted.type_id(), TypeId::of::<i32>());
    }
}
