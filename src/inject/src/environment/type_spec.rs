//! Type-specification trees: what a property *should* convert to, and its
//! default when the property tree doesn't name it (spec.md §4.8).
//!
//! Built two ways: parsed type-specification sources resolve a textual
//! type identifier against a [`TypeRegistry`]; the standalone builder DSL
//! (`group`/`value`/`unique`, spec.md §3 supplement, grounded on
//! `EnvironmentConfigurationBuilderUtils` in `original_source/`) captures
//! the Rust type directly, with no registry lookup at all.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::binding::{Binding, ClonedUniqueBinding, PrototypeValueBinding};
use crate::error::EnvironmentError;
use crate::injectable::FromPropertyString;
use crate::key::{BindingKey, MetaType};

use super::ordered_map::OrderedMap;
use super::properties::EnvironmentProperties;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Value,
    Unique,
}

impl ValueKind {
    fn meta_type(self) -> MetaType {
        match self {
            ValueKind::Value => MetaType::Value,
            ValueKind::Unique => MetaType::Unique,
        }
    }
}

/// Builds the [`Binding`] a leaf type-specification resolves to, erasing
/// the concrete `T` behind a trait object so parsed and hand-built specs
/// share one representation. The key is built internally (from the erased
/// factory's own `T`) so a caller that has only `Arc<dyn TypeFactory>`
/// never needs to name `T` itself.
pub trait TypeFactory: Send + Sync {
    /// Builds the top-level [`Binding`] this leaf resolves to.
    fn build(&self, kind: ValueKind, name: &str, text: &str) -> Result<Box<dyn Binding>, EnvironmentError>;

    /// Resolves this leaf directly into a nested [`EnvironmentProperties`]
    /// scope, with no `Binding`/injector indirection needed.
    fn insert_into(
        &self,
        kind: ValueKind,
        name: &str,
        text: &str,
        properties: &mut EnvironmentProperties,
    ) -> Result<(), EnvironmentError>;
}

struct TypedFactory<T>(PhantomData<T>);

impl<T> TypedFactory<T> {
    fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: FromPropertyString + Debug> TypedFactory<T> {
    fn convert(&self, name: &str, type_name: &'static str, text: &str) -> Result<T, EnvironmentError> {
        T::from_property_string(text).map_err(|err| EnvironmentError::Conversion {
            name: name.to_string(),
            type_name,
            text: err.0,
        })
    }
}

impl<T: FromPropertyString + Debug> TypeFactory for TypedFactory<T> {
    fn build(&self, kind: ValueKind, name: &str, text: &str) -> Result<Box<dyn Binding>, EnvironmentError> {
        let value = self.convert(name, std::any::type_name::<T>(), text)?;
        let key = BindingKey::new::<T>(kind.meta_type(), name);
        Ok(match kind {
            ValueKind::Value => Box::new(PrototypeValueBinding::new(key, value)),
            ValueKind::Unique => Box::new(ClonedUniqueBinding::new(key, value)),
        })
    }

    fn insert_into(
        &self,
        kind: ValueKind,
        name: &str,
        text: &str,
        properties: &mut EnvironmentProperties,
    ) -> Result<(), EnvironmentError> {
        let value = self.convert(name, std::any::type_name::<T>(), text)?;
        match kind {
            ValueKind::Value => properties.insert_value::<T>(name, value),
            ValueKind::Unique => properties.insert_unique::<T>(name, value),
        }
        Ok(())
    }
}

#[derive(Clone)]
pub enum TypeSpec {
    Leaf {
        factory: Arc<dyn TypeFactory>,
        kind: ValueKind,
        default: Option<String>,
    },
    Composite(OrderedMap<TypeSpec>),
}

impl TypeSpec {
    pub fn as_composite(&self) -> Option<&OrderedMap<TypeSpec>> {
        match self {
            TypeSpec::Composite(children) => Some(children),
            TypeSpec::Leaf { .. } => None,
        }
    }

    /// Folds `sources` into one tree. A name that is a value in one source
    /// and a composite in another is rejected (spec.md §4.8); otherwise a
    /// later source's leaf (factory, kind, default) replaces an earlier
    /// one's and composites merge child-by-child.
    pub fn cascade(sources: impl IntoIterator<Item = (String, TypeSpec)>) -> Result<TypeSpec, EnvironmentError> {
        let mut result = OrderedMap::new();
        for (name, spec) in sources {
            Self::merge_into(&mut result, name, spec)?;
        }
        Ok(TypeSpec::Composite(result))
    }

    /// Folds whole root trees together, later sources taking priority —
    /// the tree-level counterpart of `PropertyNode::cascade`, used when
    /// each type-specification source is already a complete tree rather
    /// than a single DSL-built `(name, TypeSpec)` pair.
    pub fn cascade_roots(sources: impl IntoIterator<Item = TypeSpec>) -> Result<TypeSpec, EnvironmentError> {
        let mut result = OrderedMap::new();
        for source in sources {
            if let TypeSpec::Composite(children) = source {
                for (name, child) in children.iter() {
                    Self::merge_into(&mut result, name.to_string(), child.clone())?;
                }
            }
        }
        Ok(TypeSpec::Composite(result))
    }

    fn merge_into(base: &mut OrderedMap<TypeSpec>, name: String, incoming: TypeSpec) -> Result<(), EnvironmentError> {
        match base.get_mut(&name) {
            None => {
                base.insert(name, incoming);
                Ok(())
            }
            Some(TypeSpec::Leaf { .. }) if matches!(incoming, TypeSpec::Composite(_)) => {
                Err(EnvironmentError::IncompatibleTypeSpec { name })
            }
            Some(TypeSpec::Composite(_)) if matches!(incoming, TypeSpec::Leaf { .. }) => {
                Err(EnvironmentError::IncompatibleTypeSpec { name })
            }
            Some(TypeSpec::Composite(existing)) => {
                let TypeSpec::Composite(incoming_children) = incoming else {
                    unreachable!("checked above");
                };
                for (child_name, child) in incoming_children.iter() {
                    Self::merge_into(existing, child_name.to_string(), child.clone())?;
                }
                Ok(())
            }
            Some(slot @ TypeSpec::Leaf { .. }) => {
                *slot = incoming;
                Ok(())
            }
        }
    }
}

/// `group(name, children)` from the standalone builder DSL.
pub fn group(name: impl Into<String>, children: Vec<(String, TypeSpec)>) -> (String, TypeSpec) {
    (name.into(), TypeSpec::Composite(children.into_iter().collect()))
}

/// `value::<T>(name)`, with no default: the property must be present.
pub fn value<T: FromPropertyString + Debug>(name: impl Into<String>) -> (String, TypeSpec) {
    (
        name.into(),
        TypeSpec::Leaf {
            factory: Arc::new(TypedFactory::<T>::new()),
            kind: ValueKind::Value,
            default: None,
        },
    )
}

/// `value::<T>(name, default)`: used when the property is absent.
pub fn value_with_default<T: FromPropertyString + Debug>(
    name: impl Into<String>,
    default: impl Into<String>,
) -> (String, TypeSpec) {
    (
        name.into(),
        TypeSpec::Leaf {
            factory: Arc::new(TypedFactory::<T>::new()),
            kind: ValueKind::Value,
            default: Some(default.into()),
        },
    )
}

/// `unique::<T>(name)`: each query clones a fresh boxed instance.
pub fn unique<T: FromPropertyString + Debug>(name: impl Into<String>) -> (String, TypeSpec) {
    (
        name.into(),
        TypeSpec::Leaf {
            factory: Arc::new(TypedFactory::<T>::new()),
            kind: ValueKind::Unique,
            default: None,
        },
    )
}

pub fn unique_with_default<T: FromPropertyString + Debug>(
    name: impl Into<String>,
    default: impl Into<String>,
) -> (String, TypeSpec) {
    (
        name.into(),
        TypeSpec::Leaf {
            factory: Arc::new(TypedFactory::<T>::new()),
            kind: ValueKind::Unique,
            default: Some(default.into()),
        },
    )
}

/// Resolves textual type-specification sources (the registry-driven half
/// of §4.8). `"int"`, `"int = 0"`, `"db"` (a bare composite name whose
/// children are the node's own composite) follow the same leaf grammar
/// the property parser would hand back as a `PropertyNode` tree.
pub struct TypeRegistry {
    factories: std::collections::HashMap<String, Arc<dyn TypeFactory>>,
}

impl TypeRegistry {
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            factories: std::collections::HashMap::new(),
        };
        registry.register::<i8>("byte");
        registry.register::<i16>("short");
        registry.register::<i32>("int");
        registry.register::<i64>("long");
        registry.register::<f32>("float");
        registry.register::<f64>("double");
        registry.register::<String>("string");
        registry.register::<char>("char");
        registry.register::<bool>("boolean");
        registry.register::<super::uri::Uri>("uri");
        registry
    }

    pub fn register<T: FromPropertyString + Debug>(&mut self, identifier: impl Into<String>) {
        self.factories
            .insert(identifier.into(), Arc::new(TypedFactory::<T>::new()));
    }

    /// Parses a leaf's text (`"<identifier>"` or `"<identifier> = <default>"`)
    /// into a [`TypeSpec::Leaf`], always [`ValueKind::Value`] — the textual
    /// grammar has no unique/value marker; that distinction is the builder
    /// DSL's alone.
    pub fn parse_leaf(&self, name: &str, text: &str) -> Result<TypeSpec, EnvironmentError> {
        let (identifier, default) = match text.split_once('=') {
            Some((identifier, default)) => (identifier.trim(), Some(default.trim().to_string())),
            None => (text.trim(), None),
        };
        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| EnvironmentError::UnknownType {
                name: name.to_string(),
                type_name: identifier.to_string(),
            })?;
        Ok(TypeSpec::Leaf {
            factory: Arc::clone(factory),
            kind: ValueKind::Value,
            default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incompatible_shapes_across_sources_are_rejected() {
        let first = group("db", vec![value::<i32>("port")]);
        let second = value::<String>("db");

        let err = TypeSpec::cascade([first, second]).unwrap_err();
        assert!(matches!(err, EnvironmentError::IncompatibleTypeSpec { name } if name == "db"));
    }

    #[test]
    fn registry_parses_default_tail() {
        let registry = TypeRegistry::with_builtins();
        let spec = registry.parse_leaf("port", "int = 8080").unwrap();
        match spec {
            TypeSpec::Leaf { default, .. } => assert_eq!(default.as_deref(), Some("8080")),
            _ => panic!("expected a leaf"),
        }
    }

    #[test]
    fn registry_rejects_unknown_identifier() {
        let registry = TypeRegistry::with_builtins();
        let err = registry.parse_leaf("port", "imaginary").unwrap_err();
        assert!(matches!(err, EnvironmentError::UnknownType { .. }));
    }
}
