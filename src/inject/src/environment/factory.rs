//! Builder synthesis: walks a cascaded property tree against an optional
//! cascaded type-specification tree, producing the top-level bindings an
//! `EnvironmentConfiguration` registers and the nested [`EnvironmentProperties`]
//! scopes composites resolve to (spec.md §4.9).

use std::sync::Arc;

use log::Level;

use crate::binding::Binding;
use crate::builder::BindingBuilder;
use crate::error::EnvironmentError;
use crate::logging::{log_if_enabled, LoggingSink};

use super::ordered_map::OrderedMap;
use super::properties::EnvironmentProperties;
use super::property::PropertyNode;
use super::type_spec::{TypeFactory, TypeSpec, ValueKind};

enum ResolvedChild<'a> {
    Leaf {
        factory: Option<&'a Arc<dyn TypeFactory>>,
        kind: ValueKind,
        text: String,
    },
    Composite {
        property_children: Option<&'a OrderedMap<PropertyNode>>,
        spec_children: Option<&'a OrderedMap<TypeSpec>>,
    },
    Absent,
}

/// Decides what one name in the tree resolves to, warning (not failing)
/// when the property tree and the type-specification disagree on shape
/// (spec.md §4.8's documented default: the property tree wins, the
/// type-specification is treated as absent for the mismatched subtree).
fn resolve_child<'a>(
    name: &str,
    property_child: Option<&'a PropertyNode>,
    spec_child: Option<&'a TypeSpec>,
    logging: &dyn LoggingSink,
) -> ResolvedChild<'a> {
    match (property_child, spec_child) {
        (Some(PropertyNode::Value(text)), Some(TypeSpec::Leaf { factory, kind, .. })) => ResolvedChild::Leaf {
            factory: Some(factory),
            kind: *kind,
            text: text.clone(),
        },
        (Some(PropertyNode::Value(text)), Some(TypeSpec::Composite(_))) => {
            log_if_enabled(logging, Level::Warn, || {
                format!(
                    "property \"{name}\" is declared as a composite type but the property tree \
                     gives it a plain value; treating it as a plain string"
                )
            });
            ResolvedChild::Leaf {
                factory: None,
                kind: ValueKind::Value,
                text: text.clone(),
            }
        }
        (Some(PropertyNode::Composite(children)), Some(TypeSpec::Leaf { .. })) => {
            log_if_enabled(logging, Level::Warn, || {
                format!(
                    "property \"{name}\" is declared as a plain value type but the property tree \
                     gives it children; treating it as a composite of strings"
                )
            });
            ResolvedChild::Composite {
                property_children: Some(children),
                spec_children: None,
            }
        }
        (Some(PropertyNode::Composite(children)), Some(TypeSpec::Composite(spec_children))) => {
            ResolvedChild::Composite {
                property_children: Some(children),
                spec_children: Some(spec_children),
            }
        }
        (Some(PropertyNode::Composite(children)), None) => ResolvedChild::Composite {
            property_children: Some(children),
            spec_children: None,
        },
        (Some(PropertyNode::Value(text)), None) => ResolvedChild::Leaf {
            factory: None,
            kind: ValueKind::Value,
            text: text.clone(),
        },
        (None, Some(TypeSpec::Leaf { factory, kind, default })) => match default {
            Some(default_text) => ResolvedChild::Leaf {
                factory: Some(factory),
                kind: *kind,
                text: default_text.clone(),
            },
            None => ResolvedChild::Absent,
        },
        (None, Some(TypeSpec::Composite(spec_children))) => ResolvedChild::Composite {
            property_children: None,
            spec_children: Some(spec_children),
        },
        (None, None) => ResolvedChild::Absent,
    }
}

fn union_names(
    property_children: Option<&OrderedMap<PropertyNode>>,
    spec_children: Option<&OrderedMap<TypeSpec>>,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    if let Some(children) = property_children {
        names.extend(children.keys().map(str::to_string));
    }
    if let Some(children) = spec_children {
        for name in children.keys() {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

fn build_leaf_binding(
    name: &str,
    factory: Option<&Arc<dyn TypeFactory>>,
    kind: ValueKind,
    text: &str,
) -> Result<Box<dyn Binding>, EnvironmentError> {
    match factory {
        Some(factory) => factory.build(kind, name, text),
        None => Ok(BindingBuilder::<String>::new(name)
            .to_prototype(text.to_string())
            .build()
            .expect("to_prototype always finalises a binding")),
    }
}

fn build_composite_binding(name: &str, nested: EnvironmentProperties) -> Box<dyn Binding> {
    BindingBuilder::<EnvironmentProperties>::new(name)
        .to_provided_singleton(Arc::new(nested))
        .build()
        .expect("to_provided_singleton always finalises a binding")
}

/// Recursively resolves one composite level into an [`EnvironmentProperties`]
/// scope, with no `Binding`/injector indirection: every entry is already a
/// concrete value by the time this returns.
fn build_properties(
    property_children: Option<&OrderedMap<PropertyNode>>,
    spec_children: Option<&OrderedMap<TypeSpec>>,
    logging: &dyn LoggingSink,
) -> Result<EnvironmentProperties, EnvironmentError> {
    let mut properties = EnvironmentProperties::new();
    for name in union_names(property_children, spec_children) {
        let resolved = resolve_child(
            &name,
            property_children.and_then(|children| children.get(&name)),
            spec_children.and_then(|children| children.get(&name)),
            logging,
        );
        match resolved {
            ResolvedChild::Leaf { factory, kind, text } => match factory {
                Some(factory) => factory.insert_into(kind, &name, &text, &mut properties)?,
                None => properties.insert_value::<String>(&name, text),
            },
            ResolvedChild::Composite {
                property_children,
                spec_children,
            } => {
                let nested = build_properties(property_children, spec_children, logging)?;
                if !nested.is_empty() {
                    properties.insert_composite(&name, nested);
                }
            }
            ResolvedChild::Absent => {}
        }
    }
    Ok(properties)
}

/// Walks the root of the cascaded trees, producing the flat list of
/// top-level bindings an `EnvironmentConfiguration` registers into a
/// [`crate::configuration::Configurer`] (spec.md §4.9's outer pass). A
/// composite whose recursive walk yields no entries at all is dropped
/// rather than bound as an empty group.
pub fn synthesize_bindings(
    property: &PropertyNode,
    spec: Option<&TypeSpec>,
    logging: &dyn LoggingSink,
) -> Result<Vec<Box<dyn Binding>>, EnvironmentError> {
    let property_children = property.as_composite();
    let spec_children = spec.and_then(TypeSpec::as_composite);

    let mut bindings = Vec::new();
    for name in union_names(property_children, spec_children) {
        let resolved = resolve_child(
            &name,
            property_children.and_then(|children| children.get(&name)),
            spec_children.and_then(|children| children.get(&name)),
            logging,
        );
        match resolved {
            ResolvedChild::Leaf { factory, kind, text } => {
                bindings.push(build_leaf_binding(&name, factory, kind, &text)?);
            }
            ResolvedChild::Composite {
                property_children,
                spec_children,
            } => {
                let nested = build_properties(property_children, spec_children, logging)?;
                if !nested.is_empty() {
                    bindings.push(build_composite_binding(&name, nested));
                }
            }
            ResolvedChild::Absent => {}
        }
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::MetaType;
    use crate::logging::GlobalLogSink;

    fn leaf(text: &str) -> PropertyNode {
        PropertyNode::value(text)
    }

    fn composite(children: Vec<(&str, PropertyNode)>) -> PropertyNode {
        let mut node = PropertyNode::composite();
        if let PropertyNode::Composite(map) = &mut node {
            for (name, child) in children {
                map.insert(name, child);
            }
        }
        node
    }

    #[test]
    fn simple_property_with_matching_factory_becomes_a_typed_binding() {
        let property = composite(vec![("port", leaf("8080"))]);
        let spec = TypeSpec::cascade([super::super::type_spec::value::<i32>("port")]).unwrap();

        let bindings = synthesize_bindings(&property, Some(&spec), &GlobalLogSink).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].final_key().type_id(), std::any::TypeId::of::<i32>());
        assert_eq!(bindings[0].final_key().meta_type(), Some(MetaType::Value));
    }

    #[test]
    fn simple_property_without_factory_becomes_a_string_binding() {
        let property = composite(vec![("name", leaf("balau"))]);

        let bindings = synthesize_bindings(&property, None, &GlobalLogSink).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].final_key().type_id(), std::any::TypeId::of::<String>());
    }

    #[test]
    fn composite_without_factory_defaults_descendants_to_string() {
        let property = composite(vec![("db", composite(vec![("host", leaf("localhost"))]))]);

        let bindings = synthesize_bindings(&property, None, &GlobalLogSink).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(
            bindings[0].final_key().type_id(),
            std::any::TypeId::of::<EnvironmentProperties>()
        );
    }

    #[test]
    fn default_emits_a_binding_even_when_the_property_is_entirely_absent() {
        let property = PropertyNode::composite();
        let spec = TypeSpec::cascade([super::super::type_spec::value_with_default::<i32>("retries", "3")]).unwrap();

        let bindings = synthesize_bindings(&property, Some(&spec), &GlobalLogSink).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].final_key().name(), "retries");
    }

    #[test]
    fn leaf_without_default_and_without_property_emits_nothing() {
        let property = PropertyNode::composite();
        let spec = TypeSpec::cascade([super::super::type_spec::value::<i32>("retries")]).unwrap();

        let bindings = synthesize_bindings(&property, Some(&spec), &GlobalLogSink).unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    fn mismatched_shape_falls_back_without_failing() {
        let property = composite(vec![("db", leaf("not-a-composite"))]);
        let spec = TypeSpec::cascade([super::super::type_spec::group("db", vec![super::super::type_spec::value::<i32>("port")])]).unwrap();

        let bindings = synthesize_bindings(&property, Some(&spec), &GlobalLogSink).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].final_key().type_id(), std::any::TypeId::of::<String>());
    }

    #[test]
    fn nested_composite_is_queryable_after_synthesis() {
        let property = composite(vec![("db", composite(vec![("port", leaf("5432"))]))]);
        let spec = TypeSpec::cascade([super::super::type_spec::group(
            "db",
            vec![super::super::type_spec::value::<i32>("port")],
        )])
        .unwrap();

        let bindings = synthesize_bindings(&property, Some(&spec), &GlobalLogSink).unwrap();
        assert_eq!(bindings.len(), 1);

        // A provided-singleton binding never touches its `injector` argument
        // (every entry was already resolved during synthesis), so a
        // placeholder that panics if called is enough to exercise it.
        struct UnusedInjector;
        impl crate::injector::Injector for UnusedInjector {
            fn dyn_get_value(
                &self,
                _key: &crate::key::BindingKey,
            ) -> Result<Box<dyn crate::managed::Managed>, crate::error::InjectError> {
                unreachable!("not called")
            }
            fn dyn_get_unique(
                &self,
                _key: &crate::key::BindingKey,
            ) -> Result<Box<dyn crate::managed::Managed>, crate::error::InjectError> {
                unreachable!("not called")
            }
            fn dyn_get_reference(
                &self,
                _key: &crate::key::BindingKey,
            ) -> Result<std::sync::Arc<dyn std::any::Any + Send + Sync>, crate::error::InjectError> {
                unreachable!("not called")
            }
            fn dyn_get_shared(
                &self,
                _key: &crate::key::BindingKey,
            ) -> Result<std::sync::Arc<dyn std::any::Any + Send + Sync>, crate::error::InjectError> {
                unreachable!("not called")
            }
        }

        let produced = bindings[0].produce(&UnusedInjector);
        match produced {
            Ok(crate::binding::Produced::Shared(shared)) => {
                let props = shared
                    .downcast::<EnvironmentProperties>()
                    .unwrap_or_else(|_| panic!("expected an EnvironmentProperties instance"));
                assert_eq!(props.get_value::<i32>("port", None).unwrap(), 5432);
            }
            _ => panic!("expected a shared EnvironmentProperties binding"),
        }
    }

    #[test]
    fn uri_conversion_round_trips_through_the_registry() {
        use super::super::type_spec::TypeRegistry;
        use super::super::uri::Uri;

        let registry = TypeRegistry::with_builtins();
        let spec = registry.parse_leaf("config", "uri").unwrap();
        let mut props = EnvironmentProperties::new();
        if let TypeSpec::Leaf { factory, kind, .. } = &spec {
            factory.insert_into(*kind, "config", "./app.conf", &mut props).unwrap();
        }
        assert!(props.has_value::<Uri>("config"));
    }
}
