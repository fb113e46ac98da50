//! [`EnvironmentConfiguration`]: the `Configuration` façade over the
//! property/type-specification pipeline (spec.md §4.6).

use crate::configuration::{Configuration, Configurer};
use crate::error::{EnvironmentError, InjectError};
use crate::logging::LoggingSink;

use super::factory::synthesize_bindings;
use super::property::PropertyNode;
use super::type_spec::TypeSpec;
use super::uri::Uri;

/// Reads one property source from its [`Uri`] into a parsed [`PropertyNode`]
/// tree. A defined collaborator seam (spec.md §6): `inject` ships no
/// concrete format parser, so callers bring their own (JSON, a custom DSL,
/// environment variables, ...).
pub trait PropertyParser: Send + Sync {
    fn parse(&self, uri: &Uri) -> Result<PropertyNode, EnvironmentError>;
}

/// A [`Configuration`] that cascades property sources — and, optionally, a
/// type-specification overlay — into the bindings an injector registers
/// (spec.md §4.6-§4.9).
///
/// Sources and type-specifications are cascaded independently, never
/// collapsed into one list (spec.md §9 open question #1): a later property
/// source overrides an earlier one's values, and separately a later
/// type-specification source overrides an earlier one's declared shape.
/// Both cascades, and the synthesis walk that combines them, run once at
/// construction; `configure` only registers the already-resolved bindings.
pub struct EnvironmentConfiguration {
    property: PropertyNode,
    type_spec: Option<TypeSpec>,
}

impl EnvironmentConfiguration {
    /// `type_specs` may be empty: every property then resolves to a
    /// `String` value binding with no overlay at all.
    pub fn new(properties: Vec<PropertyNode>, type_specs: Vec<TypeSpec>) -> Result<Self, EnvironmentError> {
        let property = PropertyNode::cascade(properties);
        let type_spec = if type_specs.is_empty() {
            None
        } else {
            Some(TypeSpec::cascade_roots(type_specs)?)
        };
        Ok(Self { property, type_spec })
    }

    /// Sugar for the common case of no type-specification overlay.
    pub fn from_properties(properties: Vec<PropertyNode>) -> Self {
        Self {
            property: PropertyNode::cascade(properties),
            type_spec: None,
        }
    }

    /// Resolves each `uri` through `parser`, then cascades the results —
    /// the end-to-end path from spec.md §4.6's "locate, parse, cascade"
    /// description.
    pub fn from_sources(uris: &[Uri], parser: &dyn PropertyParser) -> Result<Self, EnvironmentError> {
        let properties = uris
            .iter()
            .map(|uri| parser.parse(uri))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_properties(properties))
    }
}

impl Configuration for EnvironmentConfiguration {
    /// A text→value conversion failure discovered only here (the property's
    /// text wasn't known until synthesis) is still construction-time and
    /// fatal (spec.md §7): it propagates as `InjectError::EnvironmentConfiguration`
    /// rather than being logged and silently dropping the binding.
    fn configure(&self, configurer: &mut Configurer, logging: &dyn LoggingSink) -> Result<(), InjectError> {
        let bindings = synthesize_bindings(&self.property, self.type_spec.as_ref(), logging)?;
        for binding in bindings {
            configurer.bind(binding);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::Container;
    use crate::injector::TypedInjector;
    use crate::logging::GlobalLogSink;

    fn property(pairs: Vec<(&str, &str)>) -> PropertyNode {
        let mut node = PropertyNode::composite();
        if let PropertyNode::Composite(children) = &mut node {
            for (name, text) in pairs {
                children.insert(name, PropertyNode::value(text));
            }
        }
        node
    }

    #[test]
    fn properties_without_a_type_spec_bind_as_strings() {
        let config = EnvironmentConfiguration::from_properties(vec![property(vec![("name", "balau")])]);
        let container = Container::create(vec![Box::new(config)]).unwrap();
        let name: String = container.get_value("name").unwrap();
        assert_eq!(name, "balau");
    }

    #[test]
    fn later_property_source_overrides_an_earlier_one() {
        let config = EnvironmentConfiguration::from_properties(vec![
            property(vec![("name", "first")]),
            property(vec![("name", "second")]),
        ]);
        let container = Container::create(vec![Box::new(config)]).unwrap();
        let name: String = container.get_value("name").unwrap();
        assert_eq!(name, "second");
    }

    #[test]
    fn construction_fails_when_type_spec_sources_disagree_on_shape() {
        use super::super::type_spec::{group, value};

        let first = TypeSpec::cascade([group("db", vec![value::<i32>("port")])]).unwrap();
        let second = TypeSpec::cascade([value::<String>("db")]).unwrap();

        let err = EnvironmentConfiguration::new(Vec::new(), vec![first, second]).unwrap_err();
        assert!(matches!(err, EnvironmentError::IncompatibleTypeSpec { .. }));
    }

    #[test]
    fn a_bad_conversion_fails_configure_rather_than_silently_dropping_the_binding() {
        use super::super::type_spec::value;

        let type_spec = TypeSpec::cascade([value::<i32>("port")]).unwrap();
        let config = EnvironmentConfiguration::new(vec![property(vec![("port", "not-a-number")])], vec![type_spec]).unwrap();

        let mut configurer = Configurer::new();
        let err = config.configure(&mut configurer, &GlobalLogSink).unwrap_err();
        assert!(matches!(err, InjectError::EnvironmentConfiguration { .. }));
    }

    #[test]
    fn a_bad_conversion_aborts_injector_creation() {
        use super::super::type_spec::value;

        let type_spec = TypeSpec::cascade([value::<i32>("port")]).unwrap();
        let config = EnvironmentConfiguration::new(vec![property(vec![("port", "not-a-number")])], vec![type_spec]).unwrap();

        let err = Container::create(vec![Box::new(config)]).unwrap_err();
        assert!(matches!(err, InjectError::EnvironmentConfiguration { .. }));
    }
}
