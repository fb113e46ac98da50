//! The environment/property-configuration pipeline: cascading property
//! trees and type-specifications into injector bindings (spec.md
//! §4.6-§4.10).

mod config;
mod factory;
mod ordered_map;
mod property;
mod properties;
mod type_spec;
mod uri;

pub use config::{EnvironmentConfiguration, PropertyParser};
pub use properties::EnvironmentProperties;
pub use property::PropertyNode;
pub use type_spec::{group, unique, unique_with_default, value, value_with_default, TypeFactory, TypeRegistry, TypeSpec, ValueKind};
pub use uri::Uri;
