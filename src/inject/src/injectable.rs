//! Collaborator contracts the core consumes but does not implement:
//! the injectable-class contract, string conversion, and URIs
//! (spec.md §6).

use std::fmt;

use crate::error::InjectError;
use crate::injector::Injector;
use crate::key::BindingKey;
use crate::managed::Managed;

/// Threaded through every construction call so a binding can render
/// diagnostics naming the key currently being built.
#[derive(Debug, Clone)]
pub struct CallContext {
    key: BindingKey,
}

impl CallContext {
    pub fn new(key: BindingKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &BindingKey {
        &self.key
    }
}

/// The injectable-class contract (spec.md §6): a construction operation
/// plus a dependency-key enumeration operation that must name exactly the
/// keys the construction operation consults.
///
/// Implemented by hand, or generated by `#[derive(Injectable)]` from the
/// `inject-derive` crate.
pub trait Injectable: Managed + Sized {
    fn construct(injector: &dyn Injector, context: &CallContext) -> Result<Self, InjectError>;

    fn dependencies() -> Vec<BindingKey>;
}

/// A provider class contract: an injectable whose construction yields
/// something callable to produce the actual provided value. `Provider<T>`
/// wraps a plain closure implementing this for ad-hoc function/closure
/// bindings (see [`crate::builder::BindingBuilder`]).
pub trait Provides<T>: Managed {
    fn provide(&self, injector: &dyn Injector, context: &CallContext) -> Result<T, InjectError>;
}

impl<T, F> Provides<T> for F
where
    F: Fn(&dyn Injector, &CallContext) -> Result<T, InjectError> + Send + Sync + 'static,
{
    fn provide(&self, injector: &dyn Injector, context: &CallContext) -> Result<T, InjectError> {
        self(injector, context)
    }
}

/// Per-type string-to-value conversion used by property-driven bindings
/// (spec.md §6). `clone_value` backs unique bindings, which hand out a
/// fresh copy of a stored prototype on every query.
pub trait FromPropertyString: Managed + Clone {
    fn from_property_string(text: &str) -> Result<Self, ConversionError>;
}

#[derive(Debug, Clone)]
pub struct ConversionError(pub String);

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConversionError {}

macro_rules! impl_from_property_string_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromPropertyString for $ty {
                fn from_property_string(text: &str) -> Result<Self, ConversionError> {
                    text.trim()
                        .parse()
                        .map_err(|e| ConversionError(format!("{e}")))
                }
            }
        )*
    };
}

impl_from_property_string_via_parse!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool);

impl FromPropertyString for char {
    fn from_property_string(text: &str) -> Result<Self, ConversionError> {
        let mut chars = text.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConversionError(format!(
                "expected exactly one character, got \"{text}\""
            ))),
        }
    }
}

impl FromPropertyString for String {
    fn from_property_string(text: &str) -> Result<Self, ConversionError> {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod derive_tests {
    use std::sync::Arc;

    use crate::builder::BindingBuilder;
    use crate::configuration::{Configuration, Configurer};
    use crate::injector::{Container, TypedInjector};
    use crate::key::{BindingKey, MetaType};
    use crate::logging::LoggingSink;
    use crate::Injectable as InjectableDerive;

    use super::*;

    #[derive(Debug)]
    struct Engine(u32);

    impl Injectable for Engine {
        fn construct(_injector: &dyn Injector, _context: &CallContext) -> Result<Self, InjectError> {
            Ok(Engine(8))
        }

        fn dependencies() -> Vec<BindingKey> {
            Vec::new()
        }
    }

    #[derive(Debug)]
    struct Chassis(String);

    impl Injectable for Chassis {
        fn construct(_injector: &dyn Injector, _context: &CallContext) -> Result<Self, InjectError> {
            Ok(Chassis("unibody".to_string()))
        }

        fn dependencies() -> Vec<BindingKey> {
            Vec::new()
        }
    }

    #[derive(InjectableDerive, Debug)]
    struct Car {
        #[inject(name = "engine")]
        engine: Arc<Engine>,
        chassis: Box<Chassis>,
        wheel_count: u32,
    }

    struct CarConfig;

    impl Configuration for CarConfig {
        fn configure(&self, configurer: &mut Configurer, _logging: &dyn LoggingSink) -> Result<(), InjectError> {
            configurer.bind(BindingBuilder::<Engine>::new("engine").to_singleton().build().unwrap());
            configurer.bind(BindingBuilder::<Chassis>::new("").to_unique().build().unwrap());
            configurer.bind(BindingBuilder::<u32>::new("").to_prototype(4).build().unwrap());
            configurer.bind(BindingBuilder::<Car>::new("").to_value().build().unwrap());
            Ok(())
        }
    }

    #[test]
    fn derived_dependencies_name_one_key_per_field() {
        let deps = Car::dependencies();
        assert_eq!(deps.len(), 3);
        assert!(deps.contains(&BindingKey::new::<Engine>(MetaType::Shared, "engine")));
        assert!(deps.contains(&BindingKey::new::<Chassis>(MetaType::Unique, "")));
        assert!(deps.contains(&BindingKey::new::<u32>(MetaType::Value, "")));
    }

    #[test]
    fn derived_construct_assembles_every_field_shape() {
        let container = Container::create(vec![Box::new(CarConfig)]).unwrap();
        let car: Car = container.get_value("").unwrap();
        assert_eq!(car.engine.0, 8);
        assert_eq!(car.chassis.0, "unibody");
        assert_eq!(car.wheel_count, 4);
    }
}
