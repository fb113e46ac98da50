#![allow(clippy::new_without_default)]

// Lets `#[derive(Injectable)]`'s generated code, which always writes
// `::inject::...` paths so it works the same for downstream crates, also
// work in this crate's own tests.
extern crate self as inject;

pub mod binding;
pub mod builder;
pub mod configuration;
pub mod environment;
pub mod error;
pub mod graph;
pub mod injectable;
pub mod injector;
pub mod key;
pub mod logging;
pub mod managed;
mod util;

pub use inject_derive::Injectable;

/// Everything most callers need: binding construction, the sealed
/// injector's query surface, and the environment-configuration pipeline.
pub mod prelude {
    pub use crate::binding::Binding;
    pub use crate::builder::BindingBuilder;
    pub use crate::configuration::{Configuration, Configurer};
    pub use crate::environment::{EnvironmentConfiguration, EnvironmentProperties};
    pub use crate::error::{EnvironmentError, InjectError};
    pub use crate::injectable::{CallContext, Injectable, Provides};
    pub use crate::injector::{Container, Injector, TypedInjector};
    pub use crate::key::{BindingKey, MetaType};
    pub use crate::Injectable as InjectableDerive;
}
