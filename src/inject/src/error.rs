//! The exception taxonomy surfaced on the injector and environment
//! boundaries.

use std::error::Error as StdError;
use std::sync::Arc;

use snafu::prelude::*;

use crate::key::BindingKey;

/// Errors raised while building or querying an [`crate::injector::Injector`].
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum InjectError {
    #[snafu(display("duplicate binding for {key}"))]
    #[non_exhaustive]
    DuplicateBinding { key: BindingKey },

    #[snafu(display("no binding found for {key}"))]
    #[non_exhaustive]
    NoBinding { key: BindingKey },

    #[snafu(display("{dependent} depends on {independent}, which has no binding"))]
    #[non_exhaustive]
    MissingDependency {
        dependent: BindingKey,
        independent: BindingKey,
    },

    #[snafu(display("cyclic dependency detected: {description}"))]
    #[non_exhaustive]
    CyclicDependency { description: String },

    #[snafu(display("{key} asked for a shared owner of the injector itself"))]
    #[non_exhaustive]
    SharedInjector { key: BindingKey },

    #[snafu(display("failed to construct {key}"))]
    #[non_exhaustive]
    Construction {
        key: BindingKey,
        source: Arc<dyn StdError + Send + Sync>,
    },

    #[snafu(display("{text}"))]
    #[non_exhaustive]
    EnvironmentConfiguration { text: String },
}

impl Clone for InjectError {
    fn clone(&self) -> Self {
        match self {
            Self::DuplicateBinding { key } => Self::DuplicateBinding { key: key.clone() },
            Self::NoBinding { key } => Self::NoBinding { key: key.clone() },
            Self::MissingDependency {
                dependent,
                independent,
            } => Self::MissingDependency {
                dependent: dependent.clone(),
                independent: independent.clone(),
            },
            Self::CyclicDependency { description } => Self::CyclicDependency {
                description: description.clone(),
            },
            Self::SharedInjector { key } => Self::SharedInjector { key: key.clone() },
            Self::Construction { key, source } => Self::Construction {
                key: key.clone(),
                source: Arc::clone(source),
            },
            Self::EnvironmentConfiguration { text } => Self::EnvironmentConfiguration {
                text: text.clone(),
            },
        }
    }
}

/// Errors raised while cascading property/type-specification trees into
/// binding builders (spec.md §4.6-§4.9).
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum EnvironmentError {
    #[snafu(display(
        "type specification for \"{name}\" is incompatible across sources: \
         declared as a value in one source and a composite in another"
    ))]
    #[non_exhaustive]
    IncompatibleTypeSpec { name: String },

    #[snafu(display("unknown type identifier \"{type_name}\" for property \"{name}\""))]
    #[non_exhaustive]
    UnknownType { name: String, type_name: String },

    #[snafu(display("could not convert property \"{name}\" to {type_name}: {text}"))]
    #[non_exhaustive]
    Conversion {
        name: String,
        type_name: &'static str,
        text: String,
    },

    #[snafu(display("syntax error in property source at {location}: {text}"))]
    #[non_exhaustive]
    Syntax { location: String, text: String },
}

impl From<EnvironmentError> for InjectError {
    fn from(err: EnvironmentError) -> Self {
        InjectError::EnvironmentConfiguration {
            text: err.to_string(),
        }
    }
}
