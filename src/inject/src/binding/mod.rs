//! Binding variants: the recipes a sealed [`crate::injector::Injector`]
//! holds one of per key (spec.md §3/§4.2).

pub mod reference;
pub mod singleton;
pub mod thread_local;
pub mod unique;
pub mod value;

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::InjectError;
use crate::injector::Injector;
use crate::key::BindingKey;
use crate::managed::Managed;

pub use reference::ReferenceBinding;
pub use singleton::{
    EagerSingletonBinding, LazySingletonBinding, ProvidedSingletonBinding, ProvidingSingletonBinding,
};
pub use thread_local::ThreadLocalBinding;
pub use unique::{ClonedUniqueBinding, InstantiatingUniqueBinding, ProvidingUniqueBinding};
pub use value::{InstantiatingValueBinding, PrototypeValueBinding, ProvidingValueBinding};

/// What [`Binding::produce`] hands back; the variant is always the one
/// implied by the binding's own [`Binding::meta_type`].
pub enum Produced {
    Value(Box<dyn Managed>),
    Unique(Box<dyn Managed>),
    Reference(Arc<dyn Any + Send + Sync>),
    Shared(Arc<dyn Any + Send + Sync>),
}

/// The public contract every binding variant implements (spec.md §4.2).
pub trait Binding: Debug + Send + Sync {
    /// The authoritative key this binding registers under. Shared bindings
    /// canonicalise to the `Shared` meta-type even if the builder call that
    /// produced them (e.g. `to_singleton`) looked like it named a plain type.
    fn final_key(&self) -> &BindingKey;

    /// Dependency keys this binding's construction will consult. Must be
    /// side-effect free and must match the construction operation's actual
    /// lookups exactly (spec.md §6).
    fn enumerate_dependencies(&self) -> Vec<BindingKey>;

    /// Delivers a value per the ownership contract of this binding's
    /// meta-type.
    fn produce(&self, injector: &dyn Injector) -> Result<Produced, InjectError>;

    /// For eager singletons, constructs the instance now; a no-op for
    /// every other variant.
    fn instantiate_if_eager(&self, _injector: &dyn Injector) -> Result<(), InjectError> {
        Ok(())
    }

    /// Whether this binding participates in per-thread storage.
    fn is_thread_local(&self) -> bool {
        false
    }
}
