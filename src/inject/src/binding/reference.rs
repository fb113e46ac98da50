use std::sync::Arc;

use crate::binding::{Binding, Produced};
use crate::error::InjectError;
use crate::injector::Injector;
use crate::key::BindingKey;
use crate::managed::Managed;

/// Aliases a caller-owned value. Rust has no type-erased non-owning
/// reference with a 'static lifetime, so this binding realises "reference"
/// semantics the idiomatic Rust way: the caller registers an `Arc<T>` up
/// front and every query clones the handle. The binding never constructs
/// or drops the referent; the caller's `Arc` is solely responsible for its
/// lifetime, matching the "lifetime is external" contract of spec.md §3.
#[derive(Debug)]
pub struct ReferenceBinding<T: Managed> {
    key: BindingKey,
    value: Arc<T>,
}

impl<T: Managed> ReferenceBinding<T> {
    pub fn new(key: BindingKey, value: Arc<T>) -> Self {
        Self { key, value }
    }
}

impl<T: Managed + std::fmt::Debug> Binding for ReferenceBinding<T> {
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        Vec::new()
    }

    fn produce(&self, _injector: &dyn Injector) -> Result<Produced, InjectError> {
        Ok(Produced::Reference(Arc::clone(&self.value) as Arc<dyn std::any::Any + Send + Sync>))
    }
}
