use std::marker::PhantomData;

use crate::binding::{Binding, Produced};
use crate::error::InjectError;
use crate::injectable::{CallContext, Injectable, Provides};
use crate::injector::Injector;
use crate::key::BindingKey;

/// Constructs a fresh `T` per call via [`Injectable::construct`].
#[derive(Debug)]
pub struct InstantiatingValueBinding<T: Injectable> {
    key: BindingKey,
    _marker: PhantomData<T>,
}

impl<T: Injectable> InstantiatingValueBinding<T> {
    pub fn new(key: BindingKey) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }
}

impl<T: Injectable> Binding for InstantiatingValueBinding<T> {
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        T::dependencies()
    }

    fn produce(&self, injector: &dyn Injector) -> Result<Produced, InjectError> {
        let context = CallContext::new(self.key.clone());
        let value = T::construct(injector, &context)?;
        Ok(Produced::Value(Box::new(value)))
    }
}

/// Hands out a clone of a stored prototype; no dependencies.
#[derive(Debug)]
pub struct PrototypeValueBinding<T: Clone + crate::managed::Managed> {
    key: BindingKey,
    prototype: T,
}

impl<T: Clone + crate::managed::Managed> PrototypeValueBinding<T> {
    pub fn new(key: BindingKey, prototype: T) -> Self {
        Self { key, prototype }
    }
}

impl<T: Clone + crate::managed::Managed + std::fmt::Debug> Binding for PrototypeValueBinding<T> {
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        Vec::new()
    }

    fn produce(&self, _injector: &dyn Injector) -> Result<Produced, InjectError> {
        Ok(Produced::Value(Box::new(self.prototype.clone())))
    }
}

/// Delivers the result of a user callable (function, closure, or provider
/// class); the provider's own dependencies are folded into this binding's
/// enumeration (spec.md §4.2 "provider variants").
pub struct ProvidingValueBinding<T, P: Provides<T>> {
    key: BindingKey,
    provider: P,
    provider_dependencies: Vec<BindingKey>,
    _marker: PhantomData<T>,
}

impl<T, P: Provides<T>> ProvidingValueBinding<T, P> {
    pub fn new(key: BindingKey, provider: P, provider_dependencies: Vec<BindingKey>) -> Self {
        Self {
            key,
            provider,
            provider_dependencies,
            _marker: PhantomData,
        }
    }
}

impl<T, P> std::fmt::Debug for ProvidingValueBinding<T, P>
where
    P: Provides<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidingValueBinding")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T, P> Binding for ProvidingValueBinding<T, P>
where
    T: crate::managed::Managed,
    P: Provides<T>,
{
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        self.provider_dependencies.clone()
    }

    fn produce(&self, injector: &dyn Injector) -> Result<Produced, InjectError> {
        let context = CallContext::new(self.key.clone());
        let value = self.provider.provide(injector, &context)?;
        Ok(Produced::Value(Box::new(value)))
    }
}
