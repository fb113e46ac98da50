use std::marker::PhantomData;

use crate::binding::{Binding, Produced};
use crate::error::InjectError;
use crate::injectable::{CallContext, Injectable, Provides};
use crate::injector::Injector;
use crate::key::BindingKey;

/// Constructs a fresh heap instance per call, owned by the caller. The
/// interface/implementation split ("bind `Base` to `InstantiatingUnique<Derived>`")
/// is expressed by `T` being the concrete constructed type and the binding
/// key naming whatever interface type the caller asked for.
#[derive(Debug)]
pub struct InstantiatingUniqueBinding<T: Injectable> {
    key: BindingKey,
    _marker: PhantomData<T>,
}

impl<T: Injectable> InstantiatingUniqueBinding<T> {
    pub fn new(key: BindingKey) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }
}

impl<T: Injectable> Binding for InstantiatingUniqueBinding<T> {
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        T::dependencies()
    }

    fn produce(&self, injector: &dyn Injector) -> Result<Produced, InjectError> {
        let context = CallContext::new(self.key.clone());
        let value = T::construct(injector, &context)?;
        Ok(Produced::Unique(Box::new(value)))
    }
}

/// Hands out a fresh boxed clone of a stored prototype; no dependencies.
/// The unique-binding counterpart of [`super::value::PrototypeValueBinding`],
/// used by property-driven unique bindings (spec.md §6's cloner contract).
#[derive(Debug)]
pub struct ClonedUniqueBinding<T: Clone + crate::managed::Managed> {
    key: BindingKey,
    prototype: T,
}

impl<T: Clone + crate::managed::Managed> ClonedUniqueBinding<T> {
    pub fn new(key: BindingKey, prototype: T) -> Self {
        Self { key, prototype }
    }
}

impl<T: Clone + crate::managed::Managed + std::fmt::Debug> Binding for ClonedUniqueBinding<T> {
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        Vec::new()
    }

    fn produce(&self, _injector: &dyn Injector) -> Result<Produced, InjectError> {
        Ok(Produced::Unique(Box::new(self.prototype.clone())))
    }
}

/// Heap instance obtained by calling a user provider.
pub struct ProvidingUniqueBinding<T, P: Provides<T>> {
    key: BindingKey,
    provider: P,
    provider_dependencies: Vec<BindingKey>,
    _marker: PhantomData<T>,
}

impl<T, P: Provides<T>> ProvidingUniqueBinding<T, P> {
    pub fn new(key: BindingKey, provider: P, provider_dependencies: Vec<BindingKey>) -> Self {
        Self {
            key,
            provider,
            provider_dependencies,
            _marker: PhantomData,
        }
    }
}

impl<T, P> std::fmt::Debug for ProvidingUniqueBinding<T, P>
where
    P: Provides<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidingUniqueBinding")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T, P> Binding for ProvidingUniqueBinding<T, P>
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
        Ok(Produced::Unique(Box::new(value)))
    }
}
