//! [`BindingBuilder`]: the fluent recipe surface used inside
//! [`crate::configuration::Configuration::configure`] (spec.md §4.3).

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::binding::{
    Binding, EagerSingletonBinding, InstantiatingUniqueBinding, InstantiatingValueBinding,
    LazySingletonBinding, ProvidedSingletonBinding, ProvidingSingletonBinding,
    ProvidingUniqueBinding, ProvidingValueBinding, PrototypeValueBinding, ReferenceBinding,
    ThreadLocalBinding,
};
use crate::injectable::{Injectable, Provides};
use crate::key::{BindingKey, MetaType};
use crate::managed::Managed;

/// A recipe builder for one `(type, name)` pair. Each `to_*` call records
/// the binding's shape by constructing the matching [`Binding`] variant
/// immediately; the design expects a single terminal call per builder
/// (spec.md §4.3: "duplicate shape assignment is undefined").
///
/// The source design also drops a `const`-qualifier from `Value`/`Unique`
/// declared types with a logged diagnostic; Rust's ownership model has no
/// equivalent notion for an owned, freshly-constructed `T`, so there is
/// nothing to drop or warn about here — the const-qualifier rule simply
/// does not apply to this API surface.
pub struct BindingBuilder<T: Managed> {
    name: String,
    binding: Option<Box<dyn Binding>>,
    _marker: PhantomData<T>,
}

impl<T: Managed> BindingBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binding: None,
            _marker: PhantomData,
        }
    }

    fn key(&self, meta_type: MetaType) -> BindingKey {
        BindingKey::new::<T>(meta_type, self.name.clone())
    }

    /// Consumes the builder, returning the finalised binding. Called by
    /// [`crate::injector::Injector`] construction (spec.md §4.4 step 3).
    pub fn build(self) -> Option<Box<dyn Binding>> {
        self.binding
    }

    pub fn to_value(mut self) -> Self
    where
        T: Injectable,
    {
        let key = self.key(MetaType::Value);
        self.binding = Some(Box::new(InstantiatingValueBinding::<T>::new(key)));
        self
    }

    pub fn to_prototype(mut self, prototype: T) -> Self
    where
        T: Clone + Debug,
    {
        let key = self.key(MetaType::Value);
        self.binding = Some(Box::new(PrototypeValueBinding::new(key, prototype)));
        self
    }

    pub fn to_value_provider<P: Provides<T>>(
        mut self,
        provider: P,
        provider_dependencies: Vec<BindingKey>,
    ) -> Self {
        let key = self.key(MetaType::Value);
        self.binding = Some(Box::new(ProvidingValueBinding::new(
            key,
            provider,
            provider_dependencies,
        )));
        self
    }

    pub fn to_unique(mut self) -> Self
    where
        T: Injectable,
    {
        let key = self.key(MetaType::Unique);
        self.binding = Some(Box::new(InstantiatingUniqueBinding::<T>::new(key)));
        self
    }

    pub fn to_unique_provider<P: Provides<T>>(
        mut self,
        provider: P,
        provider_dependencies: Vec<BindingKey>,
    ) -> Self {
        let key = self.key(MetaType::Unique);
        self.binding = Some(Box::new(ProvidingUniqueBinding::new(
            key,
            provider,
            provider_dependencies,
        )));
        self
    }

    pub fn to_reference(mut self, value: Arc<T>) -> Self
    where
        T: Debug,
    {
        let key = self.key(MetaType::Reference);
        self.binding = Some(Box::new(ReferenceBinding::new(key, value)));
        self
    }

    pub fn to_singleton(mut self) -> Self
    where
        T: Injectable,
    {
        let key = self.key(MetaType::Shared);
        self.binding = Some(Box::new(LazySingletonBinding::<T>::new(key)));
        self
    }

    pub fn to_eager_singleton(mut self) -> Self
    where
        T: Injectable,
    {
        let key = self.key(MetaType::Shared);
        self.binding = Some(Box::new(EagerSingletonBinding::<T>::new(key)));
        self
    }

    pub fn to_thread_local(mut self) -> Self
    where
        T: Injectable,
    {
        let key = self.key(MetaType::Shared);
        self.binding = Some(Box::new(ThreadLocalBinding::<T>::new(key)));
        self
    }

    pub fn to_singleton_provider<P: Provides<T>>(
        mut self,
        provider: P,
        provider_dependencies: Vec<BindingKey>,
    ) -> Self {
        let key = self.key(MetaType::Shared);
        self.binding = Some(Box::new(ProvidingSingletonBinding::new(
            key,
            provider,
            provider_dependencies,
        )));
        self
    }

    /// Sugar over [`Self::to_singleton_provider`] for an instance the
    /// caller already constructed (spec.md §3's `ProvidedSingleton`
    /// variant): `instantiate_if_eager` is a no-op since there is nothing
    /// left to build.
    pub fn to_provided_singleton(mut self, instance: Arc<T>) -> Self
    where
        T: Debug,
    {
        let key = self.key(MetaType::Shared);
        self.binding = Some(Box::new(ProvidedSingletonBinding::new(key, instance)));
        self
    }
}
