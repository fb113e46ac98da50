use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::binding::{Binding, Produced};
use crate::error::InjectError;
use crate::injectable::{CallContext, Injectable, Provides};
use crate::injector::Injector;
use crate::key::BindingKey;
use crate::managed::Managed;

type ErasedShared = Arc<dyn Any + Send + Sync>;

enum OnceState {
    Uninit,
    Constructing(Vec<oneshot::Sender<Result<ErasedShared, InjectError>>>),
    Done(ErasedShared),
}

/// Shared one-shot construction coordination used by every `Shared`
/// meta-type binding that instantiates lazily: the first caller to see
/// an uninitialised slot wins the right to construct, concurrent callers
/// block on a `oneshot` channel, and the result is cached for everyone
/// after (spec.md §4.2, §5).
struct OnceShared {
    state: Mutex<OnceState>,
}

impl OnceShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(OnceState::Uninit),
        }
    }

    fn get_or_init(
        &self,
        construct: impl FnOnce() -> Result<ErasedShared, InjectError>,
    ) -> Result<ErasedShared, InjectError> {
        let mut guard = self.state.lock();
        match &mut *guard {
            OnceState::Done(value) => return Ok(Arc::clone(value)),
            OnceState::Constructing(waiters) => {
                let (sender, receiver) = oneshot::channel();
                waiters.push(sender);
                drop(guard);
                return receiver
                    .recv()
                    .unwrap_or_else(|_| unreachable!("the constructing thread always replies"));
            }
            OnceState::Uninit => {
                *guard = OnceState::Constructing(Vec::new());
            }
        }
        drop(guard);

        let result = construct();

        let mut guard = self.state.lock();
        let waiters = match std::mem::replace(&mut *guard, OnceState::Uninit) {
            OnceState::Constructing(waiters) => waiters,
            _ => unreachable!("only this thread transitions out of `Constructing`"),
        };
        *guard = match &result {
            Ok(value) => OnceState::Done(Arc::clone(value)),
            Err(_) => OnceState::Uninit,
        };
        drop(guard);

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
        result
    }

    fn peek(&self) -> Option<ErasedShared> {
        match &*self.state.lock() {
            OnceState::Done(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }
}

/// A user-provided shared instance; already constructed, so
/// `instantiate_if_eager` is a no-op.
#[derive(Debug)]
pub struct ProvidedSingletonBinding<T: Managed> {
    key: BindingKey,
    instance: Arc<T>,
}

impl<T: Managed> ProvidedSingletonBinding<T> {
    pub fn new(key: BindingKey, instance: Arc<T>) -> Self {
        Self { key, instance }
    }
}

impl<T: Managed + std::fmt::Debug> Binding for ProvidedSingletonBinding<T> {
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        Vec::new()
    }

    fn produce(&self, _injector: &dyn Injector) -> Result<Produced, InjectError> {
        Ok(Produced::Shared(Arc::clone(&self.instance) as ErasedShared))
    }
}

/// One process-wide instance, instantiated on first access.
pub struct LazySingletonBinding<T: Injectable> {
    key: BindingKey,
    once: OnceShared,
    _marker: PhantomData<T>,
}

impl<T: Injectable> LazySingletonBinding<T> {
    pub fn new(key: BindingKey) -> Self {
        Self {
            key,
            once: OnceShared::new(),
            _marker: PhantomData,
        }
    }
}

impl<T: Injectable> std::fmt::Debug for LazySingletonBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySingletonBinding")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T: Injectable> Binding for LazySingletonBinding<T> {
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        T::dependencies()
    }

    fn produce(&self, injector: &dyn Injector) -> Result<Produced, InjectError> {
        let key = self.key.clone();
        let value = self.once.get_or_init(move || {
            let context = CallContext::new(key.clone());
            T::construct(injector, &context).map(|v| Arc::new(v) as ErasedShared)
        })?;
        Ok(Produced::Shared(value))
    }
}

/// Process-wide; instantiated during injector finalisation (seal).
pub struct EagerSingletonBinding<T: Injectable> {
    key: BindingKey,
    once: OnceShared,
    _marker: PhantomData<T>,
}

impl<T: Injectable> EagerSingletonBinding<T> {
    pub fn new(key: BindingKey) -> Self {
        Self {
            key,
            once: OnceShared::new(),
            _marker: PhantomData,
        }
    }
}

impl<T: Injectable> std::fmt::Debug for EagerSingletonBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EagerSingletonBinding")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T: Injectable> Binding for EagerSingletonBinding<T> {
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        T::dependencies()
    }

    fn produce(&self, injector: &dyn Injector) -> Result<Produced, InjectError> {
        let key = self.key.clone();
        let value = self.once.get_or_init(move || {
            let context = CallContext::new(key.clone());
            T::construct(injector, &context).map(|v| Arc::new(v) as ErasedShared)
        })?;
        Ok(Produced::Shared(value))
    }

    fn instantiate_if_eager(&self, injector: &dyn Injector) -> Result<(), InjectError> {
        self.produce(injector).map(|_| ())
    }
}

/// A singleton obtained by calling a user provider once; subsequent
/// queries all receive the same shared owner.
pub struct ProvidingSingletonBinding<T, P: Provides<T>> {
    key: BindingKey,
    provider: P,
    provider_dependencies: Vec<BindingKey>,
    once: OnceShared,
    _marker: PhantomData<T>,
}

impl<T, P: Provides<T>> ProvidingSingletonBinding<T, P> {
    pub fn new(key: BindingKey, provider: P, provider_dependencies: Vec<BindingKey>) -> Self {
        Self {
            key,
            provider,
            provider_dependencies,
            once: OnceShared::new(),
            _marker: PhantomData,
        }
    }
}

impl<T, P> std::fmt::Debug for ProvidingSingletonBinding<T, P>
where
    P: Provides<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidingSingletonBinding")
            .field("key", &self.key)
            .field("constructed", &self.once.peek().is_some())
            .finish_non_exhaustive()
    }
}

impl<T, P> Binding for ProvidingSingletonBinding<T, P>
where
    T: Managed,
    P: Provides<T>,
{
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        self.provider_dependencies.clone()
    }

    fn produce(&self, injector: &dyn Injector) -> Result<Produced, InjectError> {
        let key = self.key.clone();
        let value = self.once.get_or_init(|| {
            let context = CallContext::new(key);
            self.provider
                .provide(injector, &context)
                .map(|v| Arc::new(v) as ErasedShared)
        })?;
        Ok(Produced::Shared(value))
    }
}
