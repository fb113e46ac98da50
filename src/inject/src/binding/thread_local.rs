use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::RwLock;

use crate::binding::{Binding, Produced};
use crate::error::InjectError;
use crate::injectable::{CallContext, Injectable};
use crate::injector::Injector;
use crate::key::BindingKey;

type ErasedShared = Arc<dyn Any + Send + Sync>;

/// One instance per thread, lazily instantiated on first per-thread
/// access (spec.md §3/§4.2/§5).
///
/// Per-thread slots live in a map keyed by [`ThreadId`] rather than true
/// OS thread-local storage, because the binding's user type is only known
/// generically at the call site and the binding itself is a trait object
/// owned by the injector — there is no `'static` place to hang a
/// `thread_local!` macro invocation per binding instance. The uniqueness
/// invariants (same thread always sees the same instance, two threads
/// never share one) hold regardless; what is not reproduced is the OS's
/// guarantee that a thread's slot is torn down exactly at that thread's
/// exit — slots here are dropped when the binding itself (and so the
/// injector) is dropped.
pub struct ThreadLocalBinding<T: Injectable> {
    key: BindingKey,
    slots: RwLock<HashMap<ThreadId, ErasedShared>>,
    _marker: PhantomData<T>,
}

impl<T: Injectable> ThreadLocalBinding<T> {
    pub fn new(key: BindingKey) -> Self {
        Self {
            key,
            slots: RwLock::new(HashMap::new()),
            _marker: PhantomData,
        }
    }
}

impl<T: Injectable> std::fmt::Debug for ThreadLocalBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadLocalBinding")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T: Injectable> Binding for ThreadLocalBinding<T> {
    fn final_key(&self) -> &BindingKey {
        &self.key
    }

    fn enumerate_dependencies(&self) -> Vec<BindingKey> {
        T::dependencies()
    }

    fn is_thread_local(&self) -> bool {
        true
    }

    fn produce(&self, injector: &dyn Injector) -> Result<Produced, InjectError> {
        let thread = thread::current().id();

        if let Some(value) = self.slots.read().get(&thread) {
            return Ok(Produced::Shared(Arc::clone(value)));
        }

        let mut slots = self.slots.write();
        if let Some(value) = slots.get(&thread) {
            return Ok(Produced::Shared(Arc::clone(value)));
        }

        let context = CallContext::new(self.key.clone());
        let value = Arc::new(T::construct(injector, &context)?) as ErasedShared;
        slots.insert(thread, Arc::clone(&value));
        Ok(Produced::Shared(value))
    }
}
