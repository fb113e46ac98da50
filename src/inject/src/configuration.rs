//! Configuration objects: the caller-supplied values whose `configure()`
//! populates the builder list consumed at seal (spec.md §4.4 steps 1-2).

use crate::binding::Binding;
use crate::error::InjectError;
use crate::logging::LoggingSink;

/// Collects finalised bindings and lifecycle callbacks during the
/// configure phase. Passed to every [`Configuration::configure`] call.
pub struct Configurer {
    bindings: Vec<Box<dyn Binding>>,
    post_construction: Vec<Box<dyn Fn() + Send + Sync>>,
    pre_destruction: Vec<Box<dyn Fn() + Send + Sync>>,
}

impl Configurer {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            post_construction: Vec::new(),
            pre_destruction: Vec::new(),
        }
    }

    /// Registers a finalised binding built through
    /// [`crate::builder::BindingBuilder`].
    pub fn bind(&mut self, binding: Box<dyn Binding>) {
        self.bindings.push(binding);
    }

    /// Registers a callback run once, after eager instantiation completes.
    pub fn on_post_construction(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.post_construction.push(Box::new(callback));
    }

    /// Registers a callback run in reverse dependency order as the
    /// injector is torn down.
    pub fn on_pre_destruction(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.pre_destruction.push(Box::new(callback));
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Vec<Box<dyn Binding>>,
        Vec<Box<dyn Fn() + Send + Sync>>,
        Vec<Box<dyn Fn() + Send + Sync>>,
    ) {
        (self.bindings, self.post_construction, self.pre_destruction)
    }
}

impl Default for Configurer {
    fn default() -> Self {
        Self::new()
    }
}

/// A caller-supplied configuration. `configure` populates bindings and
/// lifecycle callbacks into `configurer`; `siblings` names additional
/// configurations to fold in (recursively, to a fixed point) before the
/// injector seals (spec.md §4.4 step 2).
///
/// `configure` returns `Result` because not every configuration's bindings
/// can be derived without fallible work (an `EnvironmentConfiguration`
/// converts property text to typed values); any such failure is
/// construction-time and fatal to injector creation (spec.md §7), so it
/// propagates out of `Injector::create` rather than being swallowed here.
pub trait Configuration {
    fn configure(&self, configurer: &mut Configurer, logging: &dyn LoggingSink) -> Result<(), InjectError>;

    fn siblings(&self) -> Vec<Box<dyn Configuration>> {
        Vec::new()
    }
}
