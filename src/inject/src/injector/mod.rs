//! The sealed injector: construction pipeline, query API, and child
//! injector composition (spec.md §4.4).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::binding::{Binding, Produced};
use crate::configuration::{Configuration, Configurer};
use crate::error::InjectError;
use crate::graph::DependencyGraph;
use crate::key::{BindingKey, MetaType};
use crate::logging::{GlobalLogSink, LoggingSink};
use crate::managed::Managed;
use crate::util::any::Downcast;

type ErasedShared = Arc<dyn Any + Send + Sync>;

/// The dyn-safe query surface every binding's construction call receives
/// as `&dyn Injector`. This is the "weak injector reference" spec.md §4.4
/// step 5 and §9 describe: non-owning, borrowed only for the duration of
/// one call. Implemented by [`SealedCore`] and delegated to by
/// [`Container`].
#[cfg_attr(test, mockall::automock)]
pub trait Injector: Send + Sync {
    fn dyn_get_value(&self, key: &BindingKey) -> Result<Box<dyn Managed>, InjectError>;

    fn dyn_get_unique(&self, key: &BindingKey) -> Result<Box<dyn Managed>, InjectError>;

    fn dyn_get_reference(&self, key: &BindingKey) -> Result<ErasedShared, InjectError>;

    fn dyn_get_shared(&self, key: &BindingKey) -> Result<ErasedShared, InjectError>;
}

/// Generic, type-safe sugar over [`Injector`]'s type-erased methods.
/// Blanket-implemented for every `Injector`, mirroring the teacher's
/// `TypedInjector` split between an object-safe core trait and a
/// generic-method extension trait.
///
/// There is deliberately no single `get_instance::<T>(name)` entry point
/// dispatching on the static shape of `T` (plain/unique/reference/shared):
/// `get_reference` and `get_shared` already return the same `Arc<T>` shape
/// for a given `T`, so `T` alone can't pick between them, and a blanket
/// impl over every `Managed` `T` would conflict with dedicated impls for
/// `Arc<T>`/`Box<T>` under Rust's coherence rules (no stable specialization
/// to break the tie). Callers name the meta-type they want directly with
/// `get_value`/`get_unique`/`get_reference`/`get_shared`.
pub trait TypedInjector: Injector {
    fn get_value<T: Managed>(&self, name: &str) -> Result<T, InjectError> {
        let key = BindingKey::new::<T>(MetaType::Value, name);
        let boxed = self.dyn_get_value(&key)?;
        match boxed.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => unreachable!("a `Value` binding must produce its own declared type"),
        }
    }

    fn get_unique<T: Managed>(&self, name: &str) -> Result<Box<T>, InjectError> {
        let key = BindingKey::new::<T>(MetaType::Unique, name);
        let boxed = self.dyn_get_unique(&key)?;
        match boxed.downcast::<T>() {
            Ok(value) => Ok(value),
            Err(_) => unreachable!("a `Unique` binding must produce its own declared type"),
        }
    }

    fn get_reference<T: Managed>(&self, name: &str) -> Result<Arc<T>, InjectError> {
        let key = BindingKey::new::<T>(MetaType::Reference, name);
        let erased = self.dyn_get_reference(&key)?;
        erased.downcast::<T>().map_err(|_| InjectError::NoBinding { key })
    }

    fn get_shared<T: Managed>(&self, name: &str) -> Result<Arc<T>, InjectError> {
        let key = BindingKey::new::<T>(MetaType::Shared, name);
        let erased = self.dyn_get_shared(&key)?;
        erased.downcast::<T>().map_err(|_| InjectError::NoBinding { key })
    }
}

impl<T: Injector + ?Sized> TypedInjector for T {}

struct SealedCore {
    bindings: HashMap<BindingKey, Box<dyn Binding>>,
    parent: Option<Container>,
    pre_destruction: Vec<Box<dyn Fn() + Send + Sync>>,
}

impl SealedCore {
    fn resolve<F>(&self, key: &BindingKey, extract: F) -> Result<Produced, InjectError>
    where
        F: Fn(Produced) -> Option<Produced>,
    {
        if let Some(binding) = self.bindings.get(key) {
            let produced = binding.produce(self)?;
            extract(produced).ok_or_else(|| InjectError::NoBinding { key: key.clone() })
        } else if let Some(parent) = &self.parent {
            parent.core.resolve(key, extract)
        } else {
            Err(InjectError::NoBinding { key: key.clone() })
        }
    }
}

impl Injector for SealedCore {
    fn dyn_get_value(&self, key: &BindingKey) -> Result<Box<dyn Managed>, InjectError> {
        match self.resolve(key, |p| match p {
            Produced::Value(v) => Some(Produced::Value(v)),
            _ => None,
        })? {
            Produced::Value(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    fn dyn_get_unique(&self, key: &BindingKey) -> Result<Box<dyn Managed>, InjectError> {
        match self.resolve(key, |p| match p {
            Produced::Unique(v) => Some(Produced::Unique(v)),
            _ => None,
        })? {
            Produced::Unique(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    fn dyn_get_reference(&self, key: &BindingKey) -> Result<ErasedShared, InjectError> {
        match self.resolve(key, |p| match p {
            Produced::Reference(v) => Some(Produced::Reference(v)),
            _ => None,
        })? {
            Produced::Reference(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    fn dyn_get_shared(&self, key: &BindingKey) -> Result<ErasedShared, InjectError> {
        match self.resolve(key, |p| match p {
            Produced::Shared(v) => Some(Produced::Shared(v)),
            _ => None,
        })? {
            Produced::Shared(v) => Ok(v),
            _ => unreachable!(),
        }
    }
}

impl Drop for SealedCore {
    fn drop(&mut self) {
        for callback in self.pre_destruction.iter().rev() {
            callback();
        }
    }
}

/// The sealed runtime: owns the binding table and serves queries. Cheap
/// to clone (an `Arc` handle), matching the teacher's `Container<S>`.
#[derive(Clone)]
pub struct Container {
    core: Arc<SealedCore>,
}

impl Container {
    pub fn create(configurations: Vec<Box<dyn Configuration>>) -> Result<Self, InjectError> {
        Self::create_with_logging(configurations, &GlobalLogSink)
    }

    pub fn create_with_logging(
        configurations: Vec<Box<dyn Configuration>>,
        logging: &dyn LoggingSink,
    ) -> Result<Self, InjectError> {
        Self::seal(None, configurations, logging)
    }

    /// A new injector whose binding map is the parent's extended with the
    /// child's; queries miss-chain to the parent. The parent is never
    /// mutated (spec.md §4.4).
    pub fn create_child(&self, configurations: Vec<Box<dyn Configuration>>) -> Result<Self, InjectError> {
        Self::seal(Some(self.clone()), configurations, &GlobalLogSink)
    }

    fn seal(
        parent: Option<Container>,
        configurations: Vec<Box<dyn Configuration>>,
        logging: &dyn LoggingSink,
    ) -> Result<Self, InjectError> {
        let all_configs = Self::collect_configurations(configurations);

        let mut configurer = Configurer::new();
        for config in &all_configs {
            config.configure(&mut configurer, logging)?;
        }
        let (binding_list, post_construction, pre_destruction) = configurer.into_parts();

        // Duplicate detection only ever looks at this injector's own map: a
        // child is allowed to rebind a key the parent already owns, and the
        // rebound key then takes precedence for this injector and its
        // descendants (spec.md §4.4 — "a key present in both the child and
        // the parent binds to the child"). `SealedCore::resolve` already
        // checks the local map before falling back to the parent, so this
        // override is all that's needed to make it visible.
        let mut bindings: HashMap<BindingKey, Box<dyn Binding>> = HashMap::new();
        for binding in binding_list {
            let key = binding.final_key().clone();
            if bindings.contains_key(&key) {
                return Err(InjectError::DuplicateBinding { key });
            }
            bindings.insert(key, binding);
        }

        let mut graph = DependencyGraph::new();
        for key in bindings.keys() {
            graph.add_vertex(key.clone());
        }

        for (key, binding) in &bindings {
            for dependency in binding.enumerate_dependencies() {
                let resolved = Self::resolve_dependency_key(key, &dependency, &bindings, parent.as_ref())?;
                graph.add_edge(&resolved, key);
            }
        }

        let order = graph.dependency_order().map_err(|cycle| {
            let description = cycle
                .iter()
                .map(|key| key.to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            InjectError::CyclicDependency { description }
        })?;

        let core = Arc::new(SealedCore {
            bindings,
            parent,
            pre_destruction,
        });

        for key in &order {
            if let Some(binding) = core.bindings.get(key) {
                binding.instantiate_if_eager(core.as_ref())?;
            }
        }

        for callback in &post_construction {
            callback();
        }

        Ok(Container { core })
    }

    fn collect_configurations(initial: Vec<Box<dyn Configuration>>) -> Vec<Box<dyn Configuration>> {
        let mut all = initial;
        let mut index = 0;
        while index < all.len() {
            let siblings = all[index].siblings();
            all.extend(siblings);
            index += 1;
        }
        all
    }

    fn parent_contains(parent: Option<&Container>, key: &BindingKey) -> bool {
        match parent {
            Some(container) => {
                container.core.bindings.contains_key(key)
                    || Self::parent_contains(container.core.parent.as_ref(), key)
            }
            None => false,
        }
    }

    /// Resolves a declared dependency key to the final key of the binding
    /// that actually satisfies it, promoting a weak or mismatched
    /// meta-type to `Shared` when that is the only binding present
    /// (spec.md §4.4 step 4). Rejects a `Shared` dependency on the
    /// injector's own handle type (step 5).
    fn resolve_dependency_key(
        dependent: &BindingKey,
        dependency: &BindingKey,
        bindings: &HashMap<BindingKey, Box<dyn Binding>>,
        parent: Option<&Container>,
    ) -> Result<BindingKey, InjectError> {
        let exists = |key: &BindingKey| bindings.contains_key(key) || Self::parent_contains(parent, key);

        let candidates: Vec<BindingKey> = if let Some(meta_type) = dependency.meta_type() {
            let mut candidates = vec![dependency.clone()];
            if meta_type != MetaType::Shared {
                candidates.push(dependency.promoted(MetaType::Shared));
            }
            candidates
        } else {
            [MetaType::Shared, MetaType::Reference, MetaType::Unique, MetaType::Value]
                .into_iter()
                .map(|meta_type| dependency.promoted(meta_type))
                .collect()
        };

        for candidate in candidates {
            if candidate.type_id() == TypeId::of::<Container>() && candidate.meta_type() == Some(MetaType::Shared) {
                return Err(InjectError::SharedInjector { key: candidate });
            }
            if exists(&candidate) {
                return Ok(candidate);
            }
        }

        Err(InjectError::MissingDependency {
            dependent: dependent.clone(),
            independent: dependency.clone(),
        })
    }
}

impl Injector for Container {
    fn dyn_get_value(&self, key: &BindingKey) -> Result<Box<dyn Managed>, InjectError> {
        self.core.dyn_get_value(key)
    }

    fn dyn_get_unique(&self, key: &BindingKey) -> Result<Box<dyn Managed>, InjectError> {
        self.core.dyn_get_unique(key)
    }

    fn dyn_get_reference(&self, key: &BindingKey) -> Result<ErasedShared, InjectError> {
        self.core.dyn_get_reference(key)
    }

    fn dyn_get_shared(&self, key: &BindingKey) -> Result<ErasedShared, InjectError> {
        self.core.dyn_get_shared(key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    use crate::builder::BindingBuilder;
    use crate::injectable::{CallContext, Injectable};

    use super::*;

    #[derive(Debug)]
    struct Leaf(i32);

    impl Injectable for Leaf {
        fn construct(_injector: &dyn Injector, _context: &CallContext) -> Result<Self, InjectError> {
            Ok(Leaf(7))
        }

        fn dependencies() -> Vec<BindingKey> {
            Vec::new()
        }
    }

    struct LeafConfig;

    impl Configuration for LeafConfig {
        fn configure(&self, configurer: &mut Configurer, _logging: &dyn LoggingSink) -> Result<(), InjectError> {
            let binding = BindingBuilder::<Leaf>::new("").to_value().build().unwrap();
            configurer.bind(binding);
            Ok(())
        }
    }

    #[test]
    fn value_binding_round_trips() {
        let container = Container::create(vec![Box::new(LeafConfig)]).unwrap();
        let leaf: Leaf = container.get_value("").unwrap();
        assert_eq!(leaf.0, 7);
    }

    #[test]
    fn missing_binding_is_reported() {
        let container = Container::create(vec![Box::new(LeafConfig)]).unwrap();
        let err = container.get_value::<i32>("").unwrap_err();
        assert!(matches!(err, InjectError::NoBinding { .. }));
    }

    static CONSTRUCT_COUNT: AtomicU32 = AtomicU32::new(0);

    #[derive(Debug)]
    struct CountedSingleton;

    impl Injectable for CountedSingleton {
        fn construct(_injector: &dyn Injector, _context: &CallContext) -> Result<Self, InjectError> {
            CONSTRUCT_COUNT.fetch_add(1, Ordering::SeqCst);
            Ok(CountedSingleton)
        }

        fn dependencies() -> Vec<BindingKey> {
            Vec::new()
        }
    }

    struct SingletonConfig;

    impl Configuration for SingletonConfig {
        fn configure(&self, configurer: &mut Configurer, _logging: &dyn LoggingSink) -> Result<(), InjectError> {
            let binding = BindingBuilder::<CountedSingleton>::new("")
                .to_singleton()
                .build()
                .unwrap();
            configurer.bind(binding);
            Ok(())
        }
    }

    #[test]
    fn lazy_singleton_constructs_exactly_once_across_threads() {
        CONSTRUCT_COUNT.store(0, Ordering::SeqCst);
        let container = Container::create(vec![Box::new(SingletonConfig)]).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let container = container.clone();
                thread::spawn(move || container.get_shared::<CountedSingleton>("").unwrap())
            })
            .collect();

        let first = handles.into_iter().next().unwrap().join().unwrap();
        for _ in 0..16 {
            let other = container.get_shared::<CountedSingleton>("").unwrap();
            assert!(Arc::ptr_eq(&first, &other));
        }
        assert_eq!(CONSTRUCT_COUNT.load(Ordering::SeqCst), 1);
    }

    #[derive(Debug)]
    struct CycleA;
    #[derive(Debug)]
    struct CycleB;

    impl Injectable for CycleA {
        fn construct(injector: &dyn Injector, _context: &CallContext) -> Result<Self, InjectError> {
            let _: Arc<CycleB> = TypedInjector::get_shared(injector, "")?;
            Ok(CycleA)
        }

        fn dependencies() -> Vec<BindingKey> {
            vec![BindingKey::new::<CycleB>(MetaType::Shared, "")]
        }
    }

    impl Injectable for CycleB {
        fn construct(injector: &dyn Injector, _context: &CallContext) -> Result<Self, InjectError> {
            let _: Arc<CycleA> = TypedInjector::get_shared(injector, "")?;
            Ok(CycleB)
        }

        fn dependencies() -> Vec<BindingKey> {
            vec![BindingKey::new::<CycleA>(MetaType::Shared, "")]
        }
    }

    struct CycleConfig;

    impl Configuration for CycleConfig {
        fn configure(&self, configurer: &mut Configurer, _logging: &dyn LoggingSink) -> Result<(), InjectError> {
            configurer.bind(BindingBuilder::<CycleA>::new("").to_singleton().build().unwrap());
            configurer.bind(BindingBuilder::<CycleB>::new("").to_singleton().build().unwrap());
            Ok(())
        }
    }

    #[test]
    fn cyclic_dependency_fails_injector_creation() {
        let err = Container::create(vec![Box::new(CycleConfig)]).unwrap_err();
        assert!(matches!(err, InjectError::CyclicDependency { .. }));
    }

    struct DuplicateConfig;

    impl Configuration for DuplicateConfig {
        fn configure(&self, configurer: &mut Configurer, _logging: &dyn LoggingSink) -> Result<(), InjectError> {
            configurer.bind(BindingBuilder::<Leaf>::new("").to_value().build().unwrap());
            configurer.bind(BindingBuilder::<Leaf>::new("").to_value().build().unwrap());
            Ok(())
        }
    }

    #[test]
    fn duplicate_binding_fails_injector_creation() {
        let err = Container::create(vec![Box::new(DuplicateConfig)]).unwrap_err();
        assert!(matches!(err, InjectError::DuplicateBinding { .. }));
    }

    #[test]
    fn child_injector_sees_parent_bindings_without_mutating_parent() {
        let parent = Container::create(vec![Box::new(LeafConfig)]).unwrap();
        let child = parent.create_child(vec![]).unwrap();

        let leaf: Leaf = child.get_value("").unwrap();
        assert_eq!(leaf.0, 7);
    }

    struct RebindConfig;

    impl Configuration for RebindConfig {
        fn configure(&self, configurer: &mut Configurer, _logging: &dyn LoggingSink) -> Result<(), InjectError> {
            let binding = BindingBuilder::<Leaf>::new("")
                .to_value_provider(|_injector: &dyn Injector, _context: &CallContext| Ok(Leaf(99)), Vec::new())
                .build()
                .unwrap();
            configurer.bind(binding);
            Ok(())
        }
    }

    #[test]
    fn child_rebinding_a_parent_key_takes_precedence() {
        let parent = Container::create(vec![Box::new(LeafConfig)]).unwrap();
        let child = parent.create_child(vec![Box::new(RebindConfig)]).unwrap();

        let from_child: Leaf = child.get_value("").unwrap();
        assert_eq!(from_child.0, 99);

        let from_parent: Leaf = parent.get_value("").unwrap();
        assert_eq!(from_parent.0, 7);
    }
}
