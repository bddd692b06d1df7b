//! Translator registry.
//!
//! Maps prim type names to translator factories. Lookups are two-phase:
//! [`TranslatorRegistry::find_registered`] is a pure map lookup, and on a
//! miss [`TranslatorRegistry::find`] asks the [`PluginLoader`] to load a
//! plugin for the type, retries once, and remembers types that stay
//! unknown.

use crate::context::ReadContext;
use crate::error::{ImportError, Result};
use crate::translators;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use stagelink_stage::Prim;
use std::sync::{Arc, PoisonError, RwLock};

/// Creates host objects for one prim.
pub trait Translator {
    /// Translate the prim. Called in pre-order, before its descendants.
    fn read(&mut self, prim: &Prim, ctx: &mut ReadContext<'_>) -> Result<()>;

    /// Whether [`post_read_subtree`](Self::post_read_subtree) should run.
    fn has_post_read_subtree(&self) -> bool {
        false
    }

    /// Finish the prim once every descendant has been read.
    fn post_read_subtree(&mut self, _prim: &Prim, _ctx: &mut ReadContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Builds a translator for a prim.
pub type TranslatorFactory = Arc<dyn Fn(&Prim) -> Box<dyn Translator> + Send + Sync>;

/// Loads external translator plugins on demand.
pub trait PluginLoader: Send + Sync {
    /// Load whatever provides a translator for `type_name` and register it
    /// into `registry`. Returns `false` if nothing is known for the type.
    fn load(&self, type_name: &str, registry: &TranslatorRegistry) -> bool;
}

static GLOBAL: Lazy<TranslatorRegistry> = Lazy::new(TranslatorRegistry::with_builtins);

/// Registry of translator factories keyed by prim type name.
pub struct TranslatorRegistry {
    factories: RwLock<IndexMap<String, TranslatorFactory>>,
    misses: RwLock<IndexSet<String>>,
    loader: Option<Box<dyn PluginLoader>>,
    fallback: TranslatorFactory,
}

impl Default for TranslatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslatorRegistry {
    /// Create an empty registry. Unknown types use the fallback translator.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(IndexMap::new()),
            misses: RwLock::new(IndexSet::new()),
            loader: None,
            fallback: translators::fallback_factory(),
        }
    }

    /// Create a registry with the built-in translators.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        translators::register_builtins(&registry);
        registry
    }

    /// The process-wide registry, built with the built-ins on first use.
    pub fn global() -> &'static TranslatorRegistry {
        &GLOBAL
    }

    /// Use `loader` to resolve types that are not registered.
    pub fn with_loader(mut self, loader: impl PluginLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Register a factory for `type_name`. The first registration wins.
    pub fn register<F>(&self, type_name: &str, factory: F) -> Result<()>
    where
        F: Fn(&Prim) -> Box<dyn Translator> + Send + Sync + 'static,
    {
        if type_name.is_empty() {
            log::error!("cannot register a translator for an empty type name");
            return Err(ImportError::InvalidTypeName(type_name.to_string()));
        }

        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        if factories.contains_key(type_name) {
            log::error!("translator already registered for type '{}'", type_name);
            return Err(ImportError::DuplicateTranslator(type_name.to_string()));
        }
        factories.insert(type_name.to_string(), Arc::new(factory));
        drop(factories);

        self.misses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(type_name);
        log::debug!("registered translator for '{}'", type_name);
        Ok(())
    }

    /// Pure lookup of a registered factory.
    pub fn find_registered(&self, type_name: &str) -> Option<TranslatorFactory> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
            .cloned()
    }

    /// Ask the plugin loader for `type_name`. Returns whether it loaded
    /// anything.
    pub fn trigger_external_load(&self, type_name: &str) -> bool {
        match &self.loader {
            Some(loader) => {
                log::debug!("loading plugin for type '{}'", type_name);
                loader.load(type_name, self)
            }
            None => false,
        }
    }

    /// Look up a factory, loading a plugin for the type on the first miss.
    pub fn find(&self, type_name: &str) -> Option<TranslatorFactory> {
        if let Some(factory) = self.find_registered(type_name) {
            return Some(factory);
        }
        if self.is_known_miss(type_name) {
            return None;
        }
        if self.trigger_external_load(type_name) {
            if let Some(factory) = self.find_registered(type_name) {
                return Some(factory);
            }
        }
        self.misses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(type_name.to_string());
        None
    }

    /// Look up a factory, substituting the fallback translator.
    pub fn find_or_fallback(&self, type_name: &str) -> TranslatorFactory {
        self.find(type_name).unwrap_or_else(|| {
            log::debug!("no translator for type '{}', using fallback", type_name);
            Arc::clone(&self.fallback)
        })
    }

    /// Whether `type_name` is remembered as having no translator.
    pub fn is_known_miss(&self, type_name: &str) -> bool {
        self.misses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(type_name)
    }

    /// Registered type names, in registration order.
    pub fn registered_types(&self) -> Vec<String> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.factories.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stagelink_stage::{Layer, MemoryStage, Stage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Noop;

    impl Translator for Noop {
        fn read(&mut self, _prim: &Prim, _ctx: &mut ReadContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    fn noop(_: &Prim) -> Box<dyn Translator> {
        Box::new(Noop)
    }

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
    }

    impl PluginLoader for CountingLoader {
        fn load(&self, type_name: &str, registry: &TranslatorRegistry) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if type_name == "Camera" {
                return registry.register("Camera", noop).is_ok();
            }
            false
        }
    }

    #[test]
    fn test_register_and_find() {
        let registry = TranslatorRegistry::new();
        registry.register("Widget", noop).unwrap();
        assert!(registry.find("Widget").is_some());
        assert!(registry.find("Gadget").is_none());
        assert_eq!(registry.registered_types(), vec!["Widget"]);
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let registry = TranslatorRegistry::new();
        registry.register("Widget", noop).unwrap();
        let err = registry.register("Widget", noop).unwrap_err();
        assert!(matches!(err, ImportError::DuplicateTranslator(name) if name == "Widget"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_type_name_rejected() {
        let registry = TranslatorRegistry::new();
        assert!(matches!(registry.register("", noop), Err(ImportError::InvalidTypeName(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_loader_runs_once_per_type() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = TranslatorRegistry::new().with_loader(CountingLoader {
            calls: Arc::clone(&calls),
        });

        assert!(registry.find("Camera").is_some());
        assert!(registry.find("Camera").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(registry.find("Unknown").is_none());
        assert!(registry.find("Unknown").is_none());
        assert!(registry.is_known_miss("Unknown"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_registering_clears_miss() {
        let registry = TranslatorRegistry::new();
        assert!(registry.find("Late").is_none());
        assert!(registry.is_known_miss("Late"));
        registry.register("Late", noop).unwrap();
        assert!(!registry.is_known_miss("Late"));
        assert!(registry.find("Late").is_some());
    }

    #[test]
    fn test_builtins_registered() {
        let registry = TranslatorRegistry::global();
        for type_name in ["Xform", "Scope", "Mesh", "Material", "Shader", "GeomSubset", "PointInstancer"] {
            assert!(registry.find_registered(type_name).is_some(), "{}", type_name);
        }
    }

    proptest! {
        #[test]
        fn test_fallback_always_resolves(type_name in "[A-Za-z_][A-Za-z0-9_]{0,16}") {
            let stage = MemoryStage::from_layer(Layer::new("empty.json")).unwrap();
            let registry = TranslatorRegistry::global();
            let translator = registry.find_or_fallback(&type_name)(stage.pseudo_root());
            if registry.find_registered(&type_name).is_none() {
                prop_assert!(!translator.has_post_read_subtree());
            }
        }
    }
}
