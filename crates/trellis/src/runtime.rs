//! The runtime: configuration, template handlers, class catalog, compiled
//! targets and the fragment cache, shared by every render.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use trellis::{Component, ComponentClass, Runtime};
//!
//! let greeting = ComponentClass::builder("Greeting")
//!     .template("jinja", "Hello, {{ name }}")
//!     .build()
//!     .unwrap();
//!
//! let runtime = Runtime::new();
//! let mut component = Component::new(greeting, json!({"name": "World"})).unwrap();
//! let html = runtime.render(&mut component).unwrap();
//! assert_eq!(html.as_str(), "Hello, World");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use trellis_render::{EnvironmentSetup, HandlerRegistry, Html, MiniJinjaHandler, TemplateHandler};

use crate::cache::{class_digest, CacheStore, MemoryStore};
use crate::class::{ClassId, ComponentClass};
use crate::collection::render_collection;
use crate::compiler::Compiler;
use crate::component::Component;
use crate::config::RuntimeConfig;
use crate::error::ComponentError;
use crate::target::TargetSet;
use crate::view::{install_component_function, View};

/// Builder for [`Runtime`].
#[derive(Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    cache: Option<Arc<dyn CacheStore>>,
    handlers: Vec<(String, Arc<dyn TemplateHandler>)>,
    setups: Vec<EnvironmentSetup>,
    classes: Vec<Arc<ComponentClass>>,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Store for rendered fragments. Defaults to a [`MemoryStore`].
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(store);
        self
    }

    /// Registers a template handler for `ext`, replacing the built-in one.
    pub fn handler(mut self, ext: impl Into<String>, handler: impl TemplateHandler + 'static) -> Self {
        self.handlers.push((ext.into(), Arc::new(handler)));
        self
    }

    /// Customizes the MiniJinja environment of every template (filters,
    /// globals, functions).
    pub fn environment<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut minijinja::Environment<'static>) + Send + Sync + 'static,
    {
        self.setups.push(Arc::new(setup));
        self
    }

    /// Adds a class to the catalog.
    pub fn register(mut self, class: Arc<ComponentClass>) -> Self {
        self.classes.push(class);
        self
    }

    pub fn build(self) -> Arc<Runtime> {
        let mut minijinja = MiniJinjaHandler::new().with_setup(install_component_function);
        for setup in self.setups {
            minijinja = minijinja.with_setup(move |env| setup(env));
        }
        let mut handlers = HandlerRegistry::with_minijinja(minijinja);
        for (ext, handler) in self.handlers {
            handlers.register_arc(ext, handler);
        }

        let classes = self
            .classes
            .into_iter()
            .map(|class| (class.name().to_string(), class))
            .collect();

        Arc::new(Runtime {
            config: self.config,
            handlers,
            compiler: Compiler::new(),
            classes: RwLock::new(classes),
            cache: self.cache.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            digests: Mutex::new(HashMap::new()),
        })
    }
}

pub struct Runtime {
    config: RuntimeConfig,
    handlers: HandlerRegistry,
    compiler: Compiler,
    classes: RwLock<HashMap<String, Arc<ComponentClass>>>,
    cache: Arc<dyn CacheStore>,
    digests: Mutex<HashMap<ClassId, String>>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    /// A runtime with the default configuration.
    pub fn new() -> Arc<Runtime> {
        Self::builder().build()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    // ========================================================================
    // Class catalog
    // ========================================================================

    /// Adds a class to the catalog, returning the class it replaced.
    pub fn register(&self, class: Arc<ComponentClass>) -> Option<Arc<ComponentClass>> {
        self.classes
            .write()
            .insert(class.name().to_string(), class)
    }

    /// Looks up a class by name.
    pub fn class(&self, name: &str) -> Result<Arc<ComponentClass>, ComponentError> {
        self.classes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ComponentError::UnknownClass(name.to_string()))
    }

    /// Registered class names, sorted.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    // ========================================================================
    // Compilation
    // ========================================================================

    pub fn compile(&self, class: &Arc<ComponentClass>) -> Result<Arc<TargetSet>, ComponentError> {
        self.compiler
            .compile(class, &self.handlers, &self.config.default_format)
    }

    /// Compiles every registered class up front. Returns how many compiled.
    pub fn eager_load(&self) -> Result<usize, ComponentError> {
        let classes: Vec<Arc<ComponentClass>> = self.classes.read().values().cloned().collect();
        for class in &classes {
            self.compile(class)?;
        }
        tracing::debug!(count = classes.len(), "eager loaded components");
        Ok(classes.len())
    }

    /// Drops compiled targets and digests so templates are read again.
    ///
    /// Only honored in development mode; returns whether anything was reset.
    pub fn reload_templates(&self) -> bool {
        if !self.config.development {
            tracing::warn!("ignoring template reload outside development mode");
            return false;
        }
        let dropped = self.compiler.clear();
        self.digests.lock().clear();
        tracing::debug!(dropped, "reloaded component templates");
        true
    }

    /// Template digest of `class`, computed once per class.
    pub fn digest(&self, class: &Arc<ComponentClass>) -> Result<String, ComponentError> {
        if let Some(digest) = self.digests.lock().get(&class.id()) {
            return Ok(digest.clone());
        }
        let digest = class_digest(class, self)?;
        self.digests.lock().insert(class.id(), digest.clone());
        Ok(digest)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// A fresh view for one render.
    pub fn view(self: &Arc<Self>) -> View {
        View::new(self.clone())
    }

    /// Renders a component in a fresh view.
    pub fn render(self: &Arc<Self>, component: &mut Component) -> Result<Html, ComponentError> {
        self.view().render(component)
    }

    /// Renders a class by name with JSON arguments.
    pub fn render_named(self: &Arc<Self>, name: &str, args: Value) -> Result<Html, ComponentError> {
        let mut component = Component::new(self.class(name)?, args)?;
        self.render(&mut component)
    }

    /// Renders one instance of `class` per item, in a fresh view.
    pub fn render_collection(
        self: &Arc<Self>,
        class: &Arc<ComponentClass>,
        items: &[Value],
        extra: Value,
    ) -> Result<Html, ComponentError> {
        render_collection(&self.view(), class, items, &extra)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .field("classes", &self.class_names())
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_class_is_an_error() {
        let runtime = Runtime::new();
        let err = runtime.class("Nope").unwrap_err();
        assert!(matches!(err, ComponentError::UnknownClass(name) if name == "Nope"));
    }

    #[test]
    fn register_replaces_by_name() {
        let runtime = Runtime::new();
        let first = ComponentClass::builder("Card").template("txt", "1").build().unwrap();
        let second = ComponentClass::builder("Card").template("txt", "2").build().unwrap();
        assert!(runtime.register(first.clone()).is_none());
        let replaced = runtime.register(second).unwrap();
        assert_eq!(replaced.id(), first.id());
        assert_eq!(runtime.class_names(), ["Card".to_string()]);
    }

    #[test]
    fn eager_load_compiles_every_class() {
        let runtime = Runtime::builder()
            .register(ComponentClass::builder("A").template("txt", "a").build().unwrap())
            .register(ComponentClass::builder("B").template("txt", "b").build().unwrap())
            .build();
        assert_eq!(runtime.eager_load().unwrap(), 2);
        let a = runtime.class("A").unwrap();
        assert!(runtime.compiler().is_compiled(&a));
    }

    #[test]
    fn reload_requires_development_mode() {
        let runtime = Runtime::new();
        assert!(!runtime.reload_templates());

        let runtime = Runtime::builder()
            .config(RuntimeConfig {
                development: true,
                ..RuntimeConfig::default()
            })
            .build();
        let class = ComponentClass::builder("A").template("txt", "a").build().unwrap();
        runtime.compile(&class).unwrap();
        assert!(runtime.reload_templates());
        assert!(!runtime.compiler().is_compiled(&class));
    }

    #[test]
    fn environment_setup_reaches_templates() {
        let runtime = Runtime::builder()
            .environment(|env| env.add_filter("shout", |s: String| s.to_uppercase()))
            .build();
        let class = ComponentClass::builder("Shout")
            .template("jinja", "{{ word | shout }}")
            .build()
            .unwrap();
        let mut component = Component::new(class, json!({"word": "hi"})).unwrap();
        assert_eq!(runtime.render(&mut component).unwrap().as_str(), "HI");
    }

    #[test]
    fn render_named_uses_the_catalog() {
        let runtime = Runtime::builder()
            .register(
                ComponentClass::builder("Greeting")
                    .template("jinja", "Hello, {{ name }}")
                    .build()
                    .unwrap(),
            )
            .build();
        let html = runtime.render_named("Greeting", json!({"name": "World"})).unwrap();
        assert_eq!(html.as_str(), "Hello, World");
    }
}
