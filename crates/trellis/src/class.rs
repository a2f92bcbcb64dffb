//! Component class descriptors.
//!
//! A [`ComponentClass`] is built once through [`ComponentClassBuilder`] and
//! shared behind an `Arc`. It declares everything instances of the class have
//! in common: where its templates live, inline templates and render
//! callables, slots, named methods, cache dependencies, render callbacks and
//! rescue handlers.
//!
//! ```rust
//! use trellis::{ComponentClass, SlotSource};
//!
//! let card = ComponentClass::builder("Card")
//!     .template("jinja", "{{ header }}{% for item in items %}{{ item }}{% endfor %}")
//!     .renders_one("header", SlotSource::Passthrough)
//!     .unwrap()
//!     .renders_many("items", SlotSource::Passthrough)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! assert!(card.slots().accessor("with_item").is_some());
//! ```
//!
//! # Subclasses
//!
//! [`ComponentClass::subclass`] copies every registry of the parent into a new
//! builder. Later declarations on the subclass never reach the parent. A
//! subclass without templates or render callables of its own renders with
//! its parent's targets.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use trellis_render::{Html, Markup};

use crate::component::Component;
use crate::error::{ComponentError, DefinitionError};
use crate::lifecycle::{Callbacks, Flow, Next, Rescuer};
use crate::scope::RenderScope;
use crate::slots::{
    ArgTransform, Cardinality, DelegatedSlot, PolymorphicType, SlotDefinition, SlotKind,
    SlotRegistry, SlotReturn, SlotSource,
};

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a component class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Inline render callable.
pub type InlineFn =
    Arc<dyn Fn(&mut RenderScope<'_>) -> Result<Html, ComponentError> + Send + Sync>;

/// Named method exposed to templates and cache dependencies.
pub type MethodFn = Arc<dyn Fn(&Component) -> Value + Send + Sync>;

/// Predicate over a component instance.
pub type PredicateFn = Arc<dyn Fn(&Component) -> bool + Send + Sync>;

#[derive(Debug, Clone)]
pub(crate) struct InlineTemplate {
    pub(crate) variant: Option<String>,
    pub(crate) format: Option<String>,
    pub(crate) extension: String,
    pub(crate) source: String,
}

#[derive(Clone)]
pub(crate) struct InlineCall {
    pub(crate) variant: Option<String>,
    pub(crate) format: Option<String>,
    pub(crate) call: InlineFn,
}

/// Fragment cache settings for a class.
#[derive(Clone, Default)]
pub struct CachePolicy {
    pub(crate) deps: Vec<String>,
    pub(crate) cache_if: Option<PredicateFn>,
}

impl CachePolicy {
    /// Dependency names, in declaration order.
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    pub fn is_enabled(&self) -> bool {
        !self.deps.is_empty()
    }
}

impl fmt::Debug for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePolicy")
            .field("deps", &self.deps)
            .field("cache_if", &self.cache_if.is_some())
            .finish()
    }
}

pub struct ComponentClass {
    id: ClassId,
    name: String,
    parent: Option<Arc<ComponentClass>>,
    template_dir: Option<PathBuf>,
    template_base: String,
    inline_templates: Vec<InlineTemplate>,
    inline_calls: Vec<InlineCall>,
    slots: SlotRegistry,
    methods: BTreeMap<String, MethodFn>,
    cache: CachePolicy,
    callbacks: Callbacks,
    rescuers: Vec<Rescuer>,
    render_if: Option<PredicateFn>,
    required_args: Vec<String>,
    collection_parameter: Option<String>,
}

impl ComponentClass {
    pub fn builder(name: impl Into<String>) -> ComponentClassBuilder {
        ComponentClassBuilder::new(name.into(), None)
    }

    /// Starts a subclass of `parent`, copying its registries.
    pub fn subclass(parent: &Arc<ComponentClass>, name: impl Into<String>) -> ComponentClassBuilder {
        let mut builder = ComponentClassBuilder::new(name.into(), Some(parent.clone()));
        builder.template_dir = parent.template_dir.clone();
        builder.slots = parent.slots.clone();
        builder.methods = parent.methods.clone();
        builder.cache = parent.cache.clone();
        builder.callbacks = parent.callbacks.clone();
        builder.rescuers = parent.rescuers.clone();
        builder.render_if = parent.render_if.clone();
        builder.required_args = parent.required_args.clone();
        builder.collection_parameter = parent.collection_parameter.clone();
        builder
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ComponentClass>> {
        self.parent.as_ref()
    }

    /// Directory scanned for sidecar templates.
    pub fn template_dir(&self) -> Option<&Path> {
        self.template_dir.as_deref()
    }

    /// File name stem sidecar templates must start with.
    pub fn template_base(&self) -> &str {
        &self.template_base
    }

    pub(crate) fn inline_templates(&self) -> &[InlineTemplate] {
        &self.inline_templates
    }

    pub(crate) fn inline_calls(&self) -> &[InlineCall] {
        &self.inline_calls
    }

    pub fn slots(&self) -> &SlotRegistry {
        &self.slots
    }

    pub fn method(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn cache_policy(&self) -> &CachePolicy {
        &self.cache
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub(crate) fn rescuers(&self) -> &[Rescuer] {
        &self.rescuers
    }

    /// Evaluates the class's `render_if` predicate (true when none is set).
    pub fn should_render(&self, component: &Component) -> bool {
        self.render_if.as_ref().map_or(true, |p| p(component))
    }

    pub fn required_args(&self) -> &[String] {
        &self.required_args
    }

    /// Local name each item gets in [`render_collection`](crate::render_collection).
    ///
    /// Defaults to the template base without a trailing `_component`.
    pub fn collection_parameter(&self) -> String {
        match &self.collection_parameter {
            Some(name) => name.clone(),
            None => self
                .template_base
                .strip_suffix("_component")
                .unwrap_or(&self.template_base)
                .to_string(),
        }
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("template_dir", &self.template_dir)
            .field("template_base", &self.template_base)
            .field("inline_templates", &self.inline_templates.len())
            .field("inline_calls", &self.inline_calls.len())
            .field("slots", &self.slots)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("cache", &self.cache)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// Builder for [`ComponentClass`].
///
/// Slot declarations validate eagerly and return [`DefinitionError`];
/// everything else is checked by [`build`](Self::build).
pub struct ComponentClassBuilder {
    name: String,
    parent: Option<Arc<ComponentClass>>,
    template_dir: Option<PathBuf>,
    template_base: String,
    inline_templates: Vec<InlineTemplate>,
    inline_calls: Vec<InlineCall>,
    slots: SlotRegistry,
    methods: BTreeMap<String, MethodFn>,
    cache: CachePolicy,
    callbacks: Callbacks,
    rescuers: Vec<Rescuer>,
    render_if: Option<PredicateFn>,
    required_args: Vec<String>,
    collection_parameter: Option<String>,
}

impl fmt::Debug for ComponentClassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClassBuilder")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("template_dir", &self.template_dir)
            .field("template_base", &self.template_base)
            .field("inline_templates", &self.inline_templates.len())
            .field("inline_calls", &self.inline_calls.len())
            .field("slots", &self.slots)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("required_args", &self.required_args)
            .finish()
    }
}

impl ComponentClassBuilder {
    fn new(name: String, parent: Option<Arc<ComponentClass>>) -> Self {
        let template_base = template_base_for(&name);
        Self {
            name,
            parent,
            template_dir: None,
            template_base,
            inline_templates: Vec::new(),
            inline_calls: Vec::new(),
            slots: SlotRegistry::default(),
            methods: BTreeMap::new(),
            cache: CachePolicy::default(),
            callbacks: Callbacks::default(),
            rescuers: Vec::new(),
            render_if: None,
            required_args: Vec::new(),
            collection_parameter: None,
        }
    }

    // ========================================================================
    // Templates and render callables
    // ========================================================================

    pub fn template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Overrides the sidecar file stem (defaults to the snake-cased class
    /// name, ignoring any `::` path).
    pub fn template_base(mut self, base: impl Into<String>) -> Self {
        self.template_base = base.into();
        self
    }

    /// Declares the default inline template, compiled by the handler for
    /// `extension`.
    pub fn template(self, extension: &str, source: impl Into<String>) -> Self {
        self.inline_template(None, None, extension, source)
    }

    pub fn variant_template(
        self,
        variant: &str,
        extension: &str,
        source: impl Into<String>,
    ) -> Self {
        self.inline_template(Some(variant), None, extension, source)
    }

    /// Declares an inline template for any variant and format. A `None`
    /// format means the runtime's default format.
    pub fn inline_template(
        mut self,
        variant: Option<&str>,
        format: Option<&str>,
        extension: &str,
        source: impl Into<String>,
    ) -> Self {
        self.inline_templates.push(InlineTemplate {
            variant: variant.map(str::to_string),
            format: format.map(str::to_string),
            extension: extension.to_string(),
            source: source.into(),
        });
        self
    }

    /// Declares the default inline render callable.
    pub fn call<F>(self, f: F) -> Self
    where
        F: Fn(&mut RenderScope<'_>) -> Result<Html, ComponentError> + Send + Sync + 'static,
    {
        self.inline_call(None, None, f)
    }

    pub fn call_variant<F>(self, variant: &str, f: F) -> Self
    where
        F: Fn(&mut RenderScope<'_>) -> Result<Html, ComponentError> + Send + Sync + 'static,
    {
        self.inline_call(Some(variant), None, f)
    }

    /// Declares a render callable for a variant and format. Declaring the
    /// same pair twice keeps the later callable.
    pub fn inline_call<F>(mut self, variant: Option<&str>, format: Option<&str>, f: F) -> Self
    where
        F: Fn(&mut RenderScope<'_>) -> Result<Html, ComponentError> + Send + Sync + 'static,
    {
        let variant = variant.map(str::to_string);
        let format = format.map(str::to_string);
        self.inline_calls
            .retain(|c| !(c.variant == variant && c.format == format));
        self.inline_calls.push(InlineCall {
            variant,
            format,
            call: Arc::new(f),
        });
        self
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Declares a singular slot.
    pub fn renders_one(
        self,
        name: &str,
        source: SlotSource,
    ) -> Result<Self, DefinitionError> {
        self.register_slot(name, Cardinality::Single, SlotKind::Monomorphic(source))
    }

    /// Declares a collection slot. The name must be a plural.
    pub fn renders_many(
        self,
        name: &str,
        source: SlotSource,
    ) -> Result<Self, DefinitionError> {
        self.register_slot(name, Cardinality::Collection, SlotKind::Monomorphic(source))
    }

    pub fn renders_one_polymorphic(
        self,
        name: &str,
        types: Vec<PolymorphicType>,
    ) -> Result<Self, DefinitionError> {
        let kind = self.polymorphic_kind(name, types)?;
        self.register_slot(name, Cardinality::Single, kind)
    }

    pub fn renders_many_polymorphic(
        self,
        name: &str,
        types: Vec<PolymorphicType>,
    ) -> Result<Self, DefinitionError> {
        let kind = self.polymorphic_kind(name, types)?;
        self.register_slot(name, Cardinality::Collection, kind)
    }

    /// Sets the value an unset singular slot renders.
    pub fn slot_default<F>(mut self, slot: &str, f: F) -> Result<Self, DefinitionError>
    where
        F: Fn(&Component) -> Result<SlotReturn, ComponentError> + Send + Sync + 'static,
    {
        self.slots.set_default(&self.name, slot, Arc::new(f))?;
        Ok(self)
    }

    /// Declares a singular slot forwarded to the component wrapped under
    /// `target`. `transform` rewrites the call's arguments on the way.
    pub fn delegate_renders_one<F>(
        self,
        name: &str,
        target: &str,
        transform: F,
    ) -> Result<Self, DefinitionError>
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.register_delegate(name, Cardinality::Single, target, Arc::new(transform))
    }

    pub fn delegate_renders_many<F>(
        self,
        name: &str,
        target: &str,
        transform: F,
    ) -> Result<Self, DefinitionError>
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.register_delegate(name, Cardinality::Collection, target, Arc::new(transform))
    }

    fn polymorphic_kind(
        &self,
        name: &str,
        types: Vec<PolymorphicType>,
    ) -> Result<SlotKind, DefinitionError> {
        let mut map = BTreeMap::new();
        for poly in types {
            let type_name = poly.type_name.clone();
            if map.insert(type_name.clone(), poly).is_some() {
                return Err(DefinitionError::InvalidSlotSource {
                    class: self.name.clone(),
                    slot: name.to_string(),
                    reason: format!("type '{type_name}' is declared twice"),
                });
            }
        }
        Ok(SlotKind::Polymorphic(map))
    }

    fn register_slot(
        mut self,
        name: &str,
        cardinality: Cardinality,
        kind: SlotKind,
    ) -> Result<Self, DefinitionError> {
        let definition = SlotDefinition {
            name: name.to_string(),
            cardinality,
            kind,
            default: None,
        };
        let methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        self.slots.register(&self.name, definition, &methods)?;
        Ok(self)
    }

    fn register_delegate(
        mut self,
        name: &str,
        cardinality: Cardinality,
        target: &str,
        transform: ArgTransform,
    ) -> Result<Self, DefinitionError> {
        let delegate = DelegatedSlot::new(name, cardinality, target, transform);
        let methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        self.slots.register_delegate(&self.name, delegate, &methods)?;
        Ok(self)
    }

    // ========================================================================
    // Methods and caching
    // ========================================================================

    /// Declares a named method. Templates that reference the name receive its
    /// value, and cache dependencies may name it.
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Component) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Declares fragment cache dependencies, each an argument or method name.
    pub fn cache_on(mut self, deps: &[&str]) -> Self {
        for dep in deps {
            if !self.cache.deps.iter().any(|d| d == dep) {
                self.cache.deps.push(dep.to_string());
            }
        }
        self
    }

    /// Only cache renders for which `f` returns true.
    pub fn cache_if<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component) -> bool + Send + Sync + 'static,
    {
        self.cache.cache_if = Some(Arc::new(f));
        self
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn before_render<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Component) -> Result<Flow, ComponentError> + Send + Sync + 'static,
    {
        self.callbacks = std::mem::take(&mut self.callbacks).before_render(f);
        self
    }

    pub fn around_render<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Component, Next<'_>) -> Result<Html, ComponentError> + Send + Sync + 'static,
    {
        self.callbacks = std::mem::take(&mut self.callbacks).around_render(f);
        self
    }

    pub fn after_render<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component, Html) -> Result<Html, ComponentError> + Send + Sync + 'static,
    {
        self.callbacks = std::mem::take(&mut self.callbacks).after_render(f);
        self
    }

    pub fn output_preamble<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component) -> Markup + Send + Sync + 'static,
    {
        self.callbacks = std::mem::take(&mut self.callbacks).output_preamble(f);
        self
    }

    pub fn output_postamble<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component) -> Markup + Send + Sync + 'static,
    {
        self.callbacks = std::mem::take(&mut self.callbacks).output_postamble(f);
        self
    }

    /// Handles errors of type `E` raised while rendering, anywhere in the
    /// error's source chain.
    pub fn rescue_from<E, F>(mut self, f: F) -> Self
    where
        E: StdError + 'static,
        F: Fn(&E, &Component) -> Result<Html, ComponentError> + Send + Sync + 'static,
    {
        self.rescuers.push(Rescuer::new::<E, F>(f));
        self
    }

    /// Skips rendering (empty output) when `f` returns false.
    pub fn render_if<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component) -> bool + Send + Sync + 'static,
    {
        self.render_if = Some(Arc::new(f));
        self
    }

    /// Arguments every instance must be created with.
    pub fn requires(mut self, args: &[&str]) -> Self {
        for arg in args {
            if !self.required_args.iter().any(|a| a == arg) {
                self.required_args.push(arg.to_string());
            }
        }
        self
    }

    pub fn collection_parameter(mut self, name: impl Into<String>) -> Self {
        self.collection_parameter = Some(name.into());
        self
    }

    /// Finishes the class.
    ///
    /// Fails when a named method shadows a slot accessor. Templates are not
    /// looked at until the class is first compiled.
    pub fn build(self) -> Result<Arc<ComponentClass>, DefinitionError> {
        if let Some(name) = self
            .methods
            .keys()
            .find(|m| self.slots.accessor(m).is_some() || self.slots.is_slot(m))
        {
            return Err(DefinitionError::MethodConflict {
                class: self.name.clone(),
                name: name.clone(),
            });
        }

        tracing::debug!(
            component = %self.name,
            slots = self.slots.slots().count(),
            parent = ?self.parent.as_ref().map(|p| p.name()),
            "defined component class"
        );

        Ok(Arc::new(ComponentClass {
            id: ClassId::next(),
            name: self.name,
            parent: self.parent,
            template_dir: self.template_dir,
            template_base: self.template_base,
            inline_templates: self.inline_templates,
            inline_calls: self.inline_calls,
            slots: self.slots,
            methods: self.methods,
            cache: self.cache,
            callbacks: self.callbacks,
            rescuers: self.rescuers,
            render_if: self.render_if,
            required_args: self.required_args,
            collection_parameter: self.collection_parameter,
        }))
    }
}

/// `Admin::UserCard` becomes `user_card`.
fn template_base_for(name: &str) -> String {
    let last = name.rsplit("::").next().unwrap_or(name);
    let mut result = String::new();
    let mut prev_lower = false;
    for c in last.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_base_is_snake_case() {
        assert_eq!(template_base_for("Card"), "card");
        assert_eq!(template_base_for("UserCard"), "user_card");
        assert_eq!(template_base_for("Admin::UserCardComponent"), "user_card_component");
        assert_eq!(template_base_for("HTMLBadge"), "htmlbadge");
    }

    #[test]
    fn class_ids_are_unique() {
        let a = ComponentClass::builder("A").build().unwrap();
        let b = ComponentClass::builder("A").build().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn collection_parameter_defaults_to_base_without_suffix() {
        let class = ComponentClass::builder("ProductComponent").build().unwrap();
        assert_eq!(class.collection_parameter(), "product");

        let class = ComponentClass::builder("Product")
            .collection_parameter("item")
            .build()
            .unwrap();
        assert_eq!(class.collection_parameter(), "item");
    }

    #[test]
    fn method_shadowing_accessor_is_rejected() {
        let err = ComponentClass::builder("Card")
            .renders_one("header", SlotSource::Passthrough)
            .unwrap()
            .method("with_header", |_| Value::Null)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::MethodConflict {
                class: "Card".into(),
                name: "with_header".into()
            }
        );
    }

    #[test]
    fn slot_declared_after_method_is_rejected() {
        let err = ComponentClass::builder("Card")
            .method("title", |_| Value::Null)
            .renders_one("title", SlotSource::Passthrough)
            .err()
            .unwrap();
        assert!(matches!(err, DefinitionError::MethodConflict { .. }));
    }

    #[test]
    fn duplicate_polymorphic_types_are_rejected() {
        let err = ComponentClass::builder("List")
            .renders_many_polymorphic(
                "items",
                vec![
                    PolymorphicType::new("icon", SlotSource::Passthrough),
                    PolymorphicType::new("icon", SlotSource::Passthrough),
                ],
            )
            .err()
            .unwrap();
        assert!(matches!(err, DefinitionError::InvalidSlotSource { .. }));
    }

    #[test]
    fn later_inline_call_replaces_earlier_for_same_target() {
        let class = ComponentClass::builder("Card")
            .call(|_| Ok(Html::safe("one")))
            .call(|_| Ok(Html::safe("two")))
            .call_variant("phone", |_| Ok(Html::safe("phone")))
            .build()
            .unwrap();
        assert_eq!(class.inline_calls().len(), 2);
    }

    #[test]
    fn subclass_copies_registries_without_touching_parent() {
        let parent = ComponentClass::builder("Base")
            .template_dir("/tmp/components")
            .renders_one("header", SlotSource::Passthrough)
            .unwrap()
            .cache_on(&["version"])
            .requires(&["id"])
            .template("txt", "base")
            .build()
            .unwrap();

        let child = ComponentClass::subclass(&parent, "Child")
            .renders_many("items", SlotSource::Passthrough)
            .unwrap()
            .build()
            .unwrap();

        assert!(child.slots().get("header").is_some());
        assert!(child.slots().get("items").is_some());
        assert!(parent.slots().get("items").is_none());
        assert_eq!(child.cache_policy().deps(), ["version".to_string()]);
        assert_eq!(child.required_args(), ["id".to_string()]);
        assert_eq!(child.template_dir(), Some(Path::new("/tmp/components")));
        assert_eq!(child.template_base(), "child");
        assert!(child.inline_templates().is_empty());
        assert_eq!(child.parent().map(|p| p.name()), Some("Base"));
    }

    #[test]
    fn render_if_defaults_to_true() {
        let class = ComponentClass::builder("Card").build().unwrap();
        let component = Component::new(class, Value::Null).unwrap();
        assert!(component.class().should_render(&component));

        let class = ComponentClass::builder("Hidden")
            .render_if(|c| c.arg("show").and_then(Value::as_bool).unwrap_or(false))
            .build()
            .unwrap();
        let component = Component::new(class, Value::Null).unwrap();
        assert!(!component.class().should_render(&component));
    }
}
