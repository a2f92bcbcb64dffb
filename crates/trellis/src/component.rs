//! Component instances.
//!
//! A [`Component`] is one use of a [`ComponentClass`]: its arguments, the
//! content and slot values the caller supplied, any wrapped components, and
//! (once rendering starts) the [`View`] it renders into.
//!
//! Content and slots are lazy. Nothing the caller supplied is evaluated until
//! the component renders and its target asks for it, and each value is
//! evaluated at most once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use trellis_render::{Html, Local, Locals};

use crate::class::ComponentClass;
use crate::content::ContentState;
use crate::error::ComponentError;
use crate::lifecycle::RenderState;
use crate::slots::instance::render_return;
use crate::slots::{
    Cardinality, DelegatedSlot, SlotAccessor, SlotCall, SlotHandle, SlotHost, SlotInstance,
    SlotOutput,
};
use crate::view::View;

/// What [`Component::invoke`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invoked {
    /// A getter ran.
    Output(SlotOutput),
    /// A predicate ran.
    Present(bool),
    /// A setter ran.
    Set,
}

pub struct Component {
    pub(crate) class: Arc<ComponentClass>,
    pub(crate) args: Map<String, Value>,
    pub(crate) content: ContentState,
    pub(crate) slots: BTreeMap<String, Vec<SlotInstance>>,
    pub(crate) wrapped: BTreeMap<String, Component>,
    pub(crate) view: Option<View>,
    pub(crate) variant: Option<String>,
    pub(crate) state: RenderState,
}

impl Component {
    /// Creates an instance with the given arguments.
    ///
    /// `args` must be a JSON object or null. Every argument the class
    /// requires must be present.
    pub fn new(class: Arc<ComponentClass>, args: Value) -> Result<Self, ComponentError> {
        let args = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ComponentError::InvalidArguments {
                    class: class.name().to_string(),
                    found: json_type(&other).to_string(),
                })
            }
        };
        if let Some(missing) = class
            .required_args()
            .iter()
            .find(|name| !args.contains_key(name.as_str()))
        {
            return Err(ComponentError::MissingArgument {
                class: class.name().to_string(),
                argument: missing.clone(),
            });
        }
        Ok(Self {
            class,
            args,
            content: ContentState::Empty,
            slots: BTreeMap::new(),
            wrapped: BTreeMap::new(),
            view: None,
            variant: None,
            state: RenderState::Idle,
        })
    }

    pub fn class(&self) -> &Arc<ComponentClass> {
        &self.class
    }

    pub fn args(&self) -> &Map<String, Value> {
        &self.args
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Calls a named method declared on the class.
    pub fn call(&self, method: &str) -> Option<Value> {
        self.class.method(method).map(|m| m(self))
    }

    /// Forces a variant for this component, ignoring the view's variants.
    pub fn with_variant(&mut self, variant: impl Into<String>) -> &mut Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// The view this component renders into, once rendering has started.
    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub(crate) fn attach_view(&mut self, view: &View) {
        self.view = Some(view.clone());
    }

    pub(crate) fn ready_view(&self, capability: &'static str) -> Result<View, ComponentError> {
        self.view
            .clone()
            .ok_or_else(|| ComponentError::not_ready(self.class.name(), capability))
    }

    // ========================================================================
    // Wrapped components
    // ========================================================================

    /// Stores a component this one wraps, under `target`.
    ///
    /// Delegated slots forward to it, and templates can render it by name.
    pub fn wrap(&mut self, target: impl Into<String>, component: Component) -> &mut Self {
        self.wrapped.insert(target.into(), component);
        self
    }

    pub fn wrapped(&self, target: &str) -> Option<&Component> {
        self.wrapped.get(target)
    }

    pub fn wrapped_mut(&mut self, target: &str) -> Option<&mut Component> {
        self.wrapped.get_mut(target)
    }

    pub(crate) fn render_wrapped(&mut self, target: &str) -> Result<Html, ComponentError> {
        let view = self.ready_view("wrapped components")?;
        let class = self.class.name().to_string();
        let child = self
            .wrapped
            .get_mut(target)
            .ok_or_else(|| ComponentError::unknown_slot(&class, target))?;
        view.render(child)
    }

    fn delegate_target(
        &mut self,
        delegate: &DelegatedSlot,
    ) -> Result<&mut Component, ComponentError> {
        let view = self.view.clone();
        let class = self.class.name().to_string();
        let target = self.wrapped.get_mut(delegate.target()).ok_or_else(|| {
            ComponentError::MissingDelegateTarget {
                class,
                slot: delegate.name().to_string(),
                target: delegate.target().to_string(),
            }
        })?;
        if target.view.is_none() {
            target.view = view;
        }
        Ok(target)
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Renders a slot.
    ///
    /// Content is captured first, so slots set from within the content block
    /// are visible. An unset singular slot yields its default (if declared)
    /// or `None`; an unset collection yields an empty list.
    pub fn slot(&mut self, name: &str) -> Result<SlotOutput, ComponentError> {
        let class = self.class.clone();
        if let Some(delegate) = class.slots().delegate(name) {
            if self.view.is_some() {
                self.content()?;
            }
            return self.delegate_target(delegate)?.slot(name);
        }
        let definition = class
            .slots()
            .get(name)
            .ok_or_else(|| ComponentError::unknown_slot(class.name(), name))?;
        let view = self.ready_view("slots")?;
        self.content()?;

        let this: &Component = self;
        let entries = this.slots.get(name).map(Vec::as_slice).unwrap_or(&[]);
        match definition.cardinality() {
            Cardinality::Single => match (entries.last(), &definition.default) {
                (Some(instance), _) => Ok(SlotOutput::Single(Some(instance.render(this, &view)?))),
                (None, Some(producer)) => {
                    let returned = producer(this)?;
                    Ok(SlotOutput::Single(Some(render_return(returned, &view)?)))
                }
                (None, None) => Ok(SlotOutput::Single(None)),
            },
            Cardinality::Collection => entries
                .iter()
                .map(|instance| instance.render(this, &view))
                .collect::<Result<Vec<_>, _>>()
                .map(SlotOutput::Many),
        }
    }

    /// Renders a singular slot.
    pub fn slot_one(&mut self, name: &str) -> Result<Option<Html>, ComponentError> {
        Ok(self.slot(name)?.into_single())
    }

    /// Renders a collection slot in insertion order.
    pub fn slot_many(&mut self, name: &str) -> Result<Vec<Html>, ComponentError> {
        Ok(self.slot(name)?.into_many())
    }

    /// Whether a slot was set or declares a default.
    ///
    /// Once rendering has started, content is captured first.
    pub fn has_slot(&mut self, name: &str) -> Result<bool, ComponentError> {
        let class = self.class.clone();
        if let Some(delegate) = class.slots().delegate(name) {
            if self.view.is_some() {
                self.content()?;
            }
            return self.delegate_target(delegate)?.has_slot(name);
        }
        let definition = class
            .slots()
            .get(name)
            .ok_or_else(|| ComponentError::unknown_slot(class.name(), name))?;
        if self.view.is_some() {
            self.content()?;
        }
        let set = self.slots.get(name).is_some_and(|entries| !entries.is_empty());
        Ok(set || definition.has_default())
    }

    /// Sets a slot (or appends to a collection slot).
    ///
    /// Singular slots are overwritten by a second call. A singular
    /// polymorphic slot can't switch to another type once set.
    pub fn with_slot(
        &mut self,
        name: &str,
        call: SlotCall,
    ) -> Result<SlotHandle<'_>, ComponentError> {
        let class = self.class.clone();
        if let Some(delegate) = class.slots().delegate(name) {
            let call = delegate.transform_call(call);
            return self.delegate_target(delegate)?.with_slot(name, call);
        }
        let definition = class
            .slots()
            .get(name)
            .ok_or_else(|| ComponentError::unknown_slot(class.name(), name))?;
        let instance = SlotInstance::build(&class, definition, call)?;

        let entries = self.slots.entry(name.to_string()).or_default();
        if definition.cardinality() == Cardinality::Single {
            if let Some(existing) = entries.last() {
                if definition.is_polymorphic() && existing.type_name() != instance.type_name() {
                    return Err(ComponentError::SlotAlreadyProvided {
                        class: class.name().to_string(),
                        slot: name.to_string(),
                    });
                }
                tracing::debug!(component = class.name(), slot = name, "overwriting singular slot");
            }
            entries.clear();
        }
        entries.push(instance);
        let index = entries.len() - 1;
        Ok(SlotHandle::new(class.name(), &mut entries[index]))
    }

    /// Runs a slot accessor by name (`header`, `header?`, `with_header`,
    /// `with_item`, `with_items`, `with_visual_icon`, ...).
    pub fn invoke(&mut self, accessor: &str, call: SlotCall) -> Result<Invoked, ComponentError> {
        let class = self.class.clone();
        let accessor = class
            .slots()
            .accessor(accessor)
            .ok_or_else(|| ComponentError::unknown_slot(class.name(), accessor))?;
        match accessor {
            SlotAccessor::Get { slot } => Ok(Invoked::Output(self.slot(slot)?)),
            SlotAccessor::Predicate { slot } => Ok(Invoked::Present(self.has_slot(slot)?)),
            SlotAccessor::Set { slot } | SlotAccessor::Append { slot } => {
                self.with_slot(slot, call)?;
                Ok(Invoked::Set)
            }
            SlotAccessor::SetPolymorphic { slot, type_name } => {
                self.with_slot(slot, call.of_type(type_name.clone()))?;
                Ok(Invoked::Set)
            }
            SlotAccessor::SetMany { slot } => {
                let items = match call.args {
                    Value::Array(items) => items,
                    other => {
                        return Err(ComponentError::InvalidArguments {
                            class: class.name().to_string(),
                            found: json_type(&other).to_string(),
                        })
                    }
                };
                for item in items {
                    self.with_slot(slot, SlotCall::new().args(item))?;
                }
                Ok(Invoked::Set)
            }
        }
    }

    // ========================================================================
    // Template locals
    // ========================================================================

    /// Locals for a template that reads `referenced`.
    ///
    /// Arguments are always present. Methods, content, slots and wrapped
    /// components are only computed when referenced, and take precedence in
    /// that order over arguments of the same name.
    pub(crate) fn template_locals(
        &mut self,
        referenced: &BTreeSet<String>,
    ) -> Result<Locals, ComponentError> {
        let class = self.class.clone();
        let mut locals = Locals::from_object(&Value::Object(self.args.clone()));

        for name in referenced {
            if let Some(method) = class.method(name) {
                locals.insert_data(name.clone(), method(self));
            }
        }

        for name in referenced {
            if name == "content" {
                let content = self.content()?;
                locals.insert(
                    name.clone(),
                    content.map(Local::Html).unwrap_or(Local::Data(Value::Null)),
                );
            } else if class.slots().is_slot(name) {
                let output = self.slot(name)?;
                locals.insert(name.clone(), output.into_local());
            } else if self.wrapped.contains_key(name) {
                let html = self.render_wrapped(name)?;
                locals.insert_html(name.clone(), html);
            }
        }
        Ok(locals)
    }
}

impl SlotHost for Component {
    fn set_slot(&mut self, name: &str, call: SlotCall) -> Result<(), ComponentError> {
        self.with_slot(name, call).map(|_| ())
    }

    fn get_slot(&mut self, name: &str) -> Result<SlotOutput, ComponentError> {
        self.slot(name)
    }

    fn slot_present(&mut self, name: &str) -> Result<bool, ComponentError> {
        self.has_slot(name)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("class", &self.class.name())
            .field("args", &self.args)
            .field("content", &self.content)
            .field("slots", &self.slots)
            .field("wrapped", &self.wrapped.keys().collect::<Vec<_>>())
            .field("variant", &self.variant)
            .field("state", &self.state)
            .finish()
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
