//! Slot instances.
//!
//! Every value passed to a slot becomes a [`SlotInstance`] wrapping exactly
//! one [`SlotValue`]. Instances render lazily, the first time the slot is
//! read, and memoize the result.

use std::cell::RefCell;
use std::fmt;

use trellis_render::{Html, Local};

use crate::class::ComponentClass;
use crate::component::Component;
use crate::error::ComponentError;
use crate::view::{View, ViewBlock};

use super::definition::{SlotDefinition, SlotLambda, SlotReturn, SlotSource};

/// Arguments for setting a slot.
///
/// ```rust
/// use trellis::{Html, SlotCall};
/// use serde_json::json;
///
/// let call = SlotCall::new()
///     .args(json!({"href": "/home"}))
///     .content(Html::escape("Home"));
/// ```
#[derive(Default)]
pub struct SlotCall {
    pub(crate) args: serde_json::Value,
    pub(crate) block: Option<ViewBlock>,
    pub(crate) content: Option<Html>,
    pub(crate) type_name: Option<String>,
}

impl SlotCall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments for the slot's component or lambda. Must be a JSON object
    /// (or null) for component sources.
    pub fn args(mut self, args: serde_json::Value) -> Self {
        self.args = args;
        self
    }

    /// Block whose captured output becomes the slot's content.
    pub fn block<F>(mut self, block: F) -> Self
    where
        F: FnOnce(&View) -> Result<Html, ComponentError> + 'static,
    {
        self.block = Some(Box::new(block));
        self
    }

    /// Literal content.
    pub fn content(mut self, content: Html) -> Self {
        self.content = Some(content);
        self
    }

    /// Type to use for a polymorphic slot.
    pub fn of_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

impl fmt::Debug for SlotCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotCall")
            .field("args", &self.args)
            .field("block", &self.block.is_some())
            .field("content", &self.content)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A rendered slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutput {
    Single(Option<Html>),
    Many(Vec<Html>),
}

impl SlotOutput {
    pub fn into_single(self) -> Option<Html> {
        match self {
            SlotOutput::Single(html) => html,
            SlotOutput::Many(items) => items.into_iter().next(),
        }
    }

    pub fn into_many(self) -> Vec<Html> {
        match self {
            SlotOutput::Single(html) => html.into_iter().collect(),
            SlotOutput::Many(items) => items,
        }
    }

    pub fn is_present(&self) -> bool {
        match self {
            SlotOutput::Single(html) => html.is_some(),
            SlotOutput::Many(items) => !items.is_empty(),
        }
    }

    pub(crate) fn into_local(self) -> Local {
        match self {
            SlotOutput::Single(Some(html)) => Local::Html(html),
            SlotOutput::Single(None) => Local::Data(serde_json::Value::Null),
            SlotOutput::Many(items) => Local::List(items),
        }
    }
}

/// A component stored in a slot.
pub enum ComponentRef {
    Ready(Box<Component>),
    /// Resolved through the runtime's class catalog on first render.
    Named {
        class: String,
        args: serde_json::Value,
        block: Option<ViewBlock>,
        content: Option<Html>,
    },
}

impl ComponentRef {
    fn component_mut(&mut self, view: &View) -> Result<&mut Component, ComponentError> {
        if let ComponentRef::Named {
            class,
            args,
            block,
            content,
        } = self
        {
            let class = view.runtime().class(class)?;
            let child = build_child(
                &class,
                std::mem::take(args),
                block.take(),
                content.take(),
            )?;
            *self = ComponentRef::Ready(Box::new(child));
        }
        match self {
            ComponentRef::Ready(component) => Ok(&mut **component),
            ComponentRef::Named { class, .. } => Err(ComponentError::UnknownClass(class.clone())),
        }
    }
}

/// Something callable that produces the slot's output.
pub enum Callable {
    /// A captured view block.
    Block(Option<ViewBlock>),
    Lambda {
        lambda: SlotLambda,
        args: serde_json::Value,
        block: Option<ViewBlock>,
        content: Option<Html>,
    },
}

/// The value a slot holds.
pub enum SlotValue {
    Component(ComponentRef),
    Content(Html),
    Callable(Callable),
}

impl SlotValue {
    fn from_call(
        class: &ComponentClass,
        definition: &SlotDefinition,
        call: SlotCall,
    ) -> Result<SlotValue, ComponentError> {
        let SlotCall {
            args,
            block,
            content,
            type_name,
        } = call;

        if block.is_some() && content.is_some() {
            return Err(ComponentError::DuplicateContent {
                class: class.name().to_string(),
                slot: Some(definition.name().to_string()),
            });
        }

        let source = definition.source_for(class.name(), type_name.as_deref())?;
        let value = match source {
            SlotSource::Passthrough => match (block, content) {
                (Some(block), _) => SlotValue::Callable(Callable::Block(Some(block))),
                (None, content) => SlotValue::Content(content.unwrap_or_default()),
            },
            SlotSource::Component(child_class) => SlotValue::Component(ComponentRef::Ready(
                Box::new(build_child(child_class, args, block, content)?),
            )),
            SlotSource::ClassName(name) => SlotValue::Component(ComponentRef::Named {
                class: name.clone(),
                args,
                block,
                content,
            }),
            SlotSource::Lambda(lambda) => SlotValue::Callable(Callable::Lambda {
                lambda: lambda.clone(),
                args,
                block,
                content,
            }),
        };
        Ok(value)
    }

    fn render(&mut self, parent: &Component, view: &View) -> Result<Html, ComponentError> {
        match self {
            SlotValue::Content(html) => Ok(html.clone()),
            SlotValue::Component(reference) => {
                let component = reference.component_mut(view)?;
                view.render(component)
            }
            SlotValue::Callable(Callable::Block(block)) => match block.take() {
                Some(block) => view.capture(|| block(view)),
                None => Ok(Html::empty()),
            },
            SlotValue::Callable(Callable::Lambda {
                lambda,
                args,
                block,
                content,
            }) => {
                let content = match block.take() {
                    Some(block) => Some(view.capture(|| block(view))?),
                    None => content.clone(),
                };
                let returned = lambda(parent, args, content)?;
                render_return(returned, view)
            }
        }
    }

    fn set_content(&mut self, class: &str, slot: &str, html: Html) -> Result<(), ComponentError> {
        let duplicate = || ComponentError::DuplicateContent {
            class: class.to_string(),
            slot: Some(slot.to_string()),
        };
        match self {
            SlotValue::Content(existing) => *existing = html,
            SlotValue::Callable(Callable::Block(_)) => return Err(duplicate()),
            SlotValue::Component(ComponentRef::Ready(component)) => {
                component.with_content(html)?;
            }
            SlotValue::Component(ComponentRef::Named { block, content, .. })
            | SlotValue::Callable(Callable::Lambda { block, content, .. }) => {
                if block.is_some() {
                    return Err(duplicate());
                }
                *content = Some(html);
            }
        }
        Ok(())
    }
}

fn build_child(
    class: &std::sync::Arc<ComponentClass>,
    args: serde_json::Value,
    block: Option<ViewBlock>,
    content: Option<Html>,
) -> Result<Component, ComponentError> {
    let mut child = Component::new(class.clone(), args)?;
    if let Some(content) = content {
        child.with_content(content)?;
    }
    if let Some(block) = block {
        child.with_block(move |_, view| block(view))?;
    }
    Ok(child)
}

/// Renders what a lambda or default producer returned.
pub(crate) fn render_return(returned: SlotReturn, view: &View) -> Result<Html, ComponentError> {
    match returned {
        SlotReturn::Component(mut component) => view.render(&mut component),
        SlotReturn::Content(html) => Ok(html),
        SlotReturn::Text(text) => Ok(Html::escape(&text)),
    }
}

enum SlotState {
    Pending(SlotValue),
    Resolving,
    Resolved(Html),
}

/// One value stored in a slot.
pub struct SlotInstance {
    slot: String,
    type_name: Option<String>,
    state: RefCell<SlotState>,
}

impl SlotInstance {
    pub(crate) fn build(
        class: &ComponentClass,
        definition: &SlotDefinition,
        call: SlotCall,
    ) -> Result<SlotInstance, ComponentError> {
        let type_name = call.type_name.clone();
        let value = SlotValue::from_call(class, definition, call)?;
        Ok(SlotInstance {
            slot: definition.name().to_string(),
            type_name,
            state: RefCell::new(SlotState::Pending(value)),
        })
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Polymorphic type this instance was set with.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn is_rendered(&self) -> bool {
        matches!(&*self.state.borrow(), SlotState::Resolved(_))
    }

    /// Renders the instance once; later calls return the memoized output.
    pub(crate) fn render(&self, parent: &Component, view: &View) -> Result<Html, ComponentError> {
        let mut value = match self.state.replace(SlotState::Resolving) {
            SlotState::Pending(value) => value,
            SlotState::Resolved(html) => {
                *self.state.borrow_mut() = SlotState::Resolved(html.clone());
                return Ok(html);
            }
            SlotState::Resolving => {
                return Err(ComponentError::RecursiveSlot {
                    class: parent.class().name().to_string(),
                    slot: self.slot.clone(),
                })
            }
        };

        match value.render(parent, view) {
            Ok(html) => {
                *self.state.borrow_mut() = SlotState::Resolved(html.clone());
                Ok(html)
            }
            Err(err) => {
                *self.state.borrow_mut() = SlotState::Pending(value);
                Err(err)
            }
        }
    }
}

impl fmt::Debug for SlotInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotInstance")
            .field("slot", &self.slot)
            .field("type_name", &self.type_name)
            .field("rendered", &self.is_rendered())
            .finish()
    }
}

/// Returned by [`Component::with_slot`] to refine the value just set.
pub struct SlotHandle<'a> {
    class: String,
    instance: &'a mut SlotInstance,
}

impl fmt::Debug for SlotHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotHandle")
            .field("class", &self.class)
            .field("instance", &self.instance)
            .finish()
    }
}

impl<'a> SlotHandle<'a> {
    pub(crate) fn new(class: &str, instance: &'a mut SlotInstance) -> Self {
        Self {
            class: class.to_string(),
            instance,
        }
    }

    /// Sets literal content on the slot value.
    ///
    /// Fails with [`ComponentError::DuplicateContent`] when a block was
    /// already supplied.
    pub fn with_content(&mut self, html: Html) -> Result<&mut Self, ComponentError> {
        let slot = self.instance.slot.clone();
        if let SlotState::Pending(value) = self.instance.state.get_mut() {
            value.set_content(&self.class, &slot, html)?;
        }
        Ok(self)
    }

    /// The slot's component, for component sources that are already built.
    pub fn component_mut(&mut self) -> Option<&mut Component> {
        match self.instance.state.get_mut() {
            SlotState::Pending(SlotValue::Component(ComponentRef::Ready(component))) => {
                Some(&mut **component)
            }
            _ => None,
        }
    }
}
