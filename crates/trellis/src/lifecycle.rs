//! Render lifecycle and callback chain.
//!
//! Every component render goes through the same pipeline:
//!
//! ```text
//! View::render(component)
//!   → BEFORE-RENDER hooks   ← (may abort: empty output, nothing else runs)
//!   → render_if predicate   ← (false behaves like an abort)
//!   → resolve render target
//!   → fragment cache lookup ← (a hit skips everything up to after-render)
//!   → AROUND-RENDER hooks   ← (each must call Next::run)
//!       → preamble + target + postamble
//!   → AFTER-RENDER hooks    ← (post-process the rendered Html)
//! ```
//!
//! Errors from any stage go through the class's rescue handlers before they
//! reach the caller.

use std::cell::Cell;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use trellis_render::{Html, Markup};

use crate::cache;
use crate::class::ComponentClass;
use crate::component::Component;
use crate::error::ComponentError;
use crate::target::{RenderTarget, TargetSet};
use crate::view::View;

/// What a before-render hook wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop rendering; the component renders as empty output.
    Abort,
}

/// Where a component is in its render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    BeforeHooks,
    Rendering,
    AfterHooks,
    Done,
    Aborted,
}

/// The phase at which a hook error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    Around,
    After,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Before => write!(f, "before-render"),
            HookPhase::Around => write!(f, "around-render"),
            HookPhase::After => write!(f, "after-render"),
        }
    }
}

/// Error returned by a render hook.
#[derive(Debug, Error)]
#[error("hook error ({phase}): {message}")]
pub struct HookError {
    /// Human-readable error message
    pub message: String,
    /// The hook phase where the error occurred
    pub phase: HookPhase,
    /// The underlying error source, if any
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl HookError {
    pub fn before(message: impl Into<String>) -> Self {
        Self::new(message, HookPhase::Before)
    }

    pub fn around(message: impl Into<String>) -> Self {
        Self::new(message, HookPhase::Around)
    }

    pub fn after(message: impl Into<String>) -> Self {
        Self::new(message, HookPhase::After)
    }

    fn new(message: impl Into<String>, phase: HookPhase) -> Self {
        Self {
            message: message.into(),
            phase,
            source: None,
        }
    }

    /// Sets the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }
}

/// Before-render hook. Receives the component before its target is resolved.
pub type BeforeRenderFn =
    Arc<dyn Fn(&mut Component) -> Result<Flow, ComponentError> + Send + Sync>;

/// Around-render hook. Must call [`Next::run`] to continue the chain.
pub type AroundRenderFn =
    Arc<dyn Fn(&mut Component, Next<'_>) -> Result<Html, ComponentError> + Send + Sync>;

/// After-render hook, chaining transformations of the output.
pub type AfterRenderFn =
    Arc<dyn Fn(&Component, Html) -> Result<Html, ComponentError> + Send + Sync>;

/// Produces a preamble or postamble around the target's output.
pub type MarkupFn = Arc<dyn Fn(&Component) -> Markup + Send + Sync>;

type CoreFn<'a> = dyn FnMut(&mut Component) -> Result<Html, ComponentError> + 'a;

/// The rest of the around-render chain.
pub struct Next<'a> {
    hooks: &'a [AroundRenderFn],
    core: &'a mut CoreFn<'a>,
    ran: &'a Cell<bool>,
}

impl<'a> Next<'a> {
    /// Runs the remaining around hooks, then the core render.
    pub fn run(self, component: &mut Component) -> Result<Html, ComponentError> {
        match self.hooks.split_first() {
            Some((hook, rest)) => hook(
                component,
                Next {
                    hooks: rest,
                    core: self.core,
                    ran: self.ran,
                },
            ),
            None => {
                self.ran.set(true);
                (self.core)(component)
            }
        }
    }
}

/// Per-class render callbacks, executed in declaration order.
#[derive(Clone, Default)]
pub struct Callbacks {
    before: Vec<BeforeRenderFn>,
    around: Vec<AroundRenderFn>,
    after: Vec<AfterRenderFn>,
    preamble: Option<MarkupFn>,
    postamble: Option<MarkupFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty()
            && self.around.is_empty()
            && self.after.is_empty()
            && self.preamble.is_none()
            && self.postamble.is_none()
    }

    /// Adds a before-render hook.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trellis::{Callbacks, Flow};
    ///
    /// let callbacks = Callbacks::new().before_render(|component| {
    ///     if component.arg("hidden").is_some() {
    ///         return Ok(Flow::Abort);
    ///     }
    ///     Ok(Flow::Continue)
    /// });
    /// assert!(!callbacks.is_empty());
    /// ```
    pub fn before_render<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Component) -> Result<Flow, ComponentError> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(f));
        self
    }

    /// Adds an around-render hook. Hooks declared first wrap the ones after
    /// them.
    pub fn around_render<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Component, Next<'_>) -> Result<Html, ComponentError> + Send + Sync + 'static,
    {
        self.around.push(Arc::new(f));
        self
    }

    pub fn after_render<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component, Html) -> Result<Html, ComponentError> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(f));
        self
    }

    pub fn output_preamble<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component) -> Markup + Send + Sync + 'static,
    {
        self.preamble = Some(Arc::new(f));
        self
    }

    pub fn output_postamble<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component) -> Markup + Send + Sync + 'static,
    {
        self.postamble = Some(Arc::new(f));
        self
    }

    /// Runs before-render hooks until one aborts.
    pub fn run_before(&self, component: &mut Component) -> Result<Flow, ComponentError> {
        for hook in &self.before {
            if hook(component)? == Flow::Abort {
                return Ok(Flow::Abort);
            }
        }
        Ok(Flow::Continue)
    }

    /// Runs the around chain with `core` innermost.
    ///
    /// A chain in which some hook never calls [`Next::run`] is an abort.
    pub fn run_around(
        &self,
        component: &mut Component,
        core: &mut CoreFn<'_>,
    ) -> Result<Html, ComponentError> {
        let ran = Cell::new(false);
        let html = Next {
            hooks: &self.around,
            core,
            ran: &ran,
        }
        .run(component)?;
        if ran.get() {
            Ok(html)
        } else {
            Err(ComponentError::Aborted)
        }
    }

    /// Runs after-render hooks, chaining transformations.
    pub fn run_after(&self, component: &Component, html: Html) -> Result<Html, ComponentError> {
        let mut current = html;
        for hook in &self.after {
            current = hook(component, current)?;
        }
        Ok(current)
    }

    pub(crate) fn preamble(&self, component: &Component) -> Html {
        amble(self.preamble.as_ref(), component, "preamble")
    }

    pub(crate) fn postamble(&self, component: &Component) -> Html {
        amble(self.postamble.as_ref(), component, "postamble")
    }
}

fn amble(producer: Option<&MarkupFn>, component: &Component, which: &str) -> Html {
    let Some(producer) = producer else {
        return Html::empty();
    };
    let (html, escaped) = producer(component).into_html();
    if escaped {
        tracing::warn!(
            component = component.class().name(),
            which,
            "output {which} was not marked safe and has been escaped"
        );
    }
    html
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("before_count", &self.before.len())
            .field("around_count", &self.around.len())
            .field("after_count", &self.after.len())
            .field("preamble", &self.preamble.is_some())
            .field("postamble", &self.postamble.is_some())
            .finish()
    }
}

type RescueFn = Arc<
    dyn Fn(&(dyn StdError + 'static), &Component) -> Option<Result<Html, ComponentError>>
        + Send
        + Sync,
>;

/// A handler for one error type, declared with
/// [`ComponentClassBuilder::rescue_from`](crate::ComponentClassBuilder::rescue_from).
#[derive(Clone)]
pub struct Rescuer {
    error_type: &'static str,
    handler: RescueFn,
}

impl Rescuer {
    pub(crate) fn new<E, F>(f: F) -> Self
    where
        E: StdError + 'static,
        F: Fn(&E, &Component) -> Result<Html, ComponentError> + Send + Sync + 'static,
    {
        Self {
            error_type: std::any::type_name::<E>(),
            handler: Arc::new(move |err, component| {
                err.downcast_ref::<E>().map(|e| f(e, component))
            }),
        }
    }

    pub fn error_type(&self) -> &'static str {
        self.error_type
    }
}

impl fmt::Debug for Rescuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rescuer")
            .field("error_type", &self.error_type)
            .finish()
    }
}

/// Offers `err` to the rescue handlers.
///
/// The error itself is tried first, then the error it wraps, then each
/// `source()` in turn. At each step the most recently declared handler wins.
pub(crate) fn rescue(
    rescuers: &[Rescuer],
    err: ComponentError,
    component: &Component,
) -> Result<Html, ComponentError> {
    if rescuers.is_empty() || err.is_aborted() {
        return Err(err);
    }

    let outcome = {
        let mut chain: Vec<&(dyn StdError + 'static)> = vec![&err];
        let inner: Option<&(dyn StdError + 'static)> = match &err {
            ComponentError::Custom(inner) => Some(inner.as_ref() as &(dyn StdError + 'static)),
            ComponentError::Template(inner) => Some(inner as &(dyn StdError + 'static)),
            ComponentError::Cache(inner) => Some(inner as &(dyn StdError + 'static)),
            ComponentError::Hook(inner) => Some(inner as &(dyn StdError + 'static)),
            ComponentError::Definition(inner) => Some(inner as &(dyn StdError + 'static)),
            _ => None,
        };
        let mut next = inner.or_else(|| err.source());
        while let Some(current) = next {
            chain.push(current);
            next = current.source();
        }

        chain.into_iter().find_map(|candidate| {
            rescuers
                .iter()
                .rev()
                .find_map(|rescuer| (rescuer.handler)(candidate, component))
        })
    };

    match outcome {
        Some(result) => {
            tracing::debug!(component = component.class().name(), "error rescued");
            result
        }
        None => Err(err),
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Renders `component` into `view`.
pub(crate) fn run(component: &mut Component, view: &View) -> Result<Html, ComponentError> {
    component.attach_view(view);
    let class = component.class().clone();

    match drive(component, view, &class) {
        Ok(html) => {
            component.state = RenderState::Done;
            Ok(html)
        }
        Err(err) if err.is_aborted() => {
            tracing::debug!(component = class.name(), "render aborted");
            component.state = RenderState::Aborted;
            Ok(Html::empty())
        }
        Err(err) => match rescue(class.rescuers(), err, component) {
            Ok(html) => {
                component.state = RenderState::Done;
                Ok(html)
            }
            Err(err) => {
                component.state = RenderState::Aborted;
                Err(err)
            }
        },
    }
}

fn drive(
    component: &mut Component,
    view: &View,
    class: &Arc<ComponentClass>,
) -> Result<Html, ComponentError> {
    let callbacks = class.callbacks();

    component.state = RenderState::BeforeHooks;
    if callbacks.run_before(component)? == Flow::Abort {
        return Err(ComponentError::Aborted);
    }
    if !class.should_render(component) {
        return Err(ComponentError::Aborted);
    }

    component.state = RenderState::Rendering;
    let runtime = view.runtime().clone();
    let targets = runtime.compile(class)?;
    let target = resolve_target(&targets, component, view)?;
    let key = cache::cache_key(component, &target, &runtime)?;

    let mut core = |c: &mut Component| -> Result<Html, ComponentError> {
        let mut html = callbacks.preamble(c);
        html.push(&target.invoke(c, view)?);
        html.push(&callbacks.postamble(c));
        Ok(html)
    };

    let html = match key {
        Some(key) => {
            let stored = runtime.cache().fetch_or_store(&key.as_string(), &mut || {
                callbacks
                    .run_around(component, &mut core)
                    .map(Html::into_string)
            })?;
            Html::safe(stored)
        }
        None => callbacks.run_around(component, &mut core)?,
    };

    component.state = RenderState::AfterHooks;
    callbacks.run_after(component, html)
}

fn resolve_target(
    targets: &TargetSet,
    component: &Component,
    view: &View,
) -> Result<Arc<RenderTarget>, ComponentError> {
    let format = view.format();
    let resolved = match component.variant() {
        Some(variant) => targets.resolve(Some(variant), format.as_deref()),
        None => targets.resolve_first(&view.variants(), format.as_deref()),
    };
    Ok(resolved?)
}
