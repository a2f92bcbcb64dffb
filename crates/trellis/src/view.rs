//! The view: one render's output buffer, lookup settings and runtime handle.
//!
//! A [`View`] is cheap to clone (it is reference counted) and lives for a
//! single top-level render on a single thread. Components receive it when
//! their render starts; content blocks and slot blocks write into its
//! [`OutputBuffer`] through frames that [`capture`](View::capture) pushes and
//! pops.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use minijinja::{Environment, ErrorKind};
use serde_json::Value;
use trellis_render::{Html, OutputBuffer};

use crate::component::Component;
use crate::error::ComponentError;
use crate::lifecycle;
use crate::runtime::Runtime;

/// A block evaluated against the view, such as slot content.
pub type ViewBlock = Box<dyn FnOnce(&View) -> Result<Html, ComponentError>>;

#[derive(Debug, Clone, Default)]
struct Lookup {
    variants: Vec<String>,
    format: Option<String>,
}

struct ViewInner {
    runtime: Arc<Runtime>,
    buffer: RefCell<OutputBuffer>,
    lookup: RefCell<Lookup>,
}

#[derive(Clone)]
pub struct View {
    inner: Rc<ViewInner>,
}

impl View {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            inner: Rc::new(ViewInner {
                runtime,
                buffer: RefCell::new(OutputBuffer::new()),
                lookup: RefCell::new(Lookup::default()),
            }),
        }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.inner.runtime
    }

    // ========================================================================
    // Lookup settings
    // ========================================================================

    /// Variants tried, in order, when resolving render targets.
    pub fn variants(&self) -> Vec<String> {
        self.inner.lookup.borrow().variants.clone()
    }

    /// Requested format, if any.
    pub fn format(&self) -> Option<String> {
        self.inner.lookup.borrow().format.clone()
    }

    pub fn set_variants(&self, variants: Vec<String>) {
        self.inner.lookup.borrow_mut().variants = variants;
    }

    pub fn set_format(&self, format: Option<String>) {
        self.inner.lookup.borrow_mut().format = format;
    }

    /// Runs `f` with the lookup variants replaced, restoring them afterwards
    /// on every exit path.
    pub fn with_variants<T>(&self, variants: Vec<String>, f: impl FnOnce() -> T) -> T {
        let previous = std::mem::replace(&mut self.inner.lookup.borrow_mut().variants, variants);
        let _restore = RestoreLookup {
            view: self,
            saved: Saved::Variants(previous),
        };
        f()
    }

    /// Runs `f` with the requested format replaced.
    pub fn with_format<T>(&self, format: Option<String>, f: impl FnOnce() -> T) -> T {
        let previous = std::mem::replace(&mut self.inner.lookup.borrow_mut().format, format);
        let _restore = RestoreLookup {
            view: self,
            saved: Saved::Format(previous),
        };
        f()
    }

    // ========================================================================
    // Output buffer
    // ========================================================================

    /// Pushes a buffer frame, popped when the guard drops.
    pub fn push_frame(&self) -> FrameGuard<'_> {
        self.inner.buffer.borrow_mut().push();
        FrameGuard {
            view: self,
            finished: false,
        }
    }

    /// Runs `f` in a fresh frame.
    ///
    /// Whatever `f` wrote to the buffer is the result; when it wrote nothing,
    /// its return value is.
    pub fn capture<F>(&self, f: F) -> Result<Html, ComponentError>
    where
        F: FnOnce() -> Result<Html, ComponentError>,
    {
        let frame = self.push_frame();
        let returned = f()?;
        let written = frame.finish();
        Ok(if written.is_empty() { returned } else { written })
    }

    /// Escapes `text` into the current frame.
    pub fn append(&self, text: &str) {
        self.inner.buffer.borrow_mut().append(text);
    }

    pub fn append_safe(&self, html: &Html) {
        self.inner.buffer.borrow_mut().append_safe(html);
    }

    /// Replaces the current frame's contents.
    pub fn replace_buffer(&self, html: Html) {
        self.inner.buffer.borrow_mut().replace(html);
    }

    /// Frames pushed above the root.
    pub fn depth(&self) -> usize {
        self.inner.buffer.borrow().depth()
    }

    /// Takes what was written to the root frame.
    pub fn take_output(&self) -> Html {
        self.inner.buffer.borrow_mut().take_root()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Renders a component into this view and returns its output.
    pub fn render(&self, component: &mut Component) -> Result<Html, ComponentError> {
        let _active = ActiveView::enter(self);
        lifecycle::run(component, self)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("lookup", &*self.inner.lookup.borrow())
            .field("depth", &self.depth())
            .finish()
    }
}

/// Pops its buffer frame when dropped.
pub struct FrameGuard<'a> {
    view: &'a View,
    finished: bool,
}

impl FrameGuard<'_> {
    /// Pops the frame now and returns what was written to it.
    pub fn finish(mut self) -> Html {
        self.finished = true;
        self.view.inner.buffer.borrow_mut().pop().unwrap_or_default()
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.view.inner.buffer.borrow_mut().pop();
        }
    }
}

enum Saved {
    Variants(Vec<String>),
    Format(Option<String>),
}

struct RestoreLookup<'a> {
    view: &'a View,
    saved: Saved,
}

impl Drop for RestoreLookup<'_> {
    fn drop(&mut self) {
        let mut lookup = self.view.inner.lookup.borrow_mut();
        match &mut self.saved {
            Saved::Variants(variants) => lookup.variants = std::mem::take(variants),
            Saved::Format(format) => lookup.format = format.take(),
        }
    }
}

// ============================================================================
// Template access
// ============================================================================

thread_local! {
    static ACTIVE_VIEWS: RefCell<Vec<View>> = const { RefCell::new(Vec::new()) };
}

/// Marks a view as the one templates on this thread render into.
struct ActiveView;

impl ActiveView {
    fn enter(view: &View) -> Self {
        ACTIVE_VIEWS.with(|views| views.borrow_mut().push(view.clone()));
        ActiveView
    }
}

impl Drop for ActiveView {
    fn drop(&mut self) {
        ACTIVE_VIEWS.with(|views| views.borrow_mut().pop());
    }
}

fn active_view() -> Option<View> {
    ACTIVE_VIEWS.with(|views| views.borrow().last().cloned())
}

/// Registers `component(name, args)` in a MiniJinja environment.
pub(crate) fn install_component_function(env: &mut Environment<'static>) {
    env.add_function("component", component_function);
}

fn component_function(
    name: String,
    args: Option<minijinja::Value>,
) -> Result<minijinja::Value, minijinja::Error> {
    let view = active_view().ok_or_else(|| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            "component() can only be called while a component renders",
        )
    })?;

    let args = match args {
        Some(args) => serde_json::to_value(&args).map_err(|err| {
            minijinja::Error::new(ErrorKind::BadSerialization, "component arguments")
                .with_source(err)
        })?,
        None => Value::Null,
    };

    let rendered = view
        .runtime()
        .class(&name)
        .and_then(|class| Component::new(class, args))
        .and_then(|mut child| view.render(&mut child));

    match rendered {
        Ok(html) => Ok(minijinja::Value::from_safe_string(html.into_string())),
        Err(err) => Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("failed to render component {name}"),
        )
        .with_source(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> View {
        View::new(Runtime::new())
    }

    #[test]
    fn capture_prefers_buffer_output() {
        let view = view();
        let html = view
            .capture(|| {
                view.append("<b>");
                Ok(Html::safe("ignored"))
            })
            .unwrap();
        assert_eq!(html.as_str(), "&lt;b&gt;");
        assert_eq!(view.depth(), 0);
    }

    #[test]
    fn capture_falls_back_to_returned_value() {
        let view = view();
        let html = view.capture(|| Ok(Html::safe("<i>x</i>"))).unwrap();
        assert_eq!(html.as_str(), "<i>x</i>");
    }

    #[test]
    fn frames_pop_on_error() {
        let view = view();
        let err = view
            .capture(|| {
                view.append("partial");
                Err(ComponentError::Aborted)
            })
            .unwrap_err();
        assert!(err.is_aborted());
        assert_eq!(view.depth(), 0);
        assert!(view.take_output().is_empty());
    }

    #[test]
    fn nested_captures_are_isolated() {
        let view = view();
        view.append("root ");
        let outer = view
            .capture(|| {
                view.append("outer ");
                let inner = view.capture(|| {
                    view.append("inner");
                    Ok(Html::empty())
                })?;
                assert_eq!(inner.as_str(), "inner");
                Ok(Html::empty())
            })
            .unwrap();
        assert_eq!(outer.as_str(), "outer ");
        assert_eq!(view.take_output().as_str(), "root ");
    }

    #[test]
    fn replace_buffer_keeps_depth() {
        let view = view();
        let html = view
            .capture(|| {
                view.append("a");
                view.replace_buffer(Html::safe("b"));
                assert_eq!(view.depth(), 1);
                Ok(Html::empty())
            })
            .unwrap();
        assert_eq!(html.as_str(), "b");
    }

    #[test]
    fn lookup_settings_are_restored() {
        let view = view();
        view.set_variants(vec!["phone".into()]);
        let seen = view.with_variants(vec!["tablet".into()], || {
            view.with_format(Some("json".into()), || (view.variants(), view.format()))
        });
        assert_eq!(seen, (vec!["tablet".to_string()], Some("json".to_string())));
        assert_eq!(view.variants(), vec!["phone".to_string()]);
        assert_eq!(view.format(), None);
    }
}
