//! What an inline render callable sees.

use serde_json::Value;
use trellis_render::Html;

use crate::component::Component;
use crate::error::{ComponentError, DefinitionError};
use crate::slots::SlotOutput;
use crate::target::RenderTarget;
use crate::view::View;

/// The component being rendered, its view and the target that was resolved
/// for it.
///
/// ```rust
/// use trellis::{ComponentClass, Html};
///
/// let badge = ComponentClass::builder("Badge")
///     .call(|scope| {
///         let label = scope.arg("label").and_then(|v| v.as_str()).unwrap_or("?");
///         Ok(Html::escape(label))
///     })
///     .build()
///     .unwrap();
/// # let _ = badge;
/// ```
pub struct RenderScope<'a> {
    component: &'a mut Component,
    view: &'a View,
    target: &'a RenderTarget,
}

impl<'a> RenderScope<'a> {
    pub(crate) fn new(component: &'a mut Component, view: &'a View, target: &'a RenderTarget) -> Self {
        Self {
            component,
            view,
            target,
        }
    }

    pub fn component(&self) -> &Component {
        self.component
    }

    pub fn component_mut(&mut self) -> &mut Component {
        self.component
    }

    pub fn view(&self) -> &View {
        self.view
    }

    /// The variant of the resolved target, `None` for the default one.
    pub fn variant(&self) -> Option<&str> {
        self.target.variant()
    }

    pub fn format(&self) -> &str {
        self.target.format()
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.component.arg(name)
    }

    /// Calls a named method of the component's class.
    pub fn call(&self, method: &str) -> Option<Value> {
        self.component.call(method)
    }

    pub fn content(&mut self) -> Result<Option<Html>, ComponentError> {
        self.component.content()
    }

    pub fn has_content(&mut self) -> Result<bool, ComponentError> {
        self.component.has_content()
    }

    pub fn slot(&mut self, name: &str) -> Result<SlotOutput, ComponentError> {
        self.component.slot(name)
    }

    pub fn slot_one(&mut self, name: &str) -> Result<Option<Html>, ComponentError> {
        self.component.slot_one(name)
    }

    pub fn slot_many(&mut self, name: &str) -> Result<Vec<Html>, ComponentError> {
        self.component.slot_many(name)
    }

    pub fn has_slot(&mut self, name: &str) -> Result<bool, ComponentError> {
        self.component.has_slot(name)
    }

    /// Renders another component into the same view.
    pub fn render(&self, child: &mut Component) -> Result<Html, ComponentError> {
        self.view.render(child)
    }

    /// Renders a component attached with [`Component::wrap`].
    pub fn render_wrapped(&mut self, target: &str) -> Result<Html, ComponentError> {
        self.component.render_wrapped(target)
    }

    /// Renders this component with the parent class's target for the same
    /// variant and format.
    ///
    /// The lookup starts from the class that declared the current target, so
    /// calling this from an inherited target reaches the grandparent.
    pub fn render_parent(&mut self) -> Result<Html, ComponentError> {
        let owner = self.target.owner().clone();
        let parent = owner.parent().ok_or_else(|| DefinitionError::MissingTemplate {
            class: owner.name().to_string(),
            requested: Some("parent template".to_string()),
        })?;
        let targets = self.view.runtime().compile(parent)?;
        let target = targets.resolve(self.target.variant(), Some(self.target.format()))?;
        tracing::trace!(
            component = self.component.class().name(),
            parent = parent.name(),
            target = %target.identity(),
            "rendering parent target"
        );
        target.invoke(self.component, self.view)
    }

    /// Runs `f` in a fresh buffer frame; see [`View::capture`].
    pub fn capture<F>(&self, f: F) -> Result<Html, ComponentError>
    where
        F: FnOnce() -> Result<Html, ComponentError>,
    {
        self.view.capture(f)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{Component, ComponentClass, ComponentError, DefinitionError, Html, Runtime};

    #[test]
    fn scope_reports_resolved_target() {
        let class = ComponentClass::builder("Probe")
            .call(|scope| Ok(Html::escape(&format!("{}:{:?}", scope.format(), scope.variant()))))
            .call_variant("phone", |scope| {
                Ok(Html::escape(&format!("{}:{:?}", scope.format(), scope.variant())))
            })
            .build()
            .unwrap();
        let runtime = Runtime::new();

        let mut plain = Component::new(class.clone(), json!({})).unwrap();
        assert_eq!(runtime.render(&mut plain).unwrap().as_str(), "html:None");

        let mut phone = Component::new(class, json!({})).unwrap();
        phone.with_variant("phone");
        assert_eq!(
            runtime.render(&mut phone).unwrap().as_str(),
            "html:Some(&quot;phone&quot;)"
        );
    }

    #[test]
    fn render_parent_wraps_parent_output() {
        let base = ComponentClass::builder("Base")
            .template("jinja", "<p>{{ title }}</p>")
            .build()
            .unwrap();
        let fancy = ComponentClass::subclass(&base, "Fancy")
            .call(|scope| {
                let inner = scope.render_parent()?;
                Ok(Html::safe(format!("<div>{}</div>", inner.as_str())))
            })
            .build()
            .unwrap();

        let runtime = Runtime::new();
        let mut component = Component::new(fancy, json!({"title": "Hi"})).unwrap();
        assert_eq!(
            runtime.render(&mut component).unwrap().as_str(),
            "<div><p>Hi</p></div>"
        );
    }

    #[test]
    fn render_parent_without_parent_fails() {
        let orphan = ComponentClass::builder("Orphan")
            .call(|scope| scope.render_parent())
            .build()
            .unwrap();
        let runtime = Runtime::new();
        let mut component = Component::new(orphan, json!({})).unwrap();
        let err = runtime.render(&mut component).unwrap_err();
        assert!(matches!(
            err,
            ComponentError::Definition(DefinitionError::MissingTemplate { .. })
        ));
    }
}
