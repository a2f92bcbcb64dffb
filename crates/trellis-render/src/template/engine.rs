//! Template handler abstraction.
//!
//! This module defines the [`TemplateHandler`] trait which turns template
//! source into a [`CompiledTemplate`], and [`MiniJinjaHandler`], the default
//! handler backed by MiniJinja.
//!
//! A handler compiles each template once. The compiled value is immutable and
//! shareable across threads; rendering only needs a [`Locals`] map.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use minijinja::{AutoEscape, Environment, Value};

use crate::error::RenderError;
use crate::html::Html;

use super::locals::{Local, Locals};

/// Compiles template source for one file extension.
pub trait TemplateHandler: Send + Sync {
    /// Compiles `source` under `name` for the given output `format`.
    ///
    /// The format decides escaping: `html` output escapes data locals, other
    /// formats emit them as they are.
    fn compile(
        &self,
        name: &str,
        source: &str,
        format: &str,
    ) -> Result<Arc<dyn CompiledTemplate>, RenderError>;
}

/// A template ready to render.
pub trait CompiledTemplate: Send + Sync + fmt::Debug {
    /// Renders the template against `locals`.
    fn render(&self, locals: &Locals) -> Result<Html, RenderError>;

    /// Top-level names the template reads.
    ///
    /// Callers use this to compute only the locals a template actually needs.
    fn referenced_names(&self) -> &BTreeSet<String>;
}

/// Hook that customizes every MiniJinja environment the handler creates.
pub type EnvironmentSetup = Arc<dyn Fn(&mut Environment<'static>) + Send + Sync>;

/// MiniJinja-based template handler.
///
/// Each compiled template owns its environment, so rendering never contends
/// on shared state and templates can call back into the host (see
/// [`with_setup`](Self::with_setup)) while another template is mid-render.
///
/// # Example
///
/// ```rust
/// use trellis_render::{Html, Locals, MiniJinjaHandler, TemplateHandler};
/// use serde_json::json;
///
/// let handler = MiniJinjaHandler::new();
/// let template = handler
///     .compile("greeting.html.jinja", "Hello, {{ name }}", "html")
///     .unwrap();
///
/// let locals = Locals::from_object(&json!({"name": "<World>"}));
/// let output = template.render(&locals).unwrap();
/// assert_eq!(output.as_str(), "Hello, &lt;World&gt;");
/// ```
#[derive(Clone, Default)]
pub struct MiniJinjaHandler {
    setups: Vec<EnvironmentSetup>,
}

impl MiniJinjaHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an environment setup hook, run for every compiled template.
    ///
    /// Use it to register functions or filters.
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut Environment<'static>) + Send + Sync + 'static,
    {
        self.setups.push(Arc::new(setup));
        self
    }

    fn environment(&self, format: &str) -> Environment<'static> {
        let mut env = Environment::new();
        if format == "html" {
            env.set_auto_escape_callback(|_| AutoEscape::Html);
        } else {
            env.set_auto_escape_callback(|_| AutoEscape::None);
        }
        for setup in &self.setups {
            setup(&mut env);
        }
        env
    }
}

impl fmt::Debug for MiniJinjaHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniJinjaHandler")
            .field("setups", &self.setups.len())
            .finish()
    }
}

impl TemplateHandler for MiniJinjaHandler {
    fn compile(
        &self,
        name: &str,
        source: &str,
        format: &str,
    ) -> Result<Arc<dyn CompiledTemplate>, RenderError> {
        let mut env = self.environment(format);
        env.add_template_owned(name.to_string(), source.to_string())?;
        let referenced = {
            let template = env.get_template(name)?;
            template
                .undeclared_variables(false)
                .into_iter()
                .collect::<BTreeSet<_>>()
        };
        Ok(Arc::new(MiniJinjaTemplate {
            name: name.to_string(),
            env,
            referenced,
        }))
    }
}

struct MiniJinjaTemplate {
    name: String,
    env: Environment<'static>,
    referenced: BTreeSet<String>,
}

impl fmt::Debug for MiniJinjaTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniJinjaTemplate")
            .field("name", &self.name)
            .field("referenced", &self.referenced)
            .finish()
    }
}

impl CompiledTemplate for MiniJinjaTemplate {
    fn render(&self, locals: &Locals) -> Result<Html, RenderError> {
        let template = self.env.get_template(&self.name)?;
        let ctx: BTreeMap<String, Value> = locals
            .iter()
            .map(|(name, local)| (name.clone(), to_value(local)))
            .collect();
        let output = template.render(Value::from(ctx))?;
        Ok(Html::safe(output))
    }

    fn referenced_names(&self) -> &BTreeSet<String> {
        &self.referenced
    }
}

/// Converts a local into a MiniJinja value, keeping HTML marked safe.
fn to_value(local: &Local) -> Value {
    match local {
        Local::Data(data) => Value::from_serialize(data),
        Local::Html(html) => Value::from_safe_string(html.as_str().to_string()),
        Local::List(items) => Value::from_iter(
            items
                .iter()
                .map(|item| Value::from_safe_string(item.as_str().to_string())),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, format: &str, locals: &Locals) -> String {
        MiniJinjaHandler::new()
            .compile("test", source, format)
            .unwrap()
            .render(locals)
            .unwrap()
            .into_string()
    }

    #[test]
    fn test_html_format_escapes_data() {
        let locals = Locals::from_object(&json!({"name": "<b>"}));
        assert_eq!(render("{{ name }}", "html", &locals), "&lt;b&gt;");
    }

    #[test]
    fn test_text_format_does_not_escape() {
        let locals = Locals::from_object(&json!({"name": "<b>"}));
        assert_eq!(render("{{ name }}", "text", &locals), "<b>");
    }

    #[test]
    fn test_html_locals_stay_safe() {
        let mut locals = Locals::new();
        locals.insert_html("content", Html::safe("<p>hi</p>"));
        assert_eq!(render("{{ content }}", "html", &locals), "<p>hi</p>");
    }

    #[test]
    fn test_list_locals_iterate_in_order() {
        let mut locals = Locals::new();
        locals.insert_list(
            "items",
            vec![Html::safe("<i>A</i>"), Html::safe("B"), Html::safe("C")],
        );
        assert_eq!(
            render(
                "{% for item in items %}{{ item }}{% if not loop.last %}, {% endif %}{% endfor %}",
                "html",
                &locals
            ),
            "<i>A</i>, B, C"
        );
    }

    #[test]
    fn test_referenced_names() {
        let template = MiniJinjaHandler::new()
            .compile(
                "test",
                "{{ title }}{% for x in items %}{{ x }}{% endfor %}",
                "html",
            )
            .unwrap();
        let names: Vec<&str> = template
            .referenced_names()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["items", "title"]);
    }

    #[test]
    fn test_syntax_error_is_template_error() {
        let err = MiniJinjaHandler::new()
            .compile("broken", "{% if %}", "html")
            .unwrap_err();
        assert!(matches!(err, RenderError::TemplateError(_)));
    }

    #[test]
    fn test_setup_hook_registers_functions() {
        let handler = MiniJinjaHandler::new().with_setup(|env| {
            env.add_function("shout", |s: String| s.to_uppercase());
        });
        let template = handler.compile("t", "{{ shout('hi') }}", "html").unwrap();
        assert_eq!(template.render(&Locals::new()).unwrap().as_str(), "HI");
    }
}
