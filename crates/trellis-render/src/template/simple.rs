//! Simple template handler using format-string style substitution.
//!
//! This module provides [`SimpleHandler`], a lightweight handler that uses
//! `{variable}` syntax for variable substitution. It's much lighter than MiniJinja
//! and suitable for templates that don't need loops, conditionals, or filters.
//!
//! # Syntax
//!
//! - `{name}` - Simple variable substitution
//! - `{user.name}` - Nested property access via dot notation
//! - `{items.0}` - Array index access
//! - `{{` and `}}` - Escaped braces (renders as `{` and `}`)
//!
//! Unknown variables are left in place (`{missing}`) to make them easy to spot.
//!
//! # Example
//!
//! ```rust
//! use trellis_render::{Locals, SimpleHandler, TemplateHandler};
//! use serde_json::json;
//!
//! let handler = SimpleHandler::new();
//! let template = handler
//!     .compile("greeting", "Hello, {name}! Contact: {user.email}", "text")
//!     .unwrap();
//!
//! let locals = Locals::from_object(&json!({"name": "World", "user": {"email": "test@example.com"}}));
//! assert_eq!(
//!     template.render(&locals).unwrap().as_str(),
//!     "Hello, World! Contact: test@example.com"
//! );
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::RenderError;
use crate::html::Html;

use super::engine::{CompiledTemplate, TemplateHandler};
use super::locals::{Local, Locals};

/// A lightweight handler using format-string style substitution.
///
/// In the `html` format data locals are escaped while HTML locals (content,
/// slots) are inserted as they are. Other formats insert everything verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleHandler;

impl SimpleHandler {
    pub fn new() -> Self {
        SimpleHandler
    }
}

impl TemplateHandler for SimpleHandler {
    fn compile(
        &self,
        name: &str,
        source: &str,
        format: &str,
    ) -> Result<Arc<dyn CompiledTemplate>, RenderError> {
        let segments = parse(source)?;
        let referenced = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Variable(path) => path.split('.').next().map(str::to_string),
                Segment::Literal(_) => None,
            })
            .collect();
        Ok(Arc::new(SimpleTemplate {
            name: name.to_string(),
            segments,
            referenced,
            escape: format == "html",
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

#[derive(Debug)]
struct SimpleTemplate {
    name: String,
    segments: Vec<Segment>,
    referenced: BTreeSet<String>,
    escape: bool,
}

impl CompiledTemplate for SimpleTemplate {
    fn render(&self, locals: &Locals) -> Result<Html, RenderError> {
        let mut result = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => result.push_str(text),
                Segment::Variable(path) => match locals.resolve_path(path) {
                    Some(Local::Data(value)) if self.escape => {
                        let text = Local::Data(value).as_text();
                        result.push_str(Html::escape(&text).as_str());
                    }
                    Some(local) => result.push_str(&local.as_text()),
                    None => {
                        tracing::debug!(template = %self.name, variable = %path, "unresolved variable");
                        // Variable not found - leave placeholder for debugging
                        result.push_str(&format!("{{{}}}", path));
                    }
                },
            }
        }
        Ok(Html::safe(result))
    }

    fn referenced_names(&self) -> &BTreeSet<String> {
        &self.referenced
    }
}

/// Splits template source into literal text and variable segments.
fn parse(template: &str) -> Result<Vec<Segment>, RenderError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '{' {
            if chars.peek() == Some(&'{') {
                // Escaped brace: {{ -> {
                chars.next();
                literal.push('{');
                continue;
            }

            let mut var_name = String::new();
            let mut found_close = false;

            for inner_ch in chars.by_ref() {
                if inner_ch == '}' {
                    found_close = true;
                    break;
                }
                var_name.push(inner_ch);
            }

            if !found_close {
                return Err(RenderError::TemplateError(format!(
                    "Unclosed variable substitution: {{{}",
                    var_name
                )));
            }

            let var_name = var_name.trim();
            if var_name.is_empty() {
                return Err(RenderError::TemplateError(
                    "Empty variable name in template".to_string(),
                ));
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Variable(var_name.to_string()));
        } else if ch == '}' {
            if chars.peek() == Some(&'}') {
                // Escaped brace: }} -> }
                chars.next();
            }
            // A stray closing brace is kept as is
            literal.push('}');
        } else {
            literal.push(ch);
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, format: &str, data: serde_json::Value) -> Result<String, RenderError> {
        let template = SimpleHandler::new().compile("test", source, format)?;
        Ok(template.render(&Locals::from_object(&data))?.into_string())
    }

    #[test]
    fn test_simple_substitution() {
        let output = render("Hello, {name}!", "text", json!({"name": "World"})).unwrap();
        assert_eq!(output, "Hello, World!");
    }

    #[test]
    fn test_multiple_variables() {
        let output = render(
            "{first} {last}",
            "text",
            json!({"first": "John", "last": "Doe"}),
        )
        .unwrap();
        assert_eq!(output, "John Doe");
    }

    #[test]
    fn test_nested_access() {
        let data = json!({
            "user": {
                "name": "Alice",
                "profile": {
                    "email": "alice@example.com"
                }
            }
        });

        let output = render(
            "Name: {user.name}, Email: {user.profile.email}",
            "text",
            data,
        )
        .unwrap();
        assert_eq!(output, "Name: Alice, Email: alice@example.com");
    }

    #[test]
    fn test_array_index() {
        let output = render(
            "First: {items.0}, Third: {items.2}",
            "text",
            json!({"items": ["first", "second", "third"]}),
        )
        .unwrap();
        assert_eq!(output, "First: first, Third: third");
    }

    #[test]
    fn test_escaped_braces() {
        let output = render("{{literal}} and {name}", "text", json!({"name": "x"})).unwrap();
        assert_eq!(output, "{literal} and x");
    }

    #[test]
    fn test_missing_variable_left_in_place() {
        let output = render("Hello, {missing}!", "text", json!({})).unwrap();
        assert_eq!(output, "Hello, {missing}!");
    }

    #[test]
    fn test_unclosed_variable() {
        let err = render("Hello, {name", "text", json!({})).unwrap_err();
        assert!(err.to_string().contains("Unclosed"));
    }

    #[test]
    fn test_empty_variable_name() {
        let err = render("Hello, { }", "text", json!({})).unwrap_err();
        assert!(err.to_string().contains("Empty variable name"));
    }

    #[test]
    fn test_null_renders_empty() {
        let output = render("[{value}]", "text", json!({"value": null})).unwrap();
        assert_eq!(output, "[]");
    }

    // ============================================================================
    // HTML format
    // ============================================================================

    #[test]
    fn test_html_format_escapes_data() {
        let output = render("<p>{name}</p>", "html", json!({"name": "<script>"})).unwrap();
        assert_eq!(output, "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_html_locals_are_not_escaped() {
        let template = SimpleHandler::new()
            .compile("test", "<div>{content}</div>", "html")
            .unwrap();
        let mut locals = Locals::new();
        locals.insert_html("content", Html::safe("<b>hi</b>"));
        assert_eq!(
            template.render(&locals).unwrap().as_str(),
            "<div><b>hi</b></div>"
        );
    }

    #[test]
    fn test_referenced_names_are_path_heads() {
        let template = SimpleHandler::new()
            .compile("test", "{user.name} {title} {user.email}", "html")
            .unwrap();
        let names: Vec<&String> = template.referenced_names().iter().collect();
        assert_eq!(names, vec!["title", "user"]);
    }
}
