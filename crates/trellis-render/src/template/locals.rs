//! Template locals.
//!
//! [`Locals`] is the name → value map a compiled template renders against.
//! Values are either plain data (escaped by the engine when the format asks
//! for it), already-safe [`Html`] fragments, or ordered lists of fragments
//! for collection slots.
//!
//! # Example
//!
//! ```rust
//! use trellis_render::{Html, Locals};
//! use serde_json::json;
//!
//! let mut locals = Locals::new();
//! locals.insert_data("name", json!("World"));
//! locals.insert_html("content", Html::safe("<p>Body</p>"));
//!
//! assert!(locals.contains("name"));
//! assert_eq!(locals.len(), 2);
//! ```

use std::collections::BTreeMap;

use crate::html::Html;

/// A single template local.
#[derive(Debug, Clone, PartialEq)]
pub enum Local {
    Data(serde_json::Value),
    Html(Html),
    List(Vec<Html>),
}

impl Local {
    /// Renders the local as text for engines without structured values.
    pub fn as_text(&self) -> String {
        match self {
            Local::Data(serde_json::Value::String(s)) => s.clone(),
            Local::Data(serde_json::Value::Null) => String::new(),
            Local::Data(value) => value.to_string(),
            Local::Html(html) => html.as_str().to_string(),
            Local::List(items) => Html::join(items, "").into_string(),
        }
    }
}

impl From<serde_json::Value> for Local {
    fn from(value: serde_json::Value) -> Self {
        Local::Data(value)
    }
}

impl From<Html> for Local {
    fn from(html: Html) -> Self {
        Local::Html(html)
    }
}

impl From<Vec<Html>> for Local {
    fn from(items: Vec<Html>) -> Self {
        Local::List(items)
    }
}

/// Named values available to a template while it renders.
///
/// Later insertions under the same name replace earlier ones, which is how
/// callers layer slots and content over plain arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locals {
    values: BTreeMap<String, Local>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds locals from a JSON object, one data local per key.
    ///
    /// Non-object values produce empty locals.
    pub fn from_object(value: &serde_json::Value) -> Self {
        let mut locals = Self::new();
        if let serde_json::Value::Object(map) = value {
            for (key, value) in map {
                locals.insert_data(key.clone(), value.clone());
            }
        }
        locals
    }

    pub fn insert(&mut self, name: impl Into<String>, local: impl Into<Local>) {
        self.values.insert(name.into(), local.into());
    }

    pub fn insert_data(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.insert(name, Local::Data(value));
    }

    pub fn insert_html(&mut self, name: impl Into<String>, html: Html) {
        self.insert(name, Local::Html(html));
    }

    pub fn insert_list(&mut self, name: impl Into<String>, items: Vec<Html>) {
        self.insert(name, Local::List(items));
    }

    pub fn get(&self, name: &str) -> Option<&Local> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Local)> {
        self.values.iter()
    }

    /// Resolves a dotted path (`user.name`, `items.0`) into data.
    ///
    /// The first segment selects the local; the rest walks into JSON data.
    /// Paths into HTML locals only resolve when they have a single segment.
    pub fn resolve_path(&self, path: &str) -> Option<Local> {
        let mut parts = path.split('.');
        let head = parts.next()?;
        let local = self.values.get(head)?;
        let rest: Vec<&str> = parts.collect();
        if rest.is_empty() {
            return Some(local.clone());
        }
        let Local::Data(mut current) = local.clone() else {
            return None;
        };
        for part in rest {
            current = match current {
                serde_json::Value::Object(mut map) => map.remove(part)?,
                serde_json::Value::Array(mut arr) => {
                    let index: usize = part.parse().ok()?;
                    if index >= arr.len() {
                        return None;
                    }
                    arr.swap_remove(index)
                }
                _ => return None,
            };
        }
        Some(Local::Data(current))
    }
}

impl FromIterator<(String, Local)> for Locals {
    fn from_iter<I: IntoIterator<Item = (String, Local)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
