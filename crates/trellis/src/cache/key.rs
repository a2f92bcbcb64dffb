//! Cache key composition.

use std::fmt;

use serde_json::Value;

use crate::component::Component;
use crate::error::ComponentError;
use crate::runtime::Runtime;
use crate::target::RenderTarget;

/// Ordered key segments:
/// `[namespace, environment_version, class, target, deps..., digest]`, with
/// empty segments left out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    pub fn new(segments: Vec<String>) -> Self {
        CacheKey(segments.into_iter().filter(|s| !s.is_empty()).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn as_string(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// The key `component` renders under with `target`, if its render is cached.
///
/// Returns `None` when caching is disabled, the class declares no
/// dependencies, or its `cache_if` predicate says no. Dependency values are
/// read fresh on every call: a named method wins over an argument of the
/// same name.
pub fn cache_key(
    component: &Component,
    target: &RenderTarget,
    runtime: &Runtime,
) -> Result<Option<CacheKey>, ComponentError> {
    let config = runtime.config();
    let class = component.class();
    let policy = class.cache_policy();

    if !config.caching_enabled || !policy.is_enabled() {
        return Ok(None);
    }
    if let Some(cache_if) = &policy.cache_if {
        if !cache_if(component) {
            return Ok(None);
        }
    }

    let mut segments = vec![
        config.cache_namespace.clone(),
        config.environment_version.clone().unwrap_or_default(),
        class.name().to_string(),
        target.identity(),
    ];
    segments.extend(policy.deps().iter().map(|dep| dependency_value(component, dep)));
    segments.push(runtime.digest(class)?);
    Ok(Some(CacheKey::new(segments)))
}

/// Key segment for one cache dependency: a named method's result, else the
/// argument of that name.
///
/// Strings are used as is and other values as their JSON text; a missing or
/// null value is an empty segment and is dropped from the key. So `null` and
/// `""` (or `"1"` and `1`) produce the same key, and a `/` inside a value is
/// not escaped. Dependencies must render to distinct, non-empty strings.
fn dependency_value(component: &Component, dep: &str) -> String {
    let value = component
        .call(dep)
        .or_else(|| component.arg(dep).cloned())
        .unwrap_or(Value::Null);
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
