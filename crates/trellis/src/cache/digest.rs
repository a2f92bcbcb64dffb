//! Template digests.
//!
//! A class digest is a SHA-256 over the sources of every target of the class,
//! plus, transitively, the targets of every component it can render: classes
//! named in `component("Name")` template calls and component classes used as
//! slot sources. Changing any of those templates changes the digest, and so
//! every cache key that embeds it.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::class::{ClassId, ComponentClass};
use crate::error::ComponentError;
use crate::runtime::Runtime;
use crate::slots::{SlotKind, SlotSource};

static COMPONENT_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"component\(\s*["']([A-Za-z_][A-Za-z0-9_:]*)["']"#).unwrap()
});

/// Class names a template source renders through `component("Name", ...)`.
pub fn referenced_components(source: &str) -> BTreeSet<String> {
    COMPONENT_CALL
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Computes the digest of `class` as a lowercase hex string.
pub fn class_digest(class: &Arc<ComponentClass>, runtime: &Runtime) -> Result<String, ComponentError> {
    let mut hasher = Sha256::new();
    let mut visited = HashSet::new();
    feed(class, runtime, &mut hasher, &mut visited)?;
    Ok(hex::encode(hasher.finalize()))
}

fn feed(
    class: &Arc<ComponentClass>,
    runtime: &Runtime,
    hasher: &mut Sha256,
    visited: &mut HashSet<ClassId>,
) -> Result<(), ComponentError> {
    if !visited.insert(class.id()) {
        return Ok(());
    }

    let targets = runtime.compile(class)?;
    let mut entries: Vec<(String, String)> = targets
        .targets()
        .iter()
        .map(|target| {
            let body = match target.source() {
                Some(source) => source.to_string(),
                None => format!("inline call of {}", target.owner().name()),
            };
            (target.identity(), body)
        })
        .collect();
    entries.sort();

    hasher.update(class.name().as_bytes());
    hasher.update([0u8]);
    let mut referenced = BTreeSet::new();
    for (identity, body) in &entries {
        hasher.update(identity.as_bytes());
        hasher.update([0u8]);
        hasher.update(body.as_bytes());
        hasher.update([0u8]);
        referenced.extend(referenced_components(body));
    }

    let mut dependencies: Vec<Arc<ComponentClass>> = Vec::new();
    for name in &referenced {
        match runtime.class(name) {
            Ok(dependency) => dependencies.push(dependency),
            Err(_) => tracing::debug!(component = class.name(), name = %name, "digest skips unregistered component"),
        }
    }
    for definition in class.slots().slots() {
        let sources: Vec<&SlotSource> = match &definition.kind {
            SlotKind::Monomorphic(source) => vec![source],
            SlotKind::Polymorphic(types) => types.values().map(|t| &t.source).collect(),
        };
        for source in sources {
            match source {
                SlotSource::Component(dependency) => dependencies.push(dependency.clone()),
                SlotSource::ClassName(name) => {
                    if let Ok(dependency) = runtime.class(name) {
                        dependencies.push(dependency);
                    }
                }
                SlotSource::Passthrough | SlotSource::Lambda(_) => {}
            }
        }
    }

    for dependency in &dependencies {
        if let Err(err) = feed(dependency, runtime, hasher, visited) {
            tracing::debug!(
                component = class.name(),
                dependency = dependency.name(),
                error = %err,
                "digest skips dependency that failed to compile"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_component_calls() {
        let source = r#"{{ component("Badge", {"label": x}) }} {{ component( 'Admin::Icon' ) }} {{ component(name) }}"#;
        let names: Vec<_> = referenced_components(source).into_iter().collect();
        assert_eq!(names, ["Admin::Icon", "Badge"]);
    }

    #[test]
    fn digest_is_stable_and_tracks_sources() {
        let runtime = Runtime::new();
        let a = ComponentClass::builder("Card").template("txt", "one").build().unwrap();
        let b = ComponentClass::builder("Card").template("txt", "one").build().unwrap();
        let c = ComponentClass::builder("Card").template("txt", "two").build().unwrap();

        let da = class_digest(&a, &runtime).unwrap();
        assert_eq!(da.len(), 64);
        assert_eq!(da, class_digest(&b, &runtime).unwrap());
        assert_ne!(da, class_digest(&c, &runtime).unwrap());
    }

    #[test]
    fn digest_follows_referenced_components() {
        let runtime = Runtime::new();
        let outer = ComponentClass::builder("Outer")
            .template("jinja", r#"{{ component("Inner") }}"#)
            .build()
            .unwrap();

        let before = class_digest(&outer, &runtime).unwrap();
        runtime.register(ComponentClass::builder("Inner").template("txt", "v1").build().unwrap());
        let with_v1 = class_digest(&outer, &runtime).unwrap();
        runtime.register(ComponentClass::builder("Inner").template("txt", "v2").build().unwrap());
        let with_v2 = class_digest(&outer, &runtime).unwrap();

        assert_ne!(before, with_v1);
        assert_ne!(with_v1, with_v2);
    }

    #[test]
    fn digest_survives_cycles() {
        let runtime = Runtime::new();
        runtime.register(
            ComponentClass::builder("Ping")
                .template("jinja", r#"{{ component("Pong") }}"#)
                .build()
                .unwrap(),
        );
        runtime.register(
            ComponentClass::builder("Pong")
                .template("jinja", r#"{{ component("Ping") }}"#)
                .build()
                .unwrap(),
        );
        let ping = runtime.class("Ping").unwrap();
        assert!(class_digest(&ping, &runtime).is_ok());
    }
}
