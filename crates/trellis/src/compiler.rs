//! Compiles component classes into render targets.
//!
//! Compilation gathers candidates from three places: sidecar files next to
//! the class, inline templates, and inline render callables. Each class is
//! compiled once and memoized until [`Compiler::invalidate`] or
//! [`Compiler::clear`]. Lookups take the [`CompileLock`] for reading; a miss
//! takes it for writing and checks again before compiling.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_render::{discover_sidecars, read_sidecar, HandlerRegistry};

use crate::class::{ClassId, ComponentClass};
use crate::error::{ComponentError, DefinitionError};
use crate::lock::CompileLock;
use crate::target::{RenderTarget, TargetOrigin, TargetSet};

#[derive(Debug, Default)]
pub struct Compiler {
    lock: CompileLock,
    compiled: Mutex<HashMap<ClassId, Arc<TargetSet>>>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the class's targets, compiling them on first use.
    pub fn compile(
        &self,
        class: &Arc<ComponentClass>,
        handlers: &HandlerRegistry,
        default_format: &str,
    ) -> Result<Arc<TargetSet>, ComponentError> {
        {
            let _read = self.lock.read();
            if let Some(set) = self.compiled.lock().get(&class.id()) {
                return Ok(set.clone());
            }
        }

        let _write = self.lock.write();
        if let Some(set) = self.compiled.lock().get(&class.id()) {
            return Ok(set.clone());
        }

        let set = Arc::new(self.build(class, handlers, default_format)?);
        tracing::debug!(
            component = class.name(),
            targets = set.len(),
            "compiled component"
        );
        self.compiled.lock().insert(class.id(), set.clone());
        Ok(set)
    }

    pub fn is_compiled(&self, class: &ComponentClass) -> bool {
        let _read = self.lock.read();
        self.compiled.lock().contains_key(&class.id())
    }

    /// Drops one class's compiled targets.
    pub fn invalidate(&self, class: &ComponentClass) -> bool {
        let _write = self.lock.write();
        self.compiled.lock().remove(&class.id()).is_some()
    }

    /// Drops every compiled target. Returns how many classes were dropped.
    pub fn clear(&self) -> usize {
        let _write = self.lock.write();
        let mut compiled = self.compiled.lock();
        let count = compiled.len();
        compiled.clear();
        count
    }

    fn build(
        &self,
        class: &Arc<ComponentClass>,
        handlers: &HandlerRegistry,
        default_format: &str,
    ) -> Result<TargetSet, ComponentError> {
        let candidates = candidates(class, handlers, default_format)?;

        if candidates.is_empty() {
            return match class.parent() {
                Some(parent) => {
                    let inherited = self.compile(parent, handlers, default_format)?;
                    Ok(TargetSet::inherit(&inherited, class.name()))
                }
                None => Err(DefinitionError::MissingTemplate {
                    class: class.name().to_string(),
                    requested: None,
                }
                .into()),
            };
        }

        Ok(TargetSet::build(class.name(), candidates, default_format)?)
    }
}

fn candidates(
    class: &Arc<ComponentClass>,
    handlers: &HandlerRegistry,
    default_format: &str,
) -> Result<Vec<RenderTarget>, ComponentError> {
    let mut candidates = Vec::new();

    if let Some(dir) = class.template_dir() {
        for sidecar in discover_sidecars(dir, class.template_base(), &handlers.extensions())? {
            let format = sidecar.format.clone().unwrap_or_else(|| default_format.to_string());
            let source = read_sidecar(&sidecar)?;
            let name = engine_name(class.name(), &format, sidecar.variant.as_deref(), &sidecar.extension);
            let template = handlers.require(&sidecar.extension)?.compile(&name, &source, &format)?;
            candidates.push(RenderTarget::template(
                class,
                sidecar.variant.clone(),
                format,
                TargetOrigin::File,
                template,
                source,
            ));
        }
    }

    for inline in class.inline_templates() {
        let format = inline.format.clone().unwrap_or_else(|| default_format.to_string());
        let name = engine_name(class.name(), &format, inline.variant.as_deref(), &inline.extension);
        let template = handlers
            .require(&inline.extension)?
            .compile(&name, &inline.source, &format)?;
        candidates.push(RenderTarget::template(
            class,
            inline.variant.clone(),
            format,
            TargetOrigin::InlineTemplate,
            template,
            inline.source.clone(),
        ));
    }

    for call in class.inline_calls() {
        let format = call.format.clone().unwrap_or_else(|| default_format.to_string());
        candidates.push(RenderTarget::inline(
            class,
            call.variant.clone(),
            format,
            call.call.clone(),
        ));
    }

    Ok(candidates)
}

/// `Card.html+phone.jinja`
fn engine_name(class: &str, format: &str, variant: Option<&str>, extension: &str) -> String {
    match variant {
        Some(variant) => format!("{class}.{format}+{variant}.{extension}"),
        None => format!("{class}.{format}.{extension}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use trellis_render::MiniJinjaHandler;

    fn handlers() -> HandlerRegistry {
        HandlerRegistry::with_minijinja(MiniJinjaHandler::new())
    }

    #[test]
    fn engine_names_carry_format_and_variant() {
        assert_eq!(engine_name("Card", "html", None, "jinja"), "Card.html.jinja");
        assert_eq!(
            engine_name("Card", "html", Some("phone"), "jinja"),
            "Card.html+phone.jinja"
        );
    }

    #[test]
    fn compiles_sidecars_inline_templates_and_calls() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("card.jinja"), "<p>{{ title }}</p>").unwrap();
        fs::write(dir.path().join("card.txt+phone.txt"), "{title}").unwrap();

        let class = ComponentClass::builder("Card")
            .template_dir(dir.path())
            .inline_template(None, Some("text"), "txt", "{title}")
            .inline_call(Some("watch"), None, |_| Ok(trellis_render::Html::safe("w")))
            .build()
            .unwrap();

        let compiler = Compiler::new();
        let set = compiler.compile(&class, &handlers(), "html").unwrap();
        let mut identities: Vec<_> = set.targets().iter().map(|t| t.identity()).collect();
        identities.sort();
        assert_eq!(identities, ["html", "html+watch", "text", "txt+phone"]);
        assert!(compiler.is_compiled(&class));
    }

    #[test]
    fn compile_is_memoized_until_invalidated() {
        let class = ComponentClass::builder("Card")
            .template("txt", "card")
            .build()
            .unwrap();
        let compiler = Compiler::new();
        let first = compiler.compile(&class, &handlers(), "html").unwrap();
        let second = compiler.compile(&class, &handlers(), "html").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(compiler.invalidate(&class));
        let third = compiler.compile(&class, &handlers(), "html").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(compiler.clear(), 1);
    }

    #[test]
    fn class_without_templates_or_parent_is_missing() {
        let class = ComponentClass::builder("Empty").build().unwrap();
        let err = Compiler::new()
            .compile(&class, &handlers(), "html")
            .unwrap_err();
        assert!(matches!(
            err,
            ComponentError::Definition(DefinitionError::MissingTemplate { class, .. }) if class == "Empty"
        ));
    }

    #[test]
    fn subclass_inherits_parent_targets() {
        let parent = ComponentClass::builder("Base")
            .template("txt", "base")
            .build()
            .unwrap();
        let child = ComponentClass::subclass(&parent, "Child").build().unwrap();

        let compiler = Compiler::new();
        let set = compiler.compile(&child, &handlers(), "html").unwrap();
        assert_eq!(set.class(), "Child");
        assert_eq!(set.targets()[0].owner().name(), "Base");
        assert!(compiler.is_compiled(&parent));
    }

    #[test]
    fn conflicting_sidecars_fail_to_compile() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("card.jinja"), "a").unwrap();
        fs::write(dir.path().join("card.html.jinja"), "b").unwrap();

        let class = ComponentClass::builder("Card")
            .template_dir(dir.path())
            .build()
            .unwrap();
        let err = Compiler::new()
            .compile(&class, &handlers(), "html")
            .unwrap_err();
        assert!(matches!(
            err,
            ComponentError::Definition(DefinitionError::MultipleDefaultTemplates { .. })
        ));
    }
}
