//! Render targets and their resolution.
//!
//! A class compiles into a [`TargetSet`]: one [`RenderTarget`] per
//! `(variant, format)` pair, each backed by a compiled template or an inline
//! render callable. Resolution falls back in a fixed order:
//!
//! 1. the exact `(variant, format)`;
//! 2. with a variant, the default template `(None, format)`;
//! 3. when no format was requested, `(None, default_format)`.
//!
//! Anything else is [`DefinitionError::MissingTemplate`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use trellis_render::{CompiledTemplate, Html};

use crate::class::{ComponentClass, InlineFn};
use crate::component::Component;
use crate::error::{ComponentError, DefinitionError};
use crate::scope::RenderScope;
use crate::view::View;

/// Where a target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOrigin {
    File,
    InlineTemplate,
    InlineCall,
}

impl TargetOrigin {
    fn is_template(self) -> bool {
        !matches!(self, TargetOrigin::InlineCall)
    }
}

#[derive(Clone)]
pub(crate) enum TargetBody {
    Template(Arc<dyn CompiledTemplate>),
    Inline(InlineFn),
}

/// One compiled way to render a class.
pub struct RenderTarget {
    variant: Option<String>,
    format: String,
    origin: TargetOrigin,
    body: TargetBody,
    source: Option<String>,
    owner: Arc<ComponentClass>,
}

impl RenderTarget {
    pub(crate) fn template(
        owner: &Arc<ComponentClass>,
        variant: Option<String>,
        format: String,
        origin: TargetOrigin,
        template: Arc<dyn CompiledTemplate>,
        source: String,
    ) -> Self {
        Self {
            variant,
            format,
            origin,
            body: TargetBody::Template(template),
            source: Some(source),
            owner: owner.clone(),
        }
    }

    pub(crate) fn inline(
        owner: &Arc<ComponentClass>,
        variant: Option<String>,
        format: String,
        call: InlineFn,
    ) -> Self {
        Self {
            variant,
            format,
            origin: TargetOrigin::InlineCall,
            body: TargetBody::Inline(call),
            source: None,
            owner: owner.clone(),
        }
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn origin(&self) -> TargetOrigin {
        self.origin
    }

    /// Template source, when the target is a template.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Class that declared this target. Differs from the rendering class
    /// when the target was inherited.
    pub fn owner(&self) -> &Arc<ComponentClass> {
        &self.owner
    }

    /// `html` or `html+phone`.
    pub fn identity(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{}+{variant}", self.format),
            None => self.format.clone(),
        }
    }

    /// Names the target reads from its component, for templates.
    pub fn referenced_names(&self) -> Option<&BTreeSet<String>> {
        match &self.body {
            TargetBody::Template(template) => Some(template.referenced_names()),
            TargetBody::Inline(_) => None,
        }
    }

    pub(crate) fn invoke(
        &self,
        component: &mut Component,
        view: &View,
    ) -> Result<Html, ComponentError> {
        match &self.body {
            TargetBody::Template(template) => {
                let locals = component.template_locals(template.referenced_names())?;
                Ok(template.render(&locals)?)
            }
            TargetBody::Inline(call) => {
                let mut scope = RenderScope::new(component, view, self);
                call(&mut scope)
            }
        }
    }

    fn label(&self) -> &str {
        self.variant.as_deref().unwrap_or("default")
    }
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("variant", &self.variant)
            .field("format", &self.format)
            .field("origin", &self.origin)
            .field("owner", &self.owner.name())
            .finish()
    }
}

/// All targets of a class.
#[derive(Debug)]
pub struct TargetSet {
    class: String,
    default_format: String,
    targets: Vec<Arc<RenderTarget>>,
}

impl TargetSet {
    /// Checks `candidates` for conflicts and builds the set.
    pub(crate) fn build(
        class: &str,
        candidates: Vec<RenderTarget>,
        default_format: &str,
    ) -> Result<Self, DefinitionError> {
        let mut by_key: BTreeMap<(String, Option<String>), Vec<&RenderTarget>> = BTreeMap::new();
        for candidate in &candidates {
            by_key
                .entry((candidate.format.clone(), candidate.variant.clone()))
                .or_default()
                .push(candidate);
        }

        for ((format, variant), group) in &by_key {
            let templates = group.iter().filter(|t| t.origin.is_template()).count();
            if variant.is_none() && templates > 1 {
                return Err(DefinitionError::MultipleDefaultTemplates {
                    class: class.to_string(),
                    format: format.clone(),
                });
            }
        }

        let mut colliding: Vec<String> = by_key
            .iter()
            .filter(|((_, variant), group)| {
                variant.is_some() && group.iter().filter(|t| t.origin.is_template()).count() > 1
            })
            .filter_map(|((_, variant), _)| variant.clone())
            .collect();
        if !colliding.is_empty() {
            colliding.sort();
            colliding.dedup();
            return Err(DefinitionError::CollidingVariants {
                class: class.to_string(),
                variants: colliding,
            });
        }

        let mut mixed: Vec<String> = by_key
            .values()
            .filter(|group| {
                group.iter().any(|t| t.origin.is_template())
                    && group.iter().any(|t| !t.origin.is_template())
            })
            .map(|group| group[0].label().to_string())
            .collect();
        if !mixed.is_empty() {
            mixed.sort();
            mixed.dedup();
            return Err(DefinitionError::TemplateAndInline {
                class: class.to_string(),
                variants: mixed,
            });
        }

        let mut duplicated: Vec<String> = by_key
            .values()
            .filter(|group| group.len() > 1)
            .map(|group| group[0].label().to_string())
            .collect();
        if !duplicated.is_empty() {
            duplicated.sort();
            duplicated.dedup();
            return Err(DefinitionError::DuplicateInline {
                class: class.to_string(),
                variants: duplicated,
            });
        }

        Ok(Self {
            class: class.to_string(),
            default_format: default_format.to_string(),
            targets: candidates.into_iter().map(Arc::new).collect(),
        })
    }

    /// Shares `parent`'s targets under another class's name.
    pub(crate) fn inherit(parent: &TargetSet, class: &str) -> Self {
        Self {
            class: class.to_string(),
            default_format: parent.default_format.clone(),
            targets: parent.targets.clone(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn targets(&self) -> &[Arc<RenderTarget>] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn find(&self, variant: Option<&str>, format: &str) -> Option<&Arc<RenderTarget>> {
        self.targets
            .iter()
            .find(|t| t.variant.as_deref() == variant && t.format == format)
    }

    /// Resolves the target for a variant and requested format.
    pub fn resolve(
        &self,
        variant: Option<&str>,
        format: Option<&str>,
    ) -> Result<Arc<RenderTarget>, DefinitionError> {
        let wanted = format.unwrap_or(&self.default_format);
        if let Some(target) = self.find(variant, wanted) {
            return Ok(target.clone());
        }
        if variant.is_some() {
            if let Some(target) = self.find(None, wanted) {
                return Ok(target.clone());
            }
        }
        if format.is_none() {
            if let Some(target) = self.find(None, &self.default_format) {
                return Ok(target.clone());
            }
        }
        Err(self.missing(variant, wanted))
    }

    /// Resolves for the first of `variants` that has an exact target, falling
    /// back as [`resolve`](Self::resolve) does.
    pub fn resolve_first(
        &self,
        variants: &[String],
        format: Option<&str>,
    ) -> Result<Arc<RenderTarget>, DefinitionError> {
        let wanted = format.unwrap_or(&self.default_format);
        for variant in variants {
            if let Some(target) = self.find(Some(variant), wanted) {
                return Ok(target.clone());
            }
        }
        self.resolve(variants.first().map(String::as_str), format)
    }

    fn missing(&self, variant: Option<&str>, format: &str) -> DefinitionError {
        let requested = match variant {
            Some(variant) => format!("variant {variant}, format {format}"),
            None => format!("format {format}"),
        };
        DefinitionError::MissingTemplate {
            class: self.class.clone(),
            requested: Some(requested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_render::{Locals, RenderError};

    #[derive(Debug)]
    struct Fixed(&'static str, BTreeSet<String>);

    impl CompiledTemplate for Fixed {
        fn render(&self, _locals: &Locals) -> Result<Html, RenderError> {
            Ok(Html::safe(self.0))
        }

        fn referenced_names(&self) -> &BTreeSet<String> {
            &self.1
        }
    }

    fn owner() -> Arc<ComponentClass> {
        ComponentClass::builder("Card").build().unwrap()
    }

    fn file(owner: &Arc<ComponentClass>, variant: Option<&str>, format: &str) -> RenderTarget {
        RenderTarget::template(
            owner,
            variant.map(str::to_string),
            format.to_string(),
            TargetOrigin::File,
            Arc::new(Fixed("x", BTreeSet::new())),
            "x".to_string(),
        )
    }

    fn call(owner: &Arc<ComponentClass>, variant: Option<&str>, format: &str) -> RenderTarget {
        RenderTarget::inline(
            owner,
            variant.map(str::to_string),
            format.to_string(),
            Arc::new(|_: &mut RenderScope<'_>| -> Result<Html, ComponentError> {
                Ok(Html::empty())
            }),
        )
    }

    fn sample() -> TargetSet {
        let owner = owner();
        TargetSet::build(
            "Card",
            vec![
                file(&owner, None, "html"),
                file(&owner, Some("phone"), "html"),
                file(&owner, None, "text"),
            ],
            "html",
        )
        .unwrap()
    }

    #[test]
    fn identity_includes_variant() {
        let owner = owner();
        assert_eq!(file(&owner, None, "html").identity(), "html");
        assert_eq!(file(&owner, Some("phone"), "html").identity(), "html+phone");
    }

    #[test]
    fn unknown_variant_falls_back_to_default() {
        let set = sample();
        let target = set.resolve(Some("tablet"), Some("html")).unwrap();
        assert_eq!(target.variant(), None);
        assert_eq!(target.format(), "html");
    }

    #[test]
    fn exact_variant_wins() {
        let set = sample();
        let target = set.resolve(Some("phone"), Some("html")).unwrap();
        assert_eq!(target.variant(), Some("phone"));
    }

    #[test]
    fn requested_format_does_not_fall_back_to_default_format() {
        let set = sample();
        let err = set.resolve(Some("phone"), Some("json")).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::MissingTemplate {
                class: "Card".into(),
                requested: Some("variant phone, format json".into()),
            }
        );
    }

    #[test]
    fn no_format_uses_default_format() {
        let set = sample();
        assert_eq!(set.resolve(None, None).unwrap().format(), "html");
        assert_eq!(set.resolve(None, Some("text")).unwrap().format(), "text");
    }

    #[test]
    fn resolve_first_tries_each_variant() {
        let set = sample();
        let variants = vec!["watch".to_string(), "phone".to_string()];
        let target = set.resolve_first(&variants, None).unwrap();
        assert_eq!(target.variant(), Some("phone"));

        let target = set.resolve_first(&["watch".to_string()], None).unwrap();
        assert_eq!(target.variant(), None);
    }

    #[test]
    fn two_defaults_for_a_format_conflict() {
        let owner = owner();
        let err = TargetSet::build(
            "Card",
            vec![file(&owner, None, "html"), file(&owner, None, "html")],
            "html",
        )
        .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::MultipleDefaultTemplates {
                class: "Card".into(),
                format: "html".into()
            }
        );
    }

    #[test]
    fn colliding_variants_are_listed_sorted() {
        let owner = owner();
        let err = TargetSet::build(
            "Card",
            vec![
                file(&owner, Some("tablet"), "html"),
                file(&owner, Some("phone"), "html"),
                file(&owner, Some("tablet"), "html"),
                file(&owner, Some("phone"), "html"),
            ],
            "html",
        )
        .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::CollidingVariants {
                class: "Card".into(),
                variants: vec!["phone".into(), "tablet".into()],
            }
        );
    }

    #[test]
    fn template_and_inline_call_conflict() {
        let owner = owner();
        let err = TargetSet::build(
            "Card",
            vec![file(&owner, None, "html"), call(&owner, None, "html")],
            "html",
        )
        .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::TemplateAndInline {
                class: "Card".into(),
                variants: vec!["default".into()],
            }
        );
    }

    #[test]
    fn duplicate_inline_calls_conflict() {
        let owner = owner();
        let err = TargetSet::build(
            "Card",
            vec![
                call(&owner, Some("phone"), "html"),
                call(&owner, None, "html"),
                call(&owner, Some("phone"), "html"),
                call(&owner, None, "html"),
            ],
            "html",
        )
        .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateInline {
                class: "Card".into(),
                variants: vec!["default".into(), "phone".into()],
            }
        );
    }

    #[test]
    fn inline_call_for_another_variant_is_fine() {
        let owner = owner();
        let set = TargetSet::build(
            "Card",
            vec![file(&owner, None, "html"), call(&owner, Some("phone"), "html")],
            "html",
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.resolve(Some("phone"), None).unwrap().origin(),
            TargetOrigin::InlineCall
        );
    }
}
