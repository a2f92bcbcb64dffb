//! Error types for component definition and rendering.
//!
//! Two families:
//!
//! - [`DefinitionError`]: a component class is malformed. Raised while the
//!   class is being built (slot names, method conflicts) or when its templates
//!   are compiled (missing or conflicting render targets). Messages always
//!   name the class and the offending names.
//! - [`ComponentError`]: something went wrong while building an instance or
//!   rendering it.

use thiserror::Error;
use trellis_render::RenderError;

use crate::cache::CacheError;
use crate::lifecycle::HookError;

/// Boxed error type user callbacks can return through [`ComponentError::Custom`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for component operations.
pub type Result<T> = std::result::Result<T, ComponentError>;

/// A component class definition is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("couldn't find a template file or inline render method for {class}{}", describe_request(.requested))]
    MissingTemplate {
        class: String,
        requested: Option<String>,
    },

    #[error("{class} has more than one default template for the {format} format; a component may only have one default template per format")]
    MultipleDefaultTemplates { class: String, format: String },

    #[error("{class} has multiple templates for the variants {}; each variant may only have one template per format", .variants.join(", "))]
    CollidingVariants { class: String, variants: Vec<String> },

    #[error("{class} defines both a template and an inline render method for {}; remove one of them", .variants.join(", "))]
    TemplateAndInline { class: String, variants: Vec<String> },

    #[error("{class} defines more than one inline render method for {}; each variant may only have one per format", .variants.join(", "))]
    DuplicateInline { class: String, variants: Vec<String> },

    #[error("{class} declares a slot named '{slot}', which is reserved")]
    ReservedSlotName { class: String, slot: String },

    #[error("{class} declares an invalid slot name '{slot}': {reason}")]
    InvalidSlotName {
        class: String,
        slot: String,
        reason: String,
    },

    #[error("{class} declares the slot '{slot}' more than once")]
    SlotAlreadyDefined { class: String, slot: String },

    #[error("{class} declares the collection slot '{slot}', whose name can't be singularized; use a plural name such as 'items'")]
    UncountableSlotName { class: String, slot: String },

    #[error("{class} declares polymorphic slot '{slot}' whose setter '{setter}' collides with an existing accessor")]
    PolymorphicSetterCollision {
        class: String,
        slot: String,
        setter: String,
    },

    #[error("{class} declares slot '{slot}' with an invalid source: {reason}")]
    InvalidSlotSource {
        class: String,
        slot: String,
        reason: String,
    },

    #[error("{class} defines method '{name}', which conflicts with a slot accessor")]
    MethodConflict { class: String, name: String },

    #[error("{class} has no slot named '{slot}'")]
    UnknownSlot { class: String, slot: String },
}

fn describe_request(requested: &Option<String>) -> String {
    match requested {
        Some(r) => format!(" ({r})"),
        None => String::new(),
    }
}

/// Error raised while building or rendering a component instance.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("{class}: {capability} is not available before rendering starts")]
    NotReady {
        class: String,
        capability: &'static str,
    },

    #[error("{class}: content was supplied both as a block and through with_content{}", .slot.as_ref().map(|s| format!(" for slot '{s}'")).unwrap_or_default())]
    DuplicateContent { class: String, slot: Option<String> },

    #[error("{class} is missing required argument '{argument}'")]
    MissingArgument { class: String, argument: String },

    #[error("{class}: arguments must be a JSON object, got {found}")]
    InvalidArguments { class: String, found: String },

    #[error("{class} has no slot or slot accessor named '{slot}'")]
    UnknownSlot { class: String, slot: String },

    #[error("{class}: slot '{slot}' was already provided")]
    SlotAlreadyProvided { class: String, slot: String },

    #[error("{class}: slot '{slot}' has no polymorphic type '{type_name}'")]
    UnknownPolymorphicType {
        class: String,
        slot: String,
        type_name: String,
    },

    #[error("{class}: slot '{slot}' delegates to '{target}', but no component was wrapped under that name")]
    MissingDelegateTarget {
        class: String,
        slot: String,
        target: String,
    },

    #[error("no component class named '{0}' is registered")]
    UnknownClass(String),

    #[error("{class}: slot '{slot}' was read while it was rendering")]
    RecursiveSlot { class: String, slot: String },

    #[error(transparent)]
    Template(#[from] RenderError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Hook(#[from] HookError),

    /// Raised internally when a render is aborted; the lifecycle turns it into
    /// empty output.
    #[error("render aborted")]
    Aborted,

    #[error(transparent)]
    Custom(BoxError),
}

impl ComponentError {
    /// Wraps an arbitrary error from user code.
    pub fn custom<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ComponentError::Custom(err.into())
    }

    pub(crate) fn not_ready(class: &str, capability: &'static str) -> Self {
        ComponentError::NotReady {
            class: class.to_string(),
            capability,
        }
    }

    pub(crate) fn unknown_slot(class: &str, slot: &str) -> Self {
        ComponentError::UnknownSlot {
            class: class.to_string(),
            slot: slot.to_string(),
        }
    }

    /// True for the internal abort sentinel.
    pub fn is_aborted(&self) -> bool {
        matches!(self, ComponentError::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_template_names_class_and_request() {
        let err = DefinitionError::MissingTemplate {
            class: "Card".into(),
            requested: Some("variant phone, format json".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Card"));
        assert!(msg.contains("variant phone, format json"));
    }

    #[test]
    fn colliding_variants_lists_sorted_labels() {
        let err = DefinitionError::CollidingVariants {
            class: "Card".into(),
            variants: vec!["phone".into(), "tablet".into()],
        };
        assert!(err.to_string().contains("phone, tablet"));
    }

    #[test]
    fn duplicate_content_mentions_slot() {
        let err = ComponentError::DuplicateContent {
            class: "Card".into(),
            slot: Some("header".into()),
        };
        assert!(err.to_string().contains("slot 'header'"));

        let err = ComponentError::DuplicateContent {
            class: "Card".into(),
            slot: None,
        };
        assert!(!err.to_string().contains("slot"));
    }

    #[test]
    fn definition_error_converts() {
        let err: ComponentError = DefinitionError::UnknownSlot {
            class: "Card".into(),
            slot: "x".into(),
        }
        .into();
        assert!(matches!(err, ComponentError::Definition(_)));
    }

    #[test]
    fn custom_error_keeps_source_display() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = ComponentError::custom(io);
        assert_eq!(err.to_string(), "disk on fire");
    }
}
