//! Slot declarations and the accessor dispatch table.
//!
//! Each slot a class declares registers a handful of accessor names:
//!
//! | Declaration | Accessors |
//! |-------------|-----------|
//! | `renders_one("header", ..)` | `header`, `header?`, `with_header` |
//! | `renders_many("items", ..)` | `items`, `items?`, `with_item`, `with_items` |
//! | `renders_one_polymorphic("visual", [icon, avatar])` | `visual`, `visual?`, `with_visual_icon`, `with_visual_avatar` |
//! | `renders_many_polymorphic("items", [link, button])` | `items`, `items?`, `with_item_link`, `with_item_button` |
//!
//! Delegated slots register the same shapes as their monomorphic
//! counterparts. Accessor names are unique per class; a collision is a
//! definition error.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use trellis_render::Html;

use crate::class::ComponentClass;
use crate::component::Component;
use crate::error::{ComponentError, DefinitionError};

use super::delegate::DelegatedSlot;
use super::inflect::singularize;

static SLOT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap());

/// Names that would shadow a component's own content accessors.
pub const RESERVED_SLOT_NAMES: &[&str] = &["content", "render", "contents", "renders"];

/// What a lambda slot hands back.
pub enum SlotReturn {
    /// Rendered in the parent's view.
    Component(Component),
    /// Inserted as is.
    Content(Html),
    /// Escaped, then inserted.
    Text(String),
}

/// Lambda slot source: receives the parent, the call args and the captured
/// block content (if a block was given).
pub type SlotLambda = Arc<
    dyn Fn(&Component, &serde_json::Value, Option<Html>) -> Result<SlotReturn, ComponentError>
        + Send
        + Sync,
>;

/// Produces a singular slot's value when none was set.
pub type SlotDefaultFn =
    Arc<dyn Fn(&Component) -> Result<SlotReturn, ComponentError> + Send + Sync>;

/// Where a slot's value comes from.
#[derive(Clone)]
pub enum SlotSource {
    /// No renderable: the slot only carries content.
    Passthrough,
    /// Instances of a component class.
    Component(Arc<ComponentClass>),
    /// A component class looked up by name when the slot renders.
    ClassName(String),
    Lambda(SlotLambda),
}

impl SlotSource {
    pub fn component(class: &Arc<ComponentClass>) -> Self {
        SlotSource::Component(class.clone())
    }

    pub fn class_name(name: impl Into<String>) -> Self {
        SlotSource::ClassName(name.into())
    }

    pub fn lambda<F>(f: F) -> Self
    where
        F: Fn(&Component, &serde_json::Value, Option<Html>) -> Result<SlotReturn, ComponentError>
            + Send
            + Sync
            + 'static,
    {
        SlotSource::Lambda(Arc::new(f))
    }
}

impl fmt::Debug for SlotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotSource::Passthrough => write!(f, "Passthrough"),
            SlotSource::Component(class) => write!(f, "Component({})", class.name()),
            SlotSource::ClassName(name) => write!(f, "ClassName({name})"),
            SlotSource::Lambda(_) => write!(f, "Lambda"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Collection,
}

/// One type of a polymorphic slot.
#[derive(Debug, Clone)]
pub struct PolymorphicType {
    pub(crate) type_name: String,
    pub(crate) source: SlotSource,
    pub(crate) setter: Option<String>,
}

impl PolymorphicType {
    pub fn new(type_name: impl Into<String>, source: SlotSource) -> Self {
        Self {
            type_name: type_name.into(),
            source,
            setter: None,
        }
    }

    /// Overrides the generated `with_<singular>_<type>` setter name.
    pub fn setter(mut self, name: impl Into<String>) -> Self {
        self.setter = Some(name.into());
        self
    }
}

#[derive(Debug, Clone)]
pub enum SlotKind {
    Monomorphic(SlotSource),
    Polymorphic(BTreeMap<String, PolymorphicType>),
}

/// A declared slot.
#[derive(Clone)]
pub struct SlotDefinition {
    pub(crate) name: String,
    pub(crate) cardinality: Cardinality,
    pub(crate) kind: SlotKind,
    pub(crate) default: Option<SlotDefaultFn>,
}

impl SlotDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_polymorphic(&self) -> bool {
        matches!(self.kind, SlotKind::Polymorphic(_))
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Source used for a call with the given polymorphic type.
    pub(crate) fn source_for(
        &self,
        class: &str,
        type_name: Option<&str>,
    ) -> Result<&SlotSource, ComponentError> {
        match &self.kind {
            SlotKind::Monomorphic(source) => Ok(source),
            SlotKind::Polymorphic(types) => {
                let requested = type_name.unwrap_or_default();
                types
                    .get(requested)
                    .map(|t| &t.source)
                    .ok_or_else(|| ComponentError::UnknownPolymorphicType {
                        class: class.to_string(),
                        slot: self.name.clone(),
                        type_name: requested.to_string(),
                    })
            }
        }
    }
}

impl fmt::Debug for SlotDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotDefinition")
            .field("name", &self.name)
            .field("cardinality", &self.cardinality)
            .field("kind", &self.kind)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// A named accessor and what it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotAccessor {
    /// `name`: render the slot.
    Get { slot: String },
    /// `name?`: whether the slot has a value.
    Predicate { slot: String },
    /// `with_name`: set a singular slot.
    Set { slot: String },
    /// `with_<singular>`: append to a collection slot.
    Append { slot: String },
    /// `with_<plural>`: append one entry per element of an array.
    SetMany { slot: String },
    /// `with_<singular>_<type>`: set a polymorphic slot with a given type.
    SetPolymorphic { slot: String, type_name: String },
}

impl SlotAccessor {
    pub fn slot(&self) -> &str {
        match self {
            SlotAccessor::Get { slot }
            | SlotAccessor::Predicate { slot }
            | SlotAccessor::Set { slot }
            | SlotAccessor::Append { slot }
            | SlotAccessor::SetMany { slot }
            | SlotAccessor::SetPolymorphic { slot, .. } => slot,
        }
    }
}

/// Every slot and delegated slot of a class, plus the accessor table.
///
/// Cloned into subclasses at definition time.
#[derive(Clone, Default)]
pub struct SlotRegistry {
    slots: BTreeMap<String, SlotDefinition>,
    delegates: BTreeMap<String, DelegatedSlot>,
    accessors: BTreeMap<String, SlotAccessor>,
}

impl SlotRegistry {
    pub fn get(&self, name: &str) -> Option<&SlotDefinition> {
        self.slots.get(name)
    }

    pub fn delegate(&self, name: &str) -> Option<&DelegatedSlot> {
        self.delegates.get(name)
    }

    pub fn accessor(&self, name: &str) -> Option<&SlotAccessor> {
        self.accessors.get(name)
    }

    pub fn accessor_names(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(String::as_str)
    }

    pub fn slots(&self) -> impl Iterator<Item = &SlotDefinition> {
        self.slots.values()
    }

    /// True for declared and delegated slot names.
    pub fn is_slot(&self, name: &str) -> bool {
        self.slots.contains_key(name) || self.delegates.contains_key(name)
    }

    pub(crate) fn register(
        &mut self,
        class: &str,
        definition: SlotDefinition,
        methods: &[&str],
    ) -> Result<(), DefinitionError> {
        let name = definition.name.clone();
        self.validate_name(class, &name)?;

        let mut accessors = base_accessors(&name);
        let singular = match definition.cardinality {
            Cardinality::Single => name.clone(),
            Cardinality::Collection => uncountable_check(class, &name)?,
        };

        let mut polymorphic_setters = Vec::new();
        match (&definition.kind, definition.cardinality) {
            (SlotKind::Monomorphic(_), Cardinality::Single) => {
                accessors.push((format!("with_{name}"), SlotAccessor::Set { slot: name.clone() }));
            }
            (SlotKind::Monomorphic(_), Cardinality::Collection) => {
                accessors.push((
                    format!("with_{singular}"),
                    SlotAccessor::Append { slot: name.clone() },
                ));
                accessors.push((
                    format!("with_{name}"),
                    SlotAccessor::SetMany { slot: name.clone() },
                ));
            }
            (SlotKind::Polymorphic(types), _) => {
                if types.is_empty() {
                    return Err(DefinitionError::InvalidSlotSource {
                        class: class.to_string(),
                        slot: name,
                        reason: "a polymorphic slot needs at least one type".to_string(),
                    });
                }
                for (type_name, poly) in types {
                    let setter = poly
                        .setter
                        .clone()
                        .unwrap_or_else(|| format!("with_{singular}_{type_name}"));
                    if polymorphic_setters.contains(&setter) {
                        return Err(DefinitionError::PolymorphicSetterCollision {
                            class: class.to_string(),
                            slot: name,
                            setter,
                        });
                    }
                    polymorphic_setters.push(setter.clone());
                    accessors.push((
                        setter,
                        SlotAccessor::SetPolymorphic {
                            slot: name.clone(),
                            type_name: type_name.clone(),
                        },
                    ));
                }
            }
        }

        self.check_accessors(class, &name, &accessors, &polymorphic_setters, methods)?;
        self.accessors.extend(accessors);
        self.slots.insert(name, definition);
        Ok(())
    }

    pub(crate) fn register_delegate(
        &mut self,
        class: &str,
        delegate: DelegatedSlot,
        methods: &[&str],
    ) -> Result<(), DefinitionError> {
        let name = delegate.name.clone();
        self.validate_name(class, &name)?;

        let mut accessors = base_accessors(&name);
        match delegate.cardinality {
            Cardinality::Single => {
                accessors.push((format!("with_{name}"), SlotAccessor::Set { slot: name.clone() }));
            }
            Cardinality::Collection => {
                let singular = uncountable_check(class, &name)?;
                accessors.push((
                    format!("with_{singular}"),
                    SlotAccessor::Append { slot: name.clone() },
                ));
                accessors.push((
                    format!("with_{name}"),
                    SlotAccessor::SetMany { slot: name.clone() },
                ));
            }
        }

        self.check_accessors(class, &name, &accessors, &[], methods)?;
        self.accessors.extend(accessors);
        self.delegates.insert(name, delegate);
        Ok(())
    }

    pub(crate) fn set_default(
        &mut self,
        class: &str,
        slot: &str,
        producer: SlotDefaultFn,
    ) -> Result<(), DefinitionError> {
        let definition = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| DefinitionError::UnknownSlot {
                class: class.to_string(),
                slot: slot.to_string(),
            })?;
        if definition.cardinality == Cardinality::Collection {
            return Err(DefinitionError::InvalidSlotSource {
                class: class.to_string(),
                slot: slot.to_string(),
                reason: "defaults apply to singular slots only".to_string(),
            });
        }
        definition.default = Some(producer);
        Ok(())
    }

    fn validate_name(&self, class: &str, name: &str) -> Result<(), DefinitionError> {
        if RESERVED_SLOT_NAMES.contains(&name) {
            return Err(DefinitionError::ReservedSlotName {
                class: class.to_string(),
                slot: name.to_string(),
            });
        }
        if name.ends_with('?') {
            return Err(DefinitionError::InvalidSlotName {
                class: class.to_string(),
                slot: name.to_string(),
                reason: "slot names cannot end with '?'".to_string(),
            });
        }
        if !SLOT_NAME.is_match(name) {
            return Err(DefinitionError::InvalidSlotName {
                class: class.to_string(),
                slot: name.to_string(),
                reason: "slot names must be lowercase identifiers".to_string(),
            });
        }
        if self.is_slot(name) {
            return Err(DefinitionError::SlotAlreadyDefined {
                class: class.to_string(),
                slot: name.to_string(),
            });
        }
        Ok(())
    }

    fn check_accessors(
        &self,
        class: &str,
        slot: &str,
        accessors: &[(String, SlotAccessor)],
        polymorphic_setters: &[String],
        methods: &[&str],
    ) -> Result<(), DefinitionError> {
        for (accessor, _) in accessors {
            if self.accessors.contains_key(accessor) {
                if polymorphic_setters.contains(accessor) {
                    return Err(DefinitionError::PolymorphicSetterCollision {
                        class: class.to_string(),
                        slot: slot.to_string(),
                        setter: accessor.clone(),
                    });
                }
                return Err(DefinitionError::SlotAlreadyDefined {
                    class: class.to_string(),
                    slot: accessor.clone(),
                });
            }
            if methods.contains(&accessor.as_str()) {
                return Err(DefinitionError::MethodConflict {
                    class: class.to_string(),
                    name: accessor.clone(),
                });
            }
        }
        Ok(())
    }
}

fn base_accessors(name: &str) -> Vec<(String, SlotAccessor)> {
    vec![
        (
            name.to_string(),
            SlotAccessor::Get {
                slot: name.to_string(),
            },
        ),
        (
            format!("{name}?"),
            SlotAccessor::Predicate {
                slot: name.to_string(),
            },
        ),
    ]
}

fn uncountable_check(class: &str, name: &str) -> Result<String, DefinitionError> {
    singularize(name).ok_or_else(|| DefinitionError::UncountableSlotName {
        class: class.to_string(),
        slot: name.to_string(),
    })
}

impl fmt::Debug for SlotRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotRegistry")
            .field("slots", &self.slots.keys().collect::<Vec<_>>())
            .field("delegates", &self.delegates.keys().collect::<Vec<_>>())
            .field("accessors", &self.accessors.len())
            .finish()
    }
}
