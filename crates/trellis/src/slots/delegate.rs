//! Delegated slots.
//!
//! A wrapper component can expose a slot that really belongs to a component it
//! wraps. Setting or reading the slot on the wrapper forwards the call, after
//! the wrapper's transform rewrites the call's arguments, to the component
//! stored under the delegate's target name (see
//! [`Component::wrap`](crate::Component::wrap)).
//!
//! Delegation is transitive: if the wrapped component delegates the same slot
//! again, each hop applies its own transform in turn, outermost first.

use std::fmt;
use std::sync::Arc;

use crate::error::ComponentError;

use super::definition::Cardinality;
use super::instance::{SlotCall, SlotOutput};

/// Rewrites a forwarded call's arguments.
pub type ArgTransform = Arc<dyn Fn(serde_json::Value) -> serde_json::Value + Send + Sync>;

#[derive(Clone)]
pub struct DelegatedSlot {
    pub(crate) name: String,
    pub(crate) cardinality: Cardinality,
    pub(crate) target: String,
    pub(crate) transform: ArgTransform,
}

impl DelegatedSlot {
    pub(crate) fn new(
        name: impl Into<String>,
        cardinality: Cardinality,
        target: impl Into<String>,
        transform: ArgTransform,
    ) -> Self {
        Self {
            name: name.into(),
            cardinality,
            target: target.into(),
            transform,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name the wrapped component is stored under.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub(crate) fn transform_call(&self, mut call: SlotCall) -> SlotCall {
        call.args = (self.transform)(std::mem::take(&mut call.args));
        call
    }
}

impl fmt::Debug for DelegatedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedSlot")
            .field("name", &self.name)
            .field("cardinality", &self.cardinality)
            .field("target", &self.target)
            .finish()
    }
}

/// Anything that owns slots and can receive forwarded slot calls.
pub trait SlotHost {
    fn set_slot(&mut self, name: &str, call: SlotCall) -> Result<(), ComponentError>;

    fn get_slot(&mut self, name: &str) -> Result<SlotOutput, ComponentError>;

    fn slot_present(&mut self, name: &str) -> Result<bool, ComponentError>;
}
