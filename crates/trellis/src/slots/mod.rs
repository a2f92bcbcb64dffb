//! Slots: named, lazily rendered regions a caller fills in.
//!
//! - [`definition`]: declarations, sources and the accessor dispatch table
//! - [`instance`]: values stored in a slot and their memoized rendering
//! - [`delegate`]: slots forwarded to a wrapped component

pub mod definition;
pub mod delegate;
mod inflect;
pub mod instance;

pub use definition::{
    Cardinality, PolymorphicType, SlotAccessor, SlotDefaultFn, SlotDefinition, SlotKind,
    SlotLambda, SlotRegistry, SlotReturn, SlotSource, RESERVED_SLOT_NAMES,
};
pub use delegate::{ArgTransform, DelegatedSlot, SlotHost};
pub use instance::{Callable, ComponentRef, SlotCall, SlotHandle, SlotInstance, SlotOutput, SlotValue};
