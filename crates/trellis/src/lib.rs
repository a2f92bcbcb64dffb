//! # Trellis - Reusable View Components
//!
//! Trellis builds pages out of components: a component class pairs a
//! template (or render callable) with named slots, lifecycle callbacks and a
//! fragment cache policy. Instances are created with JSON arguments and
//! rendered into a [`View`], which owns the output buffer for one render.
//!
//! ## Core Concepts
//!
//! - [`ComponentClass`]: declared once through a builder, shared behind `Arc`
//! - [`Component`]: one instance with arguments, content and slot values
//! - [`Runtime`]: configuration, template handlers, class catalog, cache
//! - [`TargetSet`]: a class's compiled templates, resolved by variant and format
//! - [`Callbacks`]: `before_render` / `around_render` / `after_render` hooks
//! - [`CacheStore`]: where cached fragments live, keyed by [`CacheKey`]
//! - [`CompileLock`]: a reentrant lock that serializes template compilation
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use trellis::{Component, ComponentClass, Html, Runtime, SlotCall, SlotSource};
//!
//! let card = ComponentClass::builder("Card")
//!     .template(
//!         "jinja",
//!         "{{ header }}: {% for item in items %}{{ item }}{% if not loop.last %}, {% endif %}{% endfor %}",
//!     )
//!     .renders_one("header", SlotSource::Passthrough)
//!     .unwrap()
//!     .renders_many("items", SlotSource::Passthrough)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let mut component = Component::new(card, json!({})).unwrap();
//! component.with_slot("header", SlotCall::new().content(Html::escape("Letters"))).unwrap();
//! for letter in ["A", "B", "C"] {
//!     component.with_slot("items", SlotCall::new().content(Html::escape(letter))).unwrap();
//! }
//!
//! let html = Runtime::new().render(&mut component).unwrap();
//! assert_eq!(html.as_str(), "Letters: A, B, C");
//! ```
//!
//! ## Templates
//!
//! Templates are sidecar files next to the component
//! (`card.html.jinja`, `card.html+phone.jinja`, `card.json.txt`), inline
//! templates declared on the builder, or inline render callables that
//! receive a [`RenderScope`]. A class without its own targets inherits its
//! parent's.
//!
//! ## Configuration
//!
//! ```rust
//! use trellis::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_yaml("default_format: html\ndevelopment: true\n").unwrap();
//! assert!(config.development);
//! ```

pub mod cache;
pub mod class;
mod collection;
pub mod compiler;
pub mod component;
pub mod config;
mod content;
pub mod error;
pub mod lifecycle;
pub mod lock;
pub mod runtime;
mod scope;
pub mod slots;
pub mod target;
pub mod view;

// Errors
pub use error::{BoxError, ComponentError, DefinitionError};

// Classes and instances
pub use class::{ClassId, ComponentClass, ComponentClassBuilder};
pub use component::{Component, Invoked};
pub use content::ContentBlock;

// Rendering
pub use collection::render_collection;
pub use config::{ConfigError, RuntimeConfig};
pub use runtime::{Runtime, RuntimeBuilder};
pub use scope::RenderScope;
pub use target::{RenderTarget, TargetOrigin, TargetSet};
pub use view::{FrameGuard, View, ViewBlock};

// Lifecycle
pub use lifecycle::{Callbacks, Flow, HookError, HookPhase, Next, RenderState, Rescuer};

// Slots
pub use slots::{Cardinality, PolymorphicType, SlotCall, SlotOutput, SlotReturn, SlotSource};

// Caching and compilation
pub use cache::{CacheError, CacheKey, CacheStats, CacheStore, MemoryStore};
pub use compiler::Compiler;
pub use lock::CompileLock;

// HTML primitives
pub use trellis_render::{Html, Markup, ToHtml};
