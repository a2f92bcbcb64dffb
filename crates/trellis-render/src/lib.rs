//! # Trellis Render - Templates and HTML Output for Components
//!
//! `trellis-render` provides the rendering primitives underneath the `trellis`
//! component layer: HTML-safe strings, the output buffer stack, and template
//! handlers that compile sidecar files into reusable templates.
//!
//! This crate is the rendering foundation for `trellis`, but can be used
//! independently by anything that needs per-extension template compilation
//! with HTML escaping.
//!
//! ## Core Concepts
//!
//! - [`Html`]: a string known to be safe for embedding in a document
//! - [`OutputBuffer`]: a stack of frames used to capture nested output
//! - [`TemplateHandler`]: compiles source for one file extension
//! - [`CompiledTemplate`]: renders against [`Locals`]
//! - [`HandlerRegistry`]: extension → handler, in priority order
//! - [`discover_sidecars`]: finds a component's template files
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis_render::{HandlerRegistry, Locals};
//! use serde_json::json;
//!
//! let handlers = HandlerRegistry::default();
//! let template = handlers
//!     .require("jinja")
//!     .unwrap()
//!     .compile("greeting.jinja", "<p>Hello, {{ name }}</p>", "html")
//!     .unwrap();
//!
//! let locals = Locals::from_object(&json!({"name": "World"}));
//! assert_eq!(template.render(&locals).unwrap().as_str(), "<p>Hello, World</p>");
//! ```
//!
//! ## Capturing Output
//!
//! ```rust
//! use trellis_render::{Html, OutputBuffer};
//!
//! let mut buffer = OutputBuffer::new();
//! buffer.append_safe(&Html::safe("<main>"));
//! buffer.push();
//! buffer.append("a < b");
//! let captured = buffer.pop().unwrap();
//!
//! assert_eq!(captured.as_str(), "a &lt; b");
//! assert_eq!(buffer.current(), "<main>");
//! ```

mod buffer;
mod error;
mod html;
pub mod template;

// Error type
pub use error::RenderError;

// HTML and buffers
pub use buffer::OutputBuffer;
pub use html::{Html, Markup, ToHtml};

// Template handler abstraction
pub use template::{
    discover_sidecars, read_sidecar, CompiledTemplate, EnvironmentSetup, HandlerRegistry, Local,
    Locals, MiniJinjaHandler, SidecarFile, SimpleHandler, TemplateHandler, TEMPLATE_EXTENSIONS,
};

// Re-export minijinja so hosts can register functions without a direct dependency
pub use minijinja;
