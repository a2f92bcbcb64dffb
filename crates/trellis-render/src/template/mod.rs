//! Template compilation.
//!
//! A component's templates are compiled once, then rendered many times
//! against a [`Locals`] map. This module holds the pieces involved:
//!
//! - [`TemplateHandler`] / [`CompiledTemplate`]: the compile and render seam,
//!   one handler per file extension.
//! - [`MiniJinjaHandler`]: full Jinja templates, auto-escaping in the `html`
//!   format.
//! - [`SimpleHandler`]: `{name}` substitution for small templates.
//! - [`HandlerRegistry`]: extension → handler, in priority order.
//! - [`discover_sidecars`]: finds `<base>[.<format>][+<variant>].<ext>` files
//!   next to a component.
//!
//! Supported extensions by default: `.jinja`, `.jinja2`, `.j2`, `.txt` (in
//! priority order).

mod engine;
mod locals;
pub mod registry;
mod simple;

pub use engine::{CompiledTemplate, EnvironmentSetup, MiniJinjaHandler, TemplateHandler};
pub use locals::{Local, Locals};
pub use registry::{
    discover_sidecars, read_sidecar, HandlerRegistry, SidecarFile, TEMPLATE_EXTENSIONS,
};
pub use simple::SimpleHandler;
