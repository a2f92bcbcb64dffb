//! Template handlers by extension, and sidecar discovery.
//!
//! # Handlers
//!
//! [`HandlerRegistry`] maps file extensions to [`TemplateHandler`]s. The
//! default registry recognizes, in priority order:
//!
//! | Priority | Extension | Handler |
//! |----------|-----------|---------|
//! | 1 (highest) | `jinja` | MiniJinja |
//! | 2 | `jinja2` | MiniJinja |
//! | 3 | `j2` | MiniJinja |
//! | 4 (lowest) | `txt` | Simple `{name}` substitution |
//!
//! # Sidecar files
//!
//! A component's templates live next to it, named after its base name:
//!
//! ```text
//! components/
//!   card.jinja               default variant, default format
//!   card.json.jinja          default variant, json format
//!   card.html+phone.jinja    phone variant, html format
//!   card+tablet.jinja        tablet variant, default format
//!   card/card.txt            the same rules inside a directory named after the base
//! ```
//!
//! The general shape is `<base>[.<format>][+<variant>].<ext>`, where `<ext>`
//! must be a registered extension. [`discover_sidecars`] returns matches
//! sorted by path, so discovery is deterministic.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::RenderError;

use super::engine::{MiniJinjaHandler, TemplateHandler};
use super::simple::SimpleHandler;

/// Extensions recognized by [`HandlerRegistry::default`], in priority order.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["jinja", "jinja2", "j2", "txt"];

/// Extension → handler table.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: Vec<(String, Arc<dyn TemplateHandler>)>,
}

impl HandlerRegistry {
    /// An empty registry. Nothing will be discovered until handlers are added.
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// The default extensions, using `minijinja` for the Jinja family.
    pub fn with_minijinja(minijinja: MiniJinjaHandler) -> Self {
        let minijinja: Arc<dyn TemplateHandler> = Arc::new(minijinja);
        let mut registry = Self::empty();
        for ext in &TEMPLATE_EXTENSIONS[..3] {
            registry.register_arc(*ext, minijinja.clone());
        }
        registry.register("txt", SimpleHandler::new());
        registry
    }

    /// Registers a handler, replacing any previous one for `ext`.
    ///
    /// New extensions go to the end of the priority order; replaced ones keep
    /// their position.
    pub fn register(&mut self, ext: impl Into<String>, handler: impl TemplateHandler + 'static) {
        self.register_arc(ext, Arc::new(handler));
    }

    pub fn register_arc(&mut self, ext: impl Into<String>, handler: Arc<dyn TemplateHandler>) {
        let ext = ext.into();
        let ext = ext.trim_start_matches('.').to_string();
        match self.handlers.iter_mut().find(|(e, _)| *e == ext) {
            Some(slot) => slot.1 = handler,
            None => self.handlers.push((ext, handler)),
        }
    }

    pub fn get(&self, ext: &str) -> Option<&Arc<dyn TemplateHandler>> {
        self.handlers
            .iter()
            .find(|(e, _)| e == ext)
            .map(|(_, handler)| handler)
    }

    /// Looks up the handler for `ext`, failing with [`RenderError::UnknownHandler`].
    pub fn require(&self, ext: &str) -> Result<&Arc<dyn TemplateHandler>, RenderError> {
        self.get(ext)
            .ok_or_else(|| RenderError::UnknownHandler(ext.to_string()))
    }

    /// Registered extensions in priority order.
    pub fn extensions(&self) -> Vec<&str> {
        self.handlers.iter().map(|(e, _)| e.as_str()).collect()
    }

    /// Priority of an extension (lower is higher priority).
    ///
    /// Returns `usize::MAX` if the extension is not registered.
    pub fn priority(&self, ext: &str) -> usize {
        self.handlers
            .iter()
            .position(|(e, _)| e == ext)
            .unwrap_or(usize::MAX)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_minijinja(MiniJinjaHandler::new())
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

/// A template file discovered next to a component.
///
/// # Example
///
/// For `components/card.html+phone.jinja` with base `card`:
///
/// ```rust,ignore
/// SidecarFile {
///     path: PathBuf::from("components/card.html+phone.jinja"),
///     format: Some("html".to_string()),
///     variant: Some("phone".to_string()),
///     extension: "jinja".to_string(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Explicit format, if the file name carries one
    pub format: Option<String>,
    /// Variant, if the file name carries one
    pub variant: Option<String>,
    /// Handler extension without the dot
    pub extension: String,
}

impl SidecarFile {
    /// Parses a file name of the form `<base>[.<format>][+<variant>].<ext>`.
    ///
    /// Returns `None` when the name belongs to another base or has a malformed
    /// format or variant. The extension is not checked against any registry.
    pub fn parse(path: &Path, base: &str) -> Option<SidecarFile> {
        let file_name = path.file_name()?.to_str()?;
        let rest = file_name.strip_prefix(base)?;
        let dot = rest.rfind('.')?;
        let (middle, extension) = (&rest[..dot], &rest[dot + 1..]);
        if extension.is_empty() {
            return None;
        }

        let (format, variant) = if middle.is_empty() {
            (None, None)
        } else if let Some(variant) = middle.strip_prefix('+') {
            (None, Some(variant))
        } else if let Some(rest) = middle.strip_prefix('.') {
            match rest.split_once('+') {
                Some((format, variant)) => (Some(format), Some(variant)),
                None => (Some(rest), None),
            }
        } else {
            return None;
        };

        if !format.map_or(true, is_token) || !variant.map_or(true, is_token) {
            return None;
        }

        Some(SidecarFile {
            path: path.to_path_buf(),
            format: format.map(str::to_string),
            variant: variant.map(str::to_string),
            extension: extension.to_string(),
        })
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Finds the sidecar templates for `base` in `dir`.
///
/// Scans `dir/<base>.*` and `dir/<base>/<base>.*`, keeping files whose
/// extension appears in `extensions`. Missing directories yield no files.
pub fn discover_sidecars(
    dir: &Path,
    base: &str,
    extensions: &[&str],
) -> Result<Vec<SidecarFile>, RenderError> {
    let mut files = Vec::new();
    for scan_dir in [dir.to_path_buf(), dir.join(base)] {
        if !scan_dir.is_dir() {
            continue;
        }
        for entry in std::fs::read_dir(&scan_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(file) = SidecarFile::parse(&path, base) {
                if extensions.contains(&file.extension.as_str()) {
                    files.push(file);
                }
            }
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(dir = %dir.display(), base, count = files.len(), "discovered sidecar templates");
    Ok(files)
}

/// Reads a sidecar file's source.
pub fn read_sidecar(file: &SidecarFile) -> Result<String, RenderError> {
    std::fs::read_to_string(&file.path).map_err(|e| RenderError::read(&file.path, e))
}
