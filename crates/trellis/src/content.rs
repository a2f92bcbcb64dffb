//! Content capture.
//!
//! A component's content is the block (or literal HTML) the caller passes
//! when rendering it. The block runs lazily, inside a fresh output-buffer
//! frame, the first time anything asks for content or slots, and never again.
//! Whatever the block writes to the buffer wins over what it returns.

use std::fmt;

use trellis_render::Html;

use crate::component::Component;
use crate::error::ComponentError;
use crate::view::View;

/// Block supplying a component's content. It receives the component itself,
/// so it can set slots while it runs.
pub type ContentBlock = Box<dyn FnOnce(&mut Component, &View) -> Result<Html, ComponentError>>;

pub(crate) enum ContentState {
    Empty,
    Block(ContentBlock),
    Given(Html),
    Capturing,
    Captured(Option<Html>),
}

impl ContentState {
    pub(crate) fn is_supplied(&self) -> bool {
        !matches!(self, ContentState::Empty)
    }
}

impl fmt::Debug for ContentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentState::Empty => write!(f, "Empty"),
            ContentState::Block(_) => write!(f, "Block"),
            ContentState::Given(html) => f.debug_tuple("Given").field(html).finish(),
            ContentState::Capturing => write!(f, "Capturing"),
            ContentState::Captured(html) => f.debug_tuple("Captured").field(html).finish(),
        }
    }
}

impl Component {
    /// Supplies content as a block, evaluated at most once during render.
    ///
    /// Fails with [`ComponentError::DuplicateContent`] when literal content
    /// was already given.
    pub fn with_block<F>(&mut self, block: F) -> Result<&mut Self, ComponentError>
    where
        F: FnOnce(&mut Component, &View) -> Result<Html, ComponentError> + 'static,
    {
        if matches!(self.content, ContentState::Given(_)) {
            return Err(self.duplicate_content());
        }
        self.content = ContentState::Block(Box::new(block));
        Ok(self)
    }

    /// Supplies literal content.
    ///
    /// Fails with [`ComponentError::DuplicateContent`] when a block was
    /// already given.
    pub fn with_content(&mut self, content: Html) -> Result<&mut Self, ComponentError> {
        if matches!(self.content, ContentState::Block(_)) {
            return Err(self.duplicate_content());
        }
        self.content = ContentState::Given(content);
        Ok(self)
    }

    /// The component's content, capturing the block on first call.
    ///
    /// Returns `None` when no content was supplied. Fails with
    /// [`ComponentError::NotReady`] before rendering starts.
    pub fn content(&mut self) -> Result<Option<Html>, ComponentError> {
        let view = self.ready_view("content")?;
        match std::mem::replace(&mut self.content, ContentState::Capturing) {
            ContentState::Empty => {
                self.content = ContentState::Captured(None);
                Ok(None)
            }
            ContentState::Given(html) => {
                self.content = ContentState::Captured(Some(html.clone()));
                Ok(Some(html))
            }
            ContentState::Block(block) => {
                let captured = view.capture(|| block(self, &view));
                match captured {
                    Ok(html) => {
                        self.content = ContentState::Captured(Some(html.clone()));
                        Ok(Some(html))
                    }
                    Err(err) => {
                        self.content = ContentState::Empty;
                        Err(err)
                    }
                }
            }
            ContentState::Captured(html) => {
                self.content = ContentState::Captured(html.clone());
                Ok(html)
            }
            ContentState::Capturing => Err(ComponentError::RecursiveSlot {
                class: self.class().name().to_string(),
                slot: "content".to_string(),
            }),
        }
    }

    /// Whether the component has non-blank content.
    ///
    /// Without a block or literal content this is `false` and nothing is
    /// evaluated; otherwise content is captured and checked for blankness.
    pub fn has_content(&mut self) -> Result<bool, ComponentError> {
        if !self.content.is_supplied() {
            return Ok(false);
        }
        if let ContentState::Captured(None) = self.content {
            return Ok(false);
        }
        Ok(self.content()?.map_or(false, |html| !html.is_blank()))
    }

    fn duplicate_content(&self) -> ComponentError {
        ComponentError::DuplicateContent {
            class: self.class().name().to_string(),
            slot: None,
        }
    }
}
