//! Output buffer stack.
//!
//! An [`OutputBuffer`] holds a root frame plus any number of nested frames.
//! Writes always land in the top frame. Capturing a block of output is a
//! `push`, some writes, then a `pop` that hands the frame's contents back
//! while leaving the enclosing frames untouched.

use crate::html::Html;

#[derive(Debug, Clone)]
pub struct OutputBuffer {
    frames: Vec<String>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            frames: vec![String::new()],
        }
    }

    /// Opens a fresh frame on top of the stack.
    pub fn push(&mut self) {
        self.frames.push(String::new());
    }

    /// Closes the top frame and returns its contents.
    ///
    /// The root frame is never popped; `None` means the stack was already at
    /// the root.
    pub fn pop(&mut self) -> Option<Html> {
        if self.frames.len() <= 1 {
            return None;
        }
        self.frames.pop().map(Html::safe)
    }

    /// Appends text to the top frame, escaping it.
    pub fn append(&mut self, text: &str) {
        let escaped = Html::escape(text);
        self.top_mut().push_str(escaped.as_str());
    }

    /// Appends already-safe HTML to the top frame.
    pub fn append_safe(&mut self, html: &Html) {
        self.top_mut().push_str(html.as_str());
    }

    /// Replaces the contents of the top frame.
    ///
    /// Assigning a whole new buffer while frames are open only affects the
    /// frame currently being written, so the depth stays the same.
    pub fn replace(&mut self, html: Html) {
        *self.top_mut() = html.into_string();
    }

    /// Contents of the top frame.
    pub fn current(&self) -> &str {
        self.frames.last().map(String::as_str).unwrap_or_default()
    }

    /// Number of open frames above the root.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Takes the root frame's contents, leaving it empty.
    pub fn take_root(&mut self) -> Html {
        Html::safe(std::mem::take(&mut self.frames[0]))
    }

    fn top_mut(&mut self) -> &mut String {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_land_in_top_frame() {
        let mut buf = OutputBuffer::new();
        buf.append_safe(&Html::safe("root "));
        buf.push();
        buf.append_safe(&Html::safe("inner"));
        assert_eq!(buf.depth(), 1);
        assert_eq!(buf.pop().unwrap().as_str(), "inner");
        assert_eq!(buf.current(), "root ");
    }

    #[test]
    fn root_frame_is_never_popped() {
        let mut buf = OutputBuffer::new();
        assert!(buf.pop().is_none());
        assert_eq!(buf.depth(), 0);
    }

    #[test]
    fn append_escapes() {
        let mut buf = OutputBuffer::new();
        buf.append("<b>");
        assert_eq!(buf.current(), "&lt;b&gt;");
    }

    #[test]
    fn replace_only_touches_top_frame() {
        let mut buf = OutputBuffer::new();
        buf.append_safe(&Html::safe("outer"));
        buf.push();
        buf.append_safe(&Html::safe("discarded"));
        buf.replace(Html::safe("kept"));
        assert_eq!(buf.depth(), 1);
        assert_eq!(buf.pop().unwrap().as_str(), "kept");
        assert_eq!(buf.current(), "outer");
    }

    #[test]
    fn nested_frames_are_isolated() {
        let mut buf = OutputBuffer::new();
        buf.push();
        buf.append_safe(&Html::safe("a"));
        buf.push();
        buf.append_safe(&Html::safe("b"));
        let inner = buf.pop().unwrap();
        let outer = buf.pop().unwrap();
        assert_eq!(inner.as_str(), "b");
        assert_eq!(outer.as_str(), "a");
        assert_eq!(buf.depth(), 0);
    }

    #[test]
    fn take_root_empties_root() {
        let mut buf = OutputBuffer::new();
        buf.append_safe(&Html::safe("page"));
        assert_eq!(buf.take_root().as_str(), "page");
        assert_eq!(buf.current(), "");
    }
}
