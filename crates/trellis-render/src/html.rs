//! HTML-safe strings.
//!
//! Everything a component produces is an [`Html`] value: a string that is
//! already safe to embed in a document. Untrusted text becomes `Html` only
//! through [`Html::escape`], which delegates to the template engine's escaper
//! so that template output and programmatic output escape identically.
//!
//! ```rust
//! use trellis_render::Html;
//!
//! let safe = Html::escape("<b>bold");
//! assert_eq!(safe.as_str(), "&lt;b&gt;bold");
//!
//! let trusted = Html::safe("<b>bold</b>");
//! assert_eq!(trusted.as_str(), "<b>bold</b>");
//! ```

use std::fmt;

use minijinja::HtmlEscape;
use serde::{Deserialize, Serialize};

/// A string that is safe to emit into HTML without further escaping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Html(String);

impl Html {
    /// Wraps a string that the caller vouches for.
    pub fn safe(s: impl Into<String>) -> Self {
        Html(s.into())
    }

    /// Escapes `s` and wraps the result.
    pub fn escape(s: &str) -> Self {
        Html(HtmlEscape(s).to_string())
    }

    pub fn empty() -> Self {
        Html(String::new())
    }

    /// True when the string is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Appends another safe fragment.
    pub fn push(&mut self, other: &Html) {
        self.0.push_str(&other.0);
    }

    /// Joins fragments with a separator. The separator is escaped.
    pub fn join<'a>(parts: impl IntoIterator<Item = &'a Html>, separator: &str) -> Html {
        let separator = Html::escape(separator);
        let mut out = String::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push_str(separator.as_str());
            }
            out.push_str(part.as_str());
        }
        Html(out)
    }
}

impl fmt::Display for Html {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Html> for String {
    fn from(html: Html) -> Self {
        html.0
    }
}

/// Conversion into [`Html`], escaping anything that is not already safe.
pub trait ToHtml {
    fn to_html(&self) -> Html;
}

impl ToHtml for Html {
    fn to_html(&self) -> Html {
        self.clone()
    }
}

impl ToHtml for str {
    fn to_html(&self) -> Html {
        Html::escape(self)
    }
}

impl ToHtml for String {
    fn to_html(&self) -> Html {
        Html::escape(self)
    }
}

impl<T: ToHtml + ?Sized> ToHtml for &T {
    fn to_html(&self) -> Html {
        (**self).to_html()
    }
}

/// A fragment whose safety is decided by the producer.
///
/// Used where the caller may hand over either trusted markup or plain text,
/// such as output preambles and postambles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Markup {
    Safe(Html),
    Unsafe(String),
}

impl Markup {
    /// Resolves the fragment into safe HTML.
    ///
    /// Returns the HTML plus whether escaping changed the input.
    pub fn into_html(self) -> (Html, bool) {
        match self {
            Markup::Safe(html) => (html, false),
            Markup::Unsafe(text) => {
                let escaped = Html::escape(&text);
                let changed = escaped.as_str() != text;
                (escaped, changed)
            }
        }
    }
}

impl From<Html> for Markup {
    fn from(html: Html) -> Self {
        Markup::Safe(html)
    }
}

impl From<&str> for Markup {
    fn from(text: &str) -> Self {
        Markup::Unsafe(text.to_string())
    }
}

impl From<String> for Markup {
    fn from(text: String) -> Self {
        Markup::Unsafe(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_replaces_markup_characters() {
        let html = Html::escape("<a href=\"x\">&</a>");
        assert!(!html.as_str().contains('<'));
        assert!(html.as_str().contains("&amp;"));
        assert!(html.as_str().contains("&quot;"));
    }

    #[test]
    fn safe_keeps_input() {
        assert_eq!(Html::safe("<p>").as_str(), "<p>");
    }

    #[test]
    fn blank_detection() {
        assert!(Html::empty().is_blank());
        assert!(Html::safe("  \n\t").is_blank());
        assert!(!Html::safe(" x ").is_blank());
    }

    #[test]
    fn join_escapes_separator_only() {
        let parts = vec![Html::safe("<i>A</i>"), Html::safe("B")];
        assert_eq!(Html::join(&parts, " & ").as_str(), "<i>A</i> &amp; B");
    }

    #[test]
    fn to_html_escapes_strings() {
        assert_eq!("<".to_html().as_str(), "&lt;");
        assert_eq!(Html::safe("<").to_html().as_str(), "<");
    }

    // ============================================================================
    // Markup
    // ============================================================================

    #[test]
    fn unsafe_markup_reports_change() {
        let (html, changed) = Markup::from("<script>").into_html();
        assert!(changed);
        assert_eq!(html.as_str(), "&lt;script&gt;");
    }

    #[test]
    fn plain_unsafe_markup_is_unchanged() {
        let (html, changed) = Markup::from("plain text").into_html();
        assert!(!changed);
        assert_eq!(html.as_str(), "plain text");
    }

    #[test]
    fn safe_markup_passes_through() {
        let (html, changed) = Markup::from(Html::safe("<hr>")).into_html();
        assert!(!changed);
        assert_eq!(html.as_str(), "<hr>");
    }
}
