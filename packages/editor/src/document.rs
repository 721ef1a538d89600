//! # Live Document
//!
//! The session-owned document plus derived views.
//!
//! ## Lifecycle
//!
//! ```text
//! Markdown → Document → (edit via dispatch) → Document → Markdown
//!                ↓
//!            LineIndex (lazy, rebuilt after every replacement)
//! ```

use once_cell::unsync::OnceCell;
use redline_document::{
    from_markdown, render_line_indexed, to_markdown, Document, LineFormat, LineIndex,
};

/// Versioned document with a lazily computed line index
#[derive(Debug, Default)]
pub struct LiveDocument {
    /// Increments on each replacement
    version: u64,
    document: Document,
    line_index: OnceCell<LineIndex>,
}

impl LiveDocument {
    pub fn new(document: Document) -> Self {
        Self {
            version: 0,
            document,
            line_index: OnceCell::new(),
        }
    }

    pub fn from_markdown(markdown: &str) -> Self {
        Self::new(from_markdown(markdown))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn markdown(&self) -> String {
        to_markdown(&self.document)
    }

    /// Line index of the current version, built on first use
    pub fn line_index(&self) -> &LineIndex {
        self.line_index.get_or_init(|| LineIndex::build(&self.document))
    }

    pub fn render(&self, format: LineFormat) -> String {
        render_line_indexed(&self.document, format)
    }

    /// Swap in a new document; returns the previous one
    pub fn replace(&mut self, document: Document) -> Document {
        self.version += 1;
        self.line_index = OnceCell::new();
        std::mem::replace(&mut self.document, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_bumps_version_and_index() {
        let mut live = LiveDocument::from_markdown("One");
        assert_eq!(live.version(), 0);
        assert_eq!(live.line_index().len(), 1);

        let previous = live.replace(from_markdown("One\n\n- a\n- b"));
        assert_eq!(previous, from_markdown("One"));
        assert_eq!(live.version(), 1);
        assert_eq!(live.line_index().len(), 3);
        assert_eq!(live.markdown(), "One\n\n- a\n- b");
    }
}
