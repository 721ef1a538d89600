pub mod ast;
pub mod error;
pub mod line_index;
pub mod parser;
pub mod render;
pub mod serializer;

#[cfg(test)]
mod tests_roundtrip;

pub use ast::{Block, BlockKind, Document, Inline, ListItem, Mark};
pub use error::{DocumentError, DocumentResult};
pub use line_index::{append_text, LineIndex, SlotRef, SlotView};
pub use parser::{from_markdown, Parser};
pub use render::{render_line_indexed, LineFormat};
pub use serializer::{to_markdown, Serializer};
