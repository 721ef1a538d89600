use crate::ast::BlockKind;
use thiserror::Error;

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Line {line} is out of range (document has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },

    #[error("Line {line} is a {kind} and has no editable text")]
    NotTextual { line: usize, kind: BlockKind },
}

impl DocumentError {
    pub fn line_out_of_range(line: usize, len: usize) -> Self {
        Self::LineOutOfRange { line, len }
    }

    pub fn not_textual(line: usize, kind: BlockKind) -> Self {
        Self::NotTextual { line, kind }
    }
}
