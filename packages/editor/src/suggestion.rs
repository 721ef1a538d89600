use serde::Serialize;

/// Inline completion offered at the end of one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub line: usize,
    pub text: String,
    /// Document version the suggestion was computed against
    pub version: u64,
}

/// Per-session suggestion slot. Only mutated through dispatched
/// transactions; any document replacement clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    current: Option<Suggestion>,
}

impl SuggestionState {
    pub fn current(&self) -> Option<&Suggestion> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn set(&mut self, suggestion: Suggestion) {
        self.current = Some(suggestion);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn take(&mut self) -> Option<Suggestion> {
        self.current.take()
    }
}
