//! # Stream Activity
//!
//! One explicit state machine per assistant action class replaces
//! begin/end counters: a class is either idle or active for exactly one
//! turn, so mismatched begin/end signals cannot drift.
//!
//! ```text
//! Idle ──start/processing/streaming──► Active { turn, status }
//!  ▲                                        │
//!  └────────── complete / stale turn ───────┘
//! ```

use crate::status::StreamStatus;
use crate::transaction::TurnId;
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionClass {
    Editor,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StreamActivity {
    #[default]
    Idle,
    Active { turn: TurnId, status: StreamStatus },
}

impl StreamActivity {
    pub fn is_active(&self) -> bool {
        matches!(self, StreamActivity::Active { .. })
    }

    /// Move to the state implied by a status signal. A signal for a turn
    /// other than `current` only clears activity left over from a stale
    /// turn; it never touches the current turn's state.
    pub fn transition(&mut self, turn: TurnId, status: StreamStatus, current: TurnId) {
        let next = if turn != current {
            match *self {
                StreamActivity::Active { turn: active, .. } if active == current => *self,
                _ => StreamActivity::Idle,
            }
        } else if status == StreamStatus::Complete {
            StreamActivity::Idle
        } else {
            StreamActivity::Active { turn, status }
        };
        trace!(?turn, %status, from = ?self, to = ?next, "Stream activity transition");
        *self = next;
    }

    pub fn reset(&mut self) {
        *self = StreamActivity::Idle;
    }
}

/// Activity of every action class in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Activities {
    pub editor: StreamActivity,
    pub title: StreamActivity,
}

impl Activities {
    pub fn get(&self, class: ActionClass) -> StreamActivity {
        match class {
            ActionClass::Editor => self.editor,
            ActionClass::Title => self.title,
        }
    }

    pub fn transition(&mut self, class: ActionClass, turn: TurnId, status: StreamStatus, current: TurnId) {
        match class {
            ActionClass::Editor => self.editor.transition(turn, status, current),
            ActionClass::Title => self.title.transition(turn, status, current),
        }
    }

    /// True while any class is active; hosts lock input on this
    pub fn is_busy(&self) -> bool {
        self.editor.is_active() || self.title.is_active()
    }

    pub fn reset(&mut self) {
        self.editor.reset();
        self.title.reset();
    }
}
