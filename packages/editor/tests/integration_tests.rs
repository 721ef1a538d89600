//! Integration tests for editor crate

use anyhow::Result;
use redline_editor::{
    ActionClass, CommitOutcome, EditSession, EditorError, LineFormat, MessagePart, StreamActivity,
    StreamStatus, Transaction, TurnId,
};
use serde_json::json;

const NOTES: &str = "# Notes\n\nFirst draft.\n\n- one\n- two";

fn part(value: serde_json::Value) -> MessagePart {
    MessagePart::from_value(value).expect("valid part")
}

#[test]
fn test_streamed_turn_is_one_undo_step() -> Result<()> {
    let mut session = EditSession::from_markdown("doc", NOTES);
    let turn = session.begin_turn();

    let stream = r#"[{"line":2,"type":"replace","content":"Second draft."},{"line":4,"type":"insert","content":"- three"}]"#;
    for chunk in stream.as_bytes().chunks(16) {
        session.push_chunk(turn, std::str::from_utf8(chunk)?)?;
    }
    session.finish_turn(turn);

    assert_eq!(session.markdown(), "# Notes\n\nSecond draft.\n\n- one\n- two\n- three");
    assert!(!session.is_busy());

    session.undo()?;
    assert_eq!(session.markdown(), NOTES);
    assert!(!session.can_undo());

    session.redo()?;
    assert_eq!(session.markdown(), "# Notes\n\nSecond draft.\n\n- one\n- two\n- three");
    Ok(())
}

#[test]
fn test_undo_with_empty_history() {
    let mut session = EditSession::from_markdown("doc", NOTES);
    assert_eq!(session.undo(), Err(EditorError::NothingToUndo));
    assert_eq!(session.redo(), Err(EditorError::NothingToRedo));
}

#[test]
fn test_new_chat_makes_turn_stale() -> Result<()> {
    let mut session = EditSession::from_markdown("doc", NOTES);
    let turn = session.begin_turn();
    session.new_chat();

    let outcome = session.push_chunk(turn, r#"[{"line":1,"type":"delete"}]"#)?;
    assert_eq!(outcome, CommitOutcome::Stale);
    assert_eq!(session.markdown(), NOTES);
    assert!(!session.is_busy());
    Ok(())
}

#[test]
fn test_handle_parts_routes_each_kind() -> Result<()> {
    let mut session = EditSession::from_markdown("doc", NOTES);
    let turn = session.begin_turn();

    let ignored = session.handle_part(turn, part(json!({"type": "text", "text": "Sure!"})))?;
    assert_eq!(ignored, CommitOutcome::Unchanged);

    session.handle_part(
        turn,
        part(json!({"type": "title-status", "status": "streaming", "title": "Meeting"})),
    )?;
    assert!(session.activity(ActionClass::Title).is_active());

    let outcome = session.handle_part(
        turn,
        part(json!({"type": "document-edit", "text": "[{\"line\":3,\"type\":\"delete\"}]"})),
    )?;
    assert!(outcome.is_applied());
    assert_eq!(session.markdown(), "# Notes\n\nFirst draft.\n\n- two");
    assert_eq!(
        session.activity(ActionClass::Editor),
        StreamActivity::Active {
            turn,
            status: StreamStatus::Streaming
        }
    );

    session.handle_part(
        turn,
        part(json!({"type": "title-status", "status": "complete", "title": "Meeting notes"})),
    )?;
    assert_eq!(session.title(), Some("Meeting notes"));

    session.handle_part(turn, part(json!({"type": "error", "message": "rate limited"})))?;
    assert!(!session.is_busy());
    Ok(())
}

#[test]
fn test_editor_status_replaces_document() -> Result<()> {
    let mut session = EditSession::from_markdown("doc", NOTES);
    let turn = session.begin_turn();

    let outcome = session.handle_part(
        turn,
        part(json!({"type": "editor-status", "status": "streaming", "markdown": "# Rewritten"})),
    )?;
    assert!(outcome.is_applied());
    assert!(session.is_busy());

    session.handle_part(
        turn,
        part(json!({"type": "editor-status", "status": "complete", "markdown": "# Rewritten\n\nDone."})),
    )?;
    assert_eq!(session.markdown(), "# Rewritten\n\nDone.");
    assert!(!session.is_busy());

    // Both commits of the turn undo together.
    session.undo()?;
    assert_eq!(session.markdown(), NOTES);
    Ok(())
}

#[test]
fn test_late_status_from_old_turn_is_ignored() -> Result<()> {
    let mut session = EditSession::from_markdown("doc", NOTES);
    let old = session.begin_turn();
    let current = session.begin_turn();

    let outcome = session.handle_part(
        old,
        part(json!({"type": "editor-status", "status": "complete", "markdown": "stale"})),
    )?;
    assert_eq!(outcome, CommitOutcome::Stale);
    assert_eq!(session.markdown(), NOTES);
    assert!(session.activity(ActionClass::Editor).is_active());
    assert_eq!(session.turn(), current);
    Ok(())
}

#[test]
fn test_line_indexed_context_tracks_edits() -> Result<()> {
    let mut session = EditSession::from_markdown("doc", NOTES);
    assert_eq!(
        session.line_indexed(LineFormat::Markdown),
        "1: # Notes\n2: First draft.\n3: - one\n4: - two"
    );

    session.user_edit("# Notes\n\n- one")?;
    assert_eq!(
        session.line_indexed(LineFormat::Markdown),
        "1: # Notes\n2: - one"
    );
    assert_eq!(session.turn(), TurnId(1));
    Ok(())
}

#[test]
fn test_dispatch_clear_suggestion() -> Result<()> {
    let mut session = EditSession::from_markdown("doc", NOTES);
    session.dispatch(Transaction::SetSuggestion {
        line: 2,
        text: " Revised.".to_string(),
    })?;
    assert!(session.suggestion().is_some());

    session.dispatch(Transaction::ClearSuggestion)?;
    assert!(session.suggestion().is_none());
    assert_eq!(session.version(), 0);
    Ok(())
}
