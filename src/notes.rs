//! Two-tier note resolution.
//!
//! A session keeps notes by position; every local note is mirrored into the
//! bank-level map keyed by question id, so a note written in one session
//! resurfaces in any later session that shows the same question.

use std::collections::BTreeMap;

use crate::domain::{NotesDoc, Position, QuestionId, Session};

/// Bank-level notes for one bank, if any were ever written.
pub fn bank_notes<'a>(notes: &'a NotesDoc, bank_id: &str) -> Option<&'a BTreeMap<QuestionId, String>> {
  notes.get(bank_id)
}

/// Session-local note, else bank-level note for the question at `position`, else empty.
pub fn resolve(session: &Session, bank: Option<&BTreeMap<QuestionId, String>>, position: Position) -> String {
  if let Some(local) = session.notes.get(&position).filter(|n| !n.is_empty()) {
    return local.clone();
  }
  session
    .question_at(position)
    .and_then(|qid| bank.and_then(|b| b.get(&qid)))
    .cloned()
    .unwrap_or_default()
}

/// Resolved note for every position that has one.
pub fn merged(session: &Session, bank: Option<&BTreeMap<QuestionId, String>>) -> BTreeMap<Position, String> {
  (0..session.total())
    .filter_map(|pos| {
      let note = resolve(session, bank, pos);
      (!note.is_empty()).then_some((pos, note))
    })
    .collect()
}

/// Write or clear a note in both tiers. Returns true when the note was stored.
pub fn apply(session: &mut Session, notes: &mut NotesDoc, position: Position, question_id: QuestionId, raw: &str) -> bool {
  let bank = notes.entry(session.bank.clone()).or_default();
  if raw.trim().is_empty() {
    session.notes.remove(&position);
    bank.remove(&question_id);
    false
  } else {
    session.notes.insert(position, raw.to_string());
    bank.insert(question_id, raw.to_string());
    true
  }
}
