//! Domain models used by the backend: questions, sessions, history records and notes.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bank-local question id (0-based index into the bank).
pub type QuestionId = usize;

/// Position inside a session's `questions` order.
pub type Position = usize;

/// All sessions, keyed by session id.
pub type SessionMap = BTreeMap<String, Session>;

/// Bank id -> (question id -> note).
pub type NotesDoc = HashMap<String, BTreeMap<QuestionId, String>>;

/// One multiple-choice question as served by a bank.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
  pub id: QuestionId,
  #[serde(default)] pub question_no: Option<serde_json::Value>,
  #[serde(default)] pub question_field: Option<String>,
  #[serde(default)] pub question_type: Option<String>,
  pub question_text: String,
  #[serde(default)] pub options: Vec<String>,
  /// Correct answer key, e.g. "B".
  pub answer: String,
  #[serde(default)] pub explanation: Option<String>,
}

/// How a session picks its questions.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
  /// Every question of the bank.
  #[default]
  Full,
  /// Only the incorrect ids of an earlier history record.
  Review,
}

/// Mutable state of one attempt at a bank.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
  pub id: String,
  pub bank: String,
  pub created_at: DateTime<Utc>,
  pub start_time: DateTime<Utc>,
  pub last_active: DateTime<Utc>,
  pub current_index: Position,
  /// Fixed at creation, never reshuffled.
  pub questions: Vec<QuestionId>,
  #[serde(default)] pub answers: BTreeMap<Position, String>,
  #[serde(default)] pub flags: BTreeMap<Position, bool>,
  #[serde(default)] pub notes: BTreeMap<Position, String>,
  #[serde(default)] pub terminated: bool,
  #[serde(default)] pub completed: bool,
}

impl Session {
  pub fn total(&self) -> usize { self.questions.len() }

  /// Question id at `position`, if the position is inside the order.
  pub fn question_at(&self, position: Position) -> Option<QuestionId> {
    self.questions.get(position).copied()
  }
}

/// Result of a finished session. Only `name` changes after creation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
  pub id: String,
  pub name: String,
  pub created_at: DateTime<Utc>,
  pub bank: String,
  pub total: usize,
  pub correct: usize,
  /// Answered-and-wrong question ids; unanswered ones are left out.
  pub incorrect_ids: Vec<QuestionId>,
  #[serde(default)] pub answers: BTreeMap<Position, String>,
  #[serde(default)] pub notes: BTreeMap<Position, String>,
}

/// Bank entry shown on the home screen.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct BankInfo {
  pub id: String,
  pub label: String,
  pub count: usize,
}
