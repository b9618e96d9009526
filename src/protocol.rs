//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BankInfo, HistoryRecord, Position, Question, QuestionId, Session, SessionMode};
use crate::error::{EngineError, EngineResult};
use crate::scoring::QuestionStatus;

/// Session view without the internal maps or question order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub bank: String,
    pub created_at: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub current_index: Position,
    pub total: usize,
    pub terminated: bool,
    pub completed: bool,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id.clone(),
            bank: s.bank.clone(),
            created_at: s.created_at,
            start_time: s.start_time,
            current_index: s.current_index,
            total: s.total(),
            terminated: s.terminated,
            completed: s.completed,
        }
    }
}

/// Question as shown to the user: the answer key and explanation are withheld.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub question_no: Option<serde_json::Value>,
    pub question_field: Option<String>,
    pub question_text: String,
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_no: q.question_no.clone(),
            question_field: q.question_field.clone(),
            question_text: q.question_text.clone(),
            options: q.options.clone(),
        }
    }
}

/// Answers, flags and resolved notes keyed by position.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusBundle {
    pub answers: BTreeMap<Position, String>,
    pub flags: BTreeMap<Position, bool>,
    pub notes: BTreeMap<Position, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    pub session: SessionSummary,
    pub question: QuestionView,
    pub status: StatusBundle,
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct CreateSessionIn {
    pub bank: String,
    #[serde(default)]
    pub mode: SessionMode,
    #[serde(default)]
    pub review_source: Option<String>,
}

/// Position as sent by clients: a JSON number or a numeric string ("3").
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum IndexIn {
    Int(i64),
    Text(String),
}

impl IndexIn {
    pub fn position(&self) -> EngineResult<Position> {
        let parsed = match self {
            IndexIn::Int(n) => Position::try_from(*n).ok(),
            IndexIn::Text(s) => s.trim().parse::<Position>().ok(),
        };
        parsed.ok_or_else(|| {
            let raw = match self {
                IndexIn::Int(n) => n.to_string(),
                IndexIn::Text(s) => format!("{s:?}"),
            };
            EngineError::invalid(format!("Invalid question index: {raw}"))
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct NavigateIn {
    pub question_index: IndexIn,
}

/// Either an already-reduced `answer` key or the raw `option_text` the user clicked.
#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub question_index: IndexIn,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub option_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FlagIn {
    pub question_index: IndexIn,
    #[serde(default)]
    pub flagged: bool,
}

#[derive(Debug, Deserialize)]
pub struct NoteIn {
    pub question_index: IndexIn,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameIn {
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize)]
pub struct BanksOut {
    pub banks: Vec<BankInfo>,
}

#[derive(Serialize)]
pub struct SessionsOut {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Serialize)]
pub struct SessionOut {
    pub session: SessionSummary,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct NavigateOut {
    pub question: QuestionView,
    pub note: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AnswerOut {
    pub correct: bool,
    pub correct_answer: String,
}

#[derive(Serialize)]
pub struct FlagOut {
    pub flagged: bool,
}

#[derive(Serialize)]
pub struct NoteOut {
    pub note: String,
}

#[derive(Serialize)]
pub struct RecordOut {
    pub record: HistoryRecord,
}

#[derive(Serialize)]
pub struct TerminatedOut {
    pub terminated: bool,
}

#[derive(Serialize)]
pub struct DeletedOut {
    pub deleted: bool,
}

#[derive(Serialize)]
pub struct StatusOut {
    pub statuses: Vec<QuestionStatus>,
}

#[derive(Serialize)]
pub struct HistoryOut {
    pub history: Vec<HistoryRecord>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
