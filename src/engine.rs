//! Quiz session engine: creates sessions from a bank, moves the user through
//! the fixed question order, records answers/flags/notes, and turns finished
//! sessions into history records that later feed review mode.
//!
//! Every public operation is one read-modify-write over whole documents. All
//! operations run behind a single async mutex, so two requests can never
//! interleave their reads and writes.

use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::banks::{Bank, QuestionBankStore};
use crate::domain::{
  BankInfo, HistoryRecord, Position, Question, QuestionId, Session, SessionMap, SessionMode,
};
use crate::error::{EngineError, EngineResult};
use crate::notes;
use crate::protocol::{AnswerOut, NavigateOut, QuestionView, SessionDetail, SessionSummary, StatusBundle};
use crate::scoring::{self, QuestionStatus};
use crate::store::DocumentStore;
use crate::util::{now_utc, trunc_for_log, unique_id};

pub struct QuizEngine {
  banks: Arc<dyn QuestionBankStore>,
  store: Arc<dyn DocumentStore>,
  gate: Mutex<()>,
}

fn session_mut<'a>(sessions: &'a mut SessionMap, id: &str) -> EngineResult<&'a mut Session> {
  sessions
    .get_mut(id)
    .ok_or_else(|| EngineError::not_found(format!("Session not found: {id}")))
}

fn question_id_at(session: &Session, position: Position) -> EngineResult<QuestionId> {
  session
    .question_at(position)
    .ok_or_else(|| EngineError::invalid(format!("Invalid question index: {position}")))
}

fn question(bank: &[Question], id: QuestionId) -> EngineResult<&Question> {
  bank
    .get(id)
    .ok_or_else(|| EngineError::not_found(format!("Question {id} not found in bank")))
}

impl QuizEngine {
  pub fn new(banks: Arc<dyn QuestionBankStore>, store: Arc<dyn DocumentStore>) -> Self {
    Self { banks, store, gate: Mutex::new(()) }
  }

  async fn bank(&self, bank_id: &str) -> EngineResult<Bank> {
    self
      .banks
      .load(bank_id)
      .await?
      .ok_or_else(|| EngineError::not_found(format!("Question bank not found: {bank_id}")))
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn list_banks(&self) -> EngineResult<Vec<BankInfo>> {
    Ok(self.banks.list().await?)
  }

  /// New session over the whole bank, or over the incorrect ids of a history record.
  #[instrument(level = "info", skip(self))]
  pub async fn create_session(
    &self,
    bank_id: &str,
    mode: SessionMode,
    review_source: Option<&str>,
  ) -> EngineResult<SessionSummary> {
    let _guard = self.gate.lock().await;
    let bank = self.bank(bank_id).await?;

    let mut order: Vec<QuestionId> = match mode {
      SessionMode::Full => (0..bank.len()).collect(),
      SessionMode::Review => {
        let source = review_source
          .filter(|s| !s.trim().is_empty())
          .ok_or_else(|| EngineError::not_found("Review source not found: none given"))?;
        let history = self.store.load_history().await?;
        let record = history
          .iter()
          .find(|r| r.id == source)
          .ok_or_else(|| EngineError::not_found(format!("Review source not found: {source}")))?;
        if record.bank != bank_id {
          return Err(EngineError::invalid(format!(
            "Review source {source} belongs to bank {}",
            record.bank
          )));
        }
        if record.incorrect_ids.is_empty() {
          return Err(EngineError::invalid("No incorrect questions to review"));
        }
        if let Some(bad) = record.incorrect_ids.iter().find(|&&id| id >= bank.len()) {
          return Err(EngineError::invalid(format!("Review question {bad} is no longer in the bank")));
        }
        record.incorrect_ids.clone()
      }
    };
    if order.is_empty() {
      return Err(EngineError::invalid(format!("Question bank {bank_id} is empty")));
    }
    order.shuffle(&mut rand::thread_rng());

    let mut sessions = self.store.load_sessions().await?;
    let id = unique_id(bank_id, |candidate| sessions.contains_key(candidate));
    let now = now_utc();
    let session = Session {
      id: id.clone(),
      bank: bank_id.to_string(),
      created_at: now,
      start_time: now,
      last_active: now,
      current_index: 0,
      questions: order,
      answers: Default::default(),
      flags: Default::default(),
      notes: Default::default(),
      terminated: false,
      completed: false,
    };
    let summary = SessionSummary::from(&session);
    sessions.insert(id.clone(), session);
    self.store.save_sessions(&sessions).await?;

    info!(target: "session", %id, bank = %bank_id, ?mode, total = summary.total, "Session created");
    Ok(summary)
  }

  /// Current question plus answers, flags and resolved notes.
  #[instrument(level = "info", skip(self))]
  pub async fn get_session(&self, session_id: &str) -> EngineResult<SessionDetail> {
    let _guard = self.gate.lock().await;
    let mut sessions = self.store.load_sessions().await?;
    let session = session_mut(&mut sessions, session_id)?;

    let index = if session.current_index < session.total() {
      session.current_index
    } else {
      warn!(target: "session", id = %session_id, index = session.current_index, "Current index out of range; reset to 0");
      0
    };
    let bank = self.bank(&session.bank).await?;
    let qid = question_id_at(session, index)?;
    let view = QuestionView::from(question(&bank, qid)?);

    session.current_index = index;
    session.last_active = now_utc();
    let session = session.clone();
    self.store.save_sessions(&sessions).await?;
    let notes_doc = self.store.load_notes().await?;

    Ok(SessionDetail {
      session: SessionSummary::from(&session),
      question: view,
      status: StatusBundle {
        answers: session.answers.clone(),
        flags: session.flags.clone(),
        notes: notes::merged(&session, notes::bank_notes(&notes_doc, &session.bank)),
      },
    })
  }

  #[instrument(level = "info", skip(self))]
  pub async fn navigate(&self, session_id: &str, target: Position) -> EngineResult<NavigateOut> {
    let _guard = self.gate.lock().await;
    let mut sessions = self.store.load_sessions().await?;
    let session = session_mut(&mut sessions, session_id)?;
    let qid = question_id_at(session, target)?;
    let bank = self.bank(&session.bank).await?;
    let view = QuestionView::from(question(&bank, qid)?);

    session.current_index = target;
    session.last_active = now_utc();
    let session = session.clone();
    self.store.save_sessions(&sessions).await?;

    let notes_doc = self.store.load_notes().await?;
    let note = notes::resolve(&session, notes::bank_notes(&notes_doc, &session.bank), target);
    Ok(NavigateOut { question: view, note })
  }

  /// Store the trimmed answer at `position`, overwriting any earlier answer.
  #[instrument(level = "info", skip(self, answer), fields(answer_len = answer.len()))]
  pub async fn record_answer(&self, session_id: &str, position: Position, answer: &str) -> EngineResult<AnswerOut> {
    let _guard = self.gate.lock().await;
    let mut sessions = self.store.load_sessions().await?;
    let session = session_mut(&mut sessions, session_id)?;
    let qid = question_id_at(session, position)?;
    if session.completed {
      return Err(EngineError::invalid("Session already finished"));
    }
    let bank = self.bank(&session.bank).await?;
    let q = question(&bank, qid)?;

    let answer = answer.trim();
    let correct = scoring::is_correct(q, answer);
    session.answers.insert(position, answer.to_string());
    session.last_active = now_utc();
    self.store.save_sessions(&sessions).await?;

    debug!(target: "session", id = %session_id, position, question = qid, correct, "Answer recorded");
    Ok(AnswerOut { correct, correct_answer: q.answer.clone() })
  }

  #[instrument(level = "info", skip(self))]
  pub async fn set_flag(&self, session_id: &str, position: Position, flagged: bool) -> EngineResult<bool> {
    let _guard = self.gate.lock().await;
    let mut sessions = self.store.load_sessions().await?;
    let session = session_mut(&mut sessions, session_id)?;
    question_id_at(session, position)?;

    session.flags.insert(position, flagged);
    session.last_active = now_utc();
    self.store.save_sessions(&sessions).await?;
    Ok(flagged)
  }

  /// Write (or clear, when blank) the note at an answered position, mirrored to the bank level.
  #[instrument(level = "info", skip(self, note), fields(note_len = note.len()))]
  pub async fn set_note(&self, session_id: &str, position: Position, note: &str) -> EngineResult<String> {
    let _guard = self.gate.lock().await;
    let mut sessions = self.store.load_sessions().await?;
    let session = session_mut(&mut sessions, session_id)?;
    if !session.answers.contains_key(&position) {
      return Err(EngineError::invalid("Answer required before note"));
    }
    let qid = question_id_at(session, position)?;

    let mut notes_doc = self.store.load_notes().await?;
    let stored = notes::apply(session, &mut notes_doc, position, qid, note);
    session.last_active = now_utc();
    self.store.save_notes(&notes_doc).await?;
    self.store.save_sessions(&sessions).await?;

    debug!(target: "notes", id = %session_id, position, question = qid, stored, note = %trunc_for_log(note, 40), "Note updated");
    Ok(note.to_string())
  }

  /// Score the session, prepend a history record, and mark the session completed.
  #[instrument(level = "info", skip(self))]
  pub async fn finish(&self, session_id: &str) -> EngineResult<HistoryRecord> {
    let _guard = self.gate.lock().await;
    let mut sessions = self.store.load_sessions().await?;
    let session = session_mut(&mut sessions, session_id)?;
    if session.completed {
      return Err(EngineError::invalid("Session already finished"));
    }
    let bank = self.bank(&session.bank).await?;
    let score = scoring::score(session, &bank);

    let mut history = self.store.load_history().await?;
    let record_id = unique_id(&session.bank, |candidate| history.iter().any(|r| r.id == candidate));
    let record = HistoryRecord {
      id: record_id.clone(),
      name: record_id,
      created_at: now_utc(),
      bank: session.bank.clone(),
      total: score.total,
      correct: score.correct,
      incorrect_ids: score.incorrect_ids,
      answers: session.answers.clone(),
      notes: session.notes.clone(),
    };
    history.insert(0, record.clone());
    self.store.save_history(&history).await?;

    session.terminated = true;
    session.completed = true;
    session.last_active = now_utc();
    self.store.save_sessions(&sessions).await?;

    info!(target: "history", session = %session_id, record = %record.id, correct = record.correct, total = record.total, incorrect = record.incorrect_ids.len(), "Session finished");
    Ok(record)
  }

  /// Stop a session without scoring. Calling it again is a no-op.
  #[instrument(level = "info", skip(self))]
  pub async fn terminate(&self, session_id: &str) -> EngineResult<()> {
    let _guard = self.gate.lock().await;
    let mut sessions = self.store.load_sessions().await?;
    let session = session_mut(&mut sessions, session_id)?;
    session.terminated = true;
    session.last_active = now_utc();
    self.store.save_sessions(&sessions).await?;
    info!(target: "session", id = %session_id, "Session terminated");
    Ok(())
  }

  #[instrument(level = "info", skip(self))]
  pub async fn delete_session(&self, session_id: &str) -> EngineResult<()> {
    let _guard = self.gate.lock().await;
    let mut sessions = self.store.load_sessions().await?;
    if sessions.remove(session_id).is_none() {
      return Err(EngineError::not_found(format!("Session not found: {session_id}")));
    }
    self.store.save_sessions(&sessions).await?;
    info!(target: "session", id = %session_id, "Session deleted");
    Ok(())
  }

  /// Per-position progress, independent of the current index.
  #[instrument(level = "debug", skip(self))]
  pub async fn status(&self, session_id: &str) -> EngineResult<Vec<QuestionStatus>> {
    let _guard = self.gate.lock().await;
    let sessions = self.store.load_sessions().await?;
    let session = sessions
      .get(session_id)
      .ok_or_else(|| EngineError::not_found(format!("Session not found: {session_id}")))?;
    let bank = self.bank(&session.bank).await?;
    Ok(scoring::statuses(session, &bank))
  }

  /// Sessions not yet terminated, newest first.
  #[instrument(level = "debug", skip(self))]
  pub async fn list_active(&self) -> EngineResult<Vec<SessionSummary>> {
    let _guard = self.gate.lock().await;
    let sessions = self.store.load_sessions().await?;
    let mut out: Vec<SessionSummary> = sessions
      .values()
      .filter(|s| !s.terminated)
      .map(SessionSummary::from)
      .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(out)
  }

  /// History as stored (most recent first).
  #[instrument(level = "debug", skip(self))]
  pub async fn list_history(&self) -> EngineResult<Vec<HistoryRecord>> {
    let _guard = self.gate.lock().await;
    Ok(self.store.load_history().await?)
  }

  #[instrument(level = "info", skip(self))]
  pub async fn rename_history(&self, record_id: &str, name: &str) -> EngineResult<HistoryRecord> {
    let name = name.trim();
    if name.is_empty() {
      return Err(EngineError::invalid("Name must not be empty"));
    }
    let _guard = self.gate.lock().await;
    let mut history = self.store.load_history().await?;
    let record = history
      .iter_mut()
      .find(|r| r.id == record_id)
      .ok_or_else(|| EngineError::not_found(format!("History record not found: {record_id}")))?;
    record.name = name.to_string();
    let renamed = record.clone();
    self.store.save_history(&history).await?;
    info!(target: "history", id = %record_id, %name, "History record renamed");
    Ok(renamed)
  }

  /// Remove a history record; unknown ids are not an error.
  #[instrument(level = "info", skip(self))]
  pub async fn delete_history(&self, record_id: &str) -> EngineResult<()> {
    let _guard = self.gate.lock().await;
    let mut history = self.store.load_history().await?;
    let before = history.len();
    history.retain(|r| r.id != record_id);
    if history.len() != before {
      self.store.save_history(&history).await?;
      info!(target: "history", id = %record_id, "History record deleted");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::banks::StaticBankStore;
  use crate::store::MemoryStore;
  use std::collections::BTreeMap;

  const KEYS: [&str; 4] = ["A", "B", "C", "D"];

  fn questions(n: usize) -> Vec<Question> {
    (0..n)
      .map(|i| Question {
        id: i,
        question_no: Some(serde_json::json!(i + 1)),
        question_field: Some("General".into()),
        question_type: None,
        question_text: format!("Question {i}"),
        options: KEYS.iter().map(|k| format!("{k}. option {k}")).collect(),
        answer: KEYS[i % 4].into(),
        explanation: None,
      })
      .collect()
  }

  fn key_for(qid: QuestionId) -> &'static str {
    KEYS[qid % 4]
  }

  fn wrong_for(qid: QuestionId) -> &'static str {
    KEYS[(qid + 1) % 4]
  }

  fn setup() -> (QuizEngine, Arc<MemoryStore>) {
    let banks = StaticBankStore::new()
      .with_bank("quiz", "Quiz", questions(5))
      .with_bank("big", "Big", questions(10));
    let store = Arc::new(MemoryStore::new());
    (QuizEngine::new(Arc::new(banks), store.clone()), store)
  }

  async fn order(store: &MemoryStore, id: &str) -> Vec<QuestionId> {
    store.load_sessions().await.unwrap()[id].questions.clone()
  }

  fn record(id: &str, bank: &str, incorrect: Vec<QuestionId>) -> HistoryRecord {
    HistoryRecord {
      id: id.into(),
      name: id.into(),
      created_at: now_utc(),
      bank: bank.into(),
      total: 10,
      correct: 10 - incorrect.len(),
      incorrect_ids: incorrect,
      answers: BTreeMap::new(),
      notes: BTreeMap::new(),
    }
  }

  fn sorted(mut v: Vec<QuestionId>) -> Vec<QuestionId> {
    v.sort_unstable();
    v
  }

  #[tokio::test]
  async fn full_session_is_a_permutation_of_the_bank() {
    let (engine, store) = setup();
    let summary = engine.create_session("big", SessionMode::Full, None).await.unwrap();

    assert_eq!(summary.total, 10);
    assert_eq!(summary.current_index, 0);
    assert!(!summary.terminated && !summary.completed);
    assert_eq!(sorted(order(&store, &summary.id).await), (0..10).collect::<Vec<_>>());
  }

  #[tokio::test]
  async fn unknown_bank_is_not_found() {
    let (engine, _) = setup();
    let err = engine.create_session("nope", SessionMode::Full, None).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
  }

  #[tokio::test]
  async fn review_session_uses_only_incorrect_ids() {
    let (engine, store) = setup();
    store
      .save_history(&[record("r1", "big", vec![3, 7]), record("r0", "big", vec![])])
      .await
      .unwrap();

    let summary = engine.create_session("big", SessionMode::Review, Some("r1")).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(sorted(order(&store, &summary.id).await), vec![3, 7]);

    let empty = engine.create_session("big", SessionMode::Review, Some("r0")).await.unwrap_err();
    assert!(matches!(empty, EngineError::InvalidRequest(_)));

    let missing = engine.create_session("big", SessionMode::Review, Some("zzz")).await.unwrap_err();
    assert!(matches!(missing, EngineError::NotFound(_)));

    let other_bank = engine.create_session("quiz", SessionMode::Review, Some("r1")).await.unwrap_err();
    assert!(matches!(other_bank, EngineError::InvalidRequest(_)));

    for source in [None, Some(""), Some("  ")] {
      let err = engine.create_session("big", SessionMode::Review, source).await.unwrap_err();
      assert!(matches!(err, EngineError::NotFound(_)), "{source:?}");
    }
    assert!(engine.list_active().await.unwrap().iter().all(|s| s.total == 2));
  }

  #[tokio::test]
  async fn question_order_is_fixed_across_reads() {
    let (engine, store) = setup();
    let id = engine.create_session("big", SessionMode::Full, None).await.unwrap().id;
    let before = order(&store, &id).await;
    engine.get_session(&id).await.unwrap();
    engine.navigate(&id, 4).await.unwrap();
    engine.get_session(&id).await.unwrap();
    assert_eq!(order(&store, &id).await, before);
  }

  #[tokio::test]
  async fn get_session_withholds_answer_and_clamps_index() {
    let (engine, store) = setup();
    let id = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;

    let mut sessions = store.load_sessions().await.unwrap();
    sessions.get_mut(&id).unwrap().current_index = 99;
    store.save_sessions(&sessions).await.unwrap();

    let detail = engine.get_session(&id).await.unwrap();
    assert_eq!(detail.session.current_index, 0);
    assert_eq!(detail.question.id, order(&store, &id).await[0]);
    assert_eq!(store.load_sessions().await.unwrap()[&id].current_index, 0);

    let json = serde_json::to_value(&detail.question).unwrap();
    assert!(json.get("answer").is_none());
    assert!(json.get("explanation").is_none());
  }

  #[tokio::test]
  async fn get_session_with_missing_bank_leaves_session_untouched() {
    let (engine, store) = setup();
    let id = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    let mut sessions = store.load_sessions().await.unwrap();
    sessions.get_mut(&id).unwrap().current_index = 99;
    store.save_sessions(&sessions).await.unwrap();
    let before = store.load_sessions().await.unwrap()[&id].last_active;

    let without_quiz = StaticBankStore::new().with_bank("big", "Big", questions(10));
    let engine = QuizEngine::new(Arc::new(without_quiz), store.clone());
    assert!(matches!(engine.get_session(&id).await, Err(EngineError::NotFound(_))));

    let stored = &store.load_sessions().await.unwrap()[&id];
    assert_eq!(stored.current_index, 99);
    assert_eq!(stored.last_active, before);
  }

  #[tokio::test]
  async fn navigate_is_idempotent_and_bounds_checked() {
    let (engine, store) = setup();
    let id = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;

    let first = engine.navigate(&id, 3).await.unwrap();
    let second = engine.navigate(&id, 3).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.question.id, order(&store, &id).await[3]);
    assert_eq!(engine.get_session(&id).await.unwrap().session.current_index, 3);

    let err = engine.navigate(&id, 5).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest(_)));
    assert_eq!(store.load_sessions().await.unwrap()[&id].current_index, 3);
    let err = engine.navigate("missing", 0).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
  }

  #[tokio::test]
  async fn answers_are_case_sensitive_and_overwritable() {
    let (engine, store) = setup();
    let id = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    let qid = order(&store, &id).await[0];
    let key = key_for(qid);

    let out = engine.record_answer(&id, 0, &format!("  {key} ")).await.unwrap();
    assert_eq!(out, AnswerOut { correct: true, correct_answer: key.into() });

    let lower = engine.record_answer(&id, 0, &key.to_lowercase()).await.unwrap();
    assert!(!lower.correct);

    let status = engine.status(&id).await.unwrap();
    assert!(status[0].answered);
    assert_eq!(status[0].correct, Some(false));
    assert_eq!(status[1].correct, None);
    assert_eq!(store.load_sessions().await.unwrap()[&id].answers[&0], key.to_lowercase());

    let err = engine.record_answer(&id, 9, "A").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest(_)));
    assert_eq!(store.load_sessions().await.unwrap()[&id].answers.len(), 1);
  }

  #[tokio::test]
  async fn flags_show_up_in_status() {
    let (engine, store) = setup();
    let id = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;

    assert!(engine.set_flag(&id, 2, true).await.unwrap());
    let status = engine.status(&id).await.unwrap();
    assert!(status[2].flagged);
    assert!(!status[1].flagged);

    assert!(!engine.set_flag(&id, 2, false).await.unwrap());
    assert!(!engine.status(&id).await.unwrap()[2].flagged);

    assert!(matches!(engine.set_flag(&id, 7, true).await, Err(EngineError::InvalidRequest(_))));
    assert!(!store.load_sessions().await.unwrap()[&id].flags.contains_key(&7));
  }

  #[tokio::test]
  async fn notes_require_an_answer_and_resurface_in_other_sessions() {
    let (engine, store) = setup();
    let first = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    let qid = order(&store, &first).await[1];

    let gated = engine.set_note(&first, 1, "x").await.unwrap_err();
    assert!(matches!(gated, EngineError::InvalidRequest(_)));
    assert!(store.load_notes().await.unwrap().is_empty());
    assert!(store.load_sessions().await.unwrap()[&first].notes.is_empty());

    engine.record_answer(&first, 1, "A").await.unwrap();
    assert_eq!(engine.set_note(&first, 1, "x").await.unwrap(), "x");

    let second = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    let pos = order(&store, &second).await.iter().position(|&q| q == qid).unwrap();

    let nav = engine.navigate(&second, pos).await.unwrap();
    assert_eq!(nav.question.id, qid);
    assert_eq!(nav.note, "x");
    let detail = engine.get_session(&second).await.unwrap();
    assert_eq!(detail.status.notes, BTreeMap::from([(pos, "x".to_string())]));
    assert!(store.load_sessions().await.unwrap()[&second].notes.is_empty());

    // Clearing the note removes it from the bank level too.
    engine.set_note(&first, 1, "   ").await.unwrap();
    assert_eq!(engine.navigate(&second, pos).await.unwrap().note, "");
  }

  #[tokio::test]
  async fn finish_scores_answered_positions_only() {
    let (engine, store) = setup();
    let id = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    let ord = order(&store, &id).await;

    engine.record_answer(&id, 0, key_for(ord[0])).await.unwrap();
    engine.record_answer(&id, 1, key_for(ord[1])).await.unwrap();
    engine.record_answer(&id, 2, wrong_for(ord[2])).await.unwrap();
    engine.record_answer(&id, 2, wrong_for(ord[2])).await.unwrap();
    engine.set_note(&id, 2, "tricky").await.unwrap();

    let rec = engine.finish(&id).await.unwrap();
    assert_eq!(rec.total, 5);
    assert_eq!(rec.correct, 2);
    assert_eq!(rec.incorrect_ids, vec![ord[2]]);
    assert_eq!(rec.name, rec.id);
    assert_eq!(rec.answers.len(), 3);
    assert_eq!(rec.notes[&2], "tricky");

    let history = engine.list_history().await.unwrap();
    assert_eq!(history[0], rec);

    let detail = engine.get_session(&id).await.unwrap();
    assert!(detail.session.completed && detail.session.terminated);
  }

  #[tokio::test]
  async fn finish_is_single_shot() {
    let (engine, _) = setup();
    let id = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    engine.finish(&id).await.unwrap();

    assert!(matches!(engine.finish(&id).await, Err(EngineError::InvalidRequest(_))));
    assert!(matches!(engine.record_answer(&id, 0, "A").await, Err(EngineError::InvalidRequest(_))));
    assert_eq!(engine.list_history().await.unwrap().len(), 1);
    assert!(engine.get_session(&id).await.unwrap().status.answers.is_empty());
  }

  #[tokio::test]
  async fn finished_session_feeds_review_mode() {
    let (engine, store) = setup();
    let id = engine.create_session("big", SessionMode::Full, None).await.unwrap().id;
    let ord = order(&store, &id).await;
    engine.record_answer(&id, 0, wrong_for(ord[0])).await.unwrap();
    engine.record_answer(&id, 1, wrong_for(ord[1])).await.unwrap();
    let rec = engine.finish(&id).await.unwrap();

    let review = engine.create_session("big", SessionMode::Review, Some(rec.id.as_str())).await.unwrap();
    assert_eq!(sorted(order(&store, &review.id).await), sorted(vec![ord[0], ord[1]]));
  }

  #[tokio::test]
  async fn list_active_hides_terminated_and_finished_sessions() {
    let (engine, _) = setup();
    let a = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    let b = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    let c = engine.create_session("big", SessionMode::Full, None).await.unwrap().id;
    assert_ne!(a, b);

    engine.terminate(&a).await.unwrap();
    engine.terminate(&a).await.unwrap();
    engine.finish(&b).await.unwrap();

    let active: Vec<_> = engine.list_active().await.unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(active, vec![c]);
    assert!(engine.get_session(&a).await.unwrap().session.terminated);
    assert!(engine.get_session(&b).await.is_ok());
  }

  #[tokio::test]
  async fn list_active_is_newest_first() {
    let (engine, store) = setup();
    let old = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    let new = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;

    let mut sessions = store.load_sessions().await.unwrap();
    let s = sessions.get_mut(&old).unwrap();
    s.created_at -= chrono::Duration::minutes(5);
    store.save_sessions(&sessions).await.unwrap();

    let ids: Vec<_> = engine.list_active().await.unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![new, old]);
  }

  #[tokio::test]
  async fn delete_session_then_missing() {
    let (engine, _) = setup();
    let id = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    engine.delete_session(&id).await.unwrap();
    assert!(matches!(engine.delete_session(&id).await, Err(EngineError::NotFound(_))));
    assert!(matches!(engine.get_session(&id).await, Err(EngineError::NotFound(_))));

    // Same bank within the same second still gets a fresh id.
    let again = engine.create_session("quiz", SessionMode::Full, None).await.unwrap().id;
    assert_ne!(again, id);
    assert!(matches!(engine.get_session(&id).await, Err(EngineError::NotFound(_))));
  }

  #[tokio::test]
  async fn history_rename_and_delete() {
    let (engine, store) = setup();
    store.save_history(&[record("r1", "big", vec![1])]).await.unwrap();

    let blank = engine.rename_history("r1", "   ").await.unwrap_err();
    assert!(matches!(blank, EngineError::InvalidRequest(_)));
    let missing = engine.rename_history("nope", "My Run").await.unwrap_err();
    assert!(matches!(missing, EngineError::NotFound(_)));
    assert_eq!(engine.list_history().await.unwrap()[0].name, "r1");

    let renamed = engine.rename_history("r1", " My Run ").await.unwrap();
    assert_eq!(renamed.name, "My Run");
    assert_eq!(engine.list_history().await.unwrap()[0].name, "My Run");

    engine.delete_history("unknown").await.unwrap();
    assert_eq!(engine.list_history().await.unwrap().len(), 1);
    engine.delete_history("r1").await.unwrap();
    assert!(engine.list_history().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn list_banks_reports_counts() {
    let (engine, _) = setup();
    let banks = engine.list_banks().await.unwrap();
    let counts: Vec<_> = banks.iter().map(|b| (b.id.as_str(), b.count)).collect();
    assert_eq!(counts, vec![("quiz", 5), ("big", 10)]);
  }
}
