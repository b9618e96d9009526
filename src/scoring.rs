//! Answer checking, final scoring and the per-question progress projection.

use serde::Serialize;

use crate::domain::{Question, QuestionId, Session};

/// Exact, case-sensitive comparison of an answer key against the question's key.
pub fn is_correct(question: &Question, answer: &str) -> bool {
  answer == question.answer
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
  pub total: usize,
  pub correct: usize,
  /// Question ids answered wrongly, in session order.
  pub incorrect_ids: Vec<QuestionId>,
}

/// Score a session. Unanswered positions count neither way.
pub fn score(session: &Session, bank: &[Question]) -> Score {
  let mut correct = 0;
  let mut incorrect_ids = Vec::new();
  for (pos, &qid) in session.questions.iter().enumerate() {
    let (Some(answer), Some(question)) = (session.answers.get(&pos), bank.get(qid)) else {
      continue;
    };
    if is_correct(question, answer) {
      correct += 1;
    } else {
      incorrect_ids.push(qid);
    }
  }
  Score { total: session.total(), correct, incorrect_ids }
}

/// Progress of one position.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuestionStatus {
  pub index: usize,
  pub answered: bool,
  /// `None` until answered.
  pub correct: Option<bool>,
  pub flagged: bool,
  pub correct_answer: String,
}

pub fn statuses(session: &Session, bank: &[Question]) -> Vec<QuestionStatus> {
  session
    .questions
    .iter()
    .enumerate()
    .map(|(pos, &qid)| {
      let correct_answer = bank.get(qid).map(|q| q.answer.clone()).unwrap_or_default();
      let answer = session.answers.get(&pos);
      QuestionStatus {
        index: pos,
        answered: answer.is_some(),
        correct: answer.map(|a| *a == correct_answer),
        flagged: session.flags.get(&pos).copied().unwrap_or(false),
        correct_answer,
      }
    })
    .collect()
}
