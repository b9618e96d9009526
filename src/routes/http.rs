//! HTTP endpoint handlers. These are thin wrappers that forward to the quiz engine.
//! Each handler is instrumented; engine errors become 404/400/500 responses.

use std::sync::Arc;
use axum::{extract::{Path, State}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::{EngineError, EngineResult};
use crate::protocol::*;
use crate::state::AppState;
use crate::util::parse_answer_key;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_banks(State(state): State<Arc<AppState>>) -> EngineResult<Json<BanksOut>> {
  let banks = state.engine.list_banks().await?;
  Ok(Json(BanksOut { banks }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_sessions(State(state): State<Arc<AppState>>) -> EngineResult<Json<SessionsOut>> {
  let sessions = state.engine.list_active().await?;
  Ok(Json(SessionsOut { sessions }))
}

#[instrument(level = "info", skip(state, body), fields(bank = %body.bank, mode = ?body.mode))]
pub async fn http_create_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreateSessionIn>,
) -> EngineResult<Json<SessionOut>> {
  let session = state
    .engine
    .create_session(&body.bank, body.mode, body.review_source.as_deref())
    .await?;
  info!(target: "session", id = %session.id, total = session.total, "HTTP session created");
  Ok(Json(SessionOut { session }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> EngineResult<Json<SessionDetail>> {
  Ok(Json(state.engine.get_session(&id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> EngineResult<Json<DeletedOut>> {
  state.engine.delete_session(&id).await?;
  Ok(Json(DeletedOut { deleted: true }))
}

#[instrument(level = "info", skip(state, body), fields(index = ?body.question_index))]
pub async fn http_navigate(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<NavigateIn>,
) -> EngineResult<Json<NavigateOut>> {
  let index = body.question_index.position()?;
  Ok(Json(state.engine.navigate(&id, index).await?))
}

#[instrument(level = "info", skip(state, body), fields(index = ?body.question_index))]
pub async fn http_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> EngineResult<Json<AnswerOut>> {
  let index = body.question_index.position()?;
  let answer = match (body.answer, body.option_text.as_deref()) {
    (Some(answer), _) => answer,
    (None, Some(option)) => parse_answer_key(option),
    (None, None) => return Err(EngineError::invalid("answer or option_text is required")),
  };
  let out = state.engine.record_answer(&id, index, &answer).await?;
  info!(target: "session", %id, index, correct = out.correct, "HTTP answer evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(index = ?body.question_index, flagged = body.flagged))]
pub async fn http_flag(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<FlagIn>,
) -> EngineResult<Json<FlagOut>> {
  let index = body.question_index.position()?;
  let flagged = state.engine.set_flag(&id, index, body.flagged).await?;
  Ok(Json(FlagOut { flagged }))
}

#[instrument(level = "info", skip(state, body), fields(index = ?body.question_index, note_len = body.note.len()))]
pub async fn http_note(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<NoteIn>,
) -> EngineResult<Json<NoteOut>> {
  let index = body.question_index.position()?;
  let note = state.engine.set_note(&id, index, &body.note).await?;
  Ok(Json(NoteOut { note }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_finish(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> EngineResult<Json<RecordOut>> {
  let record = state.engine.finish(&id).await?;
  Ok(Json(RecordOut { record }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_terminate(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> EngineResult<Json<TerminatedOut>> {
  state.engine.terminate(&id).await?;
  Ok(Json(TerminatedOut { terminated: true }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_status(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> EngineResult<Json<StatusOut>> {
  let statuses = state.engine.status(&id).await?;
  Ok(Json(StatusOut { statuses }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_history(State(state): State<Arc<AppState>>) -> EngineResult<Json<HistoryOut>> {
  let history = state.engine.list_history().await?;
  Ok(Json(HistoryOut { history }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_rename_history(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<RenameIn>,
) -> EngineResult<Json<RecordOut>> {
  let record = state.engine.rename_history(&id, &body.name).await?;
  Ok(Json(RecordOut { record }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_history(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> EngineResult<Json<DeletedOut>> {
  state.engine.delete_history(&id).await?;
  Ok(Json(DeletedOut { deleted: true }))
}
