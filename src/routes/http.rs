//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; the active user always arrives as an explicit `user_id`.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  Json,
};
use tracing::{info, instrument};

use crate::domain::{Notice, QuestionSet, TaskStatus, User};
use crate::error::AppError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;
use crate::tracker::history;

#[instrument(level = "info")]
pub async fn http_health() -> Json<HealthOut> {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_users(State(state): State<Arc<AppState>>) -> Result<Json<UsersOut>, AppError> {
  Ok(Json(UsersOut { users: state.store.list_users()? }))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id))]
pub async fn http_select_user(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SelectIn>,
) -> Result<Json<SelectOut>, AppError> {
  let user = state.require_user(body.user_id)?;
  info!(target: "task_tracker", user = %user.name, "Active user selected");
  Ok(Json(SelectOut { user, redirect: "/tasks".into() }))
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_get_tasks(
  State(state): State<Arc<AppState>>,
  Query(q): Query<UserQuery>,
) -> Result<Json<TodayOut>, AppError> {
  Ok(Json(today_view(&state, q.user_id)?))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id, task = ?body.task, action = ?body.action))]
pub async fn http_post_tasks(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TasksIn>,
) -> Result<Json<TodayOut>, AppError> {
  state.require_user(body.user_id)?;

  if let Some(action) = body.action {
    let title = body.task.as_deref().ok_or_else(|| AppError::validation("Pick a task to update."))?;
    let status = match action {
      TaskAction::Mark => TaskStatus::Done,
      TaskAction::Unmark => TaskStatus::Todo,
    };
    set_task_status(&state, body.user_id, title, status)?;
  }

  let mut notice = None;
  if let Some(action) = body.difficulty_action {
    let (_, n) = adjust_difficulty(&state, body.user_id, action)?;
    notice = n;
  }

  let mut view = today_view(&state, body.user_id)?;
  view.notice = notice;
  Ok(Json(view))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id, task = %body.task))]
pub async fn http_post_page_numbers(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PageNumbersIn>,
) -> Result<Json<PageNumbersOut>, AppError> {
  submit_page_numbers(&state, body.user_id, &body.task, &body.page_numbers)?;
  Ok(Json(PageNumbersOut { success: true, message: format!("Logged pages for {}.", body.task) }))
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_get_history(
  State(state): State<Arc<AppState>>,
  Query(q): Query<UserQuery>,
) -> Result<Json<HistoryOut>, AppError> {
  let user = state.require_user(q.user_id)?;
  let days = history(&state.store, user.id)?;
  info!(target: "tracker", user = %user.name, days = days.len(), "History served");
  Ok(Json(HistoryOut { user: user.name, user_id: user.id, days }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_parent(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ParentQuery>,
) -> Result<Json<ParentOut>, AppError> {
  let parent = q.parent.unwrap_or_else(|| state.settings.default_parent.clone());
  let view = parent_view(&state, &parent, q.user_id)?;
  Ok(Json(ParentOut { view, notice: None }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_parent(
  State(state): State<Arc<AppState>>,
  Json(action): Json<ParentAction>,
) -> Result<Json<ParentOut>, AppError> {
  let (parent, selected, notice) = match action {
    ParentAction::AddUser { parent, name, date_of_birth, ai_difficulty } => {
      let parent = parent.unwrap_or_else(|| state.settings.default_parent.clone());
      let user = add_user(&state, &parent, &name, &date_of_birth, ai_difficulty)?;
      (parent, user.id, Notice::info(format!("Added {}.", user.name)))
    }
    ParentAction::EditUser { user_id, name, date_of_birth, ai_difficulty } => {
      let user = edit_user(&state, user_id, &name, &date_of_birth, ai_difficulty)?;
      (parent_name_of(&state, user_id)?, user_id, Notice::info(format!("Updated {}.", user.name)))
    }
    ParentAction::AddTask { user_id, task } => {
      let task = add_task(&state, user_id, &task)?;
      (parent_name_of(&state, user_id)?, user_id, Notice::info(format!("Added task '{}'.", task.title)))
    }
    ParentAction::EditTask { user_id, old_title, task } => {
      let task = edit_task(&state, user_id, &old_title, &task)?;
      (parent_name_of(&state, user_id)?, user_id, Notice::info(format!("Updated task '{}'.", task.title)))
    }
    ParentAction::DeleteTask { user_id, title } => {
      delete_task(&state, user_id, &title)?;
      (parent_name_of(&state, user_id)?, user_id, Notice::info(format!("Deleted task '{}'.", title)))
    }
    ParentAction::CopyTasks { from_user_id, to_user_id } => {
      let copied = copy_tasks(&state, from_user_id, to_user_id)?;
      (parent_name_of(&state, to_user_id)?, to_user_id, Notice::info(format!("Copied {} task(s).", copied)))
    }
  };
  let view = parent_view(&state, &parent, Some(selected))?;
  Ok(Json(ParentOut { view, notice: Some(notice) }))
}

fn problems_out(state: &AppState, user: User, set: QuestionSet, origin: &'static str) -> AiProblemsOut {
  let notice = (origin == ORIGIN_FAILED).then(|| Notice::error("Error fetching AI problems. Please try again later."));
  AiProblemsOut {
    user: user.name,
    user_id: user.id,
    today: state.clock.today_header(),
    difficulty: user.ai_difficulty,
    html: set.html,
    questions: set.questions.into_iter().map(|q| q.question).collect(),
    origin,
    notice,
  }
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_get_ai_problems(
  State(state): State<Arc<AppState>>,
  Query(q): Query<UserQuery>,
) -> Result<Json<AiProblemsOut>, AppError> {
  let user = state.require_user(q.user_id)?;
  let (set, origin) = get_questions(&state, &user, false).await?;
  info!(target: "questions", user = %user.name, %origin, "Practice questions served");
  Ok(Json(problems_out(&state, user, set, origin)))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id, question_id = body.question_id))]
pub async fn http_post_hint(
  State(state): State<Arc<AppState>>,
  Json(body): Json<HintIn>,
) -> Result<Json<HintOut>, AppError> {
  let user = state.require_user(body.user_id)?;
  let (question, hint) = get_hint(&state, &user, body.question_id).await?;
  Ok(Json(HintOut { question_id: body.question_id, question, hint }))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id))]
pub async fn http_post_refresh(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RefreshIn>,
) -> Result<Json<AiProblemsOut>, AppError> {
  let user = state.require_user(body.user_id)?;
  let (set, origin) = get_questions(&state, &user, true).await?;
  info!(target: "questions", user = %user.name, %origin, "Practice questions refreshed");
  Ok(Json(problems_out(&state, user, set, origin)))
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id, action = ?body.difficulty_action))]
pub async fn http_post_difficulty(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DifficultyIn>,
) -> Result<Json<DifficultyOut>, AppError> {
  let (difficulty, notice) = adjust_difficulty(&state, body.user_id, body.difficulty_action)?;
  Ok(Json(DifficultyOut { difficulty, notice }))
}
