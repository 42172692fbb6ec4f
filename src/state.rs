//! Application state: database, question log, civil clock, and optional question generator.
//!
//! This module owns:
//!   - the SQLite store (parents, users, tasks, task logs)
//!   - the append-only practice-question log
//!   - the time provider every "today" goes through
//!   - the question source (OpenAI when configured)

use std::sync::Arc;

use tracing::{info, instrument};

use crate::clock::TimeProvider;
use crate::config::{load_tracker_config_from_env, Settings};
use crate::domain::User;
use crate::error::AppError;
use crate::openai::OpenAI;
use crate::questions::{QuestionLog, QuestionSource};
use crate::store::Store;

pub struct AppState {
    pub store: Store,
    pub questions: QuestionLog,
    pub clock: TimeProvider,
    pub generator: Option<Arc<dyn QuestionSource>>,
    pub settings: Settings,
}

impl AppState {
    /// Build state from env: load config, open the database, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, AppError> {
        let cfg = load_tracker_config_from_env().unwrap_or_default();
        let settings = cfg.tracker;

        let store = Store::open(&settings.database_path)?;
        let questions = QuestionLog::new(settings.questions_log_path.clone());
        let clock = TimeProvider::system(settings.tz());

        let generator: Option<Arc<dyn QuestionSource>> = match OpenAI::from_env(cfg.prompts) {
            Some(oa) => {
                info!(target: "task_tracker", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Some(Arc::new(oa))
            }
            None => {
                info!(target: "task_tracker", "OpenAI disabled (no OPENAI_API_KEY). Practice questions will show an error payload.");
                None
            }
        };

        info!(
            target: "task_tracker",
            timezone = %clock.timezone(),
            questions_log = %questions.path().display(),
            question_count = settings.question_count,
            "Tracker state ready"
        );

        Ok(Self { store, questions, clock, generator, settings })
    }

    /// Assemble state from explicit parts (tests, embedding).
    pub fn with_parts(
        store: Store,
        questions: QuestionLog,
        clock: TimeProvider,
        generator: Option<Arc<dyn QuestionSource>>,
        settings: Settings,
    ) -> Self {
        Self { store, questions, clock, generator, settings }
    }

    /// The active user for a request; unknown ids become `UserNotFound`.
    #[instrument(level = "debug", skip(self))]
    pub fn require_user(&self, user_id: i64) -> Result<User, AppError> {
        self.store.get_user(user_id)?.ok_or(AppError::UserNotFound)
    }
}
