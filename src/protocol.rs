//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{
    DaySummary, DifficultyAction, Notice, Parent, ResolvedTask, StarRank, Task, TaskFields, User,
};
use crate::tracker::HistoryDay;

/// Body returned for redirects and rejected requests.
#[derive(Debug, Serialize)]
pub struct NoticeOut {
    pub notice: Notice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct UsersOut {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct SelectIn {
    pub user_id: i64,
}
#[derive(Serialize)]
pub struct SelectOut {
    pub user: User,
    pub redirect: String,
}

/// Query carrying the active user for read-only views.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: i64,
}

//
// Today's tasks
//

#[derive(Debug, Serialize)]
pub struct TodayOut {
    pub user: String,
    pub user_id: i64,
    /// Long-form header, e.g. "Friday, October 16, 2026".
    pub today: String,
    pub date: String,
    pub difficulty: i64,
    pub stars: StarRank,
    pub summary: DaySummary,
    pub tasks: Vec<ResolvedTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    Mark,
    Unmark,
}

#[derive(Debug, Deserialize)]
pub struct TasksIn {
    pub user_id: i64,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub action: Option<TaskAction>,
    #[serde(default)]
    pub difficulty_action: Option<DifficultyAction>,
}

#[derive(Debug, Deserialize)]
pub struct PageNumbersIn {
    pub user_id: i64,
    pub task: String,
    pub page_numbers: String,
}
#[derive(Serialize)]
pub struct PageNumbersOut {
    pub success: bool,
    pub message: String,
}

//
// History
//

#[derive(Serialize)]
pub struct HistoryOut {
    pub user: String,
    pub user_id: i64,
    pub days: Vec<HistoryDay>,
}

//
// Parent management
//

#[derive(Debug, Deserialize)]
pub struct ParentQuery {
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ParentViewOut {
    pub parent: Parent,
    pub users: Vec<User>,
    pub selected_user: Option<User>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ParentAction {
    AddUser {
        #[serde(default)]
        parent: Option<String>,
        name: String,
        #[serde(default)]
        date_of_birth: String,
        #[serde(default)]
        ai_difficulty: Option<i64>,
    },
    EditUser {
        user_id: i64,
        name: String,
        #[serde(default)]
        date_of_birth: String,
        #[serde(default)]
        ai_difficulty: Option<i64>,
    },
    AddTask {
        user_id: i64,
        #[serde(flatten)]
        task: TaskFields,
    },
    EditTask {
        user_id: i64,
        old_title: String,
        #[serde(flatten)]
        task: TaskFields,
    },
    DeleteTask {
        user_id: i64,
        title: String,
    },
    CopyTasks {
        from_user_id: i64,
        to_user_id: i64,
    },
}

#[derive(Debug, Serialize)]
pub struct ParentOut {
    #[serde(flatten)]
    pub view: ParentViewOut,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

//
// Practice questions
//

/// Questions are sent without their hints; hints are revealed one at a time.
#[derive(Serialize)]
pub struct AiProblemsOut {
    pub user: String,
    pub user_id: i64,
    pub today: String,
    pub difficulty: i64,
    pub html: String,
    pub questions: Vec<String>,
    pub origin: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Deserialize)]
pub struct HintIn {
    pub user_id: i64,
    /// 1-based position in today's set.
    pub question_id: usize,
}
#[derive(Serialize)]
pub struct HintOut {
    pub question_id: usize,
    pub question: String,
    pub hint: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshIn {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DifficultyIn {
    pub user_id: i64,
    pub difficulty_action: DifficultyAction,
}
#[derive(Serialize)]
pub struct DifficultyOut {
    pub difficulty: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}
