//! Application error type and its HTTP mapping.
//!
//! Unknown users redirect to the landing view with a notice; validation problems are
//! reported back as a notice; everything else is an internal error.

use axum::{
  http::{header::LOCATION, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;
use tracing::error;

use crate::domain::Notice;
use crate::protocol::NoticeOut;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("User not found! Please select a valid user.")]
  UserNotFound,

  #[error("{0}")]
  Validation(String),

  #[error("Database error: {0}")]
  Storage(#[from] rusqlite::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn validation(msg: impl Into<String>) -> Self {
    AppError::Validation(msg.into())
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    match self {
      AppError::UserNotFound => {
        let body = NoticeOut { notice: Notice::error(self.to_string()), redirect: Some("/".into()) };
        (StatusCode::SEE_OTHER, [(LOCATION, "/")], Json(body)).into_response()
      }
      AppError::Validation(msg) => {
        let body = NoticeOut { notice: Notice::error(msg), redirect: None };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
      }
      other => {
        error!(target: "task_tracker", error = %other, "Request failed");
        let body = NoticeOut { notice: Notice::error(other.to_string()), redirect: None };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
      }
    }
  }
}
