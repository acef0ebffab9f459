use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Query string accepted by `GET /books`.
#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub field: Option<String>,
}

/// The one interpretation of a `GET /books` query that applies.
///
/// Precedence: `author`+`field`, then `title`, then `author`. A `field` without
/// `author` is ignored.
#[derive(Debug, PartialEq, Eq)]
pub enum BookSearch {
    All,
    TitleContaining(String),
    AuthorContaining(String),
    AuthorField { author: String, field: String },
}

impl BookQuery {
    pub fn into_search(self) -> BookSearch {
        match (self.title, self.author, self.field) {
            (_, Some(author), Some(field)) => BookSearch::AuthorField { author, field },
            (Some(title), _, _) => BookSearch::TitleContaining(title),
            (None, Some(author), None) => BookSearch::AuthorContaining(author),
            (None, None, _) => BookSearch::All,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(code: StatusCode, msg: &str) -> Response {
    (
        code,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

pub fn not_found(msg: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, msg)
}

pub fn bad_request(msg: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, msg)
}

pub fn internal_error(msg: &str) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, msg)
}
