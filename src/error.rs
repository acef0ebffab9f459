use axum::response::{IntoResponse, Response};

use crate::api::{bad_request, internal_error, not_found};

pub const BOOK_NOT_FOUND: &str = "This book does not exist";

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("NotFound: book {0}")]
    NotFound(i64),
    #[error("ValidationError: {0}")]
    Validation(String),
    #[error("StoreError: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        use HandlerError::*;
        match self {
            NotFound(id) => {
                tracing::warn!(book_id = id, "book not found");
                not_found(BOOK_NOT_FOUND)
            }
            Validation(msg) => {
                tracing::warn!(reason = %msg, "rejected book request");
                bad_request(&msg)
            }
            Store(e) => {
                tracing::error!(error = %format!("{e:#}"), "store operation failed");
                internal_error("internal server error")
            }
        }
    }
}
