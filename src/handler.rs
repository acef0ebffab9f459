use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use tracing::info;

use crate::api::{BookQuery, BookSearch, StatusResponse};
use crate::db::Database;
use crate::error::HandlerError;
use crate::model::{Book, BookRequest};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        AppState { db }
    }
}

/// The only projection `?author=..&field=..` supports.
const TITLE_FIELD: &str = "title";

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(StatusResponse {
        status: "ok".to_owned(),
    })
}

pub async fn get_books(State(state): State<AppState>, Query(qp): Query<BookQuery>) -> Result<Response, HandlerError> {
    let response = match qp.into_search() {
        BookSearch::All => {
            let books = state.db.find_all().await?;
            info!(count = books.len(), "listed books");
            Json(books).into_response()
        }
        BookSearch::TitleContaining(title) => {
            let books = state.db.find_by_title_containing(&title).await?;
            info!(title = %title, count = books.len(), "searched books by title");
            Json(books).into_response()
        }
        BookSearch::AuthorContaining(author) => {
            let books = state.db.find_by_author_containing(&author).await?;
            info!(author = %author, count = books.len(), "searched books by author");
            Json(books).into_response()
        }
        BookSearch::AuthorField { author, field } => {
            if field != TITLE_FIELD {
                return Err(HandlerError::Validation(format!("unsupported field: {field}")));
            }
            let titles: Vec<String> = state
                .db
                .find_by_author(&author)
                .await?
                .into_iter()
                .map(|book| book.title)
                .collect();
            info!(author = %author, count = titles.len(), "listed titles by author");
            Json(titles).into_response()
        }
    };

    Ok(response)
}

pub async fn get_book(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Book>, HandlerError> {
    let book = state.db.find_by_id(id).await?.ok_or(HandlerError::NotFound(id))?;
    info!(book_id = id, "got book");
    Ok(Json(book))
}

fn read_payload(payload: Result<Json<BookRequest>, JsonRejection>) -> Result<BookRequest, HandlerError> {
    let Json(req) = payload.map_err(|e| HandlerError::Validation(e.body_text()))?;
    req.validate()?;
    Ok(req)
}

pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<Json<Book>, HandlerError> {
    let req = read_payload(payload)?;
    let book = state.db.save(&Book::from(req)).await?;
    info!(book_id = ?book.id, "created book");
    Ok(Json(book))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<Json<Book>, HandlerError> {
    let req = read_payload(payload)?;
    let existing = state.db.find_by_id(id).await?.ok_or(HandlerError::NotFound(id))?;
    let book = state.db.save(&existing.apply(req)).await?;
    info!(book_id = id, "updated book");
    Ok(Json(book))
}
