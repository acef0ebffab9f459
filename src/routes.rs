use axum::{Router, routing::get};

use crate::handler::{self, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(handler::get_books).post(handler::create_book))
        .route("/books/:id", get(handler::get_book).post(handler::update_book))
}
