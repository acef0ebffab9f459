use serde::{Deserialize, Serialize};

/// A catalog entry. `id` is `None` until the store has persisted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
}

impl Book {
    pub fn new(title: &str, author: &str) -> Self {
        Book {
            id: None,
            title: title.to_owned(),
            author: author.to_owned(),
        }
    }

    /// Replaces both text fields, keeping the id.
    pub fn apply(self, req: BookRequest) -> Self {
        Book {
            id: self.id,
            title: req.title,
            author: req.author,
        }
    }
}

/// Payload for create and update. Missing keys decode as empty strings so they
/// are rejected by validation rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

impl From<BookRequest> for Book {
    fn from(req: BookRequest) -> Self {
        Book {
            id: None,
            title: req.title,
            author: req.author,
        }
    }
}
