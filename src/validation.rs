use crate::error::HandlerError;
use crate::model::BookRequest;

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl BookRequest {
    pub fn validate(&self) -> Result<(), HandlerError> {
        let mut blank = Vec::new();
        if is_blank(&self.title) {
            blank.push("title");
        }
        if is_blank(&self.author) {
            blank.push("author");
        }

        if blank.is_empty() {
            Ok(())
        } else {
            Err(HandlerError::Validation(format!("{} must not be blank", blank.join(" and "))))
        }
    }
}
