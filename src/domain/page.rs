// src/domain/page.rs
use serde::Serialize;

/// One page of a keyset-paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent on the last page.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}
