// src/domain/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Filter not found: {0}")]
    FilterNotFound(i64),
    #[error("Category not found: {0}")]
    CategoryNotFound(i64),
    #[error("Subcategory not found: {0}")]
    SubcategoryNotFound(i64),
    #[error("No authenticated user")]
    Unauthenticated,
    #[error("Invalid input: {0}")]
    Validation(String),
    /// Detail is kept for logging only and never rendered to the caller.
    #[error("Operation failed")]
    Storage(String),
}

impl DomainError {
    pub fn storage(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!(%detail, "Data access failure");
        DomainError::Storage(detail)
    }
}
