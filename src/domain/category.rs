// src/domain/category.rs
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::OwnerId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: i64,
    pub owner_id: OwnerId,
    pub name: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subcategory {
    pub id: i64,
    pub category_id: i64,
    pub owner_id: OwnerId,
    pub name: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

/// A category together with its subcategories, both in manual order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

/// What `clear_category` unsets on a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    /// Both category and subcategory.
    All,
    /// Only the subcategory; the filter stays in its main category.
    SubcategoryOnly,
}
