// src/domain/mod.rs
pub mod category;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod page;
pub mod predicate;

pub use category::{Category, CategoryTree, ClearScope, Subcategory};
pub use cursor::{Cursor, CursorDecode, SortMode, SortValue};
pub use error::DomainError;
pub use filter::{
    Filter, FilterSummary, FilterUpdate, MetricEvent, NewFilter, OwnerId, Visibility,
};
pub use page::Page;
pub use predicate::{CategorySelector, FilterPredicate};
