// src/application/repository.rs
use chrono::{DateTime, Utc};

use crate::domain::{
    Category, ClearScope, Cursor, DomainError, Filter, FilterPredicate, FilterSummary,
    MetricEvent, NewFilter, OwnerId, SortMode, Subcategory,
};

/// Which rows a keyset listing runs over.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseScope {
    /// Every public filter, regardless of owner.
    Public,
    /// The owner's own filters, private ones included.
    Owned(FilterPredicate),
}

/// Fully resolved listing query handed to the data layer.
///
/// Rows come back ordered by the sort value descending, then id ascending,
/// starting strictly after `after` and capped at `limit`.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseQuery {
    pub sort: SortMode,
    pub after: Option<Cursor>,
    pub scope: BrowseScope,
    /// Already normalized; matched literally and case-insensitively against
    /// name and description.
    pub search: Option<String>,
    pub limit: usize,
}

pub trait FilterRepository {
    fn insert_filter(
        &mut self,
        owner: &OwnerId,
        new: &NewFilter,
        order: i64,
        now: DateTime<Utc>,
    ) -> Result<Filter, DomainError>;

    fn get_filter(&mut self, id: i64) -> Result<Option<Filter>, DomainError>;

    /// Persist edited content fields of an existing filter.
    fn save_filter(&mut self, filter: &Filter) -> Result<(), DomainError>;

    /// Returns false if no filter with that id belongs to `owner`.
    fn delete_filter(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError>;

    fn browse_filters(&mut self, query: &BrowseQuery) -> Result<Vec<FilterSummary>, DomainError>;

    /// Filters matching `predicate` in manual order (`order`, then id).
    fn list_filters(
        &mut self,
        predicate: &FilterPredicate,
    ) -> Result<Vec<FilterSummary>, DomainError>;

    /// One past the highest manual position among filters matching `predicate`.
    fn next_order(&mut self, predicate: &FilterPredicate) -> Result<i64, DomainError>;

    fn set_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        category_id: i64,
        subcategory_id: Option<i64>,
        order: i64,
    ) -> Result<bool, DomainError>;

    fn clear_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        scope: ClearScope,
    ) -> Result<bool, DomainError>;

    fn set_order(&mut self, id: i64, owner: &OwnerId, order: i64) -> Result<bool, DomainError>;

    /// Atomic in-place increment of the event's counter and of popularity.
    fn record_metric(&mut self, id: i64, event: MetricEvent) -> Result<bool, DomainError>;
}

pub trait CategoryRepository {
    fn insert_category(
        &mut self,
        owner: &OwnerId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, DomainError>;

    fn insert_subcategory(
        &mut self,
        parent: &Category,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Subcategory, DomainError>;

    fn get_category(&mut self, id: i64) -> Result<Option<Category>, DomainError>;

    fn get_subcategory(&mut self, id: i64) -> Result<Option<Subcategory>, DomainError>;

    fn list_categories(&mut self, owner: &OwnerId) -> Result<Vec<Category>, DomainError>;

    fn list_subcategories(&mut self, category_id: i64) -> Result<Vec<Subcategory>, DomainError>;

    fn rename_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        name: &str,
    ) -> Result<bool, DomainError>;

    /// Removes the category and its subcategories; member filters become
    /// uncategorized.
    fn delete_category(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError>;

    /// Removes the subcategory; member filters stay in the parent category.
    fn delete_subcategory(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError>;
}

impl<R: FilterRepository + ?Sized> FilterRepository for &mut R {
    fn insert_filter(
        &mut self,
        owner: &OwnerId,
        new: &NewFilter,
        order: i64,
        now: DateTime<Utc>,
    ) -> Result<Filter, DomainError> {
        (**self).insert_filter(owner, new, order, now)
    }

    fn get_filter(&mut self, id: i64) -> Result<Option<Filter>, DomainError> {
        (**self).get_filter(id)
    }

    fn save_filter(&mut self, filter: &Filter) -> Result<(), DomainError> {
        (**self).save_filter(filter)
    }

    fn delete_filter(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError> {
        (**self).delete_filter(id, owner)
    }

    fn browse_filters(&mut self, query: &BrowseQuery) -> Result<Vec<FilterSummary>, DomainError> {
        (**self).browse_filters(query)
    }

    fn list_filters(
        &mut self,
        predicate: &FilterPredicate,
    ) -> Result<Vec<FilterSummary>, DomainError> {
        (**self).list_filters(predicate)
    }

    fn next_order(&mut self, predicate: &FilterPredicate) -> Result<i64, DomainError> {
        (**self).next_order(predicate)
    }

    fn set_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        category_id: i64,
        subcategory_id: Option<i64>,
        order: i64,
    ) -> Result<bool, DomainError> {
        (**self).set_category(id, owner, category_id, subcategory_id, order)
    }

    fn clear_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        scope: ClearScope,
    ) -> Result<bool, DomainError> {
        (**self).clear_category(id, owner, scope)
    }

    fn set_order(&mut self, id: i64, owner: &OwnerId, order: i64) -> Result<bool, DomainError> {
        (**self).set_order(id, owner, order)
    }

    fn record_metric(&mut self, id: i64, event: MetricEvent) -> Result<bool, DomainError> {
        (**self).record_metric(id, event)
    }
}

impl<R: CategoryRepository + ?Sized> CategoryRepository for &mut R {
    fn insert_category(
        &mut self,
        owner: &OwnerId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, DomainError> {
        (**self).insert_category(owner, name, now)
    }

    fn insert_subcategory(
        &mut self,
        parent: &Category,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Subcategory, DomainError> {
        (**self).insert_subcategory(parent, name, now)
    }

    fn get_category(&mut self, id: i64) -> Result<Option<Category>, DomainError> {
        (**self).get_category(id)
    }

    fn get_subcategory(&mut self, id: i64) -> Result<Option<Subcategory>, DomainError> {
        (**self).get_subcategory(id)
    }

    fn list_categories(&mut self, owner: &OwnerId) -> Result<Vec<Category>, DomainError> {
        (**self).list_categories(owner)
    }

    fn list_subcategories(&mut self, category_id: i64) -> Result<Vec<Subcategory>, DomainError> {
        (**self).list_subcategories(category_id)
    }

    fn rename_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        name: &str,
    ) -> Result<bool, DomainError> {
        (**self).rename_category(id, owner, name)
    }

    fn delete_category(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError> {
        (**self).delete_category(id, owner)
    }

    fn delete_subcategory(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError> {
        (**self).delete_subcategory(id, owner)
    }
}
