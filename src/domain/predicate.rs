// src/domain/predicate.rs
use serde::Serialize;

use crate::domain::{Filter, OwnerId};

/// Which slice of a user's category tree a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CategorySelector {
    /// Directly in the category, not in any of its subcategories.
    Main(i64),
    Sub(i64),
    Uncategorized,
    All,
}

/// Owner-scoped selection of filters. There is no way to build one without an
/// owner, so category ids (which are per-user) never match across users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPredicate {
    owner: OwnerId,
    selector: CategorySelector,
}

impl FilterPredicate {
    pub fn new(owner: OwnerId, selector: CategorySelector) -> Self {
        Self { owner, selector }
    }

    pub fn owned_by(owner: OwnerId) -> Self {
        Self::new(owner, CategorySelector::All)
    }

    pub fn in_main_category(owner: OwnerId, category_id: i64) -> Self {
        Self::new(owner, CategorySelector::Main(category_id))
    }

    pub fn in_subcategory(owner: OwnerId, subcategory_id: i64) -> Self {
        Self::new(owner, CategorySelector::Sub(subcategory_id))
    }

    pub fn uncategorized(owner: OwnerId) -> Self {
        Self::new(owner, CategorySelector::Uncategorized)
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn selector(&self) -> CategorySelector {
        self.selector
    }

    pub fn matches(&self, filter: &Filter) -> bool {
        if !filter.is_owned_by(&self.owner) {
            return false;
        }
        match self.selector {
            CategorySelector::Main(id) => {
                filter.category_id == Some(id) && filter.subcategory_id.is_none()
            }
            CategorySelector::Sub(id) => filter.subcategory_id == Some(id),
            CategorySelector::Uncategorized => {
                filter.category_id.is_none() && filter.subcategory_id.is_none()
            }
            CategorySelector::All => true,
        }
    }
}
