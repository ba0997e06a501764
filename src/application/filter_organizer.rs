// src/application/filter_organizer.rs
use tracing::{debug, info, instrument};

use crate::application::access::{owned_category, owned_filter, owned_subcategory};
use crate::application::{CategoryRepository, FilterRepository, SessionProvider};
use crate::domain::{ClearScope, DomainError, FilterPredicate, FilterSummary};

/// Manual organization of a user's own filters into categories.
///
/// Listings here use the per-filter manual `order`, never the keyset sort
/// modes of public browsing.
pub struct FilterOrganizer<R, S>
where
    R: FilterRepository + CategoryRepository,
    S: SessionProvider,
{
    repository: R,
    session: S,
}

impl<R, S> FilterOrganizer<R, S>
where
    R: FilterRepository + CategoryRepository,
    S: SessionProvider,
{
    pub fn new(repository: R, session: S) -> Self {
        Self {
            repository,
            session,
        }
    }

    /// Filters directly in `category_id`, excluding those in its subcategories.
    pub fn list_main_category(&mut self, category_id: i64) -> Result<Vec<FilterSummary>, DomainError> {
        let user = self.session.current_user()?;
        self.repository
            .list_filters(&FilterPredicate::in_main_category(user, category_id))
    }

    pub fn list_subcategory(&mut self, subcategory_id: i64) -> Result<Vec<FilterSummary>, DomainError> {
        let user = self.session.current_user()?;
        self.repository
            .list_filters(&FilterPredicate::in_subcategory(user, subcategory_id))
    }

    pub fn list_uncategorized(&mut self) -> Result<Vec<FilterSummary>, DomainError> {
        let user = self.session.current_user()?;
        self.repository
            .list_filters(&FilterPredicate::uncategorized(user))
    }

    /// Unset the category (and subcategory) of an owned filter, or only its
    /// subcategory.
    #[instrument(level = "debug", skip(self))]
    pub fn clear_category(&mut self, filter_id: i64, scope: ClearScope) -> Result<(), DomainError> {
        let user = self.session.current_user()?;
        owned_filter(&mut self.repository, filter_id, &user)?;

        if !self.repository.clear_category(filter_id, &user, scope)? {
            return Err(DomainError::FilterNotFound(filter_id));
        }
        info!(filter_id, ?scope, "Cleared filter category");
        Ok(())
    }

    /// Move an owned filter into one of the caller's categories, optionally into
    /// a subcategory of that category. The filter goes to the end of its new
    /// bucket.
    #[instrument(level = "debug", skip(self))]
    pub fn assign_category(
        &mut self,
        filter_id: i64,
        category_id: i64,
        subcategory_id: Option<i64>,
    ) -> Result<(), DomainError> {
        let user = self.session.current_user()?;
        owned_filter(&mut self.repository, filter_id, &user)?;
        owned_category(&mut self.repository, category_id, &user)?;

        let target = match subcategory_id {
            Some(sub_id) => {
                let subcategory = owned_subcategory(&mut self.repository, sub_id, &user)?;
                if subcategory.category_id != category_id {
                    return Err(DomainError::Validation(format!(
                        "subcategory {sub_id} does not belong to category {category_id}"
                    )));
                }
                FilterPredicate::in_subcategory(user.clone(), sub_id)
            }
            None => FilterPredicate::in_main_category(user.clone(), category_id),
        };

        let order = self.repository.next_order(&target)?;
        if !self
            .repository
            .set_category(filter_id, &user, category_id, subcategory_id, order)?
        {
            return Err(DomainError::FilterNotFound(filter_id));
        }
        info!(filter_id, category_id, ?subcategory_id, order, "Assigned filter category");
        Ok(())
    }

    /// Set the manual position of an owned filter within its bucket.
    pub fn move_filter(&mut self, filter_id: i64, order: i64) -> Result<(), DomainError> {
        let user = self.session.current_user()?;
        owned_filter(&mut self.repository, filter_id, &user)?;

        if !self.repository.set_order(filter_id, &user, order)? {
            return Err(DomainError::FilterNotFound(filter_id));
        }
        debug!(filter_id, order, "Moved filter");
        Ok(())
    }
}
