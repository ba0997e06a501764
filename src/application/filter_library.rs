// src/application/filter_library.rs
use tracing::{info, instrument};

use crate::application::access::{owned_filter, visible_filter};
use crate::application::{FilterRepository, SessionProvider};
use crate::domain::{DomainError, Filter, FilterPredicate, FilterUpdate, NewFilter};
use crate::util::text::validate_name;
use crate::util::time;

/// Create, read, edit and delete filters.
pub struct FilterLibrary<R: FilterRepository, S: SessionProvider> {
    repository: R,
    session: S,
}

impl<R: FilterRepository, S: SessionProvider> FilterLibrary<R, S> {
    pub fn new(repository: R, session: S) -> Self {
        Self {
            repository,
            session,
        }
    }

    /// New filters start uncategorized, at the end of that bucket.
    #[instrument(level = "debug", skip(self, new), fields(name = %new.name))]
    pub fn create_filter(&mut self, new: &NewFilter) -> Result<Filter, DomainError> {
        let user = self.session.current_user()?;
        let new = NewFilter {
            name: validate_name("filter", &new.name)?,
            ..new.clone()
        };

        let order = self
            .repository
            .next_order(&FilterPredicate::uncategorized(user.clone()))?;
        let filter = self
            .repository
            .insert_filter(&user, &new, order, time::now())?;

        info!(filter_id = filter.id, owner = %user, "Created filter");
        Ok(filter)
    }

    /// Anyone may read a public filter; private ones only by their owner.
    pub fn get_filter(&mut self, filter_id: i64) -> Result<Filter, DomainError> {
        let user = self.session.current_user().ok();
        visible_filter(&mut self.repository, filter_id, user.as_ref())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn update_filter(&mut self, filter_id: i64, update: &FilterUpdate) -> Result<Filter, DomainError> {
        let user = self.session.current_user()?;
        let mut filter = owned_filter(&mut self.repository, filter_id, &user)?;
        if update.is_empty() {
            return Ok(filter);
        }

        let update = FilterUpdate {
            name: update
                .name
                .as_deref()
                .map(|name| validate_name("filter", name))
                .transpose()?,
            ..update.clone()
        };
        update.apply(&mut filter);
        filter.updated_at = time::now();
        self.repository.save_filter(&filter)?;

        info!(filter_id, "Updated filter");
        Ok(filter)
    }

    pub fn delete_filter(&mut self, filter_id: i64) -> Result<(), DomainError> {
        let user = self.session.current_user()?;
        owned_filter(&mut self.repository, filter_id, &user)?;

        if !self.repository.delete_filter(filter_id, &user)? {
            return Err(DomainError::FilterNotFound(filter_id));
        }
        info!(filter_id, "Deleted filter");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::StaticSession;
    use crate::domain::{OwnerId, Visibility};
    use crate::util::testing::{sample_filter, MockFilterStore};

    fn new_filter(name: &str) -> NewFilter {
        NewFilter {
            name: name.to_string(),
            description: Some("Routes iron plates left".to_string()),
            config: r#"{"rules":[]}"#.to_string(),
            visibility: Visibility::Public,
        }
    }

    #[test]
    fn given_signed_in_user_when_creating_filter_then_owner_comes_from_session() {
        // Arrange
        let mut store = MockFilterStore::builder().build();

        // Act
        let filter = FilterLibrary::new(&mut store, StaticSession::signed_in("alice"))
            .create_filter(&new_filter("  Iron sorter "))
            .unwrap();

        // Assert
        assert_eq!(filter.owner_id, OwnerId::new("alice"));
        assert_eq!(filter.name, "Iron sorter");
        assert_eq!(filter.category_id, None);
        assert_eq!(filter.popularity, 0.0);
    }

    #[test]
    fn given_existing_uncategorized_filters_when_creating_then_appends_order() {
        let mut existing = sample_filter(1, "alice");
        existing.order = 3;
        let mut store = MockFilterStore::builder().with_filter(existing).build();

        let filter = FilterLibrary::new(&mut store, StaticSession::signed_in("alice"))
            .create_filter(&new_filter("Copper"))
            .unwrap();

        assert_eq!(filter.order, 4);
    }

    #[test]
    fn given_anonymous_session_when_creating_filter_then_unauthenticated() {
        let mut library = FilterLibrary::new(MockFilterStore::builder().build(), StaticSession::anonymous());

        assert!(matches!(
            library.create_filter(&new_filter("Copper")),
            Err(DomainError::Unauthenticated)
        ));
    }

    #[test]
    fn given_foreign_filter_when_updating_then_returns_not_found_and_keeps_name() {
        let mut store = MockFilterStore::builder()
            .with_filter(sample_filter(1, "bob"))
            .build();
        let update = FilterUpdate {
            name: Some("Hijacked".to_string()),
            ..Default::default()
        };

        let result = FilterLibrary::new(&mut store, StaticSession::signed_in("alice"))
            .update_filter(1, &update);

        assert!(matches!(result, Err(DomainError::FilterNotFound(1))));
        assert_ne!(store.filter(1).unwrap().name, "Hijacked");
    }

    #[test]
    fn given_owned_filter_when_updating_then_bumps_updated_at() {
        let original = sample_filter(1, "alice");
        let before = original.updated_at;
        let mut store = MockFilterStore::builder().with_filter(original).build();
        let update = FilterUpdate {
            visibility: Some(Visibility::Private),
            ..Default::default()
        };

        let updated = FilterLibrary::new(&mut store, StaticSession::signed_in("alice"))
            .update_filter(1, &update)
            .unwrap();

        assert_eq!(updated.visibility, Visibility::Private);
        assert!(updated.updated_at > before);
        assert_eq!(store.filter(1).unwrap().visibility, Visibility::Private);
    }

    #[test]
    fn given_private_foreign_filter_when_reading_then_returns_not_found() {
        let mut filter = sample_filter(1, "bob");
        filter.visibility = Visibility::Private;
        let store = MockFilterStore::builder().with_filter(filter).build();

        let result = FilterLibrary::new(store, StaticSession::signed_in("alice")).get_filter(1);

        assert!(matches!(result, Err(DomainError::FilterNotFound(1))));
    }

    #[test]
    fn given_owned_filter_when_deleting_then_removes_it() {
        let mut store = MockFilterStore::builder()
            .with_filter(sample_filter(1, "alice"))
            .build();

        FilterLibrary::new(&mut store, StaticSession::signed_in("alice"))
            .delete_filter(1)
            .unwrap();

        assert!(store.filter(1).is_none());
    }

    #[test]
    fn given_foreign_filter_when_deleting_then_keeps_it() {
        let mut store = MockFilterStore::builder()
            .with_filter(sample_filter(1, "bob"))
            .build();

        let result = FilterLibrary::new(&mut store, StaticSession::signed_in("alice")).delete_filter(1);

        assert!(result.is_err());
        assert!(store.filter(1).is_some());
    }
}
