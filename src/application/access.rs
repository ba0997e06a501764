// src/application/access.rs
//
// Ownership checks shared by the use cases. A missing row and a row owned by
// someone else are told apart in the logs only; callers always see NotFound.
use tracing::debug;

use crate::application::{CategoryRepository, FilterRepository};
use crate::domain::{Category, DomainError, Filter, OwnerId, Subcategory, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessDenial {
    Missing,
    ForeignOwner,
}

fn deny(kind: &'static str, id: i64, user: Option<&OwnerId>, reason: AccessDenial) {
    debug!(kind, id, user = ?user.map(OwnerId::as_str), ?reason, "Access denied");
}

pub(crate) fn owned_filter<R: FilterRepository>(
    repository: &mut R,
    id: i64,
    user: &OwnerId,
) -> Result<Filter, DomainError> {
    match repository.get_filter(id)? {
        Some(filter) if filter.is_owned_by(user) => Ok(filter),
        Some(_) => {
            deny("filter", id, Some(user), AccessDenial::ForeignOwner);
            Err(DomainError::FilterNotFound(id))
        }
        None => {
            deny("filter", id, Some(user), AccessDenial::Missing);
            Err(DomainError::FilterNotFound(id))
        }
    }
}

/// Public filters pass for anyone; private ones only for their owner.
pub(crate) fn visible_filter<R: FilterRepository>(
    repository: &mut R,
    id: i64,
    user: Option<&OwnerId>,
) -> Result<Filter, DomainError> {
    match repository.get_filter(id)? {
        Some(filter)
            if filter.visibility == Visibility::Public
                || user.is_some_and(|u| filter.is_owned_by(u)) =>
        {
            Ok(filter)
        }
        Some(_) => {
            deny("filter", id, user, AccessDenial::ForeignOwner);
            Err(DomainError::FilterNotFound(id))
        }
        None => {
            deny("filter", id, user, AccessDenial::Missing);
            Err(DomainError::FilterNotFound(id))
        }
    }
}

pub(crate) fn owned_category<R: CategoryRepository>(
    repository: &mut R,
    id: i64,
    user: &OwnerId,
) -> Result<Category, DomainError> {
    match repository.get_category(id)? {
        Some(category) if &category.owner_id == user => Ok(category),
        Some(_) => {
            deny("category", id, Some(user), AccessDenial::ForeignOwner);
            Err(DomainError::CategoryNotFound(id))
        }
        None => {
            deny("category", id, Some(user), AccessDenial::Missing);
            Err(DomainError::CategoryNotFound(id))
        }
    }
}

pub(crate) fn owned_subcategory<R: CategoryRepository>(
    repository: &mut R,
    id: i64,
    user: &OwnerId,
) -> Result<Subcategory, DomainError> {
    match repository.get_subcategory(id)? {
        Some(subcategory) if &subcategory.owner_id == user => Ok(subcategory),
        Some(_) => {
            deny("subcategory", id, Some(user), AccessDenial::ForeignOwner);
            Err(DomainError::SubcategoryNotFound(id))
        }
        None => {
            deny("subcategory", id, Some(user), AccessDenial::Missing);
            Err(DomainError::SubcategoryNotFound(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::{sample_filter, MockFilterStore};

    #[test]
    fn given_foreign_and_missing_filters_when_checking_ownership_then_errors_are_identical() {
        // Arrange
        let mut store = MockFilterStore::builder()
            .with_filter(sample_filter(1, "bob"))
            .build();
        let alice = OwnerId::new("alice");

        // Act
        let foreign = owned_filter(&mut store, 1, &alice).unwrap_err();
        let missing = owned_filter(&mut store, 2, &alice).unwrap_err();

        // Assert
        assert!(matches!(foreign, DomainError::FilterNotFound(1)));
        assert!(matches!(missing, DomainError::FilterNotFound(2)));
        assert_eq!(foreign.to_string(), "Filter not found: 1");
    }

    #[test]
    fn given_private_filter_when_anonymous_checks_visibility_then_not_found() {
        let mut filter = sample_filter(1, "bob");
        filter.visibility = Visibility::Private;
        let mut store = MockFilterStore::builder().with_filter(filter).build();

        assert!(visible_filter(&mut store, 1, None).is_err());
        assert!(visible_filter(&mut store, 1, Some(&OwnerId::new("bob"))).is_ok());
    }

    #[test]
    fn given_public_filter_when_anonymous_checks_visibility_then_passes() {
        let mut store = MockFilterStore::builder()
            .with_filter(sample_filter(1, "bob"))
            .build();

        assert!(visible_filter(&mut store, 1, None).is_ok());
    }
}
