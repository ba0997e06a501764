mod helpers;

use anyhow::Result;
use conveyor_filters::application::{FilterMetrics, FilterRepository, StaticSession};
use conveyor_filters::constants::{POPULARITY_PER_EXPORT, POPULARITY_PER_VIEW};
use conveyor_filters::domain::DomainError;
use helpers::{Seed, TestDatabase};

#[test]
fn given_public_filter_when_recording_views_and_exports_then_counters_accumulate() -> Result<()> {
    // Arrange
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let filter = Seed::public("alice", "iron").insert(&mut repo)?;
    let mut metrics = FilterMetrics::new(&mut repo, StaticSession::anonymous());

    // Act
    metrics.record_view(filter.id)?;
    metrics.record_view(filter.id)?;
    metrics.record_export(filter.id)?;

    // Assert
    let after = repo.get_filter(filter.id)?.expect("exists");
    assert_eq!(after.view_count, 2);
    assert_eq!(after.export_count, 1);
    assert_eq!(after.popularity, 2.0 * POPULARITY_PER_VIEW + POPULARITY_PER_EXPORT);
    Ok(())
}

#[test]
fn given_metric_event_when_recorded_then_updated_at_is_untouched() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let filter = Seed::public("alice", "iron").insert(&mut repo)?;

    FilterMetrics::new(&mut repo, StaticSession::anonymous()).record_export(filter.id)?;

    let after = repo.get_filter(filter.id)?.expect("exists");
    assert_eq!(after.updated_at, filter.updated_at);
    Ok(())
}

#[test]
fn given_foreign_private_filter_when_recording_view_then_not_found_and_unchanged() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let secret = Seed::private("bob", "secret").insert(&mut repo)?;

    let result = FilterMetrics::new(&mut repo, StaticSession::signed_in("alice")).record_view(secret.id);

    assert!(matches!(result, Err(DomainError::FilterNotFound(id)) if id == secret.id));
    assert_eq!(repo.get_filter(secret.id)?.expect("exists").view_count, 0);
    Ok(())
}

#[test]
fn given_own_private_filter_when_recording_export_then_counts() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let mine = Seed::private("alice", "mine").insert(&mut repo)?;

    FilterMetrics::new(&mut repo, StaticSession::signed_in("alice")).record_export(mine.id)?;

    assert_eq!(repo.get_filter(mine.id)?.expect("exists").export_count, 1);
    Ok(())
}

#[test]
fn given_missing_filter_when_recording_view_then_not_found() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;

    let result = FilterMetrics::new(&mut repo, StaticSession::anonymous()).record_view(404);

    assert!(matches!(result, Err(DomainError::FilterNotFound(404))));
    Ok(())
}
