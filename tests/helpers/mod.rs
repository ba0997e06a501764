use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use conveyor_filters::application::{CategoryRepository, FilterRepository};
use conveyor_filters::domain::{
    Category, Filter, FilterPredicate, MetricEvent, NewFilter, OwnerId, Subcategory, Visibility,
};
use conveyor_filters::infrastructure::SqliteRepository;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test fixture for working with a throwaway filter database
#[allow(dead_code)]
pub struct TestDatabase {
    _temp_dir: TempDir,
    pub database_path: PathBuf,
}

#[allow(dead_code)]
impl TestDatabase {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir().context("Failed to create temporary directory")?;
        let database_path = temp_dir.path().join("data").join("filters.db");

        Ok(Self {
            _temp_dir: temp_dir,
            database_path,
        })
    }

    pub fn open_repository(&self) -> Result<SqliteRepository> {
        SqliteRepository::open(&self.database_path)
    }
}

/// Fixed base time so sort keys are predictable.
#[allow(dead_code)]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Shape of a seeded filter; metrics are reached by replaying events.
#[allow(dead_code)]
pub struct Seed<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub visibility: Visibility,
    pub minutes: i64,
    pub views: u32,
    pub exports: u32,
}

#[allow(dead_code)]
impl<'a> Seed<'a> {
    pub fn public(owner: &'a str, name: &'a str) -> Self {
        Self {
            owner,
            name,
            visibility: Visibility::Public,
            minutes: 0,
            views: 0,
            exports: 0,
        }
    }

    pub fn private(owner: &'a str, name: &'a str) -> Self {
        Self {
            visibility: Visibility::Private,
            ..Self::public(owner, name)
        }
    }

    pub fn at_minute(mut self, minutes: i64) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn views(mut self, views: u32) -> Self {
        self.views = views;
        self
    }

    pub fn exports(mut self, exports: u32) -> Self {
        self.exports = exports;
        self
    }

    pub fn insert<R: FilterRepository>(&self, repo: &mut R) -> Result<Filter> {
        let owner = OwnerId::new(self.owner);
        let new = NewFilter {
            name: self.name.to_string(),
            description: Some(format!("{} routing", self.name)),
            config: format!(r#"{{"name":"{}"}}"#, self.name),
            visibility: self.visibility,
        };
        let order = repo.next_order(&FilterPredicate::uncategorized(owner.clone()))?;
        let at = base_time() + Duration::minutes(self.minutes);
        let filter = repo.insert_filter(&owner, &new, order, at)?;

        for _ in 0..self.views {
            repo.record_metric(filter.id, MetricEvent::View)?;
        }
        for _ in 0..self.exports {
            repo.record_metric(filter.id, MetricEvent::Export)?;
        }
        Ok(repo
            .get_filter(filter.id)?
            .context("Seeded filter disappeared")?)
    }
}

#[allow(dead_code)]
pub fn seed_category<R: CategoryRepository>(
    repo: &mut R,
    owner: &str,
    name: &str,
) -> Result<Category> {
    Ok(repo.insert_category(&OwnerId::new(owner), name, base_time())?)
}

#[allow(dead_code)]
pub fn seed_subcategory<R: CategoryRepository>(
    repo: &mut R,
    parent: &Category,
    name: &str,
) -> Result<Subcategory> {
    Ok(repo.insert_subcategory(parent, name, base_time())?)
}
