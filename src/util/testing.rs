// src/util/testing.rs

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::application::{BrowseQuery, BrowseScope, CategoryRepository, FilterRepository};
use crate::domain::{
    Category, ClearScope, DomainError, Filter, FilterPredicate, FilterSummary, MetricEvent,
    NewFilter, OwnerId, Subcategory, Visibility,
};

/// Fixed creation time for sample rows: 2024-01-01T00:00:00Z.
pub fn sample_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200, 0)
        .single()
        .unwrap_or_default()
}

/// Public, uncategorized filter with zeroed metrics.
pub fn sample_filter(id: i64, owner: &str) -> Filter {
    Filter {
        id,
        owner_id: OwnerId::new(owner),
        name: format!("Filter {id}"),
        description: None,
        config: "{}".to_string(),
        category_id: None,
        subcategory_id: None,
        order: 0,
        visibility: Visibility::Public,
        popularity: 0.0,
        view_count: 0,
        export_count: 0,
        created_at: sample_time(),
        updated_at: sample_time(),
    }
}

pub fn sample_category(id: i64, owner: &str) -> Category {
    Category {
        id,
        owner_id: OwnerId::new(owner),
        name: format!("Category {id}"),
        order: 0,
        created_at: sample_time(),
    }
}

pub fn sample_subcategory(id: i64, category_id: i64, owner: &str) -> Subcategory {
    Subcategory {
        id,
        category_id,
        owner_id: OwnerId::new(owner),
        name: format!("Subcategory {id}"),
        order: 0,
        created_at: sample_time(),
    }
}

/// In-memory implementation of both repository traits.
///
/// Evaluates listings with the same domain predicates and keyset comparator
/// that the SQL adapter mirrors, so use cases can be tested without a
/// database.
///
/// # Examples
///
/// ```
/// use conveyor_filters::util::testing::{sample_filter, MockFilterStore};
///
/// let store = MockFilterStore::builder()
///     .with_filter(sample_filter(1, "alice"))
///     .build();
/// assert!(store.filter(1).is_some());
/// ```
#[derive(Debug, Default)]
pub struct MockFilterStore {
    filters: BTreeMap<i64, Filter>,
    categories: BTreeMap<i64, Category>,
    subcategories: BTreeMap<i64, Subcategory>,
    next_id: i64,
}

impl MockFilterStore {
    pub fn builder() -> MockFilterStoreBuilder {
        MockFilterStoreBuilder::new()
    }

    pub fn filter(&self, id: i64) -> Option<&Filter> {
        self.filters.get(&id)
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn subcategory(&self, id: i64) -> Option<&Subcategory> {
        self.subcategories.get(&id)
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn owned_filter_mut(&mut self, id: i64, owner: &OwnerId) -> Option<&mut Filter> {
        self.filters.get_mut(&id).filter(|f| f.is_owned_by(owner))
    }
}

impl FilterRepository for MockFilterStore {
    fn insert_filter(
        &mut self,
        owner: &OwnerId,
        new: &NewFilter,
        order: i64,
        now: DateTime<Utc>,
    ) -> Result<Filter, DomainError> {
        let id = self.allocate_id();
        let filter = Filter {
            id,
            owner_id: owner.clone(),
            name: new.name.clone(),
            description: new.description.clone(),
            config: new.config.clone(),
            category_id: None,
            subcategory_id: None,
            order,
            visibility: new.visibility,
            popularity: 0.0,
            view_count: 0,
            export_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.filters.insert(id, filter.clone());
        Ok(filter)
    }

    fn get_filter(&mut self, id: i64) -> Result<Option<Filter>, DomainError> {
        Ok(self.filters.get(&id).cloned())
    }

    fn save_filter(&mut self, filter: &Filter) -> Result<(), DomainError> {
        match self.filters.get_mut(&filter.id) {
            Some(stored) => {
                stored.name = filter.name.clone();
                stored.description = filter.description.clone();
                stored.config = filter.config.clone();
                stored.visibility = filter.visibility;
                stored.updated_at = filter.updated_at;
                Ok(())
            }
            None => Err(DomainError::FilterNotFound(filter.id)),
        }
    }

    fn delete_filter(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError> {
        if self.owned_filter_mut(id, owner).is_none() {
            return Ok(false);
        }
        Ok(self.filters.remove(&id).is_some())
    }

    fn browse_filters(&mut self, query: &BrowseQuery) -> Result<Vec<FilterSummary>, DomainError> {
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let mut rows: Vec<FilterSummary> = self
            .filters
            .values()
            .filter(|f| match &query.scope {
                BrowseScope::Public => f.visibility == Visibility::Public,
                BrowseScope::Owned(predicate) => predicate.matches(f),
            })
            .filter(|f| match &needle {
                None => true,
                Some(needle) => {
                    f.name.to_lowercase().contains(needle)
                        || f.description
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(needle))
                }
            })
            .map(Filter::summary)
            .filter(|row| query.after.as_ref().map_or(true, |c| c.admits(row)))
            .collect();

        rows.sort_by(|a, b| query.sort.compare(a, b));
        rows.truncate(query.limit);
        Ok(rows)
    }

    fn list_filters(
        &mut self,
        predicate: &FilterPredicate,
    ) -> Result<Vec<FilterSummary>, DomainError> {
        let mut rows: Vec<FilterSummary> = self
            .filters
            .values()
            .filter(|f| predicate.matches(f))
            .map(Filter::summary)
            .collect();
        rows.sort_by_key(|f| (f.order, f.id));
        Ok(rows)
    }

    fn next_order(&mut self, predicate: &FilterPredicate) -> Result<i64, DomainError> {
        Ok(self
            .filters
            .values()
            .filter(|f| predicate.matches(f))
            .map(|f| f.order + 1)
            .max()
            .unwrap_or(0))
    }

    fn set_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        category_id: i64,
        subcategory_id: Option<i64>,
        order: i64,
    ) -> Result<bool, DomainError> {
        Ok(match self.owned_filter_mut(id, owner) {
            Some(filter) => {
                filter.category_id = Some(category_id);
                filter.subcategory_id = subcategory_id;
                filter.order = order;
                true
            }
            None => false,
        })
    }

    fn clear_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        scope: ClearScope,
    ) -> Result<bool, DomainError> {
        let Some(category_id) = self
            .filters
            .get(&id)
            .filter(|f| f.is_owned_by(owner))
            .map(|f| f.category_id)
        else {
            return Ok(false);
        };
        let target = match (scope, category_id) {
            (ClearScope::SubcategoryOnly, Some(category_id)) => {
                FilterPredicate::in_main_category(owner.clone(), category_id)
            }
            _ => FilterPredicate::uncategorized(owner.clone()),
        };
        let order = self
            .filters
            .values()
            .filter(|f| f.id != id && target.matches(f))
            .map(|f| f.order + 1)
            .max()
            .unwrap_or(0);

        Ok(match self.owned_filter_mut(id, owner) {
            Some(filter) => {
                if scope == ClearScope::All {
                    filter.category_id = None;
                }
                filter.subcategory_id = None;
                filter.order = order;
                true
            }
            None => false,
        })
    }

    fn set_order(&mut self, id: i64, owner: &OwnerId, order: i64) -> Result<bool, DomainError> {
        Ok(match self.owned_filter_mut(id, owner) {
            Some(filter) => {
                filter.order = order;
                true
            }
            None => false,
        })
    }

    fn record_metric(&mut self, id: i64, event: MetricEvent) -> Result<bool, DomainError> {
        Ok(match self.filters.get_mut(&id) {
            Some(filter) => {
                match event {
                    MetricEvent::View => filter.view_count += 1,
                    MetricEvent::Export => filter.export_count += 1,
                }
                filter.popularity += event.popularity_delta();
                true
            }
            None => false,
        })
    }
}

impl CategoryRepository for MockFilterStore {
    fn insert_category(
        &mut self,
        owner: &OwnerId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, DomainError> {
        let order = self
            .categories
            .values()
            .filter(|c| &c.owner_id == owner)
            .map(|c| c.order + 1)
            .max()
            .unwrap_or(0);
        let category = Category {
            id: self.allocate_id(),
            owner_id: owner.clone(),
            name: name.to_string(),
            order,
            created_at: now,
        };
        self.categories.insert(category.id, category.clone());
        Ok(category)
    }

    fn insert_subcategory(
        &mut self,
        parent: &Category,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Subcategory, DomainError> {
        let order = self
            .subcategories
            .values()
            .filter(|s| s.category_id == parent.id)
            .map(|s| s.order + 1)
            .max()
            .unwrap_or(0);
        let subcategory = Subcategory {
            id: self.allocate_id(),
            category_id: parent.id,
            owner_id: parent.owner_id.clone(),
            name: name.to_string(),
            order,
            created_at: now,
        };
        self.subcategories
            .insert(subcategory.id, subcategory.clone());
        Ok(subcategory)
    }

    fn get_category(&mut self, id: i64) -> Result<Option<Category>, DomainError> {
        Ok(self.categories.get(&id).cloned())
    }

    fn get_subcategory(&mut self, id: i64) -> Result<Option<Subcategory>, DomainError> {
        Ok(self.subcategories.get(&id).cloned())
    }

    fn list_categories(&mut self, owner: &OwnerId) -> Result<Vec<Category>, DomainError> {
        let mut categories: Vec<Category> = self
            .categories
            .values()
            .filter(|c| &c.owner_id == owner)
            .cloned()
            .collect();
        categories.sort_by_key(|c| (c.order, c.id));
        Ok(categories)
    }

    fn list_subcategories(&mut self, category_id: i64) -> Result<Vec<Subcategory>, DomainError> {
        let mut subcategories: Vec<Subcategory> = self
            .subcategories
            .values()
            .filter(|s| s.category_id == category_id)
            .cloned()
            .collect();
        subcategories.sort_by_key(|s| (s.order, s.id));
        Ok(subcategories)
    }

    fn rename_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        name: &str,
    ) -> Result<bool, DomainError> {
        Ok(match self.categories.get_mut(&id) {
            Some(category) if &category.owner_id == owner => {
                category.name = name.to_string();
                true
            }
            _ => false,
        })
    }

    fn delete_category(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError> {
        if !self
            .categories
            .get(&id)
            .is_some_and(|c| &c.owner_id == owner)
        {
            return Ok(false);
        }
        let children: Vec<i64> = self
            .subcategories
            .values()
            .filter(|s| s.category_id == id)
            .map(|s| s.id)
            .collect();
        for filter in self.filters.values_mut() {
            let in_child = filter.subcategory_id.is_some_and(|s| children.contains(&s));
            if filter.category_id == Some(id) || in_child {
                filter.category_id = None;
                filter.subcategory_id = None;
            }
        }
        self.subcategories.retain(|_, s| s.category_id != id);
        self.categories.remove(&id);
        Ok(true)
    }

    fn delete_subcategory(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError> {
        if !self
            .subcategories
            .get(&id)
            .is_some_and(|s| &s.owner_id == owner)
        {
            return Ok(false);
        }
        for filter in self.filters.values_mut() {
            if filter.subcategory_id == Some(id) {
                filter.subcategory_id = None;
            }
        }
        self.subcategories.remove(&id);
        Ok(true)
    }
}

/// Builder for MockFilterStore
///
/// Provides a fluent interface for seeding rows.
pub struct MockFilterStoreBuilder {
    store: MockFilterStore,
}

impl MockFilterStoreBuilder {
    pub fn new() -> Self {
        Self {
            store: MockFilterStore::default(),
        }
    }

    /// Seed a filter under its own id
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.bump_next_id(filter.id);
        self.store.filters.insert(filter.id, filter);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.bump_next_id(category.id);
        self.store.categories.insert(category.id, category);
        self
    }

    pub fn with_subcategory(mut self, subcategory: Subcategory) -> Self {
        self.bump_next_id(subcategory.id);
        self.store
            .subcategories
            .insert(subcategory.id, subcategory);
        self
    }

    fn bump_next_id(&mut self, id: i64) {
        self.store.next_id = self.store.next_id.max(id);
    }

    pub fn build(self) -> MockFilterStore {
        self.store
    }
}

impl Default for MockFilterStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_test_setup() -> Result<()> {
    // Set up logging first
    setup_test_logging();

    info!("Test Setup complete");
    Ok(())
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Create a filter for noisy modules
    let noisy_modules = ["rusqlite"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    // Fall back to trace when RUST_LOG is unset
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));

    // Build and set the subscriber
    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}
