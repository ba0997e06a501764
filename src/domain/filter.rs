// src/domain/filter.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{POPULARITY_PER_EXPORT, POPULARITY_PER_VIEW};
use crate::domain::DomainError;

/// Identifier handed out by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(DomainError::Validation(format!(
                "unknown visibility '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub id: i64,
    pub owner_id: OwnerId,
    pub name: String,
    pub description: Option<String>,
    /// Payload imported by the game, stored verbatim.
    pub config: String,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub order: i64,
    pub visibility: Visibility,
    pub popularity: f64,
    pub view_count: i64,
    pub export_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Filter {
    pub fn is_owned_by(&self, user: &OwnerId) -> bool {
        &self.owner_id == user
    }

    /// Public filters are visible to everyone, private ones only to their owner.
    pub fn is_visible_to(&self, user: &OwnerId) -> bool {
        self.visibility == Visibility::Public || self.is_owned_by(user)
    }

    pub fn summary(&self) -> FilterSummary {
        FilterSummary {
            id: self.id,
            owner_id: self.owner_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
            order: self.order,
            visibility: self.visibility,
            popularity: self.popularity,
            view_count: self.view_count,
            export_count: self.export_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Listing projection of a filter, without the config payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub id: i64,
    pub owner_id: OwnerId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub order: i64,
    pub visibility: Visibility,
    pub popularity: f64,
    pub view_count: i64,
    pub export_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFilter {
    pub name: String,
    pub description: Option<String>,
    pub config: String,
    pub visibility: Visibility,
}

/// Partial edit; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct FilterUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<String>,
    pub visibility: Option<Visibility>,
}

impl FilterUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.config.is_none()
            && self.visibility.is_none()
    }

    pub fn apply(&self, filter: &mut Filter) {
        if let Some(name) = &self.name {
            filter.name = name.clone();
        }
        if let Some(description) = &self.description {
            filter.description = Some(description.clone());
        }
        if let Some(config) = &self.config {
            filter.config = config.clone();
        }
        if let Some(visibility) = self.visibility {
            filter.visibility = visibility;
        }
    }
}

/// Usage events that bump a filter's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricEvent {
    View,
    Export,
}

impl MetricEvent {
    pub fn popularity_delta(&self) -> f64 {
        match self {
            MetricEvent::View => POPULARITY_PER_VIEW,
            MetricEvent::Export => POPULARITY_PER_EXPORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::sample_filter;

    #[test]
    fn given_private_filter_when_checking_visibility_then_only_owner_sees_it() {
        let mut filter = sample_filter(1, "alice");
        filter.visibility = Visibility::Private;

        assert!(filter.is_visible_to(&OwnerId::new("alice")));
        assert!(!filter.is_visible_to(&OwnerId::new("bob")));
    }

    #[test]
    fn given_public_filter_when_checking_visibility_then_everyone_sees_it() {
        let filter = sample_filter(1, "alice");

        assert!(filter.is_visible_to(&OwnerId::new("bob")));
    }

    #[test]
    fn given_partial_update_when_applying_then_only_touches_given_fields() {
        let mut filter = sample_filter(1, "alice");
        let update = FilterUpdate {
            name: Some("Iron only".to_string()),
            ..Default::default()
        };

        update.apply(&mut filter);

        assert_eq!(filter.name, "Iron only");
        assert_eq!(filter.config, "{}");
    }

    #[test]
    fn given_unknown_visibility_when_parsing_then_returns_validation_error() {
        assert_eq!("private".parse::<Visibility>().unwrap(), Visibility::Private);
        assert!("hidden".parse::<Visibility>().is_err());
    }
}
