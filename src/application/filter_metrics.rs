// src/application/filter_metrics.rs
use tracing::debug;

use crate::application::access::visible_filter;
use crate::application::{FilterRepository, SessionProvider};
use crate::domain::{DomainError, MetricEvent};

/// Usage counters. Increments happen in place at the data layer, never as
/// read-modify-write here.
pub struct FilterMetrics<R: FilterRepository, S: SessionProvider> {
    repository: R,
    session: S,
}

impl<R: FilterRepository, S: SessionProvider> FilterMetrics<R, S> {
    pub fn new(repository: R, session: S) -> Self {
        Self {
            repository,
            session,
        }
    }

    pub fn record_view(&mut self, filter_id: i64) -> Result<(), DomainError> {
        self.record(filter_id, MetricEvent::View)
    }

    pub fn record_export(&mut self, filter_id: i64) -> Result<(), DomainError> {
        self.record(filter_id, MetricEvent::Export)
    }

    fn record(&mut self, filter_id: i64, event: MetricEvent) -> Result<(), DomainError> {
        let user = self.session.current_user().ok();
        visible_filter(&mut self.repository, filter_id, user.as_ref())?;

        if !self.repository.record_metric(filter_id, event)? {
            return Err(DomainError::FilterNotFound(filter_id));
        }
        debug!(filter_id, ?event, "Recorded filter metric");
        Ok(())
    }
}
