use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::JobCache;
use crate::jobs::repository::JobStore;
use crate::models::job::JobCriteria;

/// Default lifetime of a cached criteria snapshot.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("job {0} does not exist")]
    JobNotFound(i64),

    #[error("job store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Cache-or-fetch resolver: job id → criteria, cache first, store on miss.
///
/// Any cache problem (unreachable, corrupt entry, failed write-back) is logged
/// and degrades to a store read. Only store outcomes can fail a resolution.
#[derive(Clone)]
pub struct CriteriaResolver {
    cache: Arc<dyn JobCache>,
    store: Arc<dyn JobStore>,
    ttl: Duration,
}

impl CriteriaResolver {
    pub fn new(cache: Arc<dyn JobCache>, store: Arc<dyn JobStore>, ttl: Duration) -> Self {
        Self { cache, store, ttl }
    }

    pub async fn resolve(&self, job_id: i64) -> Result<JobCriteria, ResolveError> {
        match self.cache.get(job_id).await {
            Ok(Some(payload)) => match serde_json::from_str::<JobCriteria>(&payload) {
                Ok(criteria) => {
                    debug!(job_id, "job criteria cache hit");
                    return Ok(criteria);
                }
                Err(e) => {
                    warn!(job_id, error = %e, "corrupt job criteria cache entry, refetching");
                }
            },
            Ok(None) => debug!(job_id, "job criteria cache miss"),
            Err(e) => warn!(job_id, error = %e, "job cache read failed, falling back to store"),
        }

        let criteria = self
            .store
            .job_criteria(job_id)
            .await?
            .ok_or(ResolveError::JobNotFound(job_id))?;

        self.populate(&criteria).await;
        Ok(criteria)
    }

    async fn populate(&self, criteria: &JobCriteria) {
        let payload = match serde_json::to_string(criteria) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(job_id = criteria.id, error = %e, "failed to serialize job criteria");
                return;
            }
        };
        if let Err(e) = self.cache.set(criteria.id, payload, self.ttl).await {
            warn!(job_id = criteria.id, error = %e, "job cache write-back failed");
        }
    }
}
