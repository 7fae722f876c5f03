//! Concurrent batch dispatcher: screens a batch of applications, one task per
//! application, and returns the accepted subset.
//!
//! Flow per task: resolve criteria → evaluate → send accepted application into
//! the result channel. The dispatcher joins every task before the channel is
//! drained, so the result is complete (or, after cancellation, contains
//! everything accepted up to that point). Result order is unspecified.
//!
//! Per-item failures never fail the batch: they are logged and counted in the
//! batch summary.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::matching::evaluator::score;
use crate::matching::resolver::CriteriaResolver;
use crate::models::application::Application;

/// Tuning knobs for the dispatcher. The defaults reproduce an unbounded
/// fan-out with no deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatcherConfig {
    /// Upper bound on applications screened at once. `None` = unbounded.
    pub max_concurrency: Option<usize>,
    /// Batch deadline; when it passes, screening stops and partial results
    /// are returned.
    pub deadline: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Accepted,
    Rejected,
    Unresolved,
    Cancelled,
}

/// Per-batch tally, logged once the batch completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub submitted: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub unresolved: usize,
    pub cancelled: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Accepted => self.accepted += 1,
            Outcome::Rejected => self.rejected += 1,
            Outcome::Unresolved => self.unresolved += 1,
            Outcome::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Clone)]
pub struct ApplicationMatcher {
    resolver: CriteriaResolver,
    limit: Option<Arc<Semaphore>>,
    deadline: Option<Duration>,
}

impl ApplicationMatcher {
    pub fn new(resolver: CriteriaResolver, config: MatcherConfig) -> Self {
        Self {
            resolver,
            limit: config.max_concurrency.map(|permits| {
                Arc::new(Semaphore::new(permits.clamp(1, Semaphore::MAX_PERMITS)))
            }),
            deadline: config.deadline,
        }
    }

    /// Screens `applications` and returns those that clear the 4-of-7 rule.
    /// Never fails; the worst case is an empty result.
    pub async fn process_applications(&self, applications: Vec<Application>) -> Vec<Application> {
        self.process_applications_until(applications, CancellationToken::new())
            .await
    }

    /// Like [`process_applications`](Self::process_applications), but stops
    /// early when `cancel` fires and returns whatever was accepted so far.
    pub async fn process_applications_until(
        &self,
        applications: Vec<Application>,
        cancel: CancellationToken,
    ) -> Vec<Application> {
        let (accepted, summary) = self.run_batch(applications, cancel).await;
        info!(
            submitted = summary.submitted,
            accepted = summary.accepted,
            rejected = summary.rejected,
            unresolved = summary.unresolved,
            cancelled = summary.cancelled,
            failed = summary.failed,
            "application batch screened"
        );
        accepted
    }

    async fn run_batch(
        &self,
        applications: Vec<Application>,
        cancel: CancellationToken,
    ) -> (Vec<Application>, BatchSummary) {
        let mut summary = BatchSummary {
            submitted: applications.len(),
            ..Default::default()
        };
        // Child token so the deadline never cancels the caller's token.
        let cancel = cancel.child_token();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();

        for application in applications {
            if cancel.is_cancelled() {
                summary.record(Outcome::Cancelled);
                continue;
            }
            let resolver = self.resolver.clone();
            let limit = self.limit.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Outcome::Cancelled,
                    outcome = screen(resolver, limit, application, tx) => outcome,
                }
            });
        }
        drop(tx);

        let deadline = self.deadline.map(|d| Instant::now() + d);
        loop {
            let joined = match deadline {
                Some(at) if !cancel.is_cancelled() => tokio::select! {
                    joined = tasks.join_next() => joined,
                    _ = tokio::time::sleep_until(at) => {
                        warn!("application batch deadline reached, returning partial results");
                        cancel.cancel();
                        continue;
                    }
                },
                _ => tasks.join_next().await,
            };
            match joined {
                Some(Ok(outcome)) => summary.record(outcome),
                Some(Err(e)) => {
                    warn!(error = %e, "application screening task failed");
                    summary.failed += 1;
                }
                None => break,
            }
        }

        // Every sender is gone once all tasks have finished, so this drains
        // to completion without waiting.
        let mut accepted = Vec::with_capacity(summary.accepted);
        while let Some(application) = rx.recv().await {
            accepted.push(application);
        }

        (accepted, summary)
    }
}

async fn screen(
    resolver: CriteriaResolver,
    limit: Option<Arc<Semaphore>>,
    application: Application,
    tx: mpsc::UnboundedSender<Application>,
) -> Outcome {
    let _permit = match limit {
        Some(limit) => match limit.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => return Outcome::Cancelled,
        },
        None => None,
    };

    let criteria = match resolver.resolve(application.jid).await {
        Ok(criteria) => criteria,
        Err(e) => {
            warn!(
                job_id = application.jid,
                applicant = %application.name,
                error = %e,
                "dropping application: job criteria unresolved"
            );
            return Outcome::Unresolved;
        }
    };

    let result = score(&application, &criteria);
    debug!(
        job_id = application.jid,
        applicant = %application.name,
        matched = result.matched,
        total = result.total,
        "application scored"
    );

    if !result.is_accepted() {
        return Outcome::Rejected;
    }
    if tx.send(application).is_err() {
        return Outcome::Cancelled;
    }
    Outcome::Accepted
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::matching::evaluator::matches;
    use crate::matching::resolver::testing::{criteria, MemoryCache, MemoryStore};
    use crate::matching::resolver::DEFAULT_CACHE_TTL;
    use crate::models::application::ApplicationDetails;

    fn matcher(
        cache: Arc<MemoryCache>,
        store: Arc<MemoryStore>,
        config: MatcherConfig,
    ) -> ApplicationMatcher {
        ApplicationMatcher::new(CriteriaResolver::new(cache, store, DEFAULT_CACHE_TTL), config)
    }

    /// Scores 4/7 against `criteria(..)`.
    fn accepted_app(name: &str, jid: i64) -> Application {
        Application {
            name: name.to_string(),
            age: "30".to_string(),
            jid,
            job_application: ApplicationDetails {
                notice_period: 10,
                experience: 3,
                location: vec![1],
                technology_stack: vec![9],
                qualifications: vec![9],
                shifts: vec![1],
                jobtype: vec![9],
            },
        }
    }

    /// Scores 1/7 against `criteria(..)`.
    fn rejected_app(name: &str, jid: i64) -> Application {
        Application {
            name: name.to_string(),
            age: "30".to_string(),
            jid,
            job_application: ApplicationDetails {
                notice_period: 90,
                experience: 3,
                technology_stack: vec![7],
                ..Default::default()
            },
        }
    }

    fn names(applications: &[Application]) -> BTreeSet<String> {
        applications.iter().map(|a| a.name.clone()).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_empty_batch_returns_empty() {
        let matcher = matcher(
            Arc::new(MemoryCache::default()),
            Arc::new(MemoryStore::default()),
            MatcherConfig::default(),
        );
        assert!(matcher.process_applications(vec![]).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_returns_only_accepted_resolvable_applications() {
        let store = Arc::new(MemoryStore::with_jobs([criteria(1), criteria(2)]));
        let matcher = matcher(Arc::new(MemoryCache::default()), store, MatcherConfig::default());

        let batch = vec![
            accepted_app("a", 1),
            rejected_app("b", 1),
            accepted_app("c", 2),
            accepted_app("d", 99),
            rejected_app("e", 2),
        ];
        let result = matcher.process_applications(batch).await;

        assert_eq!(names(&result), BTreeSet::from(["a".to_string(), "c".to_string()]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_result_size_equals_count_of_matching_resolvable_applications() {
        let jobs = [criteria(1), criteria(2), criteria(3)];
        let store = Arc::new(MemoryStore::with_jobs(jobs.clone()));
        let matcher = matcher(Arc::new(MemoryCache::default()), store, MatcherConfig::default());

        let batch: Vec<Application> = (0..40)
            .map(|i| {
                let jid = (i % 5) + 1; // jobs 4 and 5 do not exist
                if i % 3 == 0 {
                    rejected_app(&format!("app-{i}"), jid)
                } else {
                    accepted_app(&format!("app-{i}"), jid)
                }
            })
            .collect();

        let expected: BTreeSet<String> = batch
            .iter()
            .filter(|a| {
                jobs.iter()
                    .find(|j| j.id == a.jid)
                    .is_some_and(|j| matches(a, j))
            })
            .map(|a| a.name.clone())
            .collect();

        let result = matcher.process_applications(batch).await;

        assert_eq!(result.len(), expected.len());
        assert_eq!(names(&result), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_store_outage_yields_empty_result_not_error() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..MemoryStore::with_jobs([criteria(1)])
        });
        let matcher = matcher(Arc::new(MemoryCache::default()), store, MatcherConfig::default());

        let result = matcher
            .process_applications(vec![accepted_app("a", 1), accepted_app("b", 1)])
            .await;

        assert!(result.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cache_hit_and_miss_paths_agree() {
        let batch = vec![
            accepted_app("a", 1),
            rejected_app("b", 1),
            accepted_app("c", 1),
        ];

        let cold = matcher(
            Arc::new(MemoryCache::default()),
            Arc::new(MemoryStore::with_jobs([criteria(1)])),
            MatcherConfig::default(),
        )
        .process_applications(batch.clone())
        .await;

        let warm_store = Arc::new(MemoryStore::default());
        let warm = matcher(
            Arc::new(MemoryCache::with_entry(
                1,
                serde_json::to_string(&criteria(1)).unwrap(),
            )),
            warm_store.clone(),
            MatcherConfig::default(),
        )
        .process_applications(batch)
        .await;

        assert_eq!(names(&cold), names(&warm));
        assert_eq!(warm_store.reads(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_bound_is_respected() {
        let store = Arc::new(MemoryStore {
            delay: Some(Duration::from_millis(20)),
            ..MemoryStore::with_jobs([criteria(1)])
        });
        let cache = Arc::new(MemoryCache {
            fail_reads: true,
            ..Default::default()
        });
        let matcher = matcher(
            cache,
            store.clone(),
            MatcherConfig {
                max_concurrency: Some(2),
                deadline: None,
            },
        );

        let batch: Vec<Application> = (0..8).map(|i| accepted_app(&format!("a{i}"), 1)).collect();
        let result = matcher.process_applications(batch).await;

        assert_eq!(result.len(), 8);
        assert!(store.peak_in_flight() <= 2, "peak {}", store.peak_in_flight());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_oversized_bound_is_clamped() {
        let matcher = matcher(
            Arc::new(MemoryCache::default()),
            Arc::new(MemoryStore::with_jobs([criteria(1)])),
            MatcherConfig {
                max_concurrency: Some(usize::MAX),
                deadline: None,
            },
        );

        let result = matcher.process_applications(vec![accepted_app("a", 1)]).await;
        assert_eq!(names(&result), BTreeSet::from(["a".to_string()]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unbounded_fan_out_runs_in_parallel() {
        let store = Arc::new(MemoryStore {
            delay: Some(Duration::from_millis(50)),
            ..MemoryStore::with_jobs([criteria(1)])
        });
        let cache = Arc::new(MemoryCache {
            fail_reads: true,
            ..Default::default()
        });
        let matcher = matcher(cache, store.clone(), MatcherConfig::default());

        let batch: Vec<Application> = (0..6).map(|i| accepted_app(&format!("a{i}"), 1)).collect();
        matcher.process_applications(batch).await;

        assert!(store.peak_in_flight() > 2, "peak {}", store.peak_in_flight());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pre_cancelled_batch_returns_empty() {
        let matcher = matcher(
            Arc::new(MemoryCache::default()),
            Arc::new(MemoryStore::with_jobs([criteria(1)])),
            MatcherConfig::default(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = matcher
            .process_applications_until(vec![accepted_app("a", 1)], cancel)
            .await;

        assert!(result.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deadline_returns_partial_results() {
        // Job 1 is cached and resolves immediately; job 2 needs a slow store read.
        let cache = Arc::new(MemoryCache::with_entry(
            1,
            serde_json::to_string(&criteria(1)).unwrap(),
        ));
        let store = Arc::new(MemoryStore {
            delay: Some(Duration::from_secs(5)),
            ..MemoryStore::with_jobs([criteria(2)])
        });
        let matcher = matcher(
            cache,
            store,
            MatcherConfig {
                max_concurrency: None,
                deadline: Some(Duration::from_millis(200)),
            },
        );

        let started = Instant::now();
        let result = matcher
            .process_applications(vec![accepted_app("fast", 1), accepted_app("slow", 2)])
            .await;

        assert_eq!(names(&result), BTreeSet::from(["fast".to_string()]));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_summary_counts_every_outcome() {
        let store = Arc::new(MemoryStore::with_jobs([criteria(1)]));
        let matcher = matcher(Arc::new(MemoryCache::default()), store, MatcherConfig::default());

        let (accepted, summary) = matcher
            .run_batch(
                vec![accepted_app("a", 1), rejected_app("b", 1), accepted_app("c", 42)],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(accepted.len(), 1);
        assert_eq!(
            summary,
            BatchSummary {
                submitted: 3,
                accepted: 1,
                rejected: 1,
                unresolved: 1,
                cancelled: 0,
                failed: 0,
            }
        );
    }
}
