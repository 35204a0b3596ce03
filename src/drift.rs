//! Concurrent comparison of live and declared instance maps.

mod compare;

pub use compare::compare_instance;

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{Instrument, Span};

use crate::instance::{Attribute, InstanceMap, resolve_attributes};
use crate::report::Report;

pub const DEFAULT_WORKERS: usize = 4;

/// Fans comparisons out over a fixed pool of tokio tasks.
///
/// Inputs are shared read-only; results arrive over a channel and are
/// returned in completion order, which callers must not rely on.
#[derive(Debug, Clone, Copy)]
pub struct DriftChecker {
    workers: usize,
}

impl Default for DriftChecker {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl DriftChecker {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }


    /// Produces exactly one report per instance ID found in either map.
    pub async fn check_drift(
        &self,
        span: &Span,
        live: Arc<InstanceMap>,
        declared: Arc<InstanceMap>,
        attributes: &[Attribute],
    ) -> Vec<Report> {
        let attributes: Arc<[Attribute]> = resolve_attributes(attributes).into();
        let ids: BTreeSet<String> = live.keys().chain(declared.keys()).cloned().collect();
        let total = ids.len();
        if total == 0 {
            return Vec::new();
        }

        let pool_size = self.workers.min(total);
        tracing::debug!(
            parent: span,
            instances = total,
            workers = pool_size,
            "dispatching drift comparisons"
        );

        let (job_tx, job_rx) = mpsc::channel::<String>(pool_size);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<Report>();

        let mut workers = JoinSet::new();
        workers.spawn(
            async move {
                for id in ids {
                    if job_tx.send(id).await.is_err() {
                        break;
                    }
                }
            }
            .instrument(tracing::debug_span!(parent: span, "drift_feeder")),
        );

        for worker in 0..pool_size {
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            let live = Arc::clone(&live);
            let declared = Arc::clone(&declared);
            let attributes = Arc::clone(&attributes);

            workers.spawn(
                async move {
                    loop {
                        let next = jobs.lock().await.recv().await;
                        let Some(instance_id) = next else {
                            break;
                        };

                        let live_instance = live.get(&instance_id);
                        let declared_instance = declared.get(&instance_id);
                        if live_instance.is_none() || declared_instance.is_none() {
                            tracing::info!(
                                instance_id = %instance_id,
                                in_live = live_instance.is_some(),
                                in_declared = declared_instance.is_some(),
                                "instance missing on one side"
                            );
                        } else {
                            tracing::debug!(instance_id = %instance_id, "comparing live and declared instance");
                        }

                        let report = compare_instance(
                            &instance_id,
                            live_instance,
                            declared_instance,
                            &attributes,
                        );
                        if results.send(report).is_err() {
                            break;
                        }
                    }
                }
                .instrument(tracing::debug_span!(parent: span, "drift_worker", worker)),
            );
        }
        drop(result_tx);

        let mut reports = Vec::with_capacity(total);
        while let Some(report) = result_rx.recv().await {
            reports.push(report);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
                tracing::warn!(parent: span, error = %err, "drift task did not complete");
            }
        }

        tracing::info!(
            parent: span,
            reports = reports.len(),
            drifted = reports.iter().filter(|r| r.has_drift()).count(),
            "drift reports collected"
        );
        reports
    }
}
