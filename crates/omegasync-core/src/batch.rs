//! Batch runner: synchronizes a list of resources and aggregates outcomes.

use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use futures_util::stream;

use crate::error::SyncError;
use crate::ident::Ident;
use crate::model::{ResourceConfig, ResourceKind};
use crate::platform::Platform;
use crate::sync::{SyncOutcome, Synchronizer};

/// Outcome of one resource in a batch.
#[derive(Debug)]
pub enum ResourceOutcome {
    Synced(SyncOutcome),
    Failed(SyncError),
    /// Not started because an authentication failure aborted the run.
    Skipped,
}

#[derive(Debug)]
pub struct ResourceReport {
    pub kind: ResourceKind,
    pub alias: Ident,
    pub title: String,
    pub outcome: ResourceOutcome,
}

impl ResourceReport {
    pub fn is_success(&self) -> bool {
        matches!(&self.outcome, ResourceOutcome::Synced(o) if o.failed_mutations() == 0)
    }
}

/// Aggregate result of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub resources: Vec<ResourceReport>,
    /// Set when an authentication failure stopped the run early.
    pub aborted: bool,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        !self.aborted && self.resources.iter().all(ResourceReport::is_success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ResourceReport> {
        self.resources.iter().filter(|r| !r.is_success())
    }
}

/// Runs the [`Synchronizer`] over many resources.
///
/// Resources are independent, so up to `jobs` of them are processed at the
/// same time over the shared platform session. A failing resource never
/// stops the others; only an authentication failure does.
pub struct BatchRunner<'a, P: Platform + ?Sized> {
    synchronizer: Synchronizer<'a, P>,
    jobs: usize,
}

impl<'a, P: Platform + ?Sized> BatchRunner<'a, P> {
    pub fn new(platform: &'a P, actor: Ident, can_create: bool) -> Self {
        Self {
            synchronizer: Synchronizer::new(platform, actor, can_create),
            jobs: 1,
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub async fn run(&self, resources: &[ResourceConfig]) -> BatchReport {
        let mut outcomes: Vec<Option<ResourceOutcome>> = resources.iter().map(|_| None).collect();
        let aborted = AtomicBool::new(false);

        {
            let synchronizer = &self.synchronizer;
            let aborted = &aborted;
            let mut pending = stream::iter(resources.iter().enumerate())
                .map(|(index, config)| async move {
                    if aborted.load(Ordering::SeqCst) {
                        return (index, None);
                    }
                    tracing::info!(kind = %config.kind, alias = %config.alias, title = %config.title, "Synchronizing");
                    (index, Some(synchronizer.sync(config).await))
                })
                .buffer_unordered(self.jobs);

            // Resources already in flight run to completion so their
            // outcome is reported; the rest are skipped.
            while let Some((index, result)) = pending.next().await {
                let Some(result) = result else {
                    continue;
                };
                let config = &resources[index];
                match result {
                    Ok(outcome) => outcomes[index] = Some(ResourceOutcome::Synced(outcome)),
                    Err(e) => {
                        tracing::error!(kind = %config.kind, alias = %config.alias, error = %e, "Synchronization failed");
                        if e.is_fatal_to_run() && !aborted.swap(true, Ordering::SeqCst) {
                            tracing::error!("Authentication failure, skipping remaining resources");
                        }
                        outcomes[index] = Some(ResourceOutcome::Failed(e));
                    }
                }
            }
        }

        let resources = resources
            .iter()
            .zip(outcomes)
            .map(|(config, outcome)| ResourceReport {
                kind: config.kind,
                alias: config.alias.clone(),
                title: config.title.clone(),
                outcome: outcome.unwrap_or(ResourceOutcome::Skipped),
            })
            .collect();

        BatchReport {
            resources,
            aborted: aborted.into_inner(),
        }
    }
}
