//! Per-resource synchronization.

use crate::error::{Result, SyncError};
use crate::ident::Ident;
use crate::model::{Presence, ResourceConfig, ResourceKind};
use crate::platform::Platform;
use crate::reconcile::{ReconcileOutcome, SubresourceReconciler};

/// Result of synchronizing one resource whose scalar upsert succeeded.
#[derive(Debug)]
pub struct SyncOutcome {
    pub kind: ResourceKind,
    pub alias: Ident,
    /// Whether the resource was created by this run.
    pub created: bool,
    pub relations: Vec<ReconcileOutcome>,
}

impl SyncOutcome {
    pub fn failed_mutations(&self) -> usize {
        self.relations.iter().map(|r| r.failures.len()).sum()
    }

    pub fn applied_mutations(&self) -> usize {
        self.relations.iter().map(|r| r.applied).sum()
    }
}

/// Converges one resource: existence probe, full-payload create or update,
/// then every managed relation in turn.
pub struct Synchronizer<'a, P: Platform + ?Sized> {
    platform: &'a P,
    /// Never added to or removed from admins.
    actor: Ident,
    can_create: bool,
}

impl<'a, P: Platform + ?Sized> Synchronizer<'a, P> {
    pub fn new(platform: &'a P, actor: Ident, can_create: bool) -> Self {
        Self {
            platform,
            actor,
            can_create,
        }
    }

    /// Synchronizes `config`.
    ///
    /// A failed probe or upsert aborts the resource before any relation is
    /// touched. Relation failures do not undo the upsert and do not stop the
    /// remaining relations; they are reported in [`SyncOutcome`].
    ///
    /// # Errors
    ///
    /// `SyncError::ResourceNotFound` when the resource is absent and
    /// creation is not allowed, plus whatever the platform reports for the
    /// probe or upsert. Authentication failures during reconciliation are
    /// also returned.
    pub async fn sync(&self, config: &ResourceConfig) -> Result<SyncOutcome> {
        let kind = config.kind;
        let alias = &config.alias;
        if alias.is_empty() {
            return Err(SyncError::invalid_resource(format!("{kind} has an empty alias")));
        }

        let presence = self.platform.probe(kind, alias).await?;
        let payload = config.payload();

        let created = match presence {
            Presence::Absent if !self.can_create => {
                return Err(SyncError::not_found(kind, alias.as_str()));
            }
            Presence::Absent => {
                tracing::info!(%kind, %alias, "Resource doesn't exist, creating");
                self.platform.create(kind, &payload).await?;
                true
            }
            Presence::Present(_) => {
                tracing::info!(%kind, %alias, "Updating resource");
                self.platform.update(kind, &payload).await?;
                false
            }
        };

        let mut relations = Vec::new();
        for (relation, desired) in config.subresources.managed() {
            let reconciler = SubresourceReconciler::for_relation(relation, self.actor.clone());
            let outcome = reconciler
                .reconcile(self.platform, kind, alias, &desired)
                .await?;
            if !outcome.is_clean() {
                tracing::warn!(
                    %kind,
                    %alias,
                    %relation,
                    failures = outcome.failures.len(),
                    "Relation only partially reconciled"
                );
            }
            relations.push(outcome);
        }

        tracing::info!(%kind, %alias, created, "Resource synchronized");
        Ok(SyncOutcome {
            kind,
            alias: alias.clone(),
            created,
            relations,
        })
    }
}
