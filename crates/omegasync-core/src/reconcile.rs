//! Generic diff-and-apply engine for one relation.
//!
//! [`plan`] is a pure function of the current members, the desired members,
//! an exclusion predicate and an optional attribute comparison.
//! [`SubresourceReconciler`] binds those strategies to a [`Relation`] and
//! applies the resulting plan through a [`Platform`].

use std::collections::BTreeMap;

use crate::error::{Result, SyncError};
use crate::ident::Ident;
use crate::model::{ContestProblem, Member, Relation, ResourceKind, Tag};
use crate::platform::Platform;

/// Tags whose name starts with this prefix are reserved by the platform.
pub const RESTRICTED_TAG_PREFIX: &str = "problemRestrictedTag";

pub fn is_restricted_tag(name: &Ident) -> bool {
    name.starts_with_ignore_case(RESTRICTED_TAG_PREFIX)
}

/// Anything that can be reconciled by identifier.
pub trait Keyed {
    fn key(&self) -> &Ident;
}

impl Keyed for Ident {
    fn key(&self) -> &Ident {
        self
    }
}

impl Keyed for Tag {
    fn key(&self) -> &Ident {
        &self.name
    }
}

impl Keyed for ContestProblem {
    fn key(&self) -> &Ident {
        &self.alias
    }
}

impl Keyed for Member {
    fn key(&self) -> &Ident {
        self.id()
    }
}

/// Mutations needed to turn the current set into the desired one.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationPlan<T> {
    pub to_add: Vec<T>,
    pub to_remove: Vec<T>,
    /// Members present on both sides whose attributes differ. Carries the
    /// desired attributes.
    pub to_update: Vec<T>,
}

impl<T> MutationPlan<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_update.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len() + self.to_update.len()
    }
}

impl<T> Default for MutationPlan<T> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_remove: Vec::new(),
            to_update: Vec::new(),
        }
    }
}

/// Computes the mutation plan for one relation.
///
/// Members are matched by [`Keyed::key`], so `"Alice"` and `"alice"` are the
/// same member. Excluded members never appear in any list. When
/// `attributes_equal` is given, members on both sides with differing
/// attributes go to `to_update` instead of being removed and re-added.
pub fn plan<T, E, A>(current: &[T], desired: &[T], exclude: E, attributes_equal: Option<A>) -> MutationPlan<T>
where
    T: Keyed + Clone,
    E: Fn(&T) -> bool,
    A: Fn(&T, &T) -> bool,
{
    let current: BTreeMap<&Ident, &T> = current.iter().map(|m| (m.key(), m)).collect();
    let desired: BTreeMap<&Ident, &T> = desired.iter().map(|m| (m.key(), m)).collect();

    let mut result = MutationPlan::default();

    for (key, wanted) in &desired {
        if exclude(*wanted) {
            continue;
        }
        match current.get(key) {
            None => result.to_add.push((*wanted).clone()),
            Some(existing) => {
                if let Some(equal) = &attributes_equal
                    && !equal(*existing, *wanted)
                {
                    result.to_update.push((*wanted).clone());
                }
            }
        }
    }

    for (key, existing) in &current {
        if !desired.contains_key(key) && !exclude(*existing) {
            result.to_remove.push((*existing).clone());
        }
    }

    result
}

type Exclusion = Box<dyn Fn(&Member) -> bool + Send + Sync>;

/// What happened while reconciling one relation.
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub relation: Relation,
    /// Mutations that succeeded.
    pub applied: usize,
    /// Mutations (or the listing call) that failed. Never includes
    /// authentication failures, which abort the reconciler instead.
    pub failures: Vec<SyncError>,
}

impl ReconcileOutcome {
    fn new(relation: Relation) -> Self {
        Self {
            relation,
            applied: 0,
            failures: Vec::new(),
        }
    }

    pub(crate) fn failed(relation: Relation, error: SyncError) -> Self {
        let mut outcome = Self::new(relation);
        outcome.failures.push(error);
        outcome
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A [`plan`] strategy bound to one relation.
pub struct SubresourceReconciler {
    relation: Relation,
    exclude: Option<Exclusion>,
    attributes_equal: Option<fn(&Member, &Member) -> bool>,
}

impl SubresourceReconciler {
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            exclude: None,
            attributes_equal: None,
        }
    }

    /// Members matching `predicate` are never added or removed.
    pub fn excluding(mut self, predicate: impl Fn(&Member) -> bool + Send + Sync + 'static) -> Self {
        self.exclude = Some(Box::new(predicate));
        self
    }

    /// Enables in-place updates for keyed members.
    pub fn comparing(mut self, attributes_equal: fn(&Member, &Member) -> bool) -> Self {
        self.attributes_equal = Some(attributes_equal);
        self
    }

    /// The acting user is never added or removed, so a run can't lock its
    /// own account out.
    pub fn admins(actor: Ident) -> Self {
        Self::new(Relation::Admins).excluding(move |member| member.id() == &actor)
    }

    pub fn tags() -> Self {
        Self::new(Relation::Tags).excluding(|member| is_restricted_tag(member.id()))
    }

    pub fn contest_problems() -> Self {
        Self::new(Relation::Problems).comparing(Member::same_attributes)
    }

    /// The reconciler configured for `relation`.
    pub fn for_relation(relation: Relation, actor: Ident) -> Self {
        match relation {
            Relation::Admins => Self::admins(actor),
            Relation::Tags => Self::tags(),
            Relation::Problems => Self::contest_problems(),
            Relation::AdminGroups | Relation::Contestants | Relation::ContestantGroups => {
                Self::new(relation)
            }
        }
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn plan(&self, current: &[Member], desired: &[Member]) -> MutationPlan<Member> {
        let exclude = |member: &Member| self.exclude.as_ref().is_some_and(|f| f(member));
        plan(current, desired, exclude, self.attributes_equal)
    }

    /// Fetches the current members, then applies removals, additions and
    /// updates in that order.
    ///
    /// Individual failures are logged, recorded and skipped. Only an
    /// authentication failure is returned as `Err`, since nothing after it
    /// can succeed either.
    pub async fn reconcile<P: Platform + ?Sized>(
        &self,
        platform: &P,
        kind: ResourceKind,
        alias: &Ident,
        desired: &[Member],
    ) -> Result<ReconcileOutcome> {
        let current = match platform.list_members(kind, alias, self.relation).await {
            Ok(current) => current,
            Err(e) if e.is_fatal_to_run() => return Err(e),
            Err(e) => {
                tracing::warn!(%kind, %alias, relation = %self.relation, error = %e, "Failed to list members");
                return Ok(ReconcileOutcome::failed(self.relation, e));
            }
        };

        let plan = self.plan(&current, desired);
        let mut outcome = ReconcileOutcome::new(self.relation);
        if plan.is_empty() {
            tracing::debug!(%kind, %alias, relation = %self.relation, "Already up to date");
            return Ok(outcome);
        }

        for member in &plan.to_remove {
            tracing::info!(%kind, %alias, relation = %self.relation, member = %member.id(), "Removing");
            let result = platform.remove_member(kind, alias, self.relation, member).await;
            self.record(&mut outcome, "remove", member, result)?;
        }
        for member in &plan.to_add {
            tracing::info!(%kind, %alias, relation = %self.relation, member = %member.id(), "Adding");
            let result = platform.add_member(kind, alias, self.relation, member).await;
            self.record(&mut outcome, "add", member, result)?;
        }
        for member in &plan.to_update {
            tracing::info!(%kind, %alias, relation = %self.relation, member = %member.id(), "Updating");
            let result = platform.update_member(kind, alias, self.relation, member).await;
            self.record(&mut outcome, "update", member, result)?;
        }

        Ok(outcome)
    }

    fn record(
        &self,
        outcome: &mut ReconcileOutcome,
        action: &'static str,
        member: &Member,
        result: Result<()>,
    ) -> Result<()> {
        match result {
            Ok(()) => {
                outcome.applied += 1;
                Ok(())
            }
            Err(e) if e.is_fatal_to_run() => Err(e),
            Err(e) => {
                tracing::warn!(relation = %self.relation, member = %member.id(), action, error = %e, "Mutation failed, skipping");
                outcome.failures.push(SyncError::SubresourceApply {
                    relation: self.relation,
                    action,
                    member: member.id().to_string(),
                    source: Box::new(e),
                });
                Ok(())
            }
        }
    }
}
