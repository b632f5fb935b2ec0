//! # omegasync-core
//!
//! Reconciliation engine that converges problems and contests on the
//! grading platform to their declared configuration.
//!
//! ## Overview
//!
//! - [`Synchronizer`] probes a resource, creates or fully updates it, then
//!   reconciles every managed relation.
//! - [`SubresourceReconciler`] computes a [`MutationPlan`] for one relation
//!   (admins, groups, contestants, tags, contest problems) and applies it.
//! - [`BatchRunner`] runs the synchronizer over many resources and reports
//!   an aggregate result.
//! - [`Platform`] is the remote contract; the HTTP implementation lives in
//!   `omegasync-client`, an in-memory one in `omegasync-memory`.
//!
//! Re-running a sync is always safe: against unchanged state every plan is
//! empty, and an interrupted run is finished by the next one.

mod batch;
mod error;
mod ident;
mod languages;
mod model;
mod platform;
mod reconcile;
mod sync;

pub use batch::{BatchReport, BatchRunner, ResourceOutcome, ResourceReport};
pub use error::{Result, SyncError};
pub use ident::Ident;
pub use languages::{ALL_LANGUAGES, KAREL_LANGUAGES, expand_languages};
pub use model::{
    Attachment, ContestProblem, Member, Payload, Presence, Relation, ResourceConfig,
    ResourceKind, Subresources, Tag,
};
pub use platform::Platform;
pub use reconcile::{
    Keyed, MutationPlan, RESTRICTED_TAG_PREFIX, ReconcileOutcome, SubresourceReconciler,
    is_restricted_tag, plan,
};
pub use sync::{SyncOutcome, Synchronizer};
