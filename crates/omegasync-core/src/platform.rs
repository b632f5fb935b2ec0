//! The remote platform contract consumed by the synchronizer.

use async_trait::async_trait;

use crate::error::Result;
use crate::ident::Ident;
use crate::model::{Member, Payload, Presence, Relation, ResourceKind};

/// Authenticated access to the grading platform.
///
/// Implementations attach credentials themselves and must be safe to share
/// between concurrent workers (`Send + Sync`). Every call fails loudly on a
/// non-ok platform status except [`Platform::probe`], which reports a
/// missing resource as [`Presence::Absent`].
///
/// # Example
///
/// ```ignore
/// use omegasync_core::{Platform, ResourceKind, Ident};
///
/// async fn exists(platform: &dyn Platform, alias: &str) -> omegasync_core::Result<bool> {
///     let presence = platform.probe(ResourceKind::Problem, &Ident::new(alias)).await?;
///     Ok(presence.exists())
/// }
/// ```
#[async_trait]
pub trait Platform: Send + Sync {
    /// Checks whether a resource exists. "Not found" is not an error.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Permission` when the resource exists but the
    /// caller cannot see or edit it.
    async fn probe(&self, kind: ResourceKind, alias: &Ident) -> Result<Presence>;

    /// Creates a resource from a full payload.
    async fn create(&self, kind: ResourceKind, payload: &Payload) -> Result<()>;

    /// Replaces every scalar field of an existing resource.
    async fn update(&self, kind: ResourceKind, payload: &Payload) -> Result<()>;

    /// Lists the current members of a relation.
    async fn list_members(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
    ) -> Result<Vec<Member>>;

    async fn add_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()>;

    async fn remove_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()>;

    /// Changes the attributes of an existing keyed member in place.
    async fn update_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()>;
}
