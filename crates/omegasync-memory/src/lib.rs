//! In-memory [`Platform`] backend.
//!
//! Keeps resources and their relations in maps and records every call, so
//! tests can assert which mutations a sync issued. Failures can be injected
//! per endpoint.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use omegasync_core::{
    Ident, Member, Payload, Platform, Presence, Relation, ResourceKind, Result, SyncError,
};

/// A recorded platform call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Probe(ResourceKind, String),
    Create(ResourceKind, String),
    Update(ResourceKind, String),
    List(ResourceKind, String, Relation),
    Add(ResourceKind, String, Relation, String),
    Remove(ResourceKind, String, Relation, String),
    UpdateMember(ResourceKind, String, Relation, String),
}

impl Call {
    /// Whether the call changes remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Probe(..) | Self::List(..))
    }
}

/// Which call an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Probe,
    Create,
    Update,
    List(Relation),
    Add(Relation),
    Remove(Relation),
    UpdateMember(Relation),
}

#[derive(Debug, Clone)]
pub struct StoredResource {
    pub fields: BTreeMap<String, String>,
    pub relations: HashMap<Relation, Vec<Member>>,
}

#[derive(Default)]
struct State {
    resources: HashMap<(ResourceKind, Ident), StoredResource>,
    forbidden: Vec<(ResourceKind, Ident)>,
    failures: HashMap<Endpoint, FailureKind>,
    calls: Vec<Call>,
}

#[derive(Debug, Clone, Copy)]
enum FailureKind {
    Remote,
    Auth,
}

/// Thread-safe in-memory platform.
#[derive(Default)]
pub struct MemoryPlatform {
    state: Mutex<State>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing resource with the given relation members.
    pub fn insert(&self, kind: ResourceKind, alias: &str, relations: Vec<(Relation, Vec<Member>)>) {
        let mut state = self.lock();
        state.resources.insert(
            (kind, Ident::new(alias)),
            StoredResource {
                fields: BTreeMap::new(),
                relations: relations.into_iter().collect(),
            },
        );
    }

    /// Makes the resource visible but not editable by the caller.
    pub fn forbid(&self, kind: ResourceKind, alias: &str) {
        self.lock().forbidden.push((kind, Ident::new(alias)));
    }

    /// Every call to `endpoint` fails with a platform error.
    pub fn fail(&self, endpoint: Endpoint) {
        self.lock().failures.insert(endpoint, FailureKind::Remote);
    }

    /// Every call to `endpoint` fails with an authentication error.
    pub fn fail_auth(&self, endpoint: Endpoint) {
        self.lock().failures.insert(endpoint, FailureKind::Auth);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn resource(&self, kind: ResourceKind, alias: &str) -> Option<StoredResource> {
        self.lock().resources.get(&(kind, Ident::new(alias))).cloned()
    }

    /// Current members of a relation, sorted by identifier.
    pub fn members(&self, kind: ResourceKind, alias: &str, relation: Relation) -> Vec<Member> {
        let mut members = self
            .resource(kind, alias)
            .and_then(|r| r.relations.get(&relation).cloned())
            .unwrap_or_default();
        members.sort_by(|a, b| a.id().cmp(b.id()));
        members
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl State {
    fn check(&self, endpoint: Endpoint) -> Result<()> {
        match self.failures.get(&endpoint) {
            None => Ok(()),
            Some(FailureKind::Remote) => Err(SyncError::remote(
                format!("{endpoint:?}"),
                Some(500),
                "injected failure",
            )),
            Some(FailureKind::Auth) => Err(SyncError::auth("injected authentication failure")),
        }
    }

    fn editable(&mut self, kind: ResourceKind, alias: &Ident) -> Result<&mut StoredResource> {
        if self.forbidden.contains(&(kind, alias.clone())) {
            return Err(SyncError::permission(kind, alias.as_str(), "userNotAllowed"));
        }
        self.resources
            .get_mut(&(kind, alias.clone()))
            .ok_or_else(|| SyncError::remote(format!("/api/{kind}/"), Some(404), "not found"))
    }
}

#[async_trait]
impl Platform for MemoryPlatform {
    async fn probe(&self, kind: ResourceKind, alias: &Ident) -> Result<Presence> {
        let mut state = self.lock();
        state.calls.push(Call::Probe(kind, alias.to_string()));
        state.check(Endpoint::Probe)?;
        if state.forbidden.contains(&(kind, alias.clone())) {
            return Err(SyncError::permission(kind, alias.as_str(), "userNotAllowed"));
        }
        Ok(match state.resources.get(&(kind, alias.clone())) {
            Some(resource) => Presence::Present(serde_json::json!({
                "alias": alias.as_str(),
                "title": resource.fields.get("title"),
            })),
            None => Presence::Absent,
        })
    }

    async fn create(&self, kind: ResourceKind, payload: &Payload) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::Create(kind, payload.alias.to_string()));
        state.check(Endpoint::Create)?;
        let key = (kind, payload.alias.clone());
        if state.resources.contains_key(&key) {
            return Err(SyncError::remote(
                format!("/api/{kind}/create/"),
                Some(400),
                "aliasInUse",
            ));
        }
        state.resources.insert(
            key,
            StoredResource {
                fields: payload.fields.clone(),
                relations: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn update(&self, kind: ResourceKind, payload: &Payload) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::Update(kind, payload.alias.to_string()));
        state.check(Endpoint::Update)?;
        let resource = state.editable(kind, &payload.alias)?;
        resource.fields = payload.fields.clone();
        Ok(())
    }

    async fn list_members(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
    ) -> Result<Vec<Member>> {
        let mut state = self.lock();
        state.calls.push(Call::List(kind, alias.to_string(), relation));
        state.check(Endpoint::List(relation))?;
        let resource = state.editable(kind, alias)?;
        Ok(resource.relations.get(&relation).cloned().unwrap_or_default())
    }

    async fn add_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::Add(kind, alias.to_string(), relation, member.id().to_string()));
        state.check(Endpoint::Add(relation))?;
        let members = state.editable(kind, alias)?.relations.entry(relation).or_default();
        members.retain(|m| m.id() != member.id());
        members.push(member.clone());
        Ok(())
    }

    async fn remove_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::Remove(kind, alias.to_string(), relation, member.id().to_string()));
        state.check(Endpoint::Remove(relation))?;
        let members = state.editable(kind, alias)?.relations.entry(relation).or_default();
        members.retain(|m| m.id() != member.id());
        Ok(())
    }

    async fn update_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::UpdateMember(
            kind,
            alias.to_string(),
            relation,
            member.id().to_string(),
        ));
        state.check(Endpoint::UpdateMember(relation))?;
        let members = state.editable(kind, alias)?.relations.entry(relation).or_default();
        match members.iter_mut().find(|m| m.id() == member.id()) {
            Some(existing) => *existing = member.clone(),
            None => members.push(member.clone()),
        }
        Ok(())
    }
}
