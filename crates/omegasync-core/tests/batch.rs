use async_trait::async_trait;
use omegasync_core::{
    BatchRunner, Ident, Member, Payload, Platform, Presence, Relation, ResourceConfig,
    ResourceKind, ResourceOutcome, Result, SyncError,
};
use omegasync_memory::{Endpoint, MemoryPlatform};

fn problem(alias: &str) -> ResourceConfig {
    ResourceConfig::new(ResourceKind::Problem, alias, alias.to_uppercase())
}

#[tokio::test]
async fn test_failure_does_not_stop_batch() {
    let platform = MemoryPlatform::new();
    platform.insert(ResourceKind::Problem, "first", vec![]);
    platform.insert(ResourceKind::Problem, "third", vec![]);

    let resources = vec![problem("first"), problem("missing"), problem("third")];
    let report = BatchRunner::new(&platform, Ident::new("carol"), false)
        .run(&resources)
        .await;

    assert!(!report.is_success());
    assert!(!report.aborted);
    assert!(matches!(report.resources[0].outcome, ResourceOutcome::Synced(_)));
    assert!(matches!(report.resources[1].outcome, ResourceOutcome::Failed(_)));
    assert!(matches!(report.resources[2].outcome, ResourceOutcome::Synced(_)));
    let failed: Vec<&str> = report.failed().map(|r| r.alias.as_str()).collect();
    assert_eq!(failed, vec!["missing"]);
}

#[tokio::test]
async fn test_all_successful_batch() {
    let platform = MemoryPlatform::new();
    let resources = vec![problem("a"), problem("b"), problem("c")];

    let report = BatchRunner::new(&platform, Ident::new("ci-bot"), true)
        .with_jobs(3)
        .run(&resources)
        .await;

    assert!(report.is_success());
    let aliases: Vec<&str> = report.resources.iter().map(|r| r.alias.as_str()).collect();
    assert_eq!(aliases, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_auth_failure_aborts_remaining_resources() {
    let platform = MemoryPlatform::new();
    platform.fail_auth(Endpoint::Probe);

    let resources = vec![problem("a"), problem("b")];
    let report = BatchRunner::new(&platform, Ident::new("ci-bot"), true).run(&resources).await;

    assert!(report.aborted);
    assert!(matches!(report.resources[0].outcome, ResourceOutcome::Failed(_)));
    assert!(matches!(report.resources[1].outcome, ResourceOutcome::Skipped));
}

#[tokio::test]
async fn test_partial_relation_failure_marks_resource_failed() {
    let platform = MemoryPlatform::new();
    platform.insert(ResourceKind::Problem, "a", vec![]);
    platform.fail(Endpoint::List(Relation::AdminGroups));
    let mut config = problem("a");
    config.subresources.admin_groups = Some(vec![Ident::new("staff")]);

    let report = BatchRunner::new(&platform, Ident::new("ci-bot"), false)
        .run(&[config])
        .await;

    assert!(!report.is_success());
    assert!(matches!(report.resources[0].outcome, ResourceOutcome::Synced(_)));
}

/// Delegates to a [`MemoryPlatform`]. Probing `slow` takes a few polls and
/// probing `expired` fails authentication.
struct StaggeredPlatform {
    inner: MemoryPlatform,
}

#[async_trait]
impl Platform for StaggeredPlatform {
    async fn probe(&self, kind: ResourceKind, alias: &Ident) -> Result<Presence> {
        match alias.folded() {
            "slow" => {
                for _ in 0..3 {
                    tokio::task::yield_now().await;
                }
            }
            "expired" => return Err(SyncError::auth("session expired")),
            _ => {}
        }
        self.inner.probe(kind, alias).await
    }

    async fn create(&self, kind: ResourceKind, payload: &Payload) -> Result<()> {
        self.inner.create(kind, payload).await
    }

    async fn update(&self, kind: ResourceKind, payload: &Payload) -> Result<()> {
        self.inner.update(kind, payload).await
    }

    async fn list_members(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
    ) -> Result<Vec<Member>> {
        self.inner.list_members(kind, alias, relation).await
    }

    async fn add_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()> {
        self.inner.add_member(kind, alias, relation, member).await
    }

    async fn remove_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()> {
        self.inner.remove_member(kind, alias, relation, member).await
    }

    async fn update_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()> {
        self.inner.update_member(kind, alias, relation, member).await
    }
}

#[tokio::test]
async fn test_in_flight_resources_finish_after_auth_abort() {
    let platform = StaggeredPlatform {
        inner: MemoryPlatform::new(),
    };
    platform.inner.insert(ResourceKind::Problem, "slow", vec![]);
    platform.inner.insert(ResourceKind::Problem, "later", vec![]);

    let resources = vec![problem("slow"), problem("expired"), problem("later")];
    let report = BatchRunner::new(&platform, Ident::new("ci-bot"), false)
        .with_jobs(2)
        .run(&resources)
        .await;

    assert!(report.aborted);
    assert!(matches!(report.resources[0].outcome, ResourceOutcome::Synced(_)));
    assert!(matches!(report.resources[1].outcome, ResourceOutcome::Failed(_)));
    assert!(matches!(report.resources[2].outcome, ResourceOutcome::Skipped));
    assert_eq!(
        platform.inner.mutations(),
        vec![omegasync_memory::Call::Update(ResourceKind::Problem, "slow".to_string())]
    );
}
