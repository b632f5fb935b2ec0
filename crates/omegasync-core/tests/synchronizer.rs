use omegasync_core::{
    ContestProblem, Ident, Member, Relation, ResourceConfig, ResourceKind, SyncError,
    Synchronizer, Tag,
};
use omegasync_memory::{Call, Endpoint, MemoryPlatform};

fn names(list: &[&str]) -> Vec<Member> {
    list.iter().map(|n| Member::Name(Ident::new(*n))).collect()
}

fn ids(members: &[Member]) -> Vec<String> {
    members.iter().map(|m| m.id().folded().to_string()).collect()
}

fn problem(alias: &str) -> ResourceConfig {
    let mut config = ResourceConfig::new(ResourceKind::Problem, alias, "Sumas");
    config.languages = "all".to_string();
    config
        .scalars
        .insert("visibility".to_string(), "public".to_string());
    config
}

fn contest(alias: &str) -> ResourceConfig {
    let mut config = ResourceConfig::new(ResourceKind::Contest, alias, "OCI 2024");
    config.languages = "karel".to_string();
    config.subresources.problems = Some(vec![ContestProblem::new("a", 100.0, 1)]);
    config.subresources.contestants = Some(vec![Ident::new("Alice")]);
    config.subresources.contestant_groups = Some(vec![]);
    config
}

#[tokio::test]
async fn test_absent_without_can_create_issues_no_mutations() {
    let platform = MemoryPlatform::new();
    let synchronizer = Synchronizer::new(&platform, Ident::new("carol"), false);

    let err = synchronizer.sync(&problem("sumas")).await.unwrap_err();

    assert!(matches!(err, SyncError::ResourceNotFound { kind: ResourceKind::Problem, .. }));
    assert!(platform.mutations().is_empty());
}

#[tokio::test]
async fn test_absent_with_can_create_creates_then_reconciles() {
    let platform = MemoryPlatform::new();
    let synchronizer = Synchronizer::new(&platform, Ident::new("carol"), true);

    let mut config = problem("sumas");
    config.subresources.admins = Some(vec![Ident::new("Bob")]);

    let outcome = synchronizer.sync(&config).await.unwrap();

    assert!(outcome.created);
    let calls = platform.calls();
    assert_eq!(calls[0], Call::Probe(ResourceKind::Problem, "sumas".to_string()));
    assert_eq!(calls[1], Call::Create(ResourceKind::Problem, "sumas".to_string()));
    assert!(calls.contains(&Call::Add(
        ResourceKind::Problem,
        "sumas".to_string(),
        Relation::Admins,
        "Bob".to_string()
    )));

    let stored = platform.resource(ResourceKind::Problem, "sumas").unwrap();
    assert_eq!(stored.fields["languages"], omegasync_core::ALL_LANGUAGES.join(","));
}

#[tokio::test]
async fn test_present_resource_gets_full_update() {
    let platform = MemoryPlatform::new();
    platform.insert(ResourceKind::Problem, "sumas", vec![]);
    let synchronizer = Synchronizer::new(&platform, Ident::new("ci-bot"), false);

    let outcome = synchronizer.sync(&problem("sumas")).await.unwrap();

    assert!(!outcome.created);
    let stored = platform.resource(ResourceKind::Problem, "sumas").unwrap();
    assert_eq!(stored.fields["title"], "Sumas");
    assert_eq!(stored.fields["visibility"], "public");
}

#[tokio::test]
async fn test_admin_scenario_keeps_actor() {
    let platform = MemoryPlatform::new();
    platform.insert(
        ResourceKind::Problem,
        "sumas",
        vec![(Relation::Admins, names(&["carol", "dave"]))],
    );
    let synchronizer = Synchronizer::new(&platform, Ident::new("carol"), false);

    let mut config = problem("sumas");
    config.subresources.admins = Some(vec![Ident::new("bob"), Ident::new("carol")]);
    synchronizer.sync(&config).await.unwrap();

    assert_eq!(
        ids(&platform.members(ResourceKind::Problem, "sumas", Relation::Admins)),
        vec!["bob", "carol"]
    );
}

#[tokio::test]
async fn test_empty_admin_list_never_removes_actor() {
    let platform = MemoryPlatform::new();
    platform.insert(
        ResourceKind::Problem,
        "sumas",
        vec![(Relation::Admins, names(&["Carol", "dave"]))],
    );
    let synchronizer = Synchronizer::new(&platform, Ident::new("carol"), false);

    let mut config = problem("sumas");
    config.subresources.admins = Some(Vec::new());
    synchronizer.sync(&config).await.unwrap();

    assert_eq!(
        ids(&platform.members(ResourceKind::Problem, "sumas", Relation::Admins)),
        vec!["carol"]
    );
}

#[tokio::test]
async fn test_restricted_tags_survive_sync() {
    let platform = MemoryPlatform::new();
    platform.insert(
        ResourceKind::Problem,
        "sumas",
        vec![(
            Relation::Tags,
            vec![
                Member::Tag(Tag::new("problemRestrictedTagKarel", false)),
                Member::Tag(Tag::new("problemTagOld", true)),
            ],
        )],
    );
    let synchronizer = Synchronizer::new(&platform, Ident::new("ci-bot"), false);

    let mut config = problem("sumas");
    config.subresources.tags = Some(vec![Tag::new("problemTagArrays", true)]);
    synchronizer.sync(&config).await.unwrap();

    assert_eq!(
        ids(&platform.members(ResourceKind::Problem, "sumas", Relation::Tags)),
        vec!["problemrestrictedtagkarel", "problemtagarrays"]
    );
}

#[tokio::test]
async fn test_unmanaged_relations_are_not_listed() {
    let platform = MemoryPlatform::new();
    platform.insert(
        ResourceKind::Problem,
        "sumas",
        vec![
            (Relation::Admins, names(&["dave"])),
            (Relation::AdminGroups, names(&["staff"])),
        ],
    );
    let synchronizer = Synchronizer::new(&platform, Ident::new("ci-bot"), false);

    synchronizer.sync(&problem("sumas")).await.unwrap();

    let listed: Vec<Relation> = platform
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::List(_, _, relation) => Some(relation),
            _ => None,
        })
        .collect();
    assert!(listed.is_empty());
    assert_eq!(
        platform.mutations(),
        vec![Call::Update(ResourceKind::Problem, "sumas".to_string())]
    );
}

#[tokio::test]
async fn test_contest_problem_points_change_is_an_update() {
    let platform = MemoryPlatform::new();
    platform.insert(
        ResourceKind::Contest,
        "oci",
        vec![(
            Relation::Problems,
            vec![Member::Problem(ContestProblem::new("a", 50.0, 1))],
        )],
    );
    let synchronizer = Synchronizer::new(&platform, Ident::new("ci-bot"), false);

    synchronizer.sync(&contest("oci")).await.unwrap();

    let problem_mutations: Vec<Call> = platform
        .mutations()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                Call::Add(_, _, Relation::Problems, _)
                    | Call::Remove(_, _, Relation::Problems, _)
                    | Call::UpdateMember(_, _, Relation::Problems, _)
            )
        })
        .collect();
    assert_eq!(
        problem_mutations,
        vec![Call::UpdateMember(
            ResourceKind::Contest,
            "oci".to_string(),
            Relation::Problems,
            "a".to_string()
        )]
    );
    assert_eq!(
        platform.members(ResourceKind::Contest, "oci", Relation::Problems),
        vec![Member::Problem(ContestProblem::new("a", 100.0, 1))]
    );
}

#[tokio::test]
async fn test_second_run_issues_no_relation_mutations() {
    let platform = MemoryPlatform::new();
    platform.insert(
        ResourceKind::Contest,
        "oci",
        vec![
            (Relation::Admins, names(&["carol", "dave"])),
            (Relation::Contestants, names(&["alice", "mallory"])),
        ],
    );
    let synchronizer = Synchronizer::new(&platform, Ident::new("carol"), false);
    let mut config = contest("oci");
    config.subresources.admins = Some(vec![Ident::new("bob")]);

    synchronizer.sync(&config).await.unwrap();
    platform.clear_calls();
    let outcome = synchronizer.sync(&config).await.unwrap();

    // The scalar update is always resent; nothing else should change.
    assert_eq!(
        platform.mutations(),
        vec![Call::Update(ResourceKind::Contest, "oci".to_string())]
    );
    assert_eq!(outcome.applied_mutations(), 0);
}

#[tokio::test]
async fn test_relation_failure_does_not_block_other_relations() {
    let platform = MemoryPlatform::new();
    platform.insert(ResourceKind::Contest, "oci", vec![]);
    platform.fail(Endpoint::Add(Relation::Problems));
    let synchronizer = Synchronizer::new(&platform, Ident::new("ci-bot"), false);

    let outcome = synchronizer.sync(&contest("oci")).await.unwrap();

    assert_eq!(outcome.failed_mutations(), 1);
    assert_eq!(
        ids(&platform.members(ResourceKind::Contest, "oci", Relation::Contestants)),
        vec!["alice"]
    );
}

#[tokio::test]
async fn test_failed_upsert_skips_relations() {
    let platform = MemoryPlatform::new();
    platform.insert(ResourceKind::Problem, "sumas", vec![]);
    platform.fail(Endpoint::Update);
    let synchronizer = Synchronizer::new(&platform, Ident::new("ci-bot"), false);

    let err = synchronizer.sync(&problem("sumas")).await.unwrap_err();

    assert!(matches!(err, SyncError::Remote { .. }));
    assert!(!platform.calls().iter().any(|c| matches!(c, Call::List(..))));
}

#[tokio::test]
async fn test_permission_error_aborts_resource() {
    let platform = MemoryPlatform::new();
    platform.insert(ResourceKind::Problem, "sumas", vec![]);
    platform.forbid(ResourceKind::Problem, "sumas");
    let synchronizer = Synchronizer::new(&platform, Ident::new("ci-bot"), true);

    let err = synchronizer.sync(&problem("sumas")).await.unwrap_err();

    assert!(matches!(err, SyncError::Permission { .. }));
    assert!(platform.mutations().is_empty());
}

#[tokio::test]
async fn test_auth_failure_during_reconcile_is_returned() {
    let platform = MemoryPlatform::new();
    platform.insert(ResourceKind::Problem, "sumas", vec![]);
    platform.fail_auth(Endpoint::List(Relation::Admins));
    let synchronizer = Synchronizer::new(&platform, Ident::new("ci-bot"), false);

    let mut config = problem("sumas");
    config.subresources.admins = Some(vec![Ident::new("bob")]);
    let err = synchronizer.sync(&config).await.unwrap_err();

    assert!(err.is_fatal_to_run());
}

#[tokio::test]
async fn test_failed_removal_does_not_block_later_mutations() {
    let platform = MemoryPlatform::new();
    platform.insert(
        ResourceKind::Problem,
        "sumas",
        vec![(Relation::Admins, names(&["carol", "dave"]))],
    );
    platform.fail(Endpoint::Remove(Relation::Admins));
    let synchronizer = Synchronizer::new(&platform, Ident::new("carol"), false);

    let mut config = problem("sumas");
    config.subresources.admins = Some(vec![Ident::new("bob")]);
    let outcome = synchronizer.sync(&config).await.unwrap();

    assert_eq!(outcome.failed_mutations(), 1);
    assert_eq!(outcome.applied_mutations(), 1);
    let admin_calls: Vec<Call> = platform
        .mutations()
        .into_iter()
        .filter(|c| !matches!(c, Call::Update(..)))
        .collect();
    assert_eq!(
        admin_calls,
        vec![
            Call::Remove(
                ResourceKind::Problem,
                "sumas".to_string(),
                Relation::Admins,
                "dave".to_string()
            ),
            Call::Add(
                ResourceKind::Problem,
                "sumas".to_string(),
                Relation::Admins,
                "bob".to_string()
            ),
        ]
    );
    assert_eq!(
        ids(&platform.members(ResourceKind::Problem, "sumas", Relation::Admins)),
        vec!["bob", "carol", "dave"]
    );
}
