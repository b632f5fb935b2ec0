use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use omegasync_client::{ClientConfig, Credentials, OmegaUpClient};
use omegasync_config::{RepositoryIndex, load_contest, load_problem};
use omegasync_core::{BatchRunner, ResourceConfig};

use crate::cli::{ProblemsArgs, SyncArgs};
use crate::output::{LoadFailure, print_report};

/// Where and as whom a sync command runs.
pub struct Target {
    pub url: String,
    pub credentials: Credentials,
    /// From the profile; `--jobs` overrides it.
    pub jobs: Option<usize>,
}

pub fn commit_message(commit: Option<&str>) -> String {
    match commit.map(str::trim).filter(|c| !c.is_empty()) {
        Some(sha) => format!("Deployed automatically from commit {sha}"),
        None => "Deployed automatically".to_string(),
    }
}

/// Directories to load: every enabled index entry with `--all`, otherwise
/// the given paths resolved against the root.
fn select_dirs(
    args: &SyncArgs,
    from_index: impl FnOnce(&RepositoryIndex, &Path) -> Vec<PathBuf>,
) -> Result<Vec<PathBuf>> {
    if args.all {
        let index = RepositoryIndex::load(&args.root)
            .with_context(|| format!("Cannot load index in {}", args.root.display()))?;
        return Ok(from_index(&index, &args.root));
    }
    anyhow::ensure!(
        !args.paths.is_empty(),
        "Nothing to synchronize: pass --all or one or more paths"
    );
    Ok(args.paths.iter().map(|p| args.root.join(p)).collect())
}

fn load_all<E: std::fmt::Display>(
    dirs: &[PathBuf],
    mut load: impl FnMut(&Path) -> std::result::Result<ResourceConfig, E>,
) -> (Vec<ResourceConfig>, Vec<LoadFailure>) {
    let mut configs = Vec::new();
    let mut failures = Vec::new();
    for dir in dirs {
        match load(dir) {
            Ok(config) => configs.push(config),
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "Cannot load resource");
                failures.push(LoadFailure {
                    path: dir.display().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
    (configs, failures)
}

pub async fn problems(target: &Target, args: &ProblemsArgs) -> Result<bool> {
    let dirs = select_dirs(&args.sync, RepositoryIndex::problem_dirs)?;
    let message = commit_message(args.commit.as_deref());
    let archives = tempfile::tempdir().context("Cannot create archive directory")?;

    let (configs, failures) = load_all(&dirs, |dir| load_problem(dir, &message, archives.path()));
    run(target, &args.sync, &configs, &failures).await
}

pub async fn contests(target: &Target, args: &SyncArgs) -> Result<bool> {
    let dirs = select_dirs(args, RepositoryIndex::contest_dirs)?;
    let (configs, failures) = load_all(&dirs, load_contest);
    run(target, args, &configs, &failures).await
}

async fn run(
    target: &Target,
    args: &SyncArgs,
    configs: &[ResourceConfig],
    load_failures: &[LoadFailure],
) -> Result<bool> {
    let mut config = ClientConfig::new(&target.url);
    if let Some(secs) = args.timeout {
        config.metadata_timeout = Duration::from_secs(secs);
    }
    let client = OmegaUpClient::connect(config, target.credentials.clone())
        .await
        .with_context(|| format!("Cannot connect to {}", target.url))?;
    let actor = client.actor().await.context("Cannot resolve current user")?;
    let jobs = args.jobs.or(target.jobs).unwrap_or(1);
    tracing::info!(url = %target.url, %actor, jobs, resources = configs.len(), "Starting run");

    let report = BatchRunner::new(&client, actor, args.can_create)
        .with_jobs(jobs)
        .run(configs)
        .await;
    print_report(&report, load_failures);
    Ok(report.is_success() && load_failures.is_empty())
}
