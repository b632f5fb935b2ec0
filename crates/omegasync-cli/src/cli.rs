use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "omegasync")]
#[command(about = "Deploy problems and contests from a repository to omegaUp")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// omegaUp base URL (overrides config and OMEGAUP_URL env var)
    #[arg(long, global = true, env = "OMEGAUP_URL")]
    pub url: Option<String>,

    /// Config profile name
    #[arg(long, global = true, env = "OMEGASYNC_PROFILE", default_value = "default")]
    pub profile: String,

    /// Username to log in as
    #[arg(short, long, global = true, env = "OMEGAUPUSER")]
    pub username: Option<String>,

    /// Password for --username
    #[arg(short, long, global = true, env = "OMEGAUPPASS", hide_env_values = true)]
    pub password: Option<String>,

    /// API token, used instead of username/password
    #[arg(long, global = true, env = "OMEGAUP_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize problems
    Problems(ProblemsArgs),
    /// Synchronize contests
    Contests(SyncArgs),
    /// Verify and store credentials for the profile
    Login,
    /// Remove stored credentials
    Logout,
    /// Show current auth info
    Whoami,
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct SyncArgs {
    /// Synchronize every enabled entry in problems.json
    #[arg(long, conflicts_with = "paths")]
    pub all: bool,

    /// Create resources that do not exist yet
    #[arg(long)]
    pub can_create: bool,

    /// Resources synchronized concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-request timeout in seconds (archive uploads keep their own)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Repository root holding problems.json
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Resource directories, relative to --root
    pub paths: Vec<PathBuf>,
}

#[derive(clap::Args)]
pub struct ProblemsArgs {
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Commit recorded in the update message
    #[arg(long, env = "GITHUB_SHA")]
    pub commit: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (url, username, jobs)
    pub key: String,
    /// Value
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_problems_flags() {
        let cli = Cli::try_parse_from([
            "omegasync",
            "--url",
            "http://localhost:8001",
            "problems",
            "--can-create",
            "--jobs",
            "4",
            "--commit",
            "deadbeef",
            "sumas",
            "restas",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("http://localhost:8001"));
        let Commands::Problems(args) = cli.command else {
            panic!("expected problems command");
        };
        assert!(args.sync.can_create);
        assert_eq!(args.sync.jobs, Some(4));
        assert_eq!(args.commit.as_deref(), Some("deadbeef"));
        assert_eq!(args.sync.paths, vec![PathBuf::from("sumas"), PathBuf::from("restas")]);
    }

    #[test]
    fn test_all_conflicts_with_paths() {
        assert!(Cli::try_parse_from(["omegasync", "contests", "--all", "omi"]).is_err());
    }
}
