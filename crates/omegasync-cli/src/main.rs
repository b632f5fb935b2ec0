mod auth;
mod cli;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use auth::CliCredentials;
use cli::{Cli, Commands};
use commands::sync::Target;
use output::print_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

/// RUST_LOG wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Returns whether everything succeeded.
async fn run(cli: Cli) -> Result<bool> {
    let profile = cli.profile.as_str();
    let credentials = CliCredentials {
        username: cli.username.as_deref(),
        password: cli.password.as_deref(),
        api_token: cli.api_token.as_deref(),
    };

    match &cli.command {
        Commands::Problems(args) => {
            let target = target(&cli, &credentials)?;
            commands::sync::problems(&target, args).await
        }
        Commands::Contests(args) => {
            let target = target(&cli, &credentials)?;
            commands::sync::contests(&target, args).await
        }
        Commands::Login => {
            let url = config::resolve_url(cli.url.as_deref(), profile)?;
            let cfg = config::load_profile(profile)?;
            commands::auth::login(&url, &credentials, cfg.username.as_deref(), profile).await?;
            Ok(true)
        }
        Commands::Logout => {
            commands::auth::logout(profile)?;
            Ok(true)
        }
        Commands::Whoami => {
            commands::auth::whoami(profile)?;
            Ok(true)
        }
        Commands::Config(args) => {
            commands::config::run(&args.command, profile)?;
            Ok(true)
        }
    }
}

fn target(cli: &Cli, credentials: &CliCredentials<'_>) -> Result<Target> {
    let cfg = config::load_profile(&cli.profile)?;
    let stored = auth::load_credentials(&cli.profile)?;
    Ok(Target {
        url: config::resolve_url(cli.url.as_deref(), &cli.profile)?,
        credentials: auth::resolve(credentials, cfg.username.as_deref(), stored.as_ref())?,
        jobs: cfg.jobs,
    })
}
