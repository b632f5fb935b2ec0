use anyhow::Result;
use colored::Colorize;

use crate::cli::{ConfigCommands, ConfigSetArgs};
use crate::config;
use crate::output::print_success;

pub fn run(command: &ConfigCommands, profile: &str) -> Result<()> {
    match command {
        ConfigCommands::Show => show(profile),
        ConfigCommands::Set(args) => set(args, profile),
    }
}

fn show(profile: &str) -> Result<()> {
    let cfg = config::load_profile(profile)?;
    println!("{}: {}", "Profile".cyan(), profile);
    println!(
        "{}: {}",
        "URL".cyan(),
        cfg.url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "{}: {}",
        "Username".cyan(),
        cfg.username.as_deref().unwrap_or("(not set)")
    );
    println!("{}: {}", "Jobs".cyan(), cfg.jobs.unwrap_or(1));
    Ok(())
}

fn set(args: &ConfigSetArgs, profile: &str) -> Result<()> {
    let mut cfg = config::load_profile(profile)?;
    cfg.set(&args.key, &args.value)?;
    config::save_profile(profile, &cfg)?;
    print_success(&format!("Set {} = {}", args.key, args.value));
    Ok(())
}
