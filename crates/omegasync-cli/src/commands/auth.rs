use anyhow::{Context, Result};
use colored::Colorize;
use omegasync_client::{ClientConfig, OmegaUpClient};

use crate::auth::{self, CliCredentials, StoredCredentials};
use crate::output::{print_error, print_success};

/// Verifies the given credentials against `url` and stores them.
pub async fn login(
    url: &str,
    cli: &CliCredentials<'_>,
    default_username: Option<&str>,
    profile: &str,
) -> Result<()> {
    let credentials = auth::resolve(cli, default_username, None)?;
    let client = OmegaUpClient::connect(ClientConfig::new(url), credentials.clone())
        .await
        .with_context(|| format!("Login to {url} failed"))?;
    let actor = client.actor().await.context("Cannot resolve current user")?;

    auth::save_credentials(profile, &StoredCredentials::from_credentials(url, credentials))?;
    print_success(&format!(
        "Logged in to {} as {}",
        url.cyan(),
        actor.as_str().cyan()
    ));
    Ok(())
}

pub fn logout(profile: &str) -> Result<()> {
    if auth::remove_credentials(profile)? {
        print_success("Logged out (credentials removed)");
    } else {
        println!("No credentials found for profile \"{profile}\"");
    }
    Ok(())
}

fn token_preview(token: &str) -> String {
    if token.len() > 20 && token.is_ascii() {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "****".to_string()
    }
}

pub fn whoami(profile: &str) -> Result<()> {
    match auth::load_credentials(profile)? {
        Some(creds) => {
            println!("{}: {}", "Profile".cyan(), profile);
            println!("{}: {}", "URL".cyan(), creds.url().cyan());
            match &creds {
                StoredCredentials::Password { username, .. } => {
                    println!("{}: password (user: {})", "Auth".cyan(), username);
                }
                StoredCredentials::Token {
                    api_token,
                    username,
                    ..
                } => {
                    let user = username.as_deref().unwrap_or("from session");
                    println!(
                        "{}: API token {} (user: {})",
                        "Auth".cyan(),
                        token_preview(api_token),
                        user
                    );
                }
            }
        }
        None => {
            print_error(&format!("Not logged in (profile: \"{profile}\")"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_preview_hides_middle() {
        assert_eq!(token_preview("abcdefghijklmnopqrstuvwxyz"), "abcd...wxyz");
        assert_eq!(token_preview("short"), "****");
    }
}
