use anyhow::Result;
use colored::Colorize;
use prodflow_client::ApiClient;

use crate::auth::{self, StoredCredentials};
use crate::cli::LoginArgs;
use crate::output::print_success;

pub async fn login(server: &str, args: &LoginArgs, profile: &str) -> Result<()> {
    let username = args.username.as_str();

    let client = ApiClient::new(server, None)?;
    let token = client.login(username, &args.password).await?;

    let creds = StoredCredentials {
        server: client.base_url().as_str().trim_end_matches('/').to_string(),
        token: token.access_token,
    };
    auth::save_credentials(profile, &creds)?;
    print_success(&format!(
        "Logged in to {} as {}",
        creds.server.cyan(),
        username.cyan()
    ));
    Ok(())
}

pub fn logout(profile: &str) -> Result<()> {
    if auth::remove_credentials(profile)? {
        print_success("Logged out (token removed)");
    } else {
        println!("No stored token for profile \"{profile}\"");
    }
    Ok(())
}

pub fn whoami(profile: &str) -> Result<()> {
    show_identity(profile, auth::load_credentials(profile)?)
}

fn show_identity(profile: &str, creds: Option<StoredCredentials>) -> Result<()> {
    let Some(creds) = creds else {
        anyhow::bail!("Not logged in (profile: \"{profile}\")");
    };
    println!("{}: {}", "Profile".cyan(), profile);
    println!("{}: {}", "Server".cyan(), creds.server.cyan());
    println!(
        "{}: Bearer (token: {})",
        "Auth".cyan(),
        auth::token_preview(&creds.token)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whoami_without_token_fails() {
        let err = show_identity("staging", None).unwrap_err();
        assert_eq!(err.to_string(), "Not logged in (profile: \"staging\")");

        let creds = StoredCredentials {
            server: "http://127.0.0.1:8000".into(),
            token: "jwt-token".into(),
        };
        assert!(show_identity("default", Some(creds)).is_ok());
    }
}
