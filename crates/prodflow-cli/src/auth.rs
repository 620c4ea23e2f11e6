use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Bearer token persisted per profile; the token lives under the `token` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub server: String,
    pub token: String,
}

/// Directory holding the CLI's config and credentials.
pub fn state_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".prodflow");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn creds_path(dir: &Path, profile: &str) -> PathBuf {
    dir.join(format!("credentials.{profile}.json"))
}

pub fn load_credentials(profile: &str) -> Result<Option<StoredCredentials>> {
    load_credentials_in(&state_dir()?, profile)
}

pub fn save_credentials(profile: &str, creds: &StoredCredentials) -> Result<()> {
    save_credentials_in(&state_dir()?, profile, creds)
}

pub fn remove_credentials(profile: &str) -> Result<bool> {
    remove_credentials_in(&state_dir()?, profile)
}

fn load_credentials_in(dir: &Path, profile: &str) -> Result<Option<StoredCredentials>> {
    let path = creds_path(dir, profile);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let creds: StoredCredentials = serde_json::from_str(&content)
        .with_context(|| format!("Corrupt credentials file: {}", path.display()))?;
    Ok(Some(creds))
}

fn save_credentials_in(dir: &Path, profile: &str, creds: &StoredCredentials) -> Result<()> {
    let content = serde_json::to_string_pretty(creds)?;
    fs::write(creds_path(dir, profile), content)?;
    Ok(())
}

fn remove_credentials_in(dir: &Path, profile: &str) -> Result<bool> {
    let path = creds_path(dir, profile);
    if path.exists() {
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Shortened token for display.
pub fn token_preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{head}...{tail}")
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_round_trip_and_remove() {
        let dir = tempfile::tempdir().expect("tmp dir");
        assert_eq!(load_credentials_in(dir.path(), "default").unwrap(), None);

        let creds = StoredCredentials {
            server: "http://127.0.0.1:8000".into(),
            token: "jwt-token".into(),
        };
        save_credentials_in(dir.path(), "default", &creds).unwrap();

        let raw = fs::read_to_string(dir.path().join("credentials.default.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["token"], "jwt-token");

        assert_eq!(
            load_credentials_in(dir.path(), "default").unwrap(),
            Some(creds)
        );
        assert_eq!(load_credentials_in(dir.path(), "staging").unwrap(), None);

        assert!(remove_credentials_in(dir.path(), "default").unwrap());
        assert!(!remove_credentials_in(dir.path(), "default").unwrap());
    }

    #[test]
    fn test_corrupt_credentials_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        fs::write(dir.path().join("credentials.default.json"), "{not json").unwrap();
        let err = load_credentials_in(dir.path(), "default").unwrap_err();
        assert!(err.to_string().contains("Corrupt credentials file"));
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("short"), "short");
        assert_eq!(
            token_preview("eyJhbGciOiJIUzI1NiJ9.payload.signature"),
            "eyJhbGci...ignature"
        );
    }
}
