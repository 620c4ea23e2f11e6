use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::cli::OutputFormat;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    load_profile_in(&auth::state_dir()?, profile)
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_profile_in(&auth::state_dir()?, profile, config)
}

fn load_all(dir: &Path) -> Result<ConfigFile> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)?;
    let cfg: ConfigFile = toml::from_str(&content)?;
    Ok(cfg)
}

fn load_profile_in(dir: &Path, profile: &str) -> Result<ProfileConfig> {
    Ok(load_all(dir)?.remove(profile).unwrap_or_default())
}

fn save_profile_in(dir: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all(dir)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path(dir), content)?;
    Ok(())
}

/// Checks a `config set` pair and applies it to `cfg`.
pub fn apply_setting(cfg: &mut ProfileConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "server" => cfg.server = Some(value.trim_end_matches('/').to_string()),
        "format" => {
            let format = OutputFormat::from_str(value, true)
                .map_err(|_| anyhow::anyhow!("Unknown format: {value}. Valid formats: table, json, yaml"))?;
            cfg.format = format
                .to_possible_value()
                .map(|v| v.get_name().to_string());
        }
        other => anyhow::bail!("Unknown config key: {other}. Valid keys: server, format"),
    }
    Ok(())
}

pub fn resolve_server(cli_server: &Option<String>, profile: &str) -> Result<String> {
    // 1. --server flag / PRODFLOW_URL env
    if let Some(s) = cli_server {
        return Ok(s.clone());
    }
    // 2. config.toml profile
    let cfg = load_profile(profile)?;
    if let Some(s) = cfg.server {
        return Ok(s);
    }
    // 3. Server the stored token was issued by
    if let Ok(Some(creds)) = auth::load_credentials(profile) {
        return Ok(creds.server);
    }
    anyhow::bail!(
        "No server URL configured. Use --server, set PRODFLOW_URL env var, or run: prodflow config set server <url>"
    )
}

/// `--format` wins over the profile's stored format; table otherwise.
pub fn resolve_format(cli_format: Option<OutputFormat>, profile: &str) -> OutputFormat {
    if let Some(f) = cli_format {
        return f;
    }
    load_profile(profile)
        .ok()
        .and_then(|cfg| cfg.format)
        .and_then(|f| OutputFormat::from_str(&f, true).ok())
        .unwrap_or_default()
}
