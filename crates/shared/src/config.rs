use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::script::DEFAULT_MAX_ITEMS;

const DEFAULT_FEEDS_FILE: &str = "feeds.toml";
const DEFAULT_PUBLIC_DIR: &str = "public";

#[derive(Debug, Clone)]
pub struct Config {
    pub eleven_api_key: Option<String>,
    pub eleven_voice_id: Option<String>,
    pub public_base_url: Option<Url>,
    pub max_items: usize,
    pub feeds_file: PathBuf,
    pub public_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let max_items = match get("MAX_ITEMS") {
            Some(raw) => parse_max_items(&raw)?,
            None => DEFAULT_MAX_ITEMS,
        };

        let public_base_url = get("PUBLIC_BASE_URL")
            .map(|raw| {
                Url::parse(raw.trim_end_matches('/')).with_context(|| {
                    format!(
                        "PUBLIC_BASE_URL is not a valid URL: {}\n\n\
                        Set it to where the public/ directory is served, e.g.\n  \
                        PUBLIC_BASE_URL=https://example.github.io/daily-briefing",
                        raw
                    )
                })
            })
            .transpose()?;

        Ok(Self {
            eleven_api_key: get("ELEVEN_API_KEY"),
            eleven_voice_id: get("ELEVEN_VOICE_ID"),
            public_base_url,
            max_items,
            feeds_file: get("FEEDS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FEEDS_FILE)),
            public_dir: get("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR)),
        })
    }

    /// Base URL for published files, required once anything is written
    pub fn require_base_url(&self) -> Result<&Url> {
        self.public_base_url.as_ref().context(
            "PUBLIC_BASE_URL not found.\n\n\
            To fix this, add it to ~/.config/daily-briefing/.env:\n  \
            PUBLIC_BASE_URL=https://example.github.io/daily-briefing\n\n\
            or run with --dry-run to print the script without publishing.",
        )
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/daily-briefing/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("daily-briefing").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}

pub fn parse_max_items(raw: &str) -> Result<usize> {
    let value: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("MAX_ITEMS must be a positive integer, got {:?}", raw))?;
    anyhow::ensure!(value > 0, "MAX_ITEMS must be a positive integer, got 0");
    Ok(value)
}

/// One configured feed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub rss: String,
}

/// The feed list and show metadata, read from `feeds.toml`
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    #[serde(default = "default_show_title")]
    pub show_title: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_limit_per_source")]
    pub daily_limit_per_source: usize,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    #[serde(default)]
    pub sources: Vec<FeedSource>,
}

fn default_show_title() -> String {
    "Daily Briefing".to_string()
}

fn default_description() -> String {
    "A short, factual news briefing.".to_string()
}

fn default_limit_per_source() -> usize {
    6
}

impl FeedsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read feeds file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid feeds file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: FeedsConfig =
            toml::from_str(content).context("Failed to parse feeds TOML")?;

        // Entries without a URL are ignored
        config.sources.retain(|s| !s.rss.trim().is_empty());
        config.exclude_keywords = config
            .exclude_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        if config.sources.is_empty() {
            anyhow::bail!("No feed sources configured. Add at least one [[sources]] entry with a name and rss URL.");
        }

        Ok(config)
    }

    /// Headlines mentioning an excluded keyword are not news for this show
    pub fn is_newsworthy(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        !self.exclude_keywords.iter().any(|k| title.contains(k.as_str()))
    }
}
