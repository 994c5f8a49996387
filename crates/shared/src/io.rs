use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::models::PublishedEpisode;

const RECORD_VERSION: &str = "1.0";

/// Save an episode record next to its audio as `{stem}.json`
pub fn save_episode_record(dir: &Path, stem: &str, record: &PublishedEpisode) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create episodes directory")?;
    let filepath = dir.join(format!("{}.json", stem));

    let json =
        serde_json::to_string_pretty(record).context("Failed to serialize episode record")?;

    fs::write(&filepath, json).context("Failed to write episode record")?;

    Ok(filepath)
}

/// Load an episode record from a JSON file
pub fn load_episode_record(filepath: &Path) -> Result<PublishedEpisode> {
    if !filepath.exists() {
        anyhow::bail!("Episode record not found: {}", filepath.display());
    }

    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read episode record: {}", filepath.display()))?;

    let record: PublishedEpisode = serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse episode JSON from {}. The file may be corrupted.",
            filepath.display()
        )
    })?;

    if record.version != RECORD_VERSION {
        anyhow::bail!(
            "Unsupported episode record version: {}. Expected {}.",
            record.version,
            RECORD_VERSION
        );
    }

    Ok(record)
}

/// All readable episode records in `dir`, newest first
pub fn list_episode_records(dir: &Path) -> Result<Vec<PublishedEpisode>> {
    let mut records = Vec::new();

    if dir.exists() {
        for entry in fs::read_dir(dir).context("Failed to read episodes directory")? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                match load_episode_record(&path) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping episode record"),
                }
            }
        }
    }

    records.sort_by(|a, b| {
        (b.episode.date, b.published_at).cmp(&(a.episode.date, a.published_at))
    });

    Ok(records)
}
