use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rss::extension::itunes::{ITunesChannelExtensionBuilder, ITunesItemExtensionBuilder};
use rss::validation::Validate;
use rss::{ChannelBuilder, EnclosureBuilder, GuidBuilder, ItemBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

use crate::io;
use crate::models::{Episode, PublishedEpisode};

/// Episodes listed in the podcast feed
const FEED_EPISODE_LIMIT: usize = 30;

/// Bitrate assumed when estimating duration from the MP3 size
const ASSUMED_BITRATE_BPS: u64 = 128_000;

/// Writes the public podcast site: audio, feed, show notes and index
pub struct SiteWriter {
    public_dir: PathBuf,
    base_url: Url,
    show_title: String,
    description: String,
}

impl SiteWriter {
    pub fn new(
        public_dir: impl Into<PathBuf>,
        base_url: Url,
        show_title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            public_dir: public_dir.into(),
            base_url,
            show_title: show_title.into(),
            description: description.into(),
        }
    }

    fn episodes_dir(&self) -> PathBuf {
        self.public_dir.join("episodes")
    }

    fn shownotes_dir(&self) -> PathBuf {
        self.public_dir.join("shownotes")
    }

    /// "Boston Briefing" becomes "boston-briefing"
    pub fn slug(&self) -> String {
        self.show_title
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn episode_stem(&self, date: NaiveDate) -> String {
        format!("{}-{}", self.slug(), date.format("%Y-%m-%d"))
    }

    /// Absolute URL for a path under the public directory
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Write everything for one episode and regenerate the feed.
    pub fn publish(
        &self,
        episode: &Episode,
        audio: Option<&[u8]>,
        published_at: DateTime<FixedOffset>,
    ) -> Result<PublishedEpisode> {
        let episodes_dir = self.episodes_dir();
        fs::create_dir_all(&episodes_dir).context("Failed to create episodes directory")?;

        let stem = self.episode_stem(episode.date);
        let name = format!("{}.mp3", stem);
        let path = episodes_dir.join(&name);

        let (audio_file, audio_bytes) = match audio {
            Some(bytes) => {
                fs::write(&path, bytes).context("Failed to write episode audio")?;
                info!(path = %path.display(), bytes = bytes.len(), "Saved MP3");
                (Some(name), bytes.len() as u64)
            }
            None => {
                // An earlier run today may have left audio this record no longer claims
                if path.exists() {
                    fs::remove_file(&path).context("Failed to remove stale episode audio")?;
                    info!(path = %path.display(), "Removed audio from an earlier run");
                }
                (None, 0)
            }
        };

        let record = PublishedEpisode::new(episode.clone(), audio_file, audio_bytes, published_at);
        io::save_episode_record(&episodes_dir, &stem, &record)?;

        let records = io::list_episode_records(&episodes_dir)?;
        let feed = self.generate_feed(&records)?;
        write_file(&self.public_dir.join("feed.xml"), &feed)?;

        let shownotes_dir = self.shownotes_dir();
        fs::create_dir_all(&shownotes_dir).context("Failed to create shownotes directory")?;
        write_file(
            &shownotes_dir.join(format!("{}.html", episode.date.format("%Y-%m-%d"))),
            &self.generate_shownotes(episode),
        )?;

        write_file(&self.public_dir.join("index.html"), &self.generate_index())?;

        Ok(record)
    }

    /// Podcast RSS with the newest episodes first.
    pub fn generate_feed(&self, records: &[PublishedEpisode]) -> Result<String> {
        let items: Vec<rss::Item> = records
            .iter()
            .take(FEED_EPISODE_LIMIT)
            .map(|record| self.feed_item(record))
            .collect();

        let last_build = records.first().map(|r| r.published_at.to_rfc2822());

        let channel = ChannelBuilder::default()
            .title(self.show_title.clone())
            .link(self.base_url.as_str().to_string())
            .description(self.description.clone())
            .language("en-us".to_string())
            .last_build_date(last_build)
            .itunes_ext(
                ITunesChannelExtensionBuilder::default()
                    .author(self.show_title.clone())
                    .explicit("false".to_string())
                    .summary(self.description.clone())
                    .build(),
            )
            .items(items)
            .build();

        channel
            .validate()
            .map_err(|e| anyhow!("RSS validation failed: {e}"))?;
        Ok(channel.to_string())
    }

    fn feed_item(&self, record: &PublishedEpisode) -> rss::Item {
        let episode = &record.episode;
        let pub_date = record.published_at.to_rfc2822();
        let shownotes_url =
            self.url_for(&format!("shownotes/{}.html", episode.date.format("%Y-%m-%d")));

        let audio_url = record
            .audio_file
            .as_ref()
            .map(|name| self.url_for(&format!("episodes/{}", name)));

        let enclosure = audio_url.as_ref().map(|url| {
            EnclosureBuilder::default()
                .url(url.clone())
                .length(record.audio_bytes.to_string())
                .mime_type("audio/mpeg".to_string())
                .build()
        });

        let duration = episode
            .duration_secs
            .or_else(|| (record.audio_bytes > 0).then(|| estimate_duration_secs(record.audio_bytes)))
            .map(format_duration);

        let guid = audio_url
            .clone()
            .unwrap_or_else(|| self.episode_stem(episode.date));

        ItemBuilder::default()
            .title(episode.title.clone())
            .description(episode.script_text.clone())
            .link(audio_url.unwrap_or(shownotes_url))
            .guid(GuidBuilder::default().permalink(false).value(guid).build())
            .pub_date(pub_date)
            .enclosure(enclosure)
            .itunes_ext(ITunesItemExtensionBuilder::default().duration(duration).build())
            .build()
    }

    pub fn generate_shownotes(&self, episode: &Episode) -> String {
        let date = episode.date.format("%Y-%m-%d");
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(&format!(
            "  <title>{} \u{2013} Sources</title>\n",
            escape_html(&self.show_title)
        ));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!(
            "<h2>{} \u{2013} {}</h2>\n",
            escape_html(&self.show_title),
            date
        ));

        if episode.show_notes.is_empty() {
            html.push_str("<p>No stories could be attributed cleanly for this episode.</p>\n");
        } else {
            html.push_str("<ol>\n");
            for note in &episode.show_notes {
                html.push_str(&format!(
                    "  <li><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a> \u{2013} {}</li>\n",
                    escape_html(note.link.as_str()),
                    escape_html(&note.title),
                    escape_html(&note.source_name)
                ));
            }
            html.push_str("</ol>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    pub fn generate_index(&self) -> String {
        let title = escape_html(&self.show_title);
        let feed_url = escape_html(&self.url_for("feed.xml"));
        let shownotes_url = escape_html(&self.url_for("shownotes/"));

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"UTF-8\">\n  <title>{title}</title>\n</head>\n<body>\n  \
             <h1>{title}</h1>\n  <p>{description}</p>\n  \
             <p>Podcast RSS: <a href=\"{feed_url}\">{feed_url}</a></p>\n  \
             <p>Shownotes: <a href=\"{shownotes_url}\">Open folder</a></p>\n</body>\n</html>\n",
            description = escape_html(&self.description),
        )
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn estimate_duration_secs(audio_bytes: u64) -> u64 {
    (audio_bytes * 8).div_ceil(ASSUMED_BITRATE_BPS)
}

/// Format as "HH:MM:SS" for itunes:duration
fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
