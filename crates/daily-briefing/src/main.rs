use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use shared::{
    Config, ExtractionError, FeedFetcher, FeedsConfig, Pipeline, ScriptAssembler, SiteWriter,
    SpeechSynthesizer,
};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "daily-briefing")]
#[command(about = "Build today's attributed news briefing and publish it as a podcast episode")]
struct Args {
    /// Feed list (overrides FEEDS_FILE)
    #[arg(short, long)]
    feeds: Option<PathBuf>,

    /// Maximum number of stories in the script (overrides MAX_ITEMS)
    #[arg(short, long)]
    max_items: Option<usize>,

    /// Output directory for the site (overrides PUBLIC_DIR)
    #[arg(short, long)]
    public_dir: Option<PathBuf>,

    /// Print the script without calling text-to-speech or writing files
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daily_briefing=info,shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;

    if let Some(feeds) = args.feeds {
        config.feeds_file = feeds;
    }
    if let Some(max_items) = args.max_items {
        config.max_items = max_items;
    }
    if let Some(public_dir) = args.public_dir {
        config.public_dir = public_dir;
    }

    let feeds = FeedsConfig::load(&config.feeds_file)?;
    let assembler = ScriptAssembler::new(feeds.show_title.clone(), config.max_items)?;
    let pipeline = Pipeline::new(assembler, feeds.show_title.clone());

    // Publishing needs a base URL; fail before any network work if it's missing
    let base_url = if args.dry_run {
        None
    } else {
        Some(config.require_base_url()?.clone())
    };

    let now = Local::now();
    println!("\n✓ {} for {}", feeds.show_title, now.format("%A, %-d %B %Y"));

    println!("\n📡 Fetching {} feeds...", feeds.sources.len());
    let fetcher = FeedFetcher::new()?;
    let items = fetcher.fetch_all(&feeds).await;
    println!("✓ Found {} items", items.len());

    println!("\n🔍 Extracting attributable facts...");
    let outcome = pipeline.run(&items, now.naive_local());
    println!(
        "✓ Accepted {}/{} items, {} in the script (max {})",
        outcome.accepted,
        items.len(),
        outcome.episode.fact_count,
        config.max_items
    );
    for reason in [
        ExtractionError::EmptyContent,
        ExtractionError::NoCleanFact,
        ExtractionError::Unparseable,
    ] {
        if let Some(count) = outcome.rejected.get(&reason) {
            println!("  ✗ {} skipped: {}", count, reason);
        }
    }

    if outcome.episode.is_empty() {
        warn!("No usable items found; proceeding with minimal script");
    }

    let Some(base_url) = base_url else {
        println!("\n{}\n", outcome.episode.script_text);
        return Ok(());
    };

    println!("\n🎙  Generating audio...");
    let audio = match SpeechSynthesizer::from_config(
        config.eleven_api_key.as_deref(),
        config.eleven_voice_id.as_deref(),
    )? {
        Some(synthesizer) => {
            synthesizer
                .synthesize_with_fallback(&outcome.episode.script_text)
                .await
        }
        None => None,
    };
    if audio.is_none() {
        warn!("No audio produced; publishing feed without enclosure");
    }

    println!("\n📝 Publishing site...");
    let site = SiteWriter::new(
        &config.public_dir,
        base_url,
        feeds.show_title.clone(),
        feeds.description.clone(),
    );
    let record = site
        .publish(&outcome.episode, audio.as_deref(), now.fixed_offset())
        .context("Failed to publish episode")?;

    match record.audio_file {
        Some(file) => println!(
            "\n✅ Published {} ({} bytes) to {}",
            file,
            record.audio_bytes,
            config.public_dir.display()
        ),
        None => println!(
            "\n✅ Published feed without audio to {}",
            config.public_dir.display()
        ),
    }

    Ok(())
}
