use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use feedpull::enclosure::padding_width;
use feedpull::{
    CacheOutcome, NoopReporter, ProgressEvent, ProgressReporter, ReqwestClient, SanitizeMode,
    SharedProgressReporter, SyncOptions, sync_feed,
};

// Emoji with fallback for terminals without Unicode support
static SATELLITE: Emoji<'_, '_> = Emoji("📡 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static FEED: Emoji<'_, '_> = Emoji("📰 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[=] ");
static REPLACE: Emoji<'_, '_> = Emoji("♻️  ", "[r] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Download every enclosure of an RSS or Atom feed
#[derive(Parser, Debug)]
#[command(name = "feedpull")]
#[command(about = "Download every enclosure of an RSS or Atom feed")]
#[command(version)]
struct Args {
    /// URL of the RSS or Atom feed
    feed_url: String,

    /// Directory for downloaded enclosures and the feed cache
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Do not prefix filenames with their position in the feed
    #[arg(long)]
    no_numbers: bool,

    /// Download and number items starting from the oldest
    #[arg(short = 'l', long)]
    oldest_first: bool,

    /// Replace characters Windows rejects in filenames, whatever the host
    #[arg(long)]
    strict_names: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            numbers: !self.no_numbers,
            oldest_first: self.oldest_first,
            output_dir: self.output_dir.clone(),
            sanitize: if self.strict_names {
                SanitizeMode::Strict
            } else {
                SanitizeMode::for_host()
            },
        }
    }
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    download_bar: Mutex<Option<ProgressBar>>,
    main_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_bar = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} {wide_msg}") {
            main_bar.set_style(style);
        }
        main_bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            multi,
            download_bar: Mutex::new(None),
            main_bar,
        }
    }

    fn println(&self, line: String) {
        if let Err(e) = self.multi.println(line) {
            debug!(error = %e, "progress line not printed");
        }
    }

    fn start_bar(&self, content_length: Option<u64>) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(content_length.unwrap_or(0)));
        if let Ok(style) = ProgressStyle::default_bar().template(&format!(
            "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
        )) {
            bar.set_style(style.progress_chars("█▓░"));
        }

        if let Ok(mut slot) = self.download_bar.lock()
            && let Some(previous) = slot.replace(bar.clone())
        {
            previous.finish_and_clear();
        }
        bar
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(slot) = self.download_bar.lock()
            && let Some(bar) = slot.as_ref()
        {
            f(bar);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut slot) = self.download_bar.lock()
            && let Some(bar) = slot.take()
        {
            bar.finish_and_clear();
        }
    }

    fn abandon(&self) {
        self.finish_bar();
        self.main_bar.finish_and_clear();
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingFeed { url } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Fetching feed: {}", url.cyan()));
            }

            ProgressEvent::FeedCacheSynced { path, outcome } => {
                let what = match outcome {
                    CacheOutcome::Created => "created".green(),
                    CacheOutcome::Updated => "updated".yellow(),
                    CacheOutcome::Unchanged => "unchanged".dimmed(),
                };
                self.println(format!(
                    "{FEED}Feed cache {} ({})",
                    what,
                    path.display().to_string().dimmed()
                ));
            }

            ProgressEvent::FeedParsed {
                feed_title,
                total_items,
            } => {
                self.println(format!(
                    "{FEED}{} • found {} items",
                    feed_title.bold().green(),
                    total_items.to_string().cyan()
                ));
            }

            ProgressEvent::ItemStarting {
                item_number,
                total_items,
                item_title,
            } => {
                self.main_bar.set_message(format!(
                    "Starting item ({:0width$} / {}) {}",
                    item_number,
                    total_items,
                    truncate_title(&item_title, 50),
                    width = padding_width(total_items)
                ));
            }

            ProgressEvent::EnclosureSkipped { filename, reason } => {
                self.println(format!("{SKIP}{} {}", filename.dimmed(), reason));
            }

            ProgressEvent::ReplacingIncomplete {
                filename,
                existing,
                declared,
            } => {
                self.println(format!(
                    "{REPLACE}{} is incomplete ({} of {} bytes), downloading again",
                    filename.yellow(),
                    existing,
                    declared
                ));
            }

            ProgressEvent::DownloadStarting {
                item_title,
                item_number,
                total_items,
                content_length,
                ..
            } => {
                let bar = self.start_bar(content_length);
                bar.set_message(format!(
                    "[{}/{}] {}",
                    item_number.to_string().cyan(),
                    total_items.to_string().cyan(),
                    truncate_title(&item_title, 40)
                ));
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                self.with_bar(|bar| {
                    if let Some(total) = total_bytes {
                        bar.set_length(total);
                    }
                    bar.set_position(bytes_downloaded);
                });
            }

            ProgressEvent::DownloadCompleted { filename, .. } => {
                self.finish_bar();
                self.println(format!("{SUCCESS}{}", filename.green()));
            }

            ProgressEvent::DownloadFailed { filename, error } => {
                self.finish_bar();
                self.println(format!(
                    "{FAILURE}{} - {}",
                    truncate_title(&filename, 40).red(),
                    error.red()
                ));
            }

            ProgressEvent::SyncCompleted {
                downloaded_count,
                skipped_count,
                failed_count,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} downloaded, {} skipped, {} failed",
                    "Sync complete:".bold().green(),
                    downloaded_count.to_string().green().bold(),
                    skipped_count.to_string().yellow(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedpull=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let started = Local::now();

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            SATELLITE,
            "feedpull".bold().magenta(),
            "- Feed Enclosure Downloader".dimmed()
        );
    }

    let client = ReqwestClient::new();
    let options = args.sync_options();

    let terminal = (!args.quiet).then(|| Arc::new(IndicatifReporter::new()));
    let reporter: SharedProgressReporter = match &terminal {
        Some(terminal) => terminal.clone() as SharedProgressReporter,
        None => NoopReporter::shared(),
    };

    let result = sync_feed(&client, &args.feed_url, &options, reporter).await;
    if result.is_err()
        && let Some(terminal) = &terminal
    {
        terminal.abandon();
    }
    let result = result.context("Failed to sync feed")?;

    if args.quiet {
        return Ok(());
    }

    if !result.failed_enclosures.is_empty() {
        println!("\n{}", "Failed enclosures:".red().bold());
        for (filename, error) in &result.failed_enclosures {
            println!("  {}{} - {}", CROSS, filename.yellow(), error.dimmed());
        }
    }

    let stopped = Local::now();
    let elapsed = (stopped - started).to_std().unwrap_or_default();
    println!(
        "\n{FOLDER}Output: {}",
        args.output_dir.display().to_string().cyan()
    );
    println!(
        "Started at {}, stopped at {}, took {}\n",
        started.format("%Y-%m-%d %H:%M:%S"),
        stopped.format("%Y-%m-%d %H:%M:%S"),
        format!("{:.2?}", elapsed).bold()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_is_on_by_default() {
        let args = Args::parse_from(["feedpull", "https://example.com/feed.xml"]);
        let options = args.sync_options();

        assert!(options.numbers);
        assert!(!options.oldest_first);
        assert_eq!(options.output_dir, PathBuf::from("."));
        assert_eq!(options.sanitize, SanitizeMode::for_host());
    }

    #[test]
    fn flags_map_to_options() {
        let args = Args::parse_from([
            "feedpull",
            "--no-numbers",
            "-l",
            "--strict-names",
            "-o",
            "/tmp/out",
            "https://example.com/feed.xml",
        ]);
        let options = args.sync_options();

        assert_eq!(args.feed_url, "https://example.com/feed.xml");
        assert!(!options.numbers);
        assert!(options.oldest_first);
        assert_eq!(options.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(options.sanitize, SanitizeMode::Strict);
    }

    #[test]
    fn feed_url_is_required() {
        assert!(Args::try_parse_from(["feedpull"]).is_err());
    }

    #[test]
    fn truncate_title_respects_char_boundaries() {
        assert_eq!(truncate_title("short", 10), "short");
        assert_eq!(truncate_title("ééééééééééé", 6), "ééé...");
    }
}
