//! boardwatch - whiteboard text consensus and change detection
//!
//! Ingests decoded OCR readings (JSON Lines), converges them into a stable
//! consensus transcription, and announces confirmed changes. Camera control,
//! OCR inference, and chat transport live in separate processes; this binary
//! only consumes (text, confidence) readings and publishes state files.

mod config;
mod consensus;
mod monitor;
mod notify;
mod storage;

use std::io::BufRead;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;
use crate::consensus::{summarize_history, HistoryRecord};
use crate::monitor::{MonitorEvent, RawReading, WhiteboardMonitor};
use crate::notify::MessageStyle;
use crate::storage::{HistoryLog, StatusSnapshot};

/// boardwatch - whiteboard text consensus and change detection
#[derive(Parser, Debug)]
#[command(name = "boardwatch")]
#[command(about = "Consensus and change detection over noisy whiteboard OCR readings")]
struct Args {
    /// Readings file (JSON Lines); reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Minimum confidence threshold for text recognition
    #[arg(long)]
    confidence: Option<f64>,

    /// Only announce new text, not cleared boards
    #[arg(long)]
    quiet: bool,

    /// Print the consensus over recent history and exit
    #[arg(long)]
    show_consensus: bool,

    /// Override the data directory for status and history files
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let data_dir = match &args.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("could not create data dir {}", dir.display()))?;
            dir.clone()
        }
        None => storage::get_data_dir().context("could not resolve data directory")?,
    };

    let history = HistoryLog::new(data_dir.join("whiteboard_history.jsonl"));
    let status_path = data_dir.join("whiteboard_status.json");
    let config_path = data_dir.join("config.toml");

    let mut app_config = load_or_create_config(&config_path);
    if let Some(confidence) = args.confidence {
        app_config.reader.min_confidence = confidence;
    }
    if args.quiet {
        app_config.notify.quiet = true;
    }

    // Query mode: consensus over the durable history, then exit
    if args.show_consensus {
        let records = history.read_recent(app_config.consensus.history_window)?;
        let summary = summarize_history(&records, app_config.consensus.history_top_k);
        println!(
            "Whiteboard consensus (last {} readings):\n{}",
            records.len(),
            notify::render_history_summary(&summary)
        );
        return Ok(());
    }

    info!("boardwatch starting...");
    info!(
        "Text confidence threshold: {}",
        app_config.reader.min_confidence
    );
    info!("Data directory: {}", data_dir.display());

    run_monitor(&args, app_config, &config_path, &status_path, &history)
}

/// Load configuration from file, writing the defaults on first run
fn load_or_create_config(path: &std::path::Path) -> AppConfig {
    if path.exists() {
        match config::load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                return config;
            }
            Err(e) => warn!("Could not read config file: {e}"),
        }
    } else if let Err(e) = config::save_config(&AppConfig::default(), path) {
        warn!("Could not write default config: {e}");
    } else {
        info!("Created default config file: {}", path.display());
    }
    AppConfig::default()
}

/// Main polling loop: one reading per input line
fn run_monitor(
    args: &Args,
    mut app_config: AppConfig,
    config_path: &std::path::Path,
    status_path: &std::path::Path,
    history: &HistoryLog,
) -> Result<()> {
    let username = std::env::var("USER").ok();
    let hostname = std::env::var("HOSTNAME").ok();

    let mut monitor = WhiteboardMonitor::new(&app_config);
    let mut notifications_enabled = app_config.notify.enabled;

    write_status(status_path, &monitor, 0, username.as_deref(), hostname.as_deref());

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(std::io::BufReader::new(
            std::fs::File::open(path)
                .with_context(|| format!("could not open readings file {}", path.display()))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };

    let status_interval = Duration::from_secs(app_config.timing.status_interval_secs);
    let config_interval = Duration::from_secs(app_config.timing.config_check_interval_secs);
    let feedback_interval = Duration::from_secs(app_config.timing.feedback_interval_secs);
    let start = Instant::now();
    let mut last_status_update = start;
    let mut last_config_check = start;
    // First feedback is allowed immediately
    let mut last_feedback = start.checked_sub(feedback_interval).unwrap_or(start);

    info!("Reading whiteboard text...");

    for line in reader.lines() {
        let line = line.context("failed to read input line")?;
        if line.trim().is_empty() {
            continue;
        }

        let reading: RawReading = match serde_json::from_str(&line) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("skipping malformed reading: {e}");
                continue;
            }
        };

        let now = Instant::now();
        let ingest = monitor.process_reading(&reading, now);

        if let Some(best) = monitor.consensus_text().first() {
            debug!(
                "Regions: {} | Best: \"{}\" ({:.0}%)",
                reading.num_regions,
                best,
                monitor.consensus_confidence() * 100.0
            );
        } else {
            debug!("Regions: {} | Text: [none]", reading.num_regions);
        }

        // Every detection goes to the durable history, not just changes
        if reading.num_regions > 0 {
            let record = HistoryRecord {
                timestamp_ms: storage::now_epoch_ms(),
                text_lines: ingest.kept_lines.clone(),
                num_regions: reading.num_regions,
                avg_confidence: ingest.avg_confidence,
            };
            if let Err(e) = history.append(&record) {
                warn!("could not log text history: {e}");
            }
        }

        match &ingest.event {
            Some(MonitorEvent::Changed {
                classification,
                text,
                details,
            }) => {
                let message = notify::render_change(classification, text, MessageStyle::Console);
                info!("{message}");
                for detail in details.iter().take(3).filter(|d| d.times_seen > 1) {
                    info!(
                        "  (seen {}x, best confidence: {:.0}%)",
                        detail.times_seen,
                        detail.confidence * 100.0
                    );
                }
                debug!("{}", notify::render_consensus_summary(details));
                if notifications_enabled {
                    // Markdown rendering is what an external relay forwards
                    println!(
                        "{}",
                        notify::render_change(classification, text, MessageStyle::Markdown)
                    );
                }
                write_status(
                    status_path,
                    &monitor,
                    reading.num_regions,
                    username.as_deref(),
                    hostname.as_deref(),
                );
                last_status_update = now;
            }
            Some(MonitorEvent::Cleared { previous }) => {
                let message = notify::render_cleared(previous, MessageStyle::Console);
                info!("{message}");
                if notifications_enabled && !app_config.notify.quiet {
                    println!("{}", notify::render_cleared(previous, MessageStyle::Markdown));
                }
                write_status(
                    status_path,
                    &monitor,
                    reading.num_regions,
                    username.as_deref(),
                    hostname.as_deref(),
                );
                last_status_update = now;
            }
            None => {}
        }

        // Throttled quality feedback
        if now.duration_since(last_feedback) >= feedback_interval && reading.num_regions > 0 {
            let feedback = notify::quality_feedback(
                ingest.avg_confidence,
                reading.num_regions,
                ingest.kept_lines.len(),
            );
            if !feedback.is_empty() {
                for tip in &feedback {
                    info!("{tip}");
                }
                last_feedback = now;
            }
        }

        // Periodic status refresh
        if now.duration_since(last_status_update) >= status_interval {
            write_status(
                status_path,
                &monitor,
                reading.num_regions,
                username.as_deref(),
                hostname.as_deref(),
            );
            last_status_update = now;
        }

        // Periodic config re-read for runtime-mutable settings
        if now.duration_since(last_config_check) >= config_interval {
            if let Ok(new_config) = config::load_config(config_path) {
                if (new_config.reader.min_confidence - app_config.reader.min_confidence).abs()
                    > f64::EPSILON
                {
                    info!(
                        "Config updated: min_confidence={}",
                        new_config.reader.min_confidence
                    );
                    monitor.set_min_confidence(new_config.reader.min_confidence);
                }
                notifications_enabled = new_config.notify.enabled;
                app_config = new_config;
                // CLI flags stay in force across config reloads
                if args.quiet {
                    app_config.notify.quiet = true;
                }
            }
            last_config_check = now;
        }
    }

    info!("Input exhausted, whiteboard monitor stopping");
    if let Err(e) = storage::write_status(
        status_path,
        &StatusSnapshot::stopped(storage::now_epoch_ms()),
    ) {
        warn!("could not update status file: {e}");
    }

    Ok(())
}

/// Write the current monitor state to the status file
fn write_status(
    path: &std::path::Path,
    monitor: &WhiteboardMonitor,
    num_regions: usize,
    username: Option<&str>,
    hostname: Option<&str>,
) {
    let snapshot = StatusSnapshot {
        text_detected: monitor.text_detected(),
        text_content: monitor.last_confirmed().to_vec(),
        num_text_regions: num_regions,
        timestamp_ms: storage::now_epoch_ms(),
        running: true,
        username: username.map(str::to_string),
        hostname: hostname.map(str::to_string),
    };
    if let Err(e) = storage::write_status(path, &snapshot) {
        warn!("could not update status file: {e}");
    }
}
