//! `clash` CLI — check timetable slots against a JSON snapshot of the
//! lecture and exam collections.
//!
//! ## Usage
//!
//! ```sh
//! # Would a lecture in H_01 from 09:30 to 10:30 clash with anything?
//! clash check --store timetable.json --date 2024-05-01 --start 09:30 --end 10:30 --venue H_01
//!
//! # Re-check lecture 12 after moving it, ignoring its own stored record
//! clash check --store timetable.json --date 2024-05-01 --start 11:00 --end 12:00 \
//!   --lecturer 2407 --exclude-kind lecture --exclude-id 12
//!
//! # JSON report, snapshot on stdin
//! cat timetable.json | clash check --date 2024-05-01 --start 09:00 --end 10:00 --venue H_01 --format json
//!
//! # Free slots of a venue within the teaching day
//! clash free --store timetable.json --date 2024-05-01 --venue H_01 --day-start 08:00 --day-end 18:00
//! ```
//!
//! `check` exits with status 0 when the slot is clear, 2 when it clashes,
//! and 1 on any error. Set `RUST_LOG=debug` to log each clash found.

use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use clash_engine::event::parse_time;
use clash_engine::{
    Candidate, ClashDetector, EventKind, EventRef, InMemoryEventStore, Resource, Snapshot,
    TimeWindow,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit status when the candidate slot clashes.
const EXIT_CLASH: i32 = 2;

#[derive(Parser)]
#[command(
    name = "clash",
    version,
    about = "Timetable clash detection for lectures and exams"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report every scheduled event a proposed slot would clash with
    Check {
        /// Snapshot file with "lectures" and "exams" arrays (stdin if omitted or "-")
        #[arg(short, long)]
        store: Option<String>,
        /// Date of the slot (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        /// Start time (HH:MM or HH:MM:SS)
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        /// End time (HH:MM or HH:MM:SS)
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        /// Venue the slot would occupy
        #[arg(long)]
        venue: Option<String>,
        /// Lecturer the slot would be assigned to
        #[arg(long)]
        lecturer: Option<String>,
        /// Course id (informational; never causes a clash)
        #[arg(long)]
        course: Option<String>,
        /// Kind of the stored event being edited
        #[arg(long, value_enum, requires = "exclude_id")]
        exclude_kind: Option<KindArg>,
        /// Id of the stored event being edited
        #[arg(long, requires = "exclude_kind")]
        exclude_id: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List free slots of a venue or lecturer on a date
    Free {
        /// Snapshot file with "lectures" and "exams" arrays (stdin if omitted or "-")
        #[arg(short, long)]
        store: Option<String>,
        /// Date to inspect (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long, conflicts_with = "lecturer", required_unless_present = "lecturer")]
        venue: Option<String>,
        #[arg(long)]
        lecturer: Option<String>,
        /// Start of the teaching day
        #[arg(long, value_parser = parse_time, default_value = "08:00")]
        day_start: NaiveTime,
        /// End of the teaching day
        #[arg(long, value_parser = parse_time, default_value = "18:00")]
        day_end: NaiveTime,
        /// Only list slots at least this many minutes long
        #[arg(long, default_value_t = 0)]
        min_minutes: i64,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Lecture,
    Exam,
}

impl From<KindArg> for EventKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Lecture => EventKind::Lecture,
            KindArg::Exam => EventKind::Exam,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            store,
            date,
            start,
            end,
            venue,
            lecturer,
            course,
            exclude_kind,
            exclude_id,
            format,
        } => {
            let detector = ClashDetector::new(load_store(store.as_deref())?);

            let candidate = Candidate {
                date,
                start_time: start,
                end_time: end,
                venue_id: venue,
                lecturer_id: lecturer,
                course_id: course,
            };
            let exclude = match (exclude_kind, exclude_id) {
                (Some(kind), Some(id)) => Some(EventRef::new(kind.into(), id)),
                _ => None,
            };

            let report = detector
                .check(&candidate, exclude.as_ref())
                .await
                .context("Clash check failed")?;

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                Format::Text if report.is_clear() => println!(
                    "No clashes on {} {}-{}",
                    date,
                    start.format("%H:%M"),
                    end.format("%H:%M")
                ),
                Format::Text => print!("{}", report.summary()),
            }

            if !report.is_clear() {
                process::exit(EXIT_CLASH);
            }
        }
        Commands::Free {
            store,
            date,
            venue,
            lecturer,
            day_start,
            day_end,
            min_minutes,
            format,
        } => {
            let detector = ClashDetector::new(load_store(store.as_deref())?);

            let resource = match (venue, lecturer) {
                (Some(venue), _) => Resource::Venue(venue),
                (None, Some(lecturer)) => Resource::Lecturer(lecturer),
                (None, None) => anyhow::bail!("Either --venue or --lecturer is required"),
            };
            let window = TimeWindow::new(day_start, day_end).context("Invalid teaching day")?;

            let slots: Vec<_> = detector
                .free_slots(&resource, date, window)
                .await
                .context("Free slot lookup failed")?
                .into_iter()
                .filter(|s| s.duration_minutes >= min_minutes)
                .collect();

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&slots)?),
                Format::Text if slots.is_empty() => println!("No free slots on {}", date),
                Format::Text => {
                    for slot in &slots {
                        println!(
                            "{}-{} ({} min)",
                            slot.start.format("%H:%M"),
                            slot.end.format("%H:%M"),
                            slot.duration_minutes
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Log to stderr so stdout carries only the report.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", s, e))
}

fn load_store(path: Option<&str>) -> Result<InMemoryEventStore> {
    let json = read_input(path)?;
    let snapshot = Snapshot::from_json(&json).context("Failed to load event snapshot")?;
    info!(
        source = path.unwrap_or("stdin"),
        lectures = snapshot.lectures.len(),
        exams = snapshot.exams.len(),
        "snapshot read"
    );
    Ok(InMemoryEventStore::from_snapshot(snapshot))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) if path != "-" => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
