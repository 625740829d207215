//! Roster generator (roster-gen) - command-line entry point
//!
//! Manages the volunteer roster database and generates the season's duty
//! schedule.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use roster_common::config::default_config_path;
use roster_common::db::{self, availability, members, runs, shifts, summary};
use roster_common::models::AvailabilityKind;
use roster_common::seed::seed_demo_data;
use roster_common::{RosterConfig, ShiftGenerator};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for roster-gen
#[derive(Parser, Debug)]
#[command(name = "roster-gen")]
#[command(about = "Volunteer duty roster generator")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "ROSTER_CONFIG")]
    config: Option<PathBuf>,

    /// Database file; overrides ROSTER_DATABASE and the config file
    #[arg(short, long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and schema
    Init,
    /// Replace roster and availability with demo data
    Seed {
        /// RNG seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Register a member
    AddMember {
        name: String,
        #[arg(long, default_value_t = 1)]
        grade: u32,
        /// Leadership position label
        #[arg(long)]
        position: Option<String>,
    },
    /// Mark a member inactive
    DeactivateMember { id: i64 },
    /// List active members
    Members,
    /// Record a member's availability for a date
    Declare {
        member_id: i64,
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
        /// full_day, am_only, pm_only or unavailable
        kind: AvailabilityKind,
    },
    /// Generate and publish the season schedule
    Generate {
        /// RNG seed for a reproducible schedule
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the published schedule
    Schedule {
        #[arg(long)]
        json: bool,
    },
    /// Print the workload summary
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Rebuild the summary from the stored shifts
    RefreshSummary,
    /// List past generation runs
    Runs,
}

fn init_tracing(level: &str) {
    let default_filter = format!("roster_gen={level},roster_common={level}");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging is configured from the file, so the outcome is reported after
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let loaded = RosterConfig::load_if_present(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    init_tracing(&config.logging.level);
    if config_found {
        info!("Config: {}", config_path.display());
    } else {
        warn!("Config {} not found, using defaults", config_path.display());
    }

    let db_path = config.resolve_database_path(args.database.as_deref());
    info!("Database: {}", db_path.display());

    run(args.command, config, &db_path).await
}

async fn run(command: Command, config: RosterConfig, db_path: &Path) -> Result<()> {
    let pool = db::init_database(db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match command {
        Command::Init => {
            println!("Database ready at {}", db_path.display());
        }
        Command::Seed { seed } => {
            let stats = seed_demo_data(&pool, &config.season, &mut rng_from(seed))
                .await
                .context("Failed to seed demo data")?;
            println!(
                "Seeded {} members and {} availability declarations",
                stats.members, stats.declarations
            );
        }
        Command::AddMember {
            name,
            grade,
            position,
        } => {
            let id = members::add_member(&pool, &name, grade, position.as_deref())
                .await
                .context("Failed to add member")?;
            println!("Added member {} ({})", id, name);
        }
        Command::DeactivateMember { id } => {
            members::deactivate_member(&pool, id)
                .await
                .context("Failed to deactivate member")?;
            println!("Deactivated member {}", id);
        }
        Command::Members => {
            for member in members::list_active_members(&pool).await? {
                println!(
                    "{:>4}  {:<20} grade {}  {}",
                    member.id,
                    member.name,
                    member.grade,
                    member.position.as_deref().unwrap_or("")
                );
            }
        }
        Command::Declare {
            member_id,
            date,
            kind,
        } => {
            availability::declare_availability(&pool, member_id, date, kind)
                .await
                .context("Failed to record availability")?;
            println!("Member {} is {} on {}", member_id, kind, date);
        }
        Command::Generate { seed } => {
            let generator = ShiftGenerator::new(pool, config);
            let report = generator
                .generate(&mut rng_from(seed))
                .await
                .context("Schedule generation failed")?;

            println!(
                "Run {}: {} assignments over {} days",
                report.run_id,
                report.assignment_count,
                report.days.len()
            );
            if !report.anomalies.is_empty() {
                println!(
                    "{} anomalies ({} understaffed days)",
                    report.anomalies.len(),
                    report.understaffed_days()
                );
                for anomaly in &report.anomalies {
                    println!("  {}", serde_json::to_string(anomaly)?);
                }
            }
        }
        Command::Schedule { json } => {
            let schedule = shifts::load_schedule(&pool).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&schedule)?);
            } else {
                let mut current: Option<NaiveDate> = None;
                for entry in &schedule {
                    if current != Some(entry.date) {
                        println!("{}", entry.date.format("%Y-%m-%d (%a)"));
                        current = Some(entry.date);
                    }
                    println!("    {:<20} {}", entry.name, entry.tier);
                }
            }
        }
        Command::Summary { json } => {
            let rows = summary::load_summary_view(&pool).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!(
                    "{:<20} {:>5} {:>6} {:>6} {:>6} {:>8}",
                    "name", "grade", "days", "A", "B", "B ratio"
                );
                for row in &rows {
                    println!(
                        "{:<20} {:>5} {:>6} {:>6} {:>6} {:>7.1}%",
                        row.name,
                        row.grade,
                        row.record.total_days,
                        row.record.tier_a_days,
                        row.record.tier_b_days,
                        row.record.tier_b_ratio_percent
                    );
                }
            }
        }
        Command::RefreshSummary => {
            let generator = ShiftGenerator::new(pool, config);
            let rows = generator
                .refresh_summary()
                .await
                .context("Failed to refresh summary")?;
            println!("Summary rebuilt for {} members", rows.len());
        }
        Command::Runs => {
            for run in runs::list_runs(&pool).await? {
                println!(
                    "{}  {}  {}..{}  {} assignments, {} anomalies",
                    run.run_id,
                    run.started_at.format("%Y-%m-%d %H:%M:%S"),
                    run.season_start,
                    run.season_end,
                    run.assignment_count,
                    run.anomaly_count
                );
            }
        }
    }

    Ok(())
}
