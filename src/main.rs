use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod activity;
mod db;
mod models;
mod report;

#[derive(Parser)]
#[command(name = "activity-insights")]
#[command(about = "Active-user insight tracker for learner and parent sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import session rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the DAU/WAU/MAU snapshot
    Snapshot {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate a markdown activity report
    Report {
        #[arg(long, default_value_t = 7)]
        days: usize,
        #[arg(long, default_value_t = 4)]
        weeks: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let outcome = db::import_csv(&pool, &csv).await?;
            println!(
                "Inserted {} sessions from {} ({} rows skipped).",
                outcome.inserted,
                csv.display(),
                outcome.skipped
            );
        }
        Commands::Snapshot { json } => {
            let now = Utc::now();
            let sessions = db::fetch_sessions(&pool, activity::monthly_window_start(now)).await?;
            let snapshot = activity::compute_snapshot(&sessions, now);

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("Active users:");
                for (label, window) in [
                    ("daily", &snapshot.daily),
                    ("weekly", &snapshot.weekly),
                    ("monthly", &snapshot.monthly),
                ] {
                    println!(
                        "- {}: {} total ({} learners, {} parents)",
                        label, window.total, window.learners, window.parents
                    );
                }
            }
        }
        Commands::Report { days, weeks, out } => {
            let now = Utc::now();
            // Widen the fetch window when a trend reaches back past 30 days.
            let span = (days as i64).max(weeks as i64 * 7).max(30);
            let since = activity::day_start(now) - chrono::Duration::days(span);
            let sessions = db::fetch_sessions(&pool, since).await?;
            let snapshot = activity::compute_snapshot(&sessions, now);
            let daily = activity::build_daily_trend(&sessions, now, days);
            let weekly = activity::build_weekly_trend(&sessions, now, weeks);

            let report = report::build_report(&snapshot, &daily, &weekly, now);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
