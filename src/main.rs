//! courtedge CLI: initialize the database, analyze a slate or a single
//! matchup, backtest historical picks, and record pick outcomes.

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use courtedge::backtest::{self, BacktestFilters};
use courtedge::db;
use courtedge::models::Config;
use courtedge::pipeline::AnalysisPipeline;
use courtedge::report;

#[derive(Parser, Debug)]
#[command(name = "courtedge")]
#[command(about = "College basketball matchup analysis and pick tracking")]
struct Cli {
    /// Path to the SQLite database (falls back to DATABASE_PATH).
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database schema (idempotent)
    Init,

    /// Analyze a slate (--date) or a single matchup (--away/--home)
    Analyze {
        /// Game date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Away team for single-game mode
        #[arg(long, requires = "home")]
        away: Option<String>,

        /// Home team for single-game mode
        #[arg(long, requires = "away")]
        home: Option<String>,

        /// Season year (defaults to the current season)
        #[arg(long)]
        season: Option<i32>,

        /// Show the per-dimension breakdown
        #[arg(long, short)]
        verbose: bool,
    },

    /// Evaluate historical pick performance
    Backtest {
        /// Restrict to a season year
        #[arg(long)]
        season: Option<i32>,

        /// Earliest game date to include, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,

        /// Latest game date to include, YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
    },

    /// Record the outcome of a previously made pick
    Result {
        /// Game date, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Away team
        #[arg(long)]
        away: String,

        /// Home team
        #[arg(long)]
        home: String,

        /// Pick type: spread or total
        #[arg(long = "type")]
        pick_type: String,

        /// Outcome: W, L, or P
        #[arg(long)]
        result: String,
    },
}

/// Current season year. The college season straddles two calendar
/// years: from August on, it is the next year's season.
fn current_season() -> i32 {
    let today = Local::now().date_naive();
    if today.month() >= 8 {
        today.year() + 1
    } else {
        today.year()
    }
}

fn validate_date(date: &str) -> Result<()> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid date {date:?}, expected YYYY-MM-DD"))?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let db_path = cli
        .db
        .unwrap_or_else(|| PathBuf::from(Config::from_env().database_path));

    match cli.command {
        Commands::Init => {
            let conn = db::open(&db_path)?;
            db::init_schema(&conn)?;
            println!("Database initialized at {}", db_path.display());
        }

        Commands::Analyze {
            date,
            away,
            home,
            season,
            verbose,
        } => {
            let date = date.unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
            validate_date(&date)?;
            let season = season.unwrap_or_else(current_season);

            let conn = db::open(&db_path)?;
            db::init_schema(&conn)?;
            let mut pipeline = AnalysisPipeline::new(conn);

            match (away, home) {
                (Some(away), Some(home)) => {
                    let ctx = pipeline.build_context(&away, &home, &date, season);
                    let card = pipeline.analyze_matchup(&ctx)?;
                    report::print_card(&card, verbose);
                }
                _ => {
                    let slate = pipeline.analyze_slate(&date, season)?;
                    report::print_slate(&slate, verbose);
                }
            }
        }

        Commands::Backtest { season, start, end } => {
            if let Some(start) = &start {
                validate_date(start)?;
            }
            if let Some(end) = &end {
                validate_date(end)?;
            }

            let conn = db::open(&db_path)?;
            db::init_schema(&conn)?;
            let filters = BacktestFilters {
                season,
                start_date: start,
                end_date: end,
            };
            let result = backtest::run_backtest(&conn, &filters)?;
            report::print_backtest(&result);
        }

        Commands::Result {
            date,
            away,
            home,
            pick_type,
            result,
        } => {
            validate_date(&date)?;
            let conn = db::open(&db_path)?;
            db::init_schema(&conn)?;
            backtest::record_result(&conn, &date, &away, &home, &pick_type, &result)?;
        }
    }

    Ok(())
}
