//! Historical pick evaluation.
//!
//! Replays resolved picks from storage, groups win/loss/push records by
//! confidence tier, computes flat-stake ROI and accuracy, and builds a
//! reliability-diagram calibration table. Tiers are re-derived from the
//! stored composite with the live thresholds, never read back from the
//! stored label.

use anyhow::{bail, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::db::picks::{self, PickRow};
use crate::scoring::{assign_tier, Tier};

// Standard -110 juice: risk 110 to win 100.
const JUICE_RISK: f64 = 110.0;
const JUICE_WIN: f64 = 100.0;

// Composite-score bands for the calibration table. Deliberately a
// separate binning from the tier thresholds: the top tier is split so
// the reliability diagram resolves its strongest picks.
const CALIBRATION_BANDS: &[(&str, f64, f64, f64)] = &[
    ("0-2", 0.0, 2.0, 0.10),
    ("2-4.5", 2.0, 4.5, 0.325),
    ("4.5-7", 4.5, 7.0, 0.575),
    ("7-8.5", 7.0, 8.5, 0.775),
    ("8.5-10", 8.5, 10.01, 0.925),
];

/// Optional restrictions on which resolved picks are evaluated.
#[derive(Debug, Clone, Default)]
pub struct BacktestFilters {
    pub season: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Win/loss/push record for one tier.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TierRecord {
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
}

/// One calibration bucket: fixed predicted probability vs observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRow {
    pub bucket: String,
    pub predicted: f64,
    pub actual: f64,
    pub count: usize,
}

/// Aggregated backtest output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub total_picks: usize,
    pub record: BTreeMap<Tier, TierRecord>,
    pub roi_by_tier: BTreeMap<Tier, f64>,
    pub accuracy_by_tier: BTreeMap<Tier, f64>,
    pub overall_roi: f64,
    pub calibration: Vec<CalibrationRow>,
}

impl BacktestReport {
    fn empty() -> Self {
        Self {
            total_picks: 0,
            record: BTreeMap::new(),
            roi_by_tier: BTreeMap::new(),
            accuracy_by_tier: BTreeMap::new(),
            overall_roi: 0.0,
            calibration: Vec::new(),
        }
    }
}

/// Flat-unit ROI at -110: profit over total risk, pushes excluded.
/// 0.0 when there are no decided bets.
fn compute_roi(wins: u32, losses: u32) -> f64 {
    let decided = wins + losses;
    if decided == 0 {
        return 0.0;
    }
    let profit = wins as f64 * JUICE_WIN - losses as f64 * JUICE_RISK;
    profit / (decided as f64 * JUICE_RISK)
}

/// Win percentage excluding pushes; 0.0 with no decided bets.
fn compute_accuracy(wins: u32, losses: u32) -> f64 {
    let decided = wins + losses;
    if decided == 0 {
        return 0.0;
    }
    wins as f64 / decided as f64
}

/// Reliability table over the decided picks. Buckets with no samples
/// are omitted entirely.
fn build_calibration(rows: &[PickRow]) -> Vec<CalibrationRow> {
    let mut table = Vec::new();

    for (label, lo, hi, predicted) in CALIBRATION_BANDS {
        let mut wins = 0usize;
        let mut decided = 0usize;
        for row in rows {
            let in_band = row.composite_score >= *lo && row.composite_score < *hi;
            if !in_band {
                continue;
            }
            match row.result.as_deref() {
                Some("W") => {
                    wins += 1;
                    decided += 1;
                }
                Some("L") => decided += 1,
                _ => {}
            }
        }
        if decided == 0 {
            continue;
        }
        table.push(CalibrationRow {
            bucket: label.to_string(),
            predicted: *predicted,
            actual: wins as f64 / decided as f64,
            count: decided,
        });
    }

    table
}

/// Evaluate historical pick performance over the filtered window.
pub fn run_backtest(conn: &Connection, filters: &BacktestFilters) -> Result<BacktestReport> {
    let rows = picks::resolved_picks(
        conn,
        filters.season,
        filters.start_date.as_deref(),
        filters.end_date.as_deref(),
    )?;

    if rows.is_empty() {
        warn!("no resolved picks found for backtest query");
        return Ok(BacktestReport::empty());
    }

    // Group by tier, re-derived from the stored composite so the
    // evaluation always reflects the current thresholds.
    let mut record: BTreeMap<Tier, TierRecord> = BTreeMap::new();
    for row in &rows {
        let tier = assign_tier(row.composite_score);
        let entry = record.entry(tier).or_default();
        match row.result.as_deref() {
            Some("W") => entry.wins += 1,
            Some("L") => entry.losses += 1,
            Some("P") => entry.pushes += 1,
            other => warn!(result = ?other, "ignoring pick with unrecognized result"),
        }
    }

    let roi_by_tier: BTreeMap<Tier, f64> = record
        .iter()
        .map(|(tier, rec)| (*tier, compute_roi(rec.wins, rec.losses)))
        .collect();
    let accuracy_by_tier: BTreeMap<Tier, f64> = record
        .iter()
        .map(|(tier, rec)| (*tier, compute_accuracy(rec.wins, rec.losses)))
        .collect();

    let total_wins: u32 = record.values().map(|r| r.wins).sum();
    let total_losses: u32 = record.values().map(|r| r.losses).sum();
    let overall_roi = compute_roi(total_wins, total_losses);

    let calibration = build_calibration(&rows);

    let report = BacktestReport {
        total_picks: rows.len(),
        record,
        roi_by_tier,
        accuracy_by_tier,
        overall_roi,
        calibration,
    };

    info!(
        picks = report.total_picks,
        overall_roi_pct = format!("{:.1}", report.overall_roi * 100.0),
        "backtest complete"
    );
    Ok(report)
}

/// Record the outcome of a previously made pick.
///
/// The one input-validation path that is not silently recovered: an
/// unrecognized result code or pick type is a caller bug and errors
/// immediately. A missing unresolved row is only a warning.
pub fn record_result(
    conn: &Connection,
    game_date: &str,
    away_team: &str,
    home_team: &str,
    pick_type: &str,
    result: &str,
) -> Result<()> {
    let result = result.to_ascii_uppercase();
    let pick_type = pick_type.to_ascii_lowercase();

    if !matches!(result.as_str(), "W" | "L" | "P") {
        bail!("result must be 'W', 'L', or 'P', got {result:?}");
    }
    if !matches!(pick_type.as_str(), "spread" | "total") {
        bail!("pick_type must be 'spread' or 'total', got {pick_type:?}");
    }

    let updated = picks::set_result(conn, game_date, away_team, home_team, &pick_type, &result)?;

    if updated == 0 {
        warn!(
            away = away_team,
            home = home_team,
            game_date,
            pick_type,
            "no unresolved pick found; it may already have a result or may not exist"
        );
    } else {
        info!(
            away = away_team,
            home = home_team,
            game_date,
            pick_type,
            result,
            "recorded pick result"
        );
    }
    Ok(())
}
