//! Recency and momentum.
//!
//! Compares last-five-game efficiency to the season baseline for each
//! team, plus the multi-snapshot ratings trajectory when history exists.

use anyhow::Result;
use serde_json::json;

use super::{mean, round2};
use crate::models::{DimensionResult, GameLogRow, MatchupContext, RatingsSnapshot};

pub const NAME: &str = "recency";

const WINDOW: usize = 5;
const TREND_THRESHOLD_PCT: f64 = 3.0;

#[derive(Debug, Clone)]
struct Trend {
    season_oe: f64,
    recent_oe: f64,
    oe_pct: f64,
    oe_trend: &'static str,
    season_de: Option<f64>,
    recent_de: Option<f64>,
    de_trend: &'static str,
}

fn pct_change(recent: f64, season: f64) -> f64 {
    if season == 0.0 {
        0.0
    } else {
        (recent - season) / season.abs() * 100.0
    }
}

fn classify(pct: f64) -> &'static str {
    if pct > TREND_THRESHOLD_PCT {
        "improving"
    } else if pct < -TREND_THRESHOLD_PCT {
        "declining"
    } else {
        "stable"
    }
}

fn game_log_trend(logs: &[GameLogRow]) -> Option<Trend> {
    let mut sorted: Vec<&GameLogRow> = logs.iter().filter(|g| g.adj_oe.is_some()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| b.game_date.cmp(&a.game_date));

    let recent: Vec<&GameLogRow> = sorted.iter().take(WINDOW).copied().collect();
    if recent.len() < 3 {
        return None;
    }

    let season_oe = mean(&sorted.iter().filter_map(|g| g.adj_oe).collect::<Vec<_>>())?;
    let recent_oe = mean(&recent.iter().filter_map(|g| g.adj_oe).collect::<Vec<_>>())?;
    let oe_pct = pct_change(recent_oe, season_oe);

    let season_de = mean(&sorted.iter().filter_map(|g| g.adj_de).collect::<Vec<_>>());
    let recent_de = mean(&recent.iter().filter_map(|g| g.adj_de).collect::<Vec<_>>());
    let de_pct = match (recent_de, season_de) {
        (Some(r), Some(s)) => pct_change(r, s),
        _ => 0.0,
    };

    Some(Trend {
        season_oe,
        recent_oe,
        oe_pct,
        oe_trend: classify(oe_pct),
        season_de,
        recent_de,
        // Lower defensive efficiency is better, so invert the sign.
        de_trend: classify(-de_pct),
    })
}

/// Season-long trajectory from dated ratings snapshots: first-half mean
/// vs second-half mean of the efficiency margin.
fn history_trend(history: &[RatingsSnapshot]) -> Option<&'static str> {
    if history.len() < 3 {
        return None;
    }
    let mut sorted: Vec<&RatingsSnapshot> = history.iter().collect();
    sorted.sort_by(|a, b| a.scrape_date.cmp(&b.scrape_date));

    let vals: Vec<f64> = sorted.iter().filter_map(|s| s.adj_em).collect();
    if vals.len() < 3 {
        return None;
    }

    let mid = vals.len() / 2;
    let first = mean(&vals[..mid])?;
    let second = mean(&vals[mid..])?;
    let diff = second - first;

    Some(if diff > 1.5 {
        "upward trajectory"
    } else if diff < -1.5 {
        "downward trajectory"
    } else {
        "flat trajectory"
    })
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    let away_trend = game_log_trend(&ctx.away_game_logs);
    let home_trend = game_log_trend(&ctx.home_game_logs);

    if away_trend.is_none() && home_trend.is_none() {
        return Ok(DimensionResult::neutral(
            NAME,
            "Insufficient game-log data for recency analysis.",
        ));
    }

    let mut spread_edge = 0.0;
    let mut total_edge = 0.0;
    let mut parts: Vec<String> = Vec::new();

    for (label, trend, sign) in [
        (&ctx.away_team, &away_trend, 1.0),
        (&ctx.home_team, &home_trend, -1.0),
    ] {
        let Some(t) = trend else {
            parts.push(format!("{}: no recent trend data.", label));
            continue;
        };

        parts.push(format!(
            "{} offense {} (last {}: {:.1}, season: {:.1}, {:+.1}%). Defense {}.",
            label, t.oe_trend, WINDOW, t.recent_oe, t.season_oe, t.oe_pct, t.de_trend
        ));

        // An improving offense helps its own side; an improving defense
        // (falling DE) does the same.
        let oe_boost = (t.recent_oe - t.season_oe) * 0.04;
        let de_boost = match (t.season_de, t.recent_de) {
            (Some(season), Some(recent)) => (season - recent) * 0.04,
            _ => 0.0,
        };

        spread_edge += sign * (oe_boost + de_boost);
        total_edge += oe_boost * 0.5; // hotter offense pushes the total up
    }

    let away_hist = history_trend(&ctx.away_ratings_history);
    let home_hist = history_trend(&ctx.home_ratings_history);
    for (label, hist, sign) in [
        (&ctx.away_team, away_hist, 1.0),
        (&ctx.home_team, home_hist, -1.0),
    ] {
        if let Some(h) = hist {
            parts.push(format!("{} season-long {}.", label, h));
            if h.starts_with("upward") {
                spread_edge += sign * 0.5;
            } else if h.starts_with("downward") {
                spread_edge -= sign * 0.5;
            }
        }
    }

    let mut pcts = Vec::new();
    if let Some(t) = &away_trend {
        pcts.push(t.oe_pct.abs());
    }
    if let Some(t) = &home_trend {
        pcts.push(t.oe_pct.abs());
    }
    let avg_pct = mean(&pcts).unwrap_or(0.0);
    let conf = round2((0.20 + avg_pct * 0.04).min(0.75).max(0.10));

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        round2(total_edge),
        conf,
        parts.join(" "),
    )
    .with_raw(json!({
        "away_oe_trend": away_trend.as_ref().map(|t| t.oe_trend),
        "home_oe_trend": home_trend.as_ref().map(|t| t.oe_trend),
        "away_history": away_hist,
        "home_history": home_hist,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(date: &str, adj_oe: f64, adj_de: Option<f64>) -> GameLogRow {
        GameLogRow {
            game_date: date.into(),
            opponent: "Opp".into(),
            location: None,
            result: None,
            team_score: None,
            opp_score: None,
            adj_oe: Some(adj_oe),
            adj_de,
            to_pct: None,
            opp_to_pct: None,
            opp_adj_de_rank: None,
        }
    }

    #[test]
    fn neutral_with_too_few_games() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_game_logs = vec![log("2025-01-01", 110.0, None), log("2025-01-03", 108.0, None)];
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn surging_away_offense_gives_away_edge() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        // Eight-game season: early games at 100, recent five at 112.
        let mut logs = Vec::new();
        for (i, oe) in [100.0, 100.0, 100.0, 112.0, 112.0, 112.0, 112.0, 112.0]
            .iter()
            .enumerate()
        {
            logs.push(log(&format!("2025-01-{:02}", i + 1), *oe, None));
        }
        ctx.away_game_logs = logs;

        let r = analyze(&ctx).unwrap();
        assert!(r.spread_edge > 0.0, "edge {}", r.spread_edge);
        assert!(r.total_edge > 0.0);
        assert!(r.narrative.contains("improving"));
    }

    #[test]
    fn upward_history_adds_half_point() {
        let snap = |d: &str, em: f64| RatingsSnapshot {
            scrape_date: d.into(),
            adj_em: Some(em),
        };
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_game_logs = (1..=5)
            .map(|i| log(&format!("2025-01-{:02}", i), 105.0, None))
            .collect();
        let base = analyze(&ctx).unwrap();

        ctx.away_ratings_history = vec![
            snap("2025-01-01", 5.0),
            snap("2025-01-08", 8.0),
            snap("2025-01-15", 12.0),
            snap("2025-01-22", 14.0),
        ];
        let with_hist = analyze(&ctx).unwrap();
        assert!((with_hist.spread_edge - base.spread_edge - 0.5).abs() < 1e-9);
        assert!(with_hist.narrative.contains("upward trajectory"));
    }
}
