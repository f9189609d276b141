//! Volatility profiling.
//!
//! Standard deviation of game-log efficiency measures how predictable
//! each team is. High-variance teams are boom-or-bust and drag model
//! confidence down; a clearly more stable team earns a small lean.

use anyhow::Result;
use serde_json::json;

use super::{round2, std_dev};
use crate::models::{DimensionResult, GameLogRow, MatchupContext};

pub const NAME: &str = "variance";

const HIGH_VOL: f64 = 10.0;
const MED_VOL: f64 = 6.0;
const MIN_GAMES: usize = 5;

#[derive(Debug, Clone)]
struct VolStats {
    oe_std: f64,
    ceiling: f64,
    floor: f64,
    volatility: &'static str,
    games: usize,
}

fn vol_label(std: f64) -> &'static str {
    if std >= HIGH_VOL {
        "High"
    } else if std >= MED_VOL {
        "Medium"
    } else {
        "Low"
    }
}

fn analyze_team(logs: &[GameLogRow]) -> Option<VolStats> {
    let oe: Vec<f64> = logs.iter().filter_map(|g| g.adj_oe).collect();
    if oe.len() < MIN_GAMES {
        return None;
    }

    let oe_std = std_dev(&oe)?;
    let ceiling = oe.iter().copied().fold(f64::MIN, f64::max);
    let floor = oe.iter().copied().fold(f64::MAX, f64::min);

    Some(VolStats {
        oe_std,
        ceiling,
        floor,
        volatility: vol_label(oe_std),
        games: oe.len(),
    })
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    let away_v = analyze_team(&ctx.away_game_logs);
    let home_v = analyze_team(&ctx.home_game_logs);

    if away_v.is_none() && home_v.is_none() {
        return Ok(DimensionResult::neutral(
            NAME,
            "Insufficient game-log data for variance analysis.",
        ));
    }

    let mut parts: Vec<String> = Vec::new();
    let mut spread_edge = 0.0;
    let mut total_edge = 0.0;
    let mut confidence_penalty: f64 = 0.0;

    for (label, stats, sign) in [
        (&ctx.away_team, &away_v, 1.0f64),
        (&ctx.home_team, &home_v, -1.0f64),
    ] {
        let Some(s) = stats else {
            parts.push(format!("{}: variance data unavailable.", label));
            continue;
        };

        parts.push(format!(
            "{} {} volatility (OE std {:.1}, ceiling {:.1}, floor {:.1}, range {:.1}).",
            label,
            s.volatility,
            s.oe_std,
            s.ceiling,
            s.floor,
            s.ceiling - s.floor
        ));

        // Boom-or-bust teams are unreliable to back, and their blowout
        // losses suppress scoring.
        if s.volatility == "High" {
            confidence_penalty += 0.15;
            total_edge -= 0.3 * sign;
        }
    }

    // When one team is distinctly steadier, lean toward it covering.
    if let (Some(a), Some(h)) = (&away_v, &home_v) {
        let vol_diff = a.oe_std - h.oe_std;
        if vol_diff.abs() > 3.0 {
            let stable = if vol_diff > 0.0 {
                &ctx.home_team
            } else {
                &ctx.away_team
            };
            parts.push(format!(
                "{} is notably more consistent (std diff {:.1}).",
                stable,
                vol_diff.abs()
            ));
            spread_edge += -vol_diff.signum() * vol_diff.abs() * 0.08;
        }

        let combined_std = (a.oe_std + h.oe_std) / 2.0;
        if combined_std > HIGH_VOL {
            parts.push("Both teams are highly volatile; total market is a coinflip.".to_string());
            total_edge = 0.0;
            confidence_penalty += 0.10;
        }
    }

    let conf = round2((0.50 - confidence_penalty).clamp(0.10, 0.70));

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        round2(total_edge),
        conf,
        parts.join(" "),
    )
    .with_raw(json!({
        "away_oe_std": away_v.as_ref().map(|s| round2(s.oe_std)),
        "home_oe_std": home_v.as_ref().map(|s| round2(s.oe_std)),
        "away_games": away_v.as_ref().map(|s| s.games),
        "home_games": home_v.as_ref().map(|s| s.games),
    })))
}
