//! Turnover matchups.
//!
//! Weighs each offense's ball security against the opposing defense's
//! ability to force mistakes. A turnover-prone offense meeting a
//! steal-heavy defense bleeds possessions; the reverse carves through.

use anyhow::Result;
use serde_json::json;

use super::{round2, std_dev};
use crate::models::{DimensionResult, GameLogRow, MatchupContext, StatLine};

pub const NAME: &str = "turnover_chain";

const D1_TEAMS: f64 = 364.0;

fn tier(rank: f64) -> &'static str {
    if rank < 50.0 {
        "elite"
    } else if rank < 120.0 {
        "strong"
    } else if rank < 220.0 {
        "average"
    } else if rank < 300.0 {
        "weak"
    } else {
        "poor"
    }
}

/// One offense's ball security against the other defense's pressure.
fn analyze_matchup(
    off_ff: &StatLine,
    def_ff: &StatLine,
    off_logs: &[GameLogRow],
    off_team: &str,
    def_team: &str,
) -> (f64, Vec<String>) {
    let off_to = off_ff.get_or("off_to", 0.0);
    let off_to_rank = off_ff.get_or("off_to_rank", 182.0);
    let def_to = def_ff.get_or("def_to", 0.0);
    let def_to_rank = def_ff.get_or("def_to_rank", 182.0);

    let off_tier = tier(off_to_rank);
    let def_tier = tier(def_to_rank);

    let mut findings: Vec<String> = Vec::new();
    let mut edge = 0.0;

    // Higher offensive TO rank = more giveaways; lower defensive TO rank
    // = forces more. Baseline (182 + 182) is a neutral matchup.
    let vulnerability = off_to_rank + (D1_TEAMS - def_to_rank);
    let mismatch = (vulnerability - D1_TEAMS) / D1_TEAMS;

    if mismatch > 0.25 {
        edge -= 1.5 * mismatch;
        findings.push(format!(
            "{}'s {} ball security (TO% {:.1}%, #{:.0}) faces {}'s {} turnover-forcing D \
             (TO% {:.1}%, #{:.0}). High turnover risk.",
            off_team, off_tier, off_to, off_to_rank, def_team, def_tier, def_to, def_to_rank
        ));
    } else if mismatch < -0.25 {
        edge += 1.2 * mismatch.abs();
        findings.push(format!(
            "{}'s {} ball handling (#{:.0}) should carve through {}'s {} defense at \
             forcing TOs (#{:.0}).",
            off_team, off_tier, off_to_rank, def_team, def_tier, def_to_rank
        ));
    } else {
        findings.push(format!(
            "{} TO% {:.1}% (#{:.0}) vs {} forced TO% {:.1}% (#{:.0}): neutral matchup.",
            off_team, off_to, off_to_rank, def_team, def_to, def_to_rank
        ));
    }

    // Game-log variance makes the matchup less predictable.
    let to_samples: Vec<f64> = off_logs.iter().filter_map(|g| g.to_pct).collect();
    if let Some(std) = std_dev(&to_samples) {
        if std > 4.0 {
            findings.push(format!(
                "{} has high TO% variance (std {:.1}%), making this matchup less predictable.",
                off_team, std
            ));
        }
    }

    (edge, findings)
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    if ctx.away_four_factors.is_empty() || ctx.home_four_factors.is_empty() {
        return Ok(DimensionResult::neutral(NAME, "Turnover data unavailable."));
    }

    let (away_edge, away_finds) = analyze_matchup(
        &ctx.away_four_factors,
        &ctx.home_four_factors,
        &ctx.away_game_logs,
        &ctx.away_team,
        &ctx.home_team,
    );
    let (home_edge, home_finds) = analyze_matchup(
        &ctx.home_four_factors,
        &ctx.away_four_factors,
        &ctx.home_game_logs,
        &ctx.home_team,
        &ctx.away_team,
    );

    let spread_edge = away_edge - home_edge; // positive = away value

    // Turnovers suppress scoring: net pressure anywhere leans under.
    let total_edge = if away_edge < 0.0 || home_edge < 0.0 {
        -(away_edge.abs() + home_edge.abs()) * 0.3
    } else {
        0.0
    };

    let mut findings = away_finds;
    findings.extend(home_finds);

    let conf = (0.20 + spread_edge.abs() * 0.15 + findings.len() as f64 * 0.05).min(0.70);
    let conf = round2(conf.max(0.10));

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        round2(total_edge),
        conf,
        findings.join(" "),
    )
    .with_raw(json!({
        "away_off_edge": round2(away_edge),
        "home_off_edge": round2(home_edge),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_without_data() {
        let ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn sloppy_offense_vs_pressure_defense_leans_home_and_under() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        // Away coughs it up (#350) against a defense that forces
        // turnovers at an elite clip (#10).
        ctx.away_four_factors.insert("off_to_rank", 350.0);
        ctx.away_four_factors.insert("off_to", 22.5);
        ctx.home_four_factors.insert("def_to_rank", 10.0);
        ctx.home_four_factors.insert("def_to", 24.0);

        let r = analyze(&ctx).unwrap();
        assert!(r.spread_edge < 0.0, "edge {}", r.spread_edge);
        assert!(r.total_edge < 0.0, "total {}", r.total_edge);
        assert!(r.narrative.contains("High turnover risk"));
    }

    #[test]
    fn secure_handle_vs_passive_defense_is_away_value() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_four_factors.insert("off_to_rank", 5.0);
        ctx.home_four_factors.insert("def_to_rank", 360.0);

        let r = analyze(&ctx).unwrap();
        assert!(r.spread_edge > 0.0, "edge {}", r.spread_edge);
        assert!(r.narrative.contains("carve through"));
        assert_eq!(r.total_edge, 0.0);
    }
}
