//! Offense-vs-defense rank asymmetries.
//!
//! A #5 offense against a #100 defense is a mismatch worth points; this
//! dimension checks both axes for both teams and flags the dominant
//! matchup direction, plus lopsided (offense- or defense-heavy) builds.

use anyhow::Result;
use serde_json::json;

use super::round2;
use crate::models::{DimensionResult, MatchupContext};

pub const NAME: &str = "rank_asymmetry";

const D1_TEAMS: f64 = 364.0;
const LARGE_GAP: f64 = 80.0;
const HUGE_GAP: f64 = 150.0;

fn rank_tier(rank: f64) -> &'static str {
    if rank <= 25.0 {
        "elite"
    } else if rank <= 75.0 {
        "strong"
    } else if rank <= 180.0 {
        "average"
    } else if rank <= 280.0 {
        "below-average"
    } else {
        "poor"
    }
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    if ctx.away_ratings.is_empty() || ctx.home_ratings.is_empty() {
        return Ok(DimensionResult::neutral(
            NAME,
            "Ratings data unavailable for rank-asymmetry analysis.",
        ));
    }

    let away_o_rank = ctx.away_ratings.get_or("adj_o_rank", 182.0);
    let away_d_rank = ctx.away_ratings.get_or("adj_d_rank", 182.0);
    let home_o_rank = ctx.home_ratings.get_or("adj_o_rank", 182.0);
    let home_d_rank = ctx.home_ratings.get_or("adj_d_rank", 182.0);

    let mut findings: Vec<String> = Vec::new();
    let mut spread_edge = 0.0;
    let mut total_edge = 0.0;

    // Away offense vs home defense.
    let gap_away_off = home_d_rank - away_o_rank; // positive = away offense advantage
    if gap_away_off.abs() >= LARGE_GAP {
        let direction = if gap_away_off > 0.0 { "exploits" } else { "is stifled by" };
        findings.push(format!(
            "{}'s {} offense (#{:.0}) {} {}'s {} defense (#{:.0}) [gap {:+.0}].",
            ctx.away_team,
            rank_tier(away_o_rank),
            away_o_rank,
            direction,
            ctx.home_team,
            rank_tier(home_d_rank),
            home_d_rank,
            gap_away_off
        ));
        spread_edge += gap_away_off / D1_TEAMS * 3.0; // positive = away value
    }

    // Home offense vs away defense.
    let gap_home_off = away_d_rank - home_o_rank;
    if gap_home_off.abs() >= LARGE_GAP {
        let direction = if gap_home_off > 0.0 { "exploits" } else { "is stifled by" };
        findings.push(format!(
            "{}'s {} offense (#{:.0}) {} {}'s {} defense (#{:.0}) [gap {:+.0}].",
            ctx.home_team,
            rank_tier(home_o_rank),
            home_o_rank,
            direction,
            ctx.away_team,
            rank_tier(away_d_rank),
            away_d_rank,
            gap_home_off
        ));
        spread_edge -= gap_home_off / D1_TEAMS * 3.0; // negative = home value
    }

    // Both offenses outranking the opposing defenses leans the total
    // over; both defenses dominating leans it under.
    if gap_away_off > LARGE_GAP && gap_home_off > LARGE_GAP {
        total_edge = (gap_away_off + gap_home_off) / D1_TEAMS * 2.0;
        findings.push("Both offenses significantly outrank opposing defenses -- over lean.".into());
    } else if gap_away_off < -LARGE_GAP && gap_home_off < -LARGE_GAP {
        total_edge = (gap_away_off + gap_home_off) / D1_TEAMS * 2.0;
        findings.push("Both defenses significantly outrank opposing offenses -- under lean.".into());
    }

    // Lopsided builds are worth calling out even without a cross gap.
    for (team, o_rank, d_rank) in [
        (&ctx.away_team, away_o_rank, away_d_rank),
        (&ctx.home_team, home_o_rank, home_d_rank),
    ] {
        let imbalance = d_rank - o_rank; // positive = offense much better
        if imbalance.abs() > HUGE_GAP {
            let style = if imbalance > 0.0 { "offense-heavy" } else { "defense-heavy" };
            findings.push(format!(
                "{} is {} (O #{:.0}, D #{:.0}, gap {:+.0}).",
                team, style, o_rank, d_rank, imbalance
            ));
        }
    }

    if findings.is_empty() {
        findings.push(format!(
            "No major rank asymmetries: {} O#{:.0} / D#{:.0}, {} O#{:.0} / D#{:.0}.",
            ctx.away_team, away_o_rank, away_d_rank, ctx.home_team, home_o_rank, home_d_rank
        ));
    }

    let max_gap = gap_away_off.abs().max(gap_home_off.abs());
    let conf = if max_gap >= HUGE_GAP {
        0.75
    } else if max_gap >= LARGE_GAP {
        0.55
    } else {
        0.25
    };

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        round2(total_edge),
        conf,
        findings.join(" "),
    )
    .with_raw(json!({
        "away_o_rank": away_o_rank,
        "away_d_rank": away_d_rank,
        "home_o_rank": home_o_rank,
        "home_d_rank": home_d_rank,
        "gap_away_off_vs_home_def": gap_away_off,
        "gap_home_off_vs_away_def": gap_home_off,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with_ranks(ao: f64, ad: f64, ho: f64, hd: f64) -> MatchupContext {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_ratings.insert("adj_o_rank", ao);
        ctx.away_ratings.insert("adj_d_rank", ad);
        ctx.home_ratings.insert("adj_o_rank", ho);
        ctx.home_ratings.insert("adj_d_rank", hd);
        ctx
    }

    #[test]
    fn neutral_without_ratings() {
        let ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn elite_offense_vs_bad_defense_is_away_value() {
        // Away offense #5 against home defense #250.
        let ctx = ctx_with_ranks(5.0, 100.0, 120.0, 250.0);
        let r = analyze(&ctx).unwrap();
        // Gap +245 scales to about two points of away value.
        assert!(r.spread_edge > 1.5, "edge {}", r.spread_edge);
        assert_eq!(r.confidence, 0.75);
        assert!(r.narrative.contains("exploits"));
    }

    #[test]
    fn mutual_offense_dominance_leans_over() {
        // Both offenses far ahead of the defenses they face.
        let ctx = ctx_with_ranks(10.0, 300.0, 15.0, 310.0);
        let r = analyze(&ctx).unwrap();
        assert!(r.total_edge > 0.0, "total {}", r.total_edge);
        assert!(r.narrative.contains("over lean"));
    }

    #[test]
    fn defaults_produce_no_findings() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_ratings.insert("adj_em", 5.0);
        ctx.home_ratings.insert("adj_em", 3.0);
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.spread_edge, 0.0);
        assert_eq!(r.confidence, 0.25);
        assert!(r.narrative.contains("No major rank asymmetries"));
    }
}
