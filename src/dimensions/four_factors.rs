//! Four-factors matchup evaluation.
//!
//! Applies Dean Oliver's framework (eFG%, TO%, OR%, FT rate) with the
//! standard weights to both sides of the ball and surfaces tier-level
//! asymmetries between each offense and the opposing defense.

use anyhow::Result;
use serde_json::json;

use super::round2;
use crate::models::{DimensionResult, MatchupContext, StatLine};

pub const NAME: &str = "four_factors";

const D1_TEAMS: f64 = 364.0;

// Dean Oliver factor weights.
const FACTORS: &[(&str, f64, &str, &str)] = &[
    ("EFG", 0.40, "off_efg_rank", "def_efg_rank"),
    ("TO", 0.25, "off_to_rank", "def_to_rank"),
    ("OR", 0.20, "off_or_rank", "def_or_rank"),
    ("FT_RATE", 0.15, "off_ft_rate_rank", "def_ft_rate_rank"),
];

const TIER_ORDER: &[&str] = &["Elite", "Strong", "Average", "Weak", "Poor"];

fn tier(rank: f64) -> &'static str {
    if rank < 37.0 {
        "Elite"
    } else if rank < 110.0 {
        "Strong"
    } else if rank < 220.0 {
        "Average"
    } else if rank < 300.0 {
        "Weak"
    } else {
        "Poor"
    }
}

fn tier_index(label: &str) -> i32 {
    TIER_ORDER.iter().position(|t| *t == label).unwrap_or(2) as i32
}

/// Signed factor score: positive means the offense has the advantage.
fn factor_score(off_rank: f64, def_rank: f64) -> f64 {
    (def_rank - off_rank) / D1_TEAMS
}

/// Score one side of the matchup (one team's offense vs the other's
/// defense). Returns the weighted composite and flagged asymmetries.
fn analyze_side(
    off_ff: &StatLine,
    def_ff: &StatLine,
    off_label: &str,
    def_label: &str,
) -> (f64, Vec<String>) {
    let mut composite = 0.0;
    let mut asymmetries = Vec::new();

    for (factor, weight, off_key, def_key) in FACTORS {
        let o_rank = off_ff.get_or(off_key, 182.0);
        let d_rank = def_ff.get_or(def_key, 182.0);
        composite += factor_score(o_rank, d_rank) * weight;

        let o_tier = tier(o_rank);
        let d_tier = tier(d_rank);
        // Flag meaningful asymmetries (two or more tier levels apart).
        let gap = tier_index(d_tier) - tier_index(o_tier);
        if gap.abs() >= 2 {
            let direction = if gap > 0 { "advantage" } else { "disadvantage" };
            asymmetries.push(format!(
                "{}'s {} offense ({} #{:.0}) vs {}'s defense ({} #{:.0}): {}",
                off_label, factor, o_tier, o_rank, def_label, d_tier, d_rank, direction
            ));
        }
    }

    (composite, asymmetries)
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    if ctx.away_four_factors.is_empty() || ctx.home_four_factors.is_empty() {
        return Ok(DimensionResult::neutral(NAME, "Four factors data unavailable."));
    }

    let (away_score, away_asym) = analyze_side(
        &ctx.away_four_factors,
        &ctx.home_four_factors,
        &ctx.away_team,
        &ctx.home_team,
    );
    let (home_score, home_asym) = analyze_side(
        &ctx.home_four_factors,
        &ctx.away_four_factors,
        &ctx.home_team,
        &ctx.away_team,
    );

    let net_score = away_score - home_score; // positive = away advantage
    let spread_edge = net_score * 8.0; // approximate point value

    // Both offenses holding factor advantages leans the total over.
    let total_edge = (away_score + home_score) * 5.0;

    let mut asymmetries = away_asym;
    asymmetries.extend(home_asym);

    let conf = (0.30 + 0.10 * asymmetries.len() as f64 + net_score.abs() * 0.8).min(0.85);
    let conf = round2(conf.max(0.10));

    let mut parts = vec![format!(
        "Four-factor composite: {} {:+.3}, {} {:+.3}.",
        ctx.away_team, away_score, ctx.home_team, home_score
    )];
    if asymmetries.is_empty() {
        parts.push("No significant tier-level asymmetries detected.".to_string());
    } else {
        parts.push(format!("Key asymmetries: {}.", asymmetries.join("; ")));
    }

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        round2(total_edge),
        conf,
        parts.join(" "),
    )
    .with_raw(json!({
        "away_score": super::round3(away_score),
        "home_score": super::round3(home_score),
        "asymmetries": asymmetries,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with_factors(away_efg_rank: f64, home_def_efg_rank: f64) -> MatchupContext {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_four_factors.insert("off_efg_rank", away_efg_rank);
        ctx.home_four_factors.insert("def_efg_rank", home_def_efg_rank);
        ctx
    }

    #[test]
    fn neutral_without_data() {
        let ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn elite_offense_vs_poor_defense_is_away_value() {
        // Elite away shooting (#5) against a bottom-tier home defense
        // (#340); everything else sits at the median default.
        let ctx = ctx_with_factors(5.0, 340.0);
        let r = analyze(&ctx).unwrap();
        assert!(r.spread_edge > 0.0, "edge {}", r.spread_edge);
        assert!(!r.narrative.contains("No significant"));
        assert!(r.confidence >= 0.40);
    }

    #[test]
    fn balanced_ranks_stay_quiet() {
        let ctx = ctx_with_factors(182.0, 182.0);
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.spread_edge, 0.0);
        assert!(r.narrative.contains("No significant"));
    }
}
