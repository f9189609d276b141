//! Free-throw-rate matchups.
//!
//! A foul-drawing offense against a foul-prone defense earns extra
//! possessions and free points, which also tilts totals upward.

use anyhow::Result;
use serde_json::json;

use super::round2;
use crate::models::{DimensionResult, MatchupContext, StatLine};

pub const NAME: &str = "ft_rate";

fn tier(rank: f64) -> &'static str {
    if rank < 50.0 {
        "elite"
    } else if rank < 130.0 {
        "strong"
    } else if rank < 260.0 {
        "average"
    } else {
        "weak"
    }
}

/// One offense's foul-drawing against the other defense's discipline.
fn analyze_side(
    off_ff: &StatLine,
    def_ff: &StatLine,
    off_team: &str,
    def_team: &str,
) -> (f64, Vec<String>, f64) {
    let off_ftr = off_ff.get_or("off_ft_rate", 0.0);
    let off_ftr_rank = off_ff.get_or("off_ft_rate_rank", 182.0);
    let def_ftr = def_ff.get_or("def_ft_rate", 0.0);
    let def_ftr_rank = def_ff.get_or("def_ft_rate_rank", 182.0);

    let mut findings: Vec<String> = Vec::new();
    let mut edge = 0.0;

    let gap = def_ftr_rank - off_ftr_rank; // positive = offense advantage

    if gap > 150.0 {
        edge += 1.3;
        findings.push(format!(
            "{}'s {} foul-drawing ({:.1}%, #{:.0}) exploits {}'s {} foul prevention \
             ({:.1}%, #{:.0}).",
            off_team,
            tier(off_ftr_rank),
            off_ftr,
            off_ftr_rank,
            def_team,
            tier(def_ftr_rank),
            def_ftr,
            def_ftr_rank
        ));
    } else if gap > 80.0 {
        edge += 0.6;
        findings.push(format!(
            "{} has a moderate FT-rate advantage over {} (gap {:.0} ranks).",
            off_team, def_team, gap
        ));
    } else if gap < -150.0 {
        edge -= 1.0;
        findings.push(format!(
            "{}'s foul-drawing ability (#{:.0}) is negated by {}'s {} foul discipline (#{:.0}).",
            off_team,
            off_ftr_rank,
            def_team,
            tier(def_ftr_rank),
            def_ftr_rank
        ));
    } else {
        findings.push(format!(
            "FT rate matchup roughly even: {} #{:.0} vs {} #{:.0}.",
            off_team, off_ftr_rank, def_team, def_ftr_rank
        ));
    }

    (edge, findings, gap)
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    if ctx.away_four_factors.is_empty() || ctx.home_four_factors.is_empty() {
        return Ok(DimensionResult::neutral(NAME, "Free throw rate data unavailable."));
    }

    let (away_edge, away_finds, away_gap) = analyze_side(
        &ctx.away_four_factors,
        &ctx.home_four_factors,
        &ctx.away_team,
        &ctx.home_team,
    );
    let (home_edge, home_finds, home_gap) = analyze_side(
        &ctx.home_four_factors,
        &ctx.away_four_factors,
        &ctx.home_team,
        &ctx.away_team,
    );

    let spread_edge = away_edge - home_edge; // positive = away value

    // Foul-heavy games run long and score more.
    let total_edge = (away_edge + home_edge) * 0.35;

    let mut findings = away_finds;
    findings.extend(home_finds);

    let conf = (0.20 + spread_edge.abs() * 0.10 + findings.len() as f64 * 0.05).min(0.65);
    let conf = round2(conf.max(0.10));

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        round2(total_edge),
        conf,
        findings.join(" "),
    )
    .with_raw(json!({
        "away_gap": away_gap,
        "home_gap": home_gap,
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
    fn big_gap_is_a_full_edge() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_four_factors.insert("off_ft_rate_rank", 15.0);
        ctx.away_four_factors.insert("off_ft_rate", 42.0);
        ctx.home_four_factors.insert("def_ft_rate_rank", 340.0);
        ctx.home_four_factors.insert("def_ft_rate", 38.0);

        let r = analyze(&ctx).unwrap();
        assert!((r.spread_edge - 1.3).abs() < 1e-9, "edge {}", r.spread_edge);
        assert!(r.total_edge > 0.0);
        assert!(r.narrative.contains("exploits"));
    }

    #[test]
    fn moderate_gap_is_a_partial_edge() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_four_factors.insert("off_ft_rate_rank", 80.0);
        ctx.home_four_factors.insert("def_ft_rate_rank", 200.0);

        let r = analyze(&ctx).unwrap();
        assert!((r.spread_edge - 0.6).abs() < 1e-9, "edge {}", r.spread_edge);
        assert!(r.narrative.contains("moderate FT-rate advantage"));
    }
}
