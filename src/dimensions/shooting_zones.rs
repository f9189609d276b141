//! Two-point / three-point shooting matchups.
//!
//! A three-reliant offense running into an elite perimeter defense is a
//! red flag; an interior-dominant attack against a soft 2P defense is a
//! green one. Gaps are measured in national rank.

use anyhow::Result;
use serde_json::json;

use super::round2;
use crate::models::{DimensionResult, MatchupContext, StatLine};

pub const NAME: &str = "shooting_zones";

fn rank_label(rank: f64) -> &'static str {
    if rank < 50.0 {
        "elite"
    } else if rank < 120.0 {
        "strong"
    } else if rank < 260.0 {
        "average"
    } else {
        "weak"
    }
}

/// One offense against the opposing perimeter/interior defense.
fn analyze_side(
    off_ff: &StatLine,
    def_ff: &StatLine,
    off_team: &str,
    def_team: &str,
) -> (f64, Vec<String>, serde_json::Value) {
    let off_2p = off_ff.get_or("off_2p", 0.0);
    let off_3p = off_ff.get_or("off_3p", 0.0);
    let def_2p = def_ff.get_or("def_2p", 0.0);
    let def_3p = def_ff.get_or("def_3p", 0.0);

    let off_2p_rank = off_ff.get_or("off_2p_rank", 182.0);
    let off_3p_rank = off_ff.get_or("off_3p_rank", 182.0);
    let def_2p_rank = def_ff.get_or("def_2p_rank", 182.0);
    let def_3p_rank = def_ff.get_or("def_3p_rank", 182.0);

    let mut findings: Vec<String> = Vec::new();
    let mut edge = 0.0;

    // Shooting profile: relies on the three when its 3P rank beats its 2P rank.
    let relies_on_three = off_3p_rank < off_2p_rank;

    let three_gap = def_3p_rank - off_3p_rank; // positive = offense advantage
    if three_gap > 150.0 {
        edge += 1.5;
        findings.push(format!(
            "{}'s {} 3P shooting (#{:.0}, {:.1}%) exploits {}'s {} 3P defense (#{:.0}, {:.1}%).",
            off_team,
            rank_label(off_3p_rank),
            off_3p_rank,
            off_3p,
            def_team,
            rank_label(def_3p_rank),
            def_3p_rank,
            def_3p
        ));
    } else if three_gap < -150.0 {
        edge -= 1.2;
        findings.push(format!(
            "{}'s 3P attack (#{:.0}) is neutralized by {}'s {} perimeter D (#{:.0}).",
            off_team,
            off_3p_rank,
            def_team,
            rank_label(def_3p_rank),
            def_3p_rank
        ));
        if relies_on_three {
            edge -= 0.8;
            findings.push(format!(
                "Critical: {} relies on the three and faces an elite perimeter defense.",
                off_team
            ));
        }
    }

    let two_gap = def_2p_rank - off_2p_rank;
    if two_gap > 150.0 {
        edge += 1.2;
        findings.push(format!(
            "{}'s {} interior scoring (#{:.0}, {:.1}%) exploits {}'s {} 2P defense (#{:.0}, {:.1}%).",
            off_team,
            rank_label(off_2p_rank),
            off_2p_rank,
            off_2p,
            def_team,
            rank_label(def_2p_rank),
            def_2p_rank,
            def_2p
        ));
    } else if two_gap < -150.0 {
        edge -= 1.0;
        findings.push(format!(
            "{}'s interior game (#{:.0}) faces stiff {} 2P defense (#{:.0}).",
            off_team, off_2p_rank, def_team, def_2p_rank
        ));
    }

    let data = json!({
        "off_2p_rank": off_2p_rank,
        "off_3p_rank": off_3p_rank,
        "def_2p_rank": def_2p_rank,
        "def_3p_rank": def_3p_rank,
        "three_gap": three_gap,
        "two_gap": two_gap,
    });
    (edge, findings, data)
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    if ctx.away_four_factors.is_empty() || ctx.home_four_factors.is_empty() {
        return Ok(DimensionResult::neutral(NAME, "Shooting zone data unavailable."));
    }

    let (away_edge, away_finds, away_data) = analyze_side(
        &ctx.away_four_factors,
        &ctx.home_four_factors,
        &ctx.away_team,
        &ctx.home_team,
    );
    let (home_edge, home_finds, home_data) = analyze_side(
        &ctx.home_four_factors,
        &ctx.away_four_factors,
        &ctx.home_team,
        &ctx.away_team,
    );

    let net_edge = away_edge - home_edge; // positive = away value
    let total_edge = (away_edge + home_edge) * 0.4; // both favorable => points

    let mut findings = away_finds;
    findings.extend(home_finds);

    let conf = (0.20 + findings.len() as f64 * 0.12 + net_edge.abs() * 0.06).min(0.80);
    let conf = round2(conf.max(0.10));

    let narrative = if findings.is_empty() {
        "No significant shooting zone mismatches detected.".to_string()
    } else {
        findings.join(" ")
    };

    Ok(DimensionResult::new(NAME, round2(net_edge), round2(total_edge), conf, narrative)
        .with_raw(json!({ "away": away_data, "home": home_data })))
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
    fn hot_perimeter_vs_soft_defense() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_four_factors.insert("off_3p_rank", 10.0);
        ctx.away_four_factors.insert("off_3p", 38.5);
        ctx.home_four_factors.insert("def_3p_rank", 330.0);
        ctx.home_four_factors.insert("def_3p", 36.0);
        // Keep the rest at the median via defaults.
        ctx.home_four_factors.insert("off_efg", 50.0);
        ctx.away_four_factors.insert("def_efg", 50.0);

        let r = analyze(&ctx).unwrap();
        assert!((r.spread_edge - 1.5).abs() < 1e-9, "edge {}", r.spread_edge);
        assert!(r.narrative.contains("exploits"));
    }

    #[test]
    fn reliance_on_three_compounds_penalty() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        // Away leans on the three (3P rank ahead of 2P rank) and meets
        // an elite perimeter defense.
        ctx.away_four_factors.insert("off_3p_rank", 160.0);
        ctx.away_four_factors.insert("off_2p_rank", 300.0);
        ctx.home_four_factors.insert("def_3p_rank", 5.0);
        ctx.home_four_factors.insert("off_efg", 50.0);

        let r = analyze(&ctx).unwrap();
        // -1.2 for the neutralized arc, -0.8 for the reliance flag.
        assert!((r.spread_edge - -2.0).abs() < 1e-9, "edge {}", r.spread_edge);
        assert!(r.narrative.contains("Critical"));
        assert!(r.total_edge < 0.0);
    }
}
