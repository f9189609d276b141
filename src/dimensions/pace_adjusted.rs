//! Pace-adjusted score projection.
//!
//! Projects possessions from the two tempo ratings, blends season
//! efficiency with recent form, and compares the projected margin and
//! total against the posted numbers.

use anyhow::Result;
use serde_json::json;

use super::{mean, round2};
use crate::models::{DimensionResult, GameLogRow, MatchupContext};

pub const NAME: &str = "pace_adjusted";

const D1_AVG_TEMPO: f64 = 67.5;
const RECENT_GAMES: usize = 5;

/// Mean adjusted efficiency over the last few games, when logged.
fn recent_efficiency(logs: &[GameLogRow]) -> (Option<f64>, Option<f64>) {
    let mut sorted: Vec<&GameLogRow> = logs.iter().collect();
    sorted.sort_by(|a, b| b.game_date.cmp(&a.game_date));
    let recent: Vec<&GameLogRow> = sorted.into_iter().take(RECENT_GAMES).collect();

    let oe: Vec<f64> = recent.iter().filter_map(|g| g.adj_oe).collect();
    let de: Vec<f64> = recent.iter().filter_map(|g| g.adj_de).collect();
    (mean(&oe), mean(&de))
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    if ctx.away_ratings.is_empty() || ctx.home_ratings.is_empty() {
        return Ok(DimensionResult::neutral(
            NAME,
            "Insufficient ratings data for pace-adjusted projection.",
        ));
    }

    let away_tempo = ctx.away_ratings.get_or("adj_t", D1_AVG_TEMPO);
    let home_tempo = ctx.home_ratings.get_or("adj_t", D1_AVG_TEMPO);
    let expected_poss = (away_tempo * home_tempo) / D1_AVG_TEMPO;

    let mut away_adj_o = ctx.away_ratings.get_or("adj_o", 100.0);
    let mut away_adj_d = ctx.away_ratings.get_or("adj_d", 100.0);
    let mut home_adj_o = ctx.home_ratings.get_or("adj_o", 100.0);
    let mut home_adj_d = ctx.home_ratings.get_or("adj_d", 100.0);

    // Blend season ratings (60%) with recent game-log form (40%) to
    // capture momentum shifts.
    let (away_rec_oe, away_rec_de) = recent_efficiency(&ctx.away_game_logs);
    let (home_rec_oe, home_rec_de) = recent_efficiency(&ctx.home_game_logs);

    if let Some(oe) = away_rec_oe {
        away_adj_o = 0.60 * away_adj_o + 0.40 * oe;
    }
    if let Some(de) = away_rec_de {
        away_adj_d = 0.60 * away_adj_d + 0.40 * de;
    }
    if let Some(oe) = home_rec_oe {
        home_adj_o = 0.60 * home_adj_o + 0.40 * oe;
    }
    if let Some(de) = home_rec_de {
        home_adj_d = 0.60 * home_adj_d + 0.40 * de;
    }

    // Matchup efficiency: each offense averaged with the opposing defense.
    let away_off_eff = (away_adj_o + home_adj_d) / 2.0;
    let home_off_eff = (home_adj_o + away_adj_d) / 2.0;

    let away_pts = away_off_eff * (expected_poss / 100.0);
    let home_pts = home_off_eff * (expected_poss / 100.0);

    let proj_margin = home_pts - away_pts; // positive = home leads
    let proj_total = away_pts + home_pts;

    let spread = ctx.line.spread.unwrap_or(0.0);
    let total_line = ctx.line.total.unwrap_or(0.0);

    // Positive = away value: the posted spread is negative when home is
    // favored, so spread -5 with a projected home margin of +8 leaves
    // +3 points of away value.
    let spread_edge = spread + proj_margin;
    let total_edge = if total_line > 0.0 {
        proj_total - total_line
    } else {
        0.0
    };

    let margin_diff = spread_edge.abs();
    let conf = if margin_diff > 6.0 {
        0.80
    } else if margin_diff > 3.0 {
        0.60
    } else if margin_diff > 1.5 {
        0.40
    } else {
        0.20
    };

    let mut parts = vec![
        format!(
            "Projected possessions: {:.1} (away tempo {:.1}, home tempo {:.1}).",
            expected_poss, away_tempo, home_tempo
        ),
        format!(
            "Projected score: {} {:.1} - {} {:.1} (margin {:+.1} home, total {:.1}).",
            ctx.away_team, away_pts, ctx.home_team, home_pts, proj_margin, proj_total
        ),
    ];
    if total_line > 0.0 {
        let direction = if total_edge > 0.0 { "OVER" } else { "UNDER" };
        parts.push(format!(
            "Total line {:.1} => model says {} by {:.1}.",
            total_line,
            direction,
            total_edge.abs()
        ));
    }
    if spread != 0.0 {
        let side = if spread_edge > 0.0 {
            &ctx.away_team
        } else {
            &ctx.home_team
        };
        parts.push(format!(
            "Spread {:+.1} => model favors {} by {:.1} pts.",
            spread,
            side,
            spread_edge.abs()
        ));
    }

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        round2(total_edge),
        conf,
        parts.join(" "),
    )
    .with_raw(json!({
        "expected_poss": round2(expected_poss),
        "away_pts": round2(away_pts),
        "home_pts": round2(home_pts),
        "proj_margin": round2(proj_margin),
        "proj_total": round2(proj_total),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchupContext;

    fn ratings_ctx() -> MatchupContext {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.away_ratings.insert("adj_o", 115.0);
        ctx.away_ratings.insert("adj_d", 95.0);
        ctx.away_ratings.insert("adj_t", 70.0);
        ctx.home_ratings.insert("adj_o", 100.0);
        ctx.home_ratings.insert("adj_d", 100.0);
        ctx.home_ratings.insert("adj_t", 68.0);
        ctx
    }

    #[test]
    fn neutral_without_ratings() {
        let ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.spread_edge, 0.0);
        assert!(r.raw.is_none());
    }

    #[test]
    fn projects_from_ratings_alone() {
        let ctx = ratings_ctx();
        let r = analyze(&ctx).unwrap();
        assert!(r.confidence > 0.0);

        let raw = r.raw.expect("projection diagnostics");
        // Expected possessions: 70 * 68 / 67.5.
        let poss = raw["expected_poss"].as_f64().unwrap();
        assert!((poss - 70.52).abs() < 0.01);
        // Away offense (115) vs home defense (100) outscores the
        // reverse matchup, so the model favors the away side.
        let margin = raw["proj_margin"].as_f64().unwrap();
        assert!(margin < 0.0, "expected away lead, margin {}", margin);
    }

    #[test]
    fn edge_compares_projection_to_line() {
        let mut ctx = ratings_ctx();
        ctx.line.spread = Some(-3.5);
        ctx.line.total = Some(145.5);
        let r = analyze(&ctx).unwrap();
        // Away projected ahead by ~7 with the line at -3.5 leaves a
        // double-digit gap between model and market.
        assert!((r.spread_edge - -10.55).abs() < 0.2, "edge {}", r.spread_edge);
        assert_eq!(r.confidence, 0.80);
        assert!(r.total_edge.abs() < 5.0);
    }

    #[test]
    fn no_total_line_means_no_total_edge() {
        let ctx = ratings_ctx();
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.total_edge, 0.0);
    }
}
