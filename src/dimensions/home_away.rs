//! Venue splits.
//!
//! Measures each team's efficiency split by game location and adjusts
//! the edge for where this game is played. The canonical home-court
//! advantage is about 3.5 points; individual teams deviate widely.

use anyhow::Result;
use serde_json::json;

use super::{mean, round2};
use crate::models::{DimensionResult, GameLogRow, MatchupContext};

pub const NAME: &str = "home_away";

const DEFAULT_HCA: f64 = 3.5;

#[derive(Debug, Clone, Copy)]
struct VenueStats {
    games: usize,
    adj_oe: f64,
}

fn is_home(loc: &str) -> bool {
    loc.eq_ignore_ascii_case("h") || loc.eq_ignore_ascii_case("home")
}

fn is_away(loc: &str) -> bool {
    loc.eq_ignore_ascii_case("a") || loc.eq_ignore_ascii_case("away")
}

fn venue_stats(logs: &[GameLogRow], pick: fn(&str) -> bool) -> Option<VenueStats> {
    let oe: Vec<f64> = logs
        .iter()
        .filter(|g| g.location.as_deref().map(pick).unwrap_or(false))
        .filter_map(|g| g.adj_oe)
        .collect();
    mean(&oe).map(|avg| VenueStats {
        games: oe.len(),
        adj_oe: avg,
    })
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    let away_home = venue_stats(&ctx.away_game_logs, is_home);
    let away_away = venue_stats(&ctx.away_game_logs, is_away);
    let home_home = venue_stats(&ctx.home_game_logs, is_home);
    let home_away = venue_stats(&ctx.home_game_logs, is_away);

    if away_home.is_none() && away_away.is_none() && home_home.is_none() && home_away.is_none() {
        return Ok(DimensionResult::neutral(NAME, "Location split data unavailable."));
    }

    let mut parts: Vec<String> = Vec::new();
    let mut spread_adj = 0.0;

    // Away team plays on the road today.
    match (away_away, away_home) {
        (Some(road), Some(home)) => {
            let oe_drop = road.adj_oe - home.adj_oe;
            parts.push(format!(
                "{} away OE {:.1} vs home OE {:.1} (diff {:+.1}).",
                ctx.away_team, road.adj_oe, home.adj_oe, oe_drop
            ));
            if oe_drop < -2.0 {
                spread_adj -= oe_drop.abs() * 0.15;
                parts.push(format!("{} struggles on the road.", ctx.away_team));
            } else if oe_drop > 2.0 {
                spread_adj += oe_drop * 0.15;
                parts.push(format!("{} is a road warrior.", ctx.away_team));
            }
        }
        (Some(road), None) => parts.push(format!(
            "{} road OE {:.1} (no home split).",
            ctx.away_team, road.adj_oe
        )),
        _ => {}
    }

    // Home team plays at home today.
    match (home_home, home_away) {
        (Some(home), Some(road)) => {
            let oe_boost = home.adj_oe - road.adj_oe;
            parts.push(format!(
                "{} home OE {:.1} vs away OE {:.1} (diff {:+.1}).",
                ctx.home_team, home.adj_oe, road.adj_oe, oe_boost
            ));
            if oe_boost > 2.0 {
                spread_adj -= oe_boost * 0.15;
                parts.push(format!("{} has a strong home-court boost.", ctx.home_team));
            } else if oe_boost < -2.0 {
                spread_adj += oe_boost.abs() * 0.15;
                parts.push(format!("{} is oddly worse at home.", ctx.home_team));
            }

            // Compare the implied home-court advantage to the standard.
            let implied_hca = oe_boost * 0.5;
            let hca_diff = implied_hca - DEFAULT_HCA;
            if hca_diff.abs() > 1.0 {
                let direction = if hca_diff > 0.0 { "above" } else { "below" };
                parts.push(format!(
                    "Implied HCA for {} is {} the {}-pt standard by ~{:.1} pts.",
                    ctx.home_team, direction, DEFAULT_HCA, hca_diff.abs()
                ));
                spread_adj -= hca_diff * 0.20; // negative = home value
            }
        }
        (Some(home), None) => parts.push(format!(
            "{} home OE {:.1} (no road split).",
            ctx.home_team, home.adj_oe
        )),
        _ => {}
    }

    // Venue-specific scoring level nudges the total.
    let mut total_edge = 0.0;
    if let (Some(road), Some(home)) = (away_away, home_home) {
        let combined_oe = road.adj_oe + home.adj_oe;
        total_edge = (combined_oe - 200.0) * 0.06;
    }

    let n_games: usize = [away_home, away_away, home_home, home_away]
        .iter()
        .flatten()
        .map(|s| s.games)
        .sum();
    let conf = round2((0.15 + n_games as f64 * 0.012).min(0.70).max(0.10));

    Ok(DimensionResult::new(
        NAME,
        round2(spread_adj),
        round2(total_edge),
        conf,
        parts.join(" "),
    )
    .with_raw(json!({
        "away_road_oe": away_away.map(|s| round2(s.adj_oe)),
        "away_home_oe": away_home.map(|s| round2(s.adj_oe)),
        "home_home_oe": home_home.map(|s| round2(s.adj_oe)),
        "home_road_oe": home_away.map(|s| round2(s.adj_oe)),
    })))
}
