//! Opponent-quality splits.
//!
//! Buckets each team's game-log efficiency by the defensive rank of the
//! opponent faced, to catch teams that rise to quality competition or
//! play down to weak fields, then weighs how each profile maps onto the
//! defense they meet in this game.

use anyhow::Result;
use serde_json::json;

use super::{mean, round2};
use crate::models::{DimensionResult, GameLogRow, MatchupContext};

pub const NAME: &str = "opponent_quality";

// Opponent tiers by defensive-efficiency rank.
const TIERS: &[(&str, i64, i64)] = &[
    ("Elite", 0, 50),
    ("Strong", 50, 150),
    ("Average", 150, 250),
    ("Weak", 250, 500),
];

#[derive(Debug, Clone)]
struct Bucket {
    games: usize,
    avg_adj_oe: f64,
}

fn bucket_games(logs: &[GameLogRow]) -> Vec<(&'static str, Bucket)> {
    let mut buckets = Vec::new();
    for (label, lo, hi) in TIERS {
        let oe: Vec<f64> = logs
            .iter()
            .filter(|g| {
                g.opp_adj_de_rank
                    .map(|r| r >= *lo && r < *hi)
                    .unwrap_or(false)
            })
            .filter_map(|g| g.adj_oe)
            .collect();
        if let Some(avg) = mean(&oe) {
            buckets.push((
                *label,
                Bucket {
                    games: oe.len(),
                    avg_adj_oe: avg,
                },
            ));
        }
    }
    buckets
}

fn bucket<'a>(buckets: &'a [(&'static str, Bucket)], label: &str) -> Option<&'a Bucket> {
    buckets.iter().find(|(l, _)| *l == label).map(|(_, b)| b)
}

/// Whether a team performs better or worse against quality opponents:
/// (trend label, top-tier OE, bottom-tier OE, diff).
fn quality_trend(
    buckets: &[(&'static str, Bucket)],
) -> (&'static str, Option<f64>, Option<f64>, f64) {
    let top = bucket(buckets, "Elite")
        .or_else(|| bucket(buckets, "Strong"))
        .map(|b| b.avg_adj_oe);
    let bottom = bucket(buckets, "Weak")
        .or_else(|| bucket(buckets, "Average"))
        .map(|b| b.avg_adj_oe);

    match (top, bottom) {
        (Some(t), Some(b)) => {
            let diff = t - b;
            let label = if diff > 3.0 {
                "rises to competition"
            } else if diff < -3.0 {
                "plays down to competition"
            } else {
                "consistent across tiers"
            };
            (label, Some(t), Some(b), diff)
        }
        _ => ("unknown", None, None, 0.0),
    }
}

fn tier_for_rank(rank: f64) -> &'static str {
    for (label, lo, hi) in TIERS {
        if rank >= *lo as f64 && rank < *hi as f64 {
            return *label;
        }
    }
    "Weak"
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    let away_buckets = bucket_games(&ctx.away_game_logs);
    let home_buckets = bucket_games(&ctx.home_game_logs);

    if away_buckets.is_empty() && home_buckets.is_empty() {
        return Ok(DimensionResult::neutral(
            NAME,
            "Game log data insufficient for opponent-quality analysis.",
        ));
    }

    let (away_trend, away_top, away_bot, away_diff) = quality_trend(&away_buckets);
    let (home_trend, home_top, home_bot, home_diff) = quality_trend(&home_buckets);

    // Defensive tier each team faces in THIS game.
    let away_def_rank = ctx.home_ratings.get_or("adj_d_rank", 182.0);
    let home_def_rank = ctx.away_ratings.get_or("adj_d_rank", 182.0);
    let away_facing = tier_for_rank(away_def_rank);
    let home_facing = tier_for_rank(home_def_rank);

    // A team that historically lifts (or sinks) its offense against the
    // tier it faces today earns a corresponding edge.
    let mut spread_edge = 0.0;
    let away_avgs: Vec<f64> = away_buckets.iter().map(|(_, b)| b.avg_adj_oe).collect();
    let home_avgs: Vec<f64> = home_buckets.iter().map(|(_, b)| b.avg_adj_oe).collect();

    if let (Some(ctx_bucket), Some(season_oe)) = (bucket(&away_buckets, away_facing), mean(&away_avgs)) {
        spread_edge += (ctx_bucket.avg_adj_oe - season_oe) * 0.08;
    }
    if let (Some(ctx_bucket), Some(season_oe)) = (bucket(&home_buckets, home_facing), mean(&home_avgs)) {
        spread_edge -= (ctx_bucket.avg_adj_oe - season_oe) * 0.08;
    }

    let mut total_edge = 0.0;
    if let (Some(a), Some(h)) = (bucket(&away_buckets, away_facing), bucket(&home_buckets, home_facing)) {
        let combined: Vec<f64> = away_avgs.iter().chain(home_avgs.iter()).copied().collect();
        if let Some(total_avg) = mean(&combined) {
            total_edge = ((a.avg_adj_oe + h.avg_adj_oe) / 2.0 - total_avg) * 0.10;
        }
    }

    let n_games: usize = away_buckets
        .iter()
        .chain(home_buckets.iter())
        .map(|(_, b)| b.games)
        .sum();
    let conf = round2((0.15 + n_games as f64 * 0.015).min(0.75).max(0.10));

    let mut parts = Vec::new();
    match (away_top, away_bot) {
        (Some(t), Some(b)) => parts.push(format!(
            "{} {} (top-tier OE {:.1}, low-tier OE {:.1}, diff {:+.1}).",
            ctx.away_team, away_trend, t, b, away_diff
        )),
        _ => parts.push(format!("{}: insufficient tier data.", ctx.away_team)),
    }
    match (home_top, home_bot) {
        (Some(t), Some(b)) => parts.push(format!(
            "{} {} (top-tier OE {:.1}, low-tier OE {:.1}, diff {:+.1}).",
            ctx.home_team, home_trend, t, b, home_diff
        )),
        _ => parts.push(format!("{}: insufficient tier data.", ctx.home_team)),
    }
    parts.push(format!(
        "In this matchup {} faces {}-tier defense, {} faces {}-tier defense.",
        ctx.away_team, away_facing, ctx.home_team, home_facing
    ));

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        round2(total_edge),
        conf,
        parts.join(" "),
    )
    .with_raw(json!({
        "away_trend": away_trend,
        "home_trend": home_trend,
        "away_facing": away_facing,
        "home_facing": home_facing,
        "games": n_games,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(opp_rank: i64, adj_oe: f64) -> GameLogRow {
        GameLogRow {
            game_date: "2025-01-01".into(),
            opponent: "Opp".into(),
            location: None,
            result: None,
            team_score: None,
            opp_score: None,
            adj_oe: Some(adj_oe),
            adj_de: None,
            to_pct: None,
            opp_to_pct: None,
            opp_adj_de_rank: Some(opp_rank),
        }
    }

    #[test]
    fn neutral_without_logs() {
        let ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn detects_rising_to_competition() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        // Strong offense against elite defenses, weak against weak ones.
        ctx.away_game_logs = vec![
            log(20, 118.0),
            log(30, 116.0),
            log(300, 108.0),
            log(320, 106.0),
        ];
        // Facing an elite home defense today.
        ctx.home_ratings.insert("adj_d_rank", 10.0);

        let r = analyze(&ctx).unwrap();
        assert!(r.narrative.contains("rises to competition"));
        // Elite-bucket OE (117) above the bucket-average baseline gives
        // the away side a positive lean.
        assert!(r.spread_edge > 0.0, "edge {}", r.spread_edge);
    }

    #[test]
    fn confidence_grows_with_sample() {
        let mut small = MatchupContext::new("A", "B", "2025-02-01", 2025);
        small.away_game_logs = vec![log(100, 110.0)];
        let mut large = MatchupContext::new("A", "B", "2025-02-01", 2025);
        large.away_game_logs = (0..20).map(|i| log(100 + i, 110.0)).collect();

        let r_small = analyze(&small).unwrap();
        let r_large = analyze(&large).unwrap();
        assert!(r_large.confidence > r_small.confidence);
    }
}
