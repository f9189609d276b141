//! Trap-game detection.
//!
//! Flags the classic spots where favorites fail to cover: big numbers,
//! road favorites, letdown after a long win streak, poor ATS record as
//! chalk, a luck rating due for regression, and live underdogs.

use anyhow::Result;
use serde_json::json;

use super::{round2, round3};
use crate::models::{AtsRow, DimensionResult, GameLogRow, MatchupContext};

pub const NAME: &str = "trap_detect";

const BIG_SPREAD: f64 = 10.0;
const WIN_STREAK_ALERT: usize = 5;
const LUCK_THRESHOLD: f64 = 0.050;
const POOR_FAV_ATS: f64 = 40.0;

/// Consecutive results matching `target` from the most recent game back.
fn streak(logs: &[GameLogRow], target: &str) -> usize {
    let mut sorted: Vec<&GameLogRow> = logs.iter().collect();
    sorted.sort_by(|a, b| b.game_date.cmp(&a.game_date));

    let mut count = 0;
    for game in sorted {
        match game.result.as_deref() {
            Some(r) if r.eq_ignore_ascii_case(target) => count += 1,
            _ => break,
        }
    }
    count
}

/// Cover rate when favored: (cover_pct, n). Neutral 50% with no sample.
fn fav_ats_rate(ats: &[AtsRow]) -> (f64, usize) {
    let fav: Vec<&AtsRow> = ats
        .iter()
        .filter(|r| r.line.map(|l| l < 0.0).unwrap_or(false) && r.ats_result.is_some())
        .collect();
    if fav.is_empty() {
        return (50.0, 0);
    }
    let covers = fav.iter().filter(|r| r.covered()).count();
    (covers as f64 / fav.len() as f64 * 100.0, fav.len())
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    let spread = ctx.line.spread.unwrap_or(0.0);
    let abs_spread = spread.abs();

    // Negative spread = home favored. Pick 'em games have no trap angle.
    let (fav_is_home, fav_team, dog_team) = if spread < 0.0 {
        (true, &ctx.home_team, &ctx.away_team)
    } else if spread > 0.0 {
        (false, &ctx.away_team, &ctx.home_team)
    } else {
        return Ok(DimensionResult::new(
            NAME,
            0.0,
            0.0,
            0.15,
            "Pick 'em game -- no trap-game signals to evaluate.",
        ));
    };

    let (fav_ratings, dog_ratings) = if fav_is_home {
        (&ctx.home_ratings, &ctx.away_ratings)
    } else {
        (&ctx.away_ratings, &ctx.home_ratings)
    };
    let (fav_logs, dog_logs) = if fav_is_home {
        (&ctx.home_game_logs, &ctx.away_game_logs)
    } else {
        (&ctx.away_game_logs, &ctx.home_game_logs)
    };
    let fav_ats = if fav_is_home { &ctx.home_ats } else { &ctx.away_ats };

    let mut signals: Vec<String> = Vec::new();
    let mut trap_score: f64 = 0.0;

    if abs_spread >= BIG_SPREAD {
        trap_score += 0.15;
        signals.push(format!(
            "Large spread ({:+.1}). Big favorites fail to cover ~55% historically.",
            spread
        ));
    }

    if !fav_is_home {
        trap_score += 0.12;
        signals.push(format!(
            "{} is a road favorite, a historically under-performing spot.",
            fav_team
        ));
    }

    let fav_streak = streak(fav_logs, "W");
    if fav_streak >= WIN_STREAK_ALERT {
        trap_score += 0.15;
        signals.push(format!(
            "{} is on a {}-game win streak. Letdown risk elevated.",
            fav_team, fav_streak
        ));
    }

    let (fav_cover_pct, fav_cover_n) = fav_ats_rate(fav_ats);
    if fav_cover_n >= 5 && fav_cover_pct < POOR_FAV_ATS {
        trap_score += 0.18;
        signals.push(format!(
            "{} covers only {:.0}% as a favorite ({} games). Fade signal.",
            fav_team, fav_cover_pct, fav_cover_n
        ));
    }

    let fav_luck = fav_ratings.get_or("luck", 0.0);
    if fav_luck > LUCK_THRESHOLD {
        trap_score += 0.15;
        signals.push(format!(
            "{} has a luck rating of {:.3} -- regression candidate.",
            fav_team, fav_luck
        ));
    }

    let dog_loss_streak = streak(dog_logs, "L");
    if dog_loss_streak >= 3 {
        trap_score += 0.08;
        signals.push(format!(
            "{} has lost {} straight. Possible bounce-back / market over-reaction.",
            dog_team, dog_loss_streak
        ));
    }

    let dog_d_rank = dog_ratings.get_or("adj_d_rank", 182.0);
    if dog_d_rank <= 50.0 && abs_spread >= 5.0 {
        trap_score += 0.12;
        signals.push(format!(
            "{} has an elite defense (#{:.0}) and is getting {:.1} points. Live dog.",
            dog_team, dog_d_rank, abs_spread
        ));
    }

    let trap_score = trap_score.min(1.0);

    // A high trap score is value on the underdog's side.
    let spread_edge = if fav_is_home {
        trap_score * 2.5 // dog is away
    } else {
        -trap_score * 2.5
    };

    // Trap games run lower-scoring; the favorite can't pull away.
    let total_edge = if trap_score > 0.3 { -trap_score } else { 0.0 };

    if signals.is_empty() {
        signals.push("No significant trap-game signals detected.".to_string());
    }

    let conf = round2((0.15 + trap_score * 0.7).min(0.80));

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        round2(total_edge),
        conf,
        signals.join(" "),
    )
    .with_raw(json!({
        "trap_score": round3(trap_score),
        "fav_team": fav_team,
        "dog_team": dog_team,
        "fav_side": if fav_is_home { "home" } else { "away" },
        "spread": spread,
        "fav_win_streak": fav_streak,
        "fav_ats_as_fav": fav_cover_pct,
        "fav_luck": fav_luck,
        "dog_d_rank": dog_d_rank,
    })))
}
