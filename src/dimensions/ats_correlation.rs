//! Against-the-spread patterns.
//!
//! Mines each team's ATS history for situational edges: venue cover
//! rates, favorite/underdog splits, and the spread bucket closest to
//! this game's number. Spread-only; contributes nothing to totals.

use anyhow::Result;
use serde_json::json;

use super::round2;
use crate::models::{AtsRow, DimensionResult, MatchupContext};

pub const NAME: &str = "ats_correlation";

// Spread buckets for segmentation, by absolute line.
const BUCKETS: &[(&str, f64, f64)] = &[
    ("pk_to_3", 0.0, 3.5),
    ("small_fav", 3.5, 7.5),
    ("mid_fav", 7.5, 12.5),
    ("big_fav", 12.5, 50.0),
];

/// Cover percentage and sample size over the rows matching `keep`.
fn cover_rate<F: Fn(&AtsRow) -> bool>(ats: &[AtsRow], keep: F) -> (f64, usize) {
    let rows: Vec<&AtsRow> = ats
        .iter()
        .filter(|r| r.ats_result.is_some() && keep(r))
        .collect();
    if rows.is_empty() {
        return (0.0, 0);
    }
    let covers = rows.iter().filter(|r| r.covered()).count();
    (covers as f64 / rows.len() as f64 * 100.0, rows.len())
}

fn at_home(row: &AtsRow) -> bool {
    matches!(row.location.as_deref(), Some(l) if l.eq_ignore_ascii_case("h") || l.eq_ignore_ascii_case("home"))
}

fn on_road(row: &AtsRow) -> bool {
    matches!(row.location.as_deref(), Some(l) if l.eq_ignore_ascii_case("a") || l.eq_ignore_ascii_case("away"))
}

/// One team's ATS history, scored for this game's role and number.
fn analyze_team(
    ats: &[AtsRow],
    team: &str,
    role_in_game: &str,
    game_spread: f64,
) -> (f64, Vec<String>, usize) {
    if ats.is_empty() || ats.iter().all(|r| r.ats_result.is_none()) {
        return (0.0, Vec::new(), 0);
    }

    let mut findings: Vec<String> = Vec::new();
    let mut edge = 0.0;

    let (overall_pct, overall_n) = cover_rate(ats, |_| true);

    // Venue splits.
    let (home_pct, home_n) = cover_rate(ats, at_home);
    let (away_pct, away_n) = cover_rate(ats, on_road);

    if role_in_game == "away" && away_n >= 5 {
        if away_pct >= 60.0 {
            edge += 0.8;
            findings.push(format!(
                "{} covers {:.0}% on the road ({} games).",
                team, away_pct, away_n
            ));
        } else if away_pct < 40.0 {
            edge -= 0.6;
            findings.push(format!(
                "{} covers only {:.0}% on the road ({} games).",
                team, away_pct, away_n
            ));
        }
    }
    if role_in_game == "home" && home_n >= 5 {
        if home_pct >= 60.0 {
            edge += 0.7;
            findings.push(format!(
                "{} covers {:.0}% at home ({} games).",
                team, home_pct, home_n
            ));
        } else if home_pct < 40.0 {
            edge -= 0.5;
            findings.push(format!(
                "{} covers only {:.0}% at home ({} games).",
                team, home_pct, home_n
            ));
        }
    }

    // Role splits: a negative stored line means the team was favored.
    let (fav_pct, fav_n) = cover_rate(ats, |r| r.line.map(|l| l < 0.0).unwrap_or(false));
    let (dog_pct, dog_n) = cover_rate(ats, |r| r.line.map(|l| l > 0.0).unwrap_or(false));

    let is_dog = if role_in_game == "home" {
        game_spread > 0.0
    } else {
        game_spread < 0.0
    };

    if is_dog && dog_n >= 4 && dog_pct >= 60.0 {
        edge += 0.9;
        findings.push(format!(
            "{} covers {:.0}% as an underdog ({} games). Live dog alert.",
            team, dog_pct, dog_n
        ));
    }
    if !is_dog && fav_n >= 4 && fav_pct < 40.0 {
        edge -= 0.7;
        findings.push(format!(
            "{} covers only {:.0}% as a favorite ({} games). Fade-the-chalk signal.",
            team, fav_pct, fav_n
        ));
    }

    // The spread bucket this game's number lands in.
    let abs_spread = game_spread.abs();
    for (label, lo, hi) in BUCKETS {
        let (bkt_pct, bkt_n) =
            cover_rate(ats, |r| r.line.map(|l| l.abs() >= *lo && l.abs() < *hi).unwrap_or(false));
        if abs_spread >= *lo && abs_spread < *hi && bkt_n >= 3 {
            if bkt_pct >= 65.0 {
                edge += 0.5;
                findings.push(format!(
                    "{} covers {:.0}% in the {} bucket ({} games).",
                    team, bkt_pct, label, bkt_n
                ));
            } else if bkt_pct < 35.0 {
                edge -= 0.5;
                findings.push(format!(
                    "{} covers only {:.0}% in the {} bucket ({} games).",
                    team, bkt_pct, label, bkt_n
                ));
            }
        }
    }

    if findings.is_empty() {
        findings.push(format!(
            "{} ATS record: {:.0}% overall ({} games). No notable situational patterns.",
            team, overall_pct, overall_n
        ));
    }

    (edge, findings, overall_n)
}

pub fn analyze(ctx: &MatchupContext) -> Result<DimensionResult> {
    if ctx.away_ats.is_empty() && ctx.home_ats.is_empty() {
        return Ok(DimensionResult::neutral(
            NAME,
            "ATS data unavailable for both teams.",
        ));
    }

    let spread = ctx.line.spread.unwrap_or(0.0);

    let (away_edge, away_finds, away_n) = analyze_team(&ctx.away_ats, &ctx.away_team, "away", spread);
    let (home_edge, home_finds, home_n) = analyze_team(&ctx.home_ats, &ctx.home_team, "home", spread);

    let spread_edge = away_edge - home_edge; // positive = away value

    let mut findings = away_finds;
    findings.extend(home_finds);

    let n_games = away_n + home_n;
    let conf = (0.10 + n_games as f64 * 0.01 + findings.len() as f64 * 0.06).min(0.75);
    let conf = round2(conf.max(0.10));

    Ok(DimensionResult::new(
        NAME,
        round2(spread_edge),
        0.0, // spread-only dimension
        conf,
        findings.join(" "),
    )
    .with_raw(json!({
        "away_edge": round2(away_edge),
        "home_edge": round2(home_edge),
        "games": n_games,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(location: &str, line: f64, result: &str) -> AtsRow {
        AtsRow {
            game_date: "2025-01-01".into(),
            opponent: "Opp".into(),
            location: Some(location.into()),
            line: Some(line),
            ats_result: Some(result.into()),
        }
    }

    #[test]
    fn neutral_without_history() {
        let ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        let r = analyze(&ctx).unwrap();
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.total_edge, 0.0);
    }

    #[test]
    fn road_cover_machine_gets_away_edge() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        // 5-1 ATS on the road.
        ctx.away_ats = vec![
            row("A", 3.0, "cover"),
            row("A", 4.0, "cover"),
            row("A", 2.0, "cover"),
            row("A", 6.0, "cover"),
            row("A", 1.0, "cover"),
            row("A", 5.0, "miss"),
        ];
        let r = analyze(&ctx).unwrap();
        assert!(r.spread_edge > 0.0, "edge {}", r.spread_edge);
        assert!(r.narrative.contains("on the road"));
    }

    #[test]
    fn live_dog_alert_fires() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.line.spread = Some(-6.5); // away side catching points
        ctx.away_ats = vec![
            row("A", 7.0, "cover"),
            row("H", 5.0, "cover"),
            row("A", 9.0, "cover"),
            row("H", 3.0, "miss"),
        ];
        let r = analyze(&ctx).unwrap();
        assert!(r.narrative.contains("Live dog alert"));
        assert!(r.spread_edge > 0.0);
    }

    #[test]
    fn chalk_fade_penalizes_bad_favorites() {
        let mut ctx = MatchupContext::new("Away U", "Home St.", "2025-02-01", 2025);
        ctx.line.spread = Some(-6.5); // home favored
        ctx.home_ats = vec![
            row("H", -5.0, "miss"),
            row("H", -7.0, "miss"),
            row("A", -3.0, "miss"),
            row("H", -9.0, "cover"),
        ];
        let r = analyze(&ctx).unwrap();
        assert!(r.narrative.contains("Fade-the-chalk"));
        // Penalty lands on the home side, which is away value.
        assert!(r.spread_edge > 0.0, "edge {}", r.spread_edge);
    }
}
