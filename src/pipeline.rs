//! The analysis pipeline: builds per-game context from storage, runs
//! every registered dimension through the guarded dispatcher, scores
//! both markets, and assembles the finished pick card. Slate mode runs
//! the whole date and persists the actionable picks.

use anyhow::{bail, Result};
use chrono::Utc;
use rusqlite::Connection;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

use crate::db::{picks, queries};
use crate::dimensions::{self, round1, DimensionFn};
use crate::models::{DimensionResult, MatchupContext, PickCard, SlateReport};
use crate::scoring::{assign_tier, compute_composite, Market, Tier};

// Fallback projection constants when the pace dimension has no
// diagnostics to offer: league-average efficiency and possessions.
const FALLBACK_EFFICIENCY: f64 = 105.0;
const FALLBACK_TEMPO: f64 = 67.5;
const FALLBACK_TOTAL_LINE: f64 = 140.0;

/// Trap-score diagnostic level above which a caution is surfaced.
const TRAP_WARNING_THRESHOLD: f64 = 0.3;

/// Run one dimension with full failure isolation: an `Err` or a panic
/// inside the signal source becomes a neutral result, and a successful
/// result has its confidence clamped to [0, 1]. Never propagates.
pub fn run_guarded(name: &str, run: DimensionFn, ctx: &MatchupContext) -> DimensionResult {
    match catch_unwind(AssertUnwindSafe(|| run(ctx))) {
        Ok(Ok(mut result)) => {
            result.confidence = result.confidence.clamp(0.0, 1.0);
            result
        }
        Ok(Err(err)) => {
            warn!(
                dimension = name,
                away = %ctx.away_team,
                home = %ctx.home_team,
                error = %err,
                "dimension failed; returning neutral result"
            );
            DimensionResult::neutral(name, format!("[{name}] dimension unavailable."))
        }
        Err(_) => {
            warn!(
                dimension = name,
                away = %ctx.away_team,
                home = %ctx.home_team,
                "dimension panicked; returning neutral result"
            );
            DimensionResult::neutral(name, format!("[{name}] dimension unavailable."))
        }
    }
}

/// Confidence-weighted signed edge across all results. The sign picks
/// the side (positive = away / over); the magnitude is not used.
fn directional_sum(results: &[DimensionResult], market: Market) -> f64 {
    results
        .iter()
        .map(|r| {
            let edge = match market {
                Market::Spread => r.spread_edge,
                Market::Total => r.total_edge,
            };
            edge * r.confidence
        })
        .sum()
}

fn raw_f64(result: Option<&DimensionResult>, key: &str) -> Option<f64> {
    result
        .and_then(|r| r.raw.as_ref())
        .and_then(|raw| raw.get(key))
        .and_then(|v| v.as_f64())
}

pub struct AnalysisPipeline {
    conn: Connection,
    weights: HashMap<String, f64>,
}

impl AnalysisPipeline {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            weights: dimensions::weight_table(),
        }
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Assemble the per-game context. Every lookup is individually
    /// guarded: a failing or empty query leaves that field an empty
    /// container and never aborts the build.
    pub fn build_context(
        &self,
        away_team: &str,
        home_team: &str,
        game_date: &str,
        season: i32,
    ) -> MatchupContext {
        let conn = &self.conn;
        let mut ctx = MatchupContext::new(away_team, home_team, game_date, season);

        ctx.away_ratings = guarded("ratings", away_team, queries::team_ratings(conn, away_team, season));
        ctx.home_ratings = guarded("ratings", home_team, queries::team_ratings(conn, home_team, season));

        ctx.away_four_factors = guarded(
            "four_factors",
            away_team,
            queries::team_four_factors(conn, away_team, season),
        );
        ctx.home_four_factors = guarded(
            "four_factors",
            home_team,
            queries::team_four_factors(conn, home_team, season),
        );

        ctx.away_game_logs = guarded("game_logs", away_team, queries::team_game_logs(conn, away_team, season));
        ctx.home_game_logs = guarded("game_logs", home_team, queries::team_game_logs(conn, home_team, season));

        ctx.away_ats = guarded("ats", away_team, queries::team_ats(conn, away_team, season));
        ctx.home_ats = guarded("ats", home_team, queries::team_ats(conn, home_team, season));

        ctx.away_ou = guarded("ou", away_team, queries::team_ou(conn, away_team, season));
        ctx.home_ou = guarded("ou", home_team, queries::team_ou(conn, home_team, season));

        ctx.line = guarded(
            "line",
            away_team,
            queries::matchup_line(conn, away_team, home_team, season),
        );

        ctx.away_ratings_history = guarded(
            "ratings_history",
            away_team,
            queries::ratings_history(conn, away_team, season, 5),
        );
        ctx.home_ratings_history = guarded(
            "ratings_history",
            home_team,
            queries::ratings_history(conn, home_team, season, 5),
        );

        ctx
    }

    /// Dispatch one named dimension. An unknown name is a configuration
    /// error and fails immediately; everything the dimension itself does
    /// wrong is converted to a neutral result.
    pub fn dispatch(&self, name: &str, ctx: &MatchupContext) -> Result<DimensionResult> {
        let Some(spec) = dimensions::find(name) else {
            bail!("unknown dimension: {name:?}");
        };
        Ok(run_guarded(spec.name, spec.run, ctx))
    }

    /// Run every registered dimension and produce the pick card.
    pub fn analyze_matchup(&self, ctx: &MatchupContext) -> Result<PickCard> {
        let mut results = Vec::with_capacity(dimensions::DIMENSIONS.len());
        for spec in dimensions::DIMENSIONS {
            results.push(self.dispatch(spec.name, ctx)?);
        }

        let spread_composite = compute_composite(&results, &self.weights, Market::Spread);
        let total_composite = compute_composite(&results, &self.weights, Market::Total);

        // Direction comes from the aggregate signed edge, not from the
        // composite (which is magnitude-only). Ties default away/over.
        let spread_direction = directional_sum(&results, Market::Spread);
        let total_direction = directional_sum(&results, Market::Total);

        let spread_tier = assign_tier(spread_composite);
        let total_tier = assign_tier(total_composite);

        let mut spread_pick = if spread_direction >= 0.0 {
            ctx.away_team.clone()
        } else {
            ctx.home_team.clone()
        };
        let mut total_pick = if total_direction >= 0.0 {
            "OVER".to_string()
        } else {
            "UNDER".to_string()
        };

        // A skip market never carries a side.
        if spread_tier == Tier::Skip {
            spread_pick.clear();
        }
        if total_tier == Tier::Skip {
            total_pick.clear();
        }

        let vegas_spread = ctx.line.spread.unwrap_or(0.0);
        let vegas_total = ctx.line.total.unwrap_or(FALLBACK_TOTAL_LINE);

        // Projected scores: the pace dimension's own projection when it
        // produced one, otherwise a ratings-average estimate.
        let pace = results.iter().find(|r| r.name == dimensions::pace_adjusted::NAME);
        let (proj_away, proj_home) = match (raw_f64(pace, "away_pts"), raw_f64(pace, "home_pts")) {
            (Some(away), Some(home)) => (away, home),
            _ => {
                let away_o = ctx.away_ratings.get_or("adj_o", FALLBACK_EFFICIENCY);
                let home_d = ctx.home_ratings.get_or("adj_d", FALLBACK_EFFICIENCY);
                let home_o = ctx.home_ratings.get_or("adj_o", FALLBACK_EFFICIENCY);
                let away_d = ctx.away_ratings.get_or("adj_d", FALLBACK_EFFICIENCY);
                (
                    (away_o + home_d) / 2.0 * FALLBACK_TEMPO / 100.0,
                    (home_o + away_d) / 2.0 * FALLBACK_TEMPO / 100.0,
                )
            }
        };

        let projected_total = proj_away + proj_home;
        let true_spread = proj_away - proj_home;

        // Top narratives by weighted spread signal.
        let mut ranked: Vec<&DimensionResult> = results.iter().collect();
        ranked.sort_by(|a, b| {
            (b.spread_edge.abs() * b.confidence).total_cmp(&(a.spread_edge.abs() * a.confidence))
        });
        let key_factors: Vec<String> = ranked
            .iter()
            .take(3)
            .filter(|r| !r.narrative.is_empty())
            .map(|r| r.narrative.clone())
            .collect();

        let trap = results.iter().find(|r| r.name == dimensions::trap_detect::NAME);
        let mut trap_warnings = Vec::new();
        if let Some(score) = raw_f64(trap, "trap_score") {
            if score > TRAP_WARNING_THRESHOLD {
                if let Some(t) = trap {
                    trap_warnings.push(t.narrative.clone());
                }
            }
        }

        let spread_part = if spread_pick.is_empty() {
            "Spread: PASS".to_string()
        } else {
            format!("{} covers [{}]", spread_pick, spread_tier)
        };
        let total_part = if total_pick.is_empty() {
            "Total: PASS".to_string()
        } else {
            format!("{} [{}]", total_pick, total_tier)
        };
        // The stronger market leads the headline.
        let headline = if spread_composite >= total_composite {
            format!("{} | {}", spread_part, total_part)
        } else {
            format!("{} | {}", total_part, spread_part)
        };

        Ok(PickCard {
            away_team: ctx.away_team.clone(),
            home_team: ctx.home_team.clone(),
            game_date: ctx.game_date.clone(),
            season: ctx.season,
            spread: vegas_spread,
            total: vegas_total,
            projected_away_score: round1(proj_away),
            projected_home_score: round1(proj_home),
            projected_total: round1(projected_total),
            true_spread: round1(true_spread),
            spread_pick,
            spread_tier,
            spread_composite,
            spread_value: round1(true_spread - vegas_spread),
            total_pick,
            total_tier,
            total_composite,
            total_value: round1(projected_total - vegas_total),
            dimensions: results,
            headline,
            key_factors,
            trap_warnings,
        })
    }

    /// Analyze every game on a date: build context defensively, skip
    /// rows with missing team names, survive per-game failures, sort by
    /// conviction, and persist the actionable picks.
    pub fn analyze_slate(&mut self, game_date: &str, season: i32) -> Result<SlateReport> {
        let games = guarded("slate", game_date, queries::lines_for_date(&self.conn, game_date));

        if games.is_empty() {
            warn!(game_date, season, "no games found");
            return Ok(SlateReport {
                game_date: game_date.to_string(),
                slate_size: 0,
                cards: Vec::new(),
            });
        }

        let slate_size = games.len();
        let mut cards: Vec<PickCard> = Vec::with_capacity(slate_size);

        for game in &games {
            if game.away_team.is_empty() || game.home_team.is_empty() {
                warn!(
                    away = %game.away_team,
                    home = %game.home_team,
                    "skipping row with missing team names"
                );
                continue;
            }

            let ctx = self.build_context(&game.away_team, &game.home_team, game_date, season);
            match self.analyze_matchup(&ctx) {
                Ok(card) => cards.push(card),
                Err(err) => {
                    error!(
                        away = %game.away_team,
                        home = %game.home_team,
                        game_date,
                        error = %err,
                        "failed to analyze game; continuing slate"
                    );
                }
            }
        }

        // Best picks first.
        cards.sort_by(|a, b| b.max_composite().total_cmp(&a.max_composite()));

        let analysis_date = Utc::now().format("%Y-%m-%d").to_string();
        if let Err(err) = picks::save_picks(&mut self.conn, &cards, &analysis_date) {
            error!(error = %err, "failed to persist slate picks");
        }

        info!(game_date, analyzed = cards.len(), slate_size, "slate analysis complete");

        Ok(SlateReport {
            game_date: game_date.to_string(),
            slate_size,
            cards,
        })
    }
}

/// Unwrap a context query, degrading to the empty container on error.
fn guarded<T: Default>(what: &str, team: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            debug!(what, team, error = %err, "context query returned no data");
            T::default()
        }
    }
}
