//! Core data shapes shared across the analysis engine.
//!
//! Containers that could not be populated from the database are always
//! empty (`StatLine::is_empty`, empty `Vec`s, a default `MarketLine`),
//! never `None` — downstream code checks emptiness only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scoring::Tier;

/// Flat mapping of named numeric fields (a ratings or four-factors
/// snapshot). Empty when no snapshot exists for the team/season.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatLine(BTreeMap<String, f64>);

impl StatLine {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Field value, or `default` when the field is absent or non-finite.
    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        match self.0.get(key) {
            Some(v) if v.is_finite() => *v,
            _ => default,
        }
    }

    pub fn insert(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }
}

impl FromIterator<(String, f64)> for StatLine {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One game from a team's season log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLogRow {
    pub game_date: String,
    pub opponent: String,
    pub location: Option<String>,
    pub result: Option<String>,
    pub team_score: Option<i64>,
    pub opp_score: Option<i64>,
    pub adj_oe: Option<f64>,
    pub adj_de: Option<f64>,
    pub to_pct: Option<f64>,
    pub opp_to_pct: Option<f64>,
    pub opp_adj_de_rank: Option<i64>,
}

/// One against-the-spread outcome from a team's season history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsRow {
    pub game_date: String,
    pub opponent: String,
    pub location: Option<String>,
    pub line: Option<f64>,
    pub ats_result: Option<String>,
}

impl AtsRow {
    /// Whether this row counts as a cover (`cover` / `W` / `win`).
    pub fn covered(&self) -> bool {
        matches!(
            self.ats_result
                .as_deref()
                .map(str::to_ascii_uppercase)
                .as_deref(),
            Some("COVER") | Some("W") | Some("WIN")
        )
    }
}

/// One over/under outcome from a team's season history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OuRow {
    pub game_date: String,
    pub opponent: String,
    pub total: Option<f64>,
    pub combined_score: Option<i64>,
    pub ou_result: Option<String>,
}

/// One dated ratings snapshot, for trend detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingsSnapshot {
    pub scrape_date: String,
    pub adj_em: Option<f64>,
}

/// Posted market numbers for one game. Default-constructed = no line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketLine {
    pub spread: Option<f64>,
    pub total: Option<f64>,
    pub away_ml: Option<i64>,
    pub home_ml: Option<i64>,
}

impl MarketLine {
    pub fn is_empty(&self) -> bool {
        self.spread.is_none()
            && self.total.is_none()
            && self.away_ml.is_none()
            && self.home_ml.is_none()
    }
}

/// One scheduled game with its posted line, as stored per date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRow {
    pub game_date: String,
    pub season: i32,
    pub away_team: String,
    pub home_team: String,
    pub spread: Option<f64>,
    pub total: Option<f64>,
    pub away_ml: Option<i64>,
    pub home_ml: Option<i64>,
}

/// Everything needed to evaluate a single game. Built once per game,
/// read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupContext {
    pub away_team: String,
    pub home_team: String,
    pub game_date: String,
    pub season: i32,

    pub away_ratings: StatLine,
    pub home_ratings: StatLine,

    pub away_four_factors: StatLine,
    pub home_four_factors: StatLine,

    pub away_game_logs: Vec<GameLogRow>,
    pub home_game_logs: Vec<GameLogRow>,

    pub away_ats: Vec<AtsRow>,
    pub home_ats: Vec<AtsRow>,

    pub away_ou: Vec<OuRow>,
    pub home_ou: Vec<OuRow>,

    pub line: MarketLine,

    pub away_ratings_history: Vec<RatingsSnapshot>,
    pub home_ratings_history: Vec<RatingsSnapshot>,
}

impl MatchupContext {
    /// Context with every data field empty.
    pub fn new(away_team: &str, home_team: &str, game_date: &str, season: i32) -> Self {
        Self {
            away_team: away_team.to_string(),
            home_team: home_team.to_string(),
            game_date: game_date.to_string(),
            season,
            away_ratings: StatLine::new(),
            home_ratings: StatLine::new(),
            away_four_factors: StatLine::new(),
            home_four_factors: StatLine::new(),
            away_game_logs: Vec::new(),
            home_game_logs: Vec::new(),
            away_ats: Vec::new(),
            home_ats: Vec::new(),
            away_ou: Vec::new(),
            home_ou: Vec::new(),
            line: MarketLine::default(),
            away_ratings_history: Vec::new(),
            home_ratings_history: Vec::new(),
        }
    }
}

/// Output of a single analytical dimension.
///
/// `spread_edge`: positive = value on the away side. `total_edge`:
/// positive = value on the over. `confidence` is clamped to [0, 1] by
/// the dispatcher before anything downstream sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionResult {
    pub name: String,
    pub spread_edge: f64,
    pub total_edge: f64,
    pub confidence: f64,
    pub narrative: String,
    /// Intermediate values for diagnostics and reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl DimensionResult {
    pub fn new(
        name: &str,
        spread_edge: f64,
        total_edge: f64,
        confidence: f64,
        narrative: impl Into<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            spread_edge,
            total_edge,
            confidence,
            narrative: narrative.into(),
            raw: None,
        }
    }

    /// Zero-edge, zero-confidence result used when a dimension has
    /// nothing to say (missing inputs) or failed outright.
    pub fn neutral(name: &str, narrative: impl Into<String>) -> Self {
        Self::new(name, 0.0, 0.0, 0.0, narrative)
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Complete analysis output for a single matchup — the one artifact the
/// rendering and persistence layers consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickCard {
    pub away_team: String,
    pub home_team: String,
    pub game_date: String,
    pub season: i32,

    /// Posted spread (negative = home favored).
    pub spread: f64,
    /// Posted over/under total.
    pub total: f64,

    pub projected_away_score: f64,
    pub projected_home_score: f64,
    pub projected_total: f64,
    /// Model margin, away minus home (negative = model favors home).
    pub true_spread: f64,

    /// Team name on the spread side, or `""` when the market is a skip.
    pub spread_pick: String,
    pub spread_tier: Tier,
    pub spread_composite: f64,
    /// Points of value: model spread minus posted spread.
    pub spread_value: f64,

    /// `"OVER"`, `"UNDER"`, or `""` when the market is a skip.
    pub total_pick: String,
    pub total_tier: Tier,
    pub total_composite: f64,
    /// Points of value: projected total minus posted total.
    pub total_value: f64,

    pub dimensions: Vec<DimensionResult>,

    pub headline: String,
    pub key_factors: Vec<String>,
    pub trap_warnings: Vec<String>,
}

impl PickCard {
    /// Higher of the two market composites.
    pub fn max_composite(&self) -> f64 {
        self.spread_composite.max(self.total_composite)
    }

    /// True when at least one market is not a skip.
    pub fn has_actionable_pick(&self) -> bool {
        self.spread_tier != Tier::Skip || self.total_tier != Tier::Skip
    }

    /// Human-friendly line string like `"Duke -3.5"`.
    pub fn spread_display(&self) -> String {
        if self.spread == 0.0 {
            "PICK".to_string()
        } else if self.spread < 0.0 {
            format!("{} {}", self.home_team, self.spread)
        } else {
            format!("{} -{}", self.away_team, self.spread)
        }
    }
}

impl std::fmt::Display for PickCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} @ {}  ({})\n  Line: {} | O/U {}",
            self.away_team,
            self.home_team,
            self.game_date,
            self.spread_display(),
            self.total
        )?;
        if !self.spread_pick.is_empty() {
            write!(
                f,
                "\n  Spread: {} [{}] (composite {:.1}, value {:+.1})",
                self.spread_pick, self.spread_tier, self.spread_composite, self.spread_value
            )?;
        }
        if !self.total_pick.is_empty() {
            write!(
                f,
                "\n  Total: {} [{}] (composite {:.1}, value {:+.1})",
                self.total_pick, self.total_tier, self.total_composite, self.total_value
            )?;
        }
        Ok(())
    }
}

/// Result of analyzing every game on a date. `slate_size` is the number
/// of games found on the schedule, so a date with no games is
/// distinguishable from a date where every analysis failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlateReport {
    pub game_date: String,
    pub slate_size: usize,
    pub cards: Vec<PickCard>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./courtedge.db".to_string());

        Self { database_path }
    }
}
