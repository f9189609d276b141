//! Composite scoring, confidence tiers, and Kelly bankroll sizing.
//!
//! Collapses per-dimension edges into a single 0-10 conviction score per
//! market, maps that score to a categorical tier, and converts it into a
//! recommended bankroll fraction via a logistic win-probability model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::DimensionResult;

const COMPOSITE_FLOOR: f64 = 0.0;
const COMPOSITE_CEILING: f64 = 10.0;

// The weighted average of edge * confidence lands in a narrow band;
// scaled up before clamping so the 0-10 range is actually used.
const RAW_TO_SCALE_FACTOR: f64 = 10.0;

// Logistic mapping from composite to estimated win probability:
// ~5% at composite 0, 50% at 5, ~95% at 10.
const LOGISTIC_MIDPOINT: f64 = 5.0;
const LOGISTIC_STEEPNESS: f64 = 0.6;

/// Quarter-Kelly cap on the recommended bankroll fraction.
const MAX_KELLY_FRACTION: f64 = 0.25;

/// Implied win probability of a standard -110 line (risk 110 to win 100).
pub const STANDARD_JUICE_IMPLIED_PROB: f64 = 110.0 / 210.0;

/// Which market a composite is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    Spread,
    Total,
}

impl Market {
    fn edge_of(self, result: &DimensionResult) -> f64 {
        match self {
            Market::Spread => result.spread_edge,
            Market::Total => result.total_edge,
        }
    }
}

/// Categorical confidence label applied to every pick.
///
/// Ordered `Skip < Lean < Strong < Lock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Skip,
    Lean,
    Strong,
    Lock,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Skip => "SKIP",
            Tier::Lean => "LEAN",
            Tier::Strong => "STRONG",
            Tier::Lock => "LOCK",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn clip(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Collapse dimension results into one 0-10 conviction score.
///
/// Each result contributes `edge * confidence * weight`; the signed sum
/// is normalized by the total weight of the participating dimensions so
/// unweighted entries neither add nor deflate conviction, then the
/// absolute value is scaled to the 0-10 range. Direction is carried by
/// the raw edge signs, never by the composite.
pub fn compute_composite(
    results: &[DimensionResult],
    weights: &HashMap<String, f64>,
    market: Market,
) -> f64 {
    if results.is_empty() {
        return 0.0;
    }

    let mut total_weight = 0.0;
    let mut weighted_sum = 0.0;

    for dim in results {
        let w = weights.get(&dim.name).copied().unwrap_or(0.0);
        weighted_sum += market.edge_of(dim) * dim.confidence * w;
        total_weight += w;
    }

    if total_weight == 0.0 {
        return 0.0;
    }

    let normalized = weighted_sum / total_weight;
    let scaled = normalized.abs() * RAW_TO_SCALE_FACTOR;

    clip(scaled, COMPOSITE_FLOOR, COMPOSITE_CEILING)
}

/// Map a composite score to its confidence tier.
///
/// Thresholds: >= 7.0 LOCK, >= 4.5 STRONG, >= 2.0 LEAN, else SKIP.
/// Lower bounds are inclusive.
pub fn assign_tier(composite: f64) -> Tier {
    if composite >= 7.0 {
        Tier::Lock
    } else if composite >= 4.5 {
        Tier::Strong
    } else if composite >= 2.0 {
        Tier::Lean
    } else {
        Tier::Skip
    }
}

/// Recommended bankroll fraction for a pick at the given composite.
///
/// The composite is converted to an estimated win probability through
/// the logistic curve, and the Kelly fraction is the edge over the
/// market-implied probability, `(p_est - p_imp) / (1 - p_imp)`, floored
/// at zero and capped at quarter-Kelly. A degenerate market
/// (`implied_prob >= 1.0`) never produces a bet.
pub fn kelly_fraction(composite: f64, implied_prob: f64) -> f64 {
    // Guard the exponent against extreme inputs.
    let z = clip(
        -LOGISTIC_STEEPNESS * (composite - LOGISTIC_MIDPOINT),
        -500.0,
        500.0,
    );
    let estimated_prob = 1.0 / (1.0 + z.exp());

    if implied_prob >= 1.0 {
        return 0.0;
    }

    let edge = estimated_prob - implied_prob;
    if edge <= 0.0 {
        return 0.0;
    }

    clip(edge / (1.0 - implied_prob), 0.0, MAX_KELLY_FRACTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(name: &str, spread_edge: f64, total_edge: f64, confidence: f64) -> DimensionResult {
        DimensionResult::new(name, spread_edge, total_edge, confidence, "test")
    }

    fn weights(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(name, w)| (name.to_string(), *w))
            .collect()
    }

    #[test]
    fn composite_stays_in_range_for_extreme_inputs() {
        let w = weights(&[("a", 0.5), ("b", 0.5)]);
        for edge in [-1000.0, -5.0, 0.0, 5.0, 1000.0] {
            let results = vec![dim("a", edge, -edge, 1.0), dim("b", edge * 2.0, edge, 0.7)];
            let spread = compute_composite(&results, &w, Market::Spread);
            let total = compute_composite(&results, &w, Market::Total);
            assert!((0.0..=10.0).contains(&spread), "spread {} out of range", spread);
            assert!((0.0..=10.0).contains(&total), "total {} out of range", total);
        }
    }

    #[test]
    fn composite_zero_for_empty_or_unweighted() {
        let w = weights(&[("a", 1.0)]);
        assert_eq!(compute_composite(&[], &w, Market::Spread), 0.0);

        // Results whose names carry no weight accumulate zero total weight.
        let results = vec![dim("unknown", 5.0, 5.0, 1.0)];
        assert_eq!(compute_composite(&results, &w, Market::Spread), 0.0);
    }

    #[test]
    fn composite_zero_for_all_zero_edges() {
        let w = weights(&[("a", 0.6), ("b", 0.4)]);
        let results = vec![dim("a", 0.0, 0.0, 0.9), dim("b", 0.0, 0.0, 0.2)];
        assert_eq!(compute_composite(&results, &w, Market::Total), 0.0);
    }

    #[test]
    fn composite_normalizes_by_participating_weight() {
        // Contribution 0.5 * 0.8 * 0.5 = 0.2 over total weight 0.5
        // normalizes to 0.4, which scales to 4.0.
        let w = weights(&[("a", 0.5)]);
        let results = vec![dim("a", 0.5, 0.0, 0.8)];
        let composite = compute_composite(&results, &w, Market::Spread);
        assert!((composite - 4.0).abs() < 1e-9, "got {}", composite);
    }

    #[test]
    fn composite_sign_is_stripped() {
        let w = weights(&[("a", 1.0)]);
        let pos = compute_composite(&[dim("a", 0.3, 0.0, 1.0)], &w, Market::Spread);
        let neg = compute_composite(&[dim("a", -0.3, 0.0, 1.0)], &w, Market::Spread);
        assert_eq!(pos, neg);
        assert!(pos > 0.0);
    }

    #[test]
    fn tier_boundaries_are_exact() {
        assert_eq!(assign_tier(7.0), Tier::Lock);
        assert_eq!(assign_tier(6.999), Tier::Strong);
        assert_eq!(assign_tier(4.5), Tier::Strong);
        assert_eq!(assign_tier(4.499), Tier::Lean);
        assert_eq!(assign_tier(2.0), Tier::Lean);
        assert_eq!(assign_tier(1.999), Tier::Skip);
        assert_eq!(assign_tier(0.0), Tier::Skip);
        assert_eq!(assign_tier(10.0), Tier::Lock);
    }

    #[test]
    fn tier_is_monotonic_in_composite() {
        let mut last = Tier::Skip;
        let mut c = 0.0;
        while c <= 10.0 {
            let tier = assign_tier(c);
            assert!(tier >= last, "tier regressed at composite {}", c);
            last = tier;
            c += 0.05;
        }
    }

    #[test]
    fn kelly_zero_at_no_edge() {
        // Composite 5.0 maps to exactly 50% estimated probability.
        assert_eq!(kelly_fraction(5.0, 0.5), 0.0);
        // Below the implied probability there is never a bet.
        assert_eq!(kelly_fraction(0.0, 0.5), 0.0);
        assert_eq!(kelly_fraction(3.0, STANDARD_JUICE_IMPLIED_PROB), 0.0);
    }

    #[test]
    fn kelly_capped_at_quarter() {
        let f = kelly_fraction(10.0, 0.5);
        assert!(f > 0.0);
        assert!(f <= 0.25, "fraction {} exceeds quarter-Kelly cap", f);
    }

    #[test]
    fn kelly_degenerate_market_never_bets() {
        assert_eq!(kelly_fraction(10.0, 1.0), 0.0);
        assert_eq!(kelly_fraction(10.0, 1.5), 0.0);
    }

    #[test]
    fn kelly_always_in_range() {
        for composite in [0.0, 2.5, 5.0, 7.5, 10.0] {
            for implied in [0.0, 0.3, 0.5, STANDARD_JUICE_IMPLIED_PROB, 0.9, 1.0] {
                let f = kelly_fraction(composite, implied);
                assert!((0.0..=0.25).contains(&f), "f {} for ({}, {})", f, composite, implied);
            }
        }
    }
}
