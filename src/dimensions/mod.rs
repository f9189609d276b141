//! The analytical dimensions and their static registry.
//!
//! Each dimension is a pure function from a matchup context to a
//! directional result. The set is closed and known at compile time, so
//! the registry is a `const` slice; the pipeline iterates it in order
//! and the weights here are the composite weights.

pub mod ats_correlation;
pub mod four_factors;
pub mod ft_rate;
pub mod home_away;
pub mod opponent_quality;
pub mod pace_adjusted;
pub mod rank_asymmetry;
pub mod recency;
pub mod shooting_zones;
pub mod trap_detect;
pub mod turnover_chain;
pub mod variance;

use anyhow::Result;
use std::collections::HashMap;

use crate::models::{DimensionResult, MatchupContext};

pub type DimensionFn = fn(&MatchupContext) -> Result<DimensionResult>;

/// One registry entry: name, composite weight, and the analysis function.
pub struct DimensionSpec {
    pub name: &'static str,
    pub weight: f64,
    pub run: DimensionFn,
}

/// The full dimension set, in evaluation order. Weights sum to 1.0.
pub const DIMENSIONS: &[DimensionSpec] = &[
    DimensionSpec { name: pace_adjusted::NAME, weight: 0.14, run: pace_adjusted::analyze },
    DimensionSpec { name: four_factors::NAME, weight: 0.14, run: four_factors::analyze },
    DimensionSpec { name: opponent_quality::NAME, weight: 0.10, run: opponent_quality::analyze },
    DimensionSpec { name: home_away::NAME, weight: 0.08, run: home_away::analyze },
    DimensionSpec { name: recency::NAME, weight: 0.09, run: recency::analyze },
    DimensionSpec { name: shooting_zones::NAME, weight: 0.07, run: shooting_zones::analyze },
    DimensionSpec { name: turnover_chain::NAME, weight: 0.07, run: turnover_chain::analyze },
    DimensionSpec { name: ft_rate::NAME, weight: 0.05, run: ft_rate::analyze },
    DimensionSpec { name: ats_correlation::NAME, weight: 0.08, run: ats_correlation::analyze },
    DimensionSpec { name: variance::NAME, weight: 0.06, run: variance::analyze },
    DimensionSpec { name: rank_asymmetry::NAME, weight: 0.06, run: rank_asymmetry::analyze },
    DimensionSpec { name: trap_detect::NAME, weight: 0.06, run: trap_detect::analyze },
];

/// Registry lookup by name.
pub fn find(name: &str) -> Option<&'static DimensionSpec> {
    DIMENSIONS.iter().find(|spec| spec.name == name)
}

/// Name -> weight mapping for the composite computation.
pub fn weight_table() -> HashMap<String, f64> {
    DIMENSIONS
        .iter()
        .map(|spec| (spec.name.to_string(), spec.weight))
        .collect()
}

// ---------------------------------------------------------------------
// Shared numeric helpers
// ---------------------------------------------------------------------

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator). None below 2 values.
pub(crate) fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
