//! Terminal rendering for pick cards and backtest reports.

use crate::backtest::BacktestReport;
use crate::models::{PickCard, SlateReport};
use crate::scoring::{kelly_fraction, STANDARD_JUICE_IMPLIED_PROB};

const RULE: &str = "────────────────────────────────────────────────────────────";

pub fn print_card(card: &PickCard, verbose: bool) {
    println!("{RULE}");
    println!("{}", card.headline);
    println!("{}", card);
    println!(
        "  Projection: {} {:.1} - {} {:.1} (true spread {:+.1}, total {:.1})",
        card.away_team,
        card.projected_away_score,
        card.home_team,
        card.projected_home_score,
        card.true_spread,
        card.projected_total
    );

    if card.has_actionable_pick() {
        let stake = stake_pct(card.max_composite());
        if stake > 0.0 {
            println!("  Suggested stake: {:.1}% of bankroll (quarter-Kelly cap)", stake);
        }
    }

    if !card.key_factors.is_empty() {
        println!("  Key factors:");
        for factor in &card.key_factors {
            println!("    - {}", factor);
        }
    }
    for warning in &card.trap_warnings {
        println!("  ⚠ {}", warning);
    }

    if verbose {
        println!("  Dimension breakdown:");
        for dim in &card.dimensions {
            println!(
                "    {:<18} spread {:+6.2}  total {:+6.2}  conf {:.2}",
                dim.name, dim.spread_edge, dim.total_edge, dim.confidence
            );
        }
    }
}

pub fn print_slate(report: &SlateReport, verbose: bool) {
    if report.slate_size == 0 {
        println!("No games found for {}.", report.game_date);
        return;
    }

    println!(
        "Slate for {}: {} game(s), {} analyzed.",
        report.game_date,
        report.slate_size,
        report.cards.len()
    );
    for card in &report.cards {
        print_card(card, verbose);
    }
    println!("{RULE}");

    let actionable = report.cards.iter().filter(|c| c.has_actionable_pick()).count();
    println!("{} actionable pick(s).", actionable);
}

pub fn print_backtest(report: &BacktestReport) {
    println!("{RULE}");
    println!("Backtest: {} resolved pick(s)", report.total_picks);
    if report.total_picks == 0 {
        return;
    }

    println!("\n  {:<8} {:>4} {:>4} {:>4} {:>8} {:>8}", "tier", "W", "L", "P", "win%", "ROI");
    // Strongest tier first.
    for (tier, rec) in report.record.iter().rev() {
        let accuracy = report.accuracy_by_tier.get(tier).copied().unwrap_or(0.0);
        let roi = report.roi_by_tier.get(tier).copied().unwrap_or(0.0);
        println!(
            "  {:<8} {:>4} {:>4} {:>4} {:>7.1}% {:>+7.1}%",
            tier.to_string(),
            rec.wins,
            rec.losses,
            rec.pushes,
            accuracy * 100.0,
            roi * 100.0
        );
    }
    println!("\n  Overall ROI: {:+.1}%", report.overall_roi * 100.0);

    if !report.calibration.is_empty() {
        println!("\n  Calibration (predicted vs observed win rate):");
        println!("  {:<8} {:>10} {:>10} {:>7}", "band", "predicted", "observed", "n");
        for row in &report.calibration {
            println!(
                "  {:<8} {:>9.1}% {:>9.1}% {:>7}",
                row.bucket,
                row.predicted * 100.0,
                row.actual * 100.0,
                row.count
            );
        }
    }
    println!("{RULE}");
}

/// Suggested bankroll percentage for a composite at standard juice.
pub fn stake_pct(composite: f64) -> f64 {
    kelly_fraction(composite, STANDARD_JUICE_IMPLIED_PROB) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Tier;

    #[test]
    fn stake_is_zero_below_breakeven() {
        assert_eq!(stake_pct(0.0), 0.0);
        assert_eq!(stake_pct(5.0), 0.0);
        assert!(stake_pct(9.0) > 0.0);
    }

    #[test]
    fn tier_ordering_puts_lock_first_when_reversed() {
        let tiers = [Tier::Skip, Tier::Lean, Tier::Strong, Tier::Lock];
        let mut sorted = tiers;
        sorted.sort();
        sorted.reverse();
        assert_eq!(sorted[0], Tier::Lock);
    }
}
