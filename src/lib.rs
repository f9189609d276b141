//! courtedge — college basketball matchup analysis and pick tracking.
//!
//! Combines independent statistical dimensions into spread and total
//! recommendations with calibrated confidence tiers, persists the
//! actionable picks, and backtests historical accuracy.

pub mod backtest;
pub mod db;
pub mod dimensions;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod scoring;
