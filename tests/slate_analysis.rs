//! End-to-end slate analysis against a seeded database: context
//! building, dimension dispatch, composite scoring, pick persistence,
//! outcome recording, and the backtest read-back.

use rusqlite::params;
use tempfile::TempDir;

use courtedge::backtest::{self, BacktestFilters};
use courtedge::db;
use courtedge::pipeline::AnalysisPipeline;
use courtedge::scoring::Tier;

const GAME_DATE: &str = "2025-02-14";
const SEASON: i32 = 2025;

struct Fixture {
    _dir: TempDir,
    pipeline: AnalysisPipeline,
}

/// Temp database with ratings for both teams and one posted line.
/// The away side profiles much stronger (115/95 efficiency vs 100/100)
/// while the market only has the home side -3.5.
fn seeded_fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let conn = db::open(dir.path().join("test.db")).unwrap();
    db::init_schema(&conn).unwrap();

    conn.execute(
        "INSERT INTO team_ratings (scrape_date, season, team, adj_o, adj_d, adj_t) \
         VALUES ('2025-02-10', ?1, 'Away U', 115.0, 95.0, 70.0)",
        params![SEASON],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO team_ratings (scrape_date, season, team, adj_o, adj_d, adj_t) \
         VALUES ('2025-02-10', ?1, 'Home St.', 100.0, 100.0, 68.0)",
        params![SEASON],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO market_lines (game_date, season, away_team, home_team, spread, total) \
         VALUES (?1, ?2, 'Away U', 'Home St.', -3.5, 145.5)",
        params![GAME_DATE, SEASON],
    )
    .unwrap();

    Fixture {
        _dir: dir,
        pipeline: AnalysisPipeline::new(conn),
    }
}

#[test]
fn ratings_only_context_round_trips_through_the_pipeline() {
    let fixture = seeded_fixture();
    let ctx = fixture
        .pipeline
        .build_context("Away U", "Home St.", GAME_DATE, SEASON);

    assert!(!ctx.away_ratings.is_empty());
    assert!(!ctx.home_ratings.is_empty());
    // Everything without seeded rows is an empty container, not an error.
    assert!(ctx.away_four_factors.is_empty());
    assert!(ctx.away_game_logs.is_empty());
    assert!(ctx.away_ats.is_empty());
    assert!(ctx.away_ou.is_empty());
    assert_eq!(ctx.line.spread, Some(-3.5));

    let card = fixture.pipeline.analyze_matchup(&ctx).unwrap();

    // Data-starved dimensions degrade to neutral results.
    for name in ["four_factors", "ats_correlation", "recency", "variance"] {
        let dim = card.dimensions.iter().find(|d| d.name == name).unwrap();
        assert_eq!(dim.confidence, 0.0, "{name} should be neutral");
        assert_eq!(dim.spread_edge, 0.0, "{name} should be neutral");
    }

    // Ratings-driven dimensions stay live.
    let pace = card.dimensions.iter().find(|d| d.name == "pace_adjusted").unwrap();
    assert!(pace.confidence > 0.0);
    assert!(pace.spread_edge != 0.0);
    let rank = card.dimensions.iter().find(|d| d.name == "rank_asymmetry").unwrap();
    assert!(rank.confidence > 0.0);

    // The card is complete: projections, picks, narrative.
    assert!(card.projected_away_score > 0.0);
    assert!(!card.headline.is_empty());
    assert!(!card.key_factors.is_empty());
}

#[test]
fn slate_analysis_persists_actionable_picks_and_backtests() {
    let mut fixture = seeded_fixture();

    let report = fixture.pipeline.analyze_slate(GAME_DATE, SEASON).unwrap();
    assert_eq!(report.slate_size, 1);
    assert_eq!(report.cards.len(), 1);

    let card = &report.cards[0];

    // The away side projects roughly seven points better while the
    // market has the home side favored, a maxed-out spread conviction.
    assert_eq!(card.spread_composite, 10.0);
    assert_eq!(card.spread_tier, Tier::Lock);
    // The directional sum points home under the sign conventions, so
    // the spread side is the home team.
    assert_eq!(card.spread_pick, "Home St.");

    // The total barely moves: a skip, and a skip never carries a side.
    assert_eq!(card.total_tier, Tier::Skip);
    assert_eq!(card.total_pick, "");

    // Exactly one row persisted: the spread pick. The skip total is not
    // written.
    let conn = fixture.pipeline.into_connection();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM pick_history", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
    let (pick_type, pick_side, tier): (String, String, String) = conn
        .query_row(
            "SELECT pick_type, pick_side, tier FROM pick_history",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(pick_type, "spread");
    assert_eq!(pick_side, "Home St.");
    assert_eq!(tier, "LOCK");

    // Re-running the same slate replaces rather than duplicates.
    let mut pipeline = AnalysisPipeline::new(conn);
    pipeline.analyze_slate(GAME_DATE, SEASON).unwrap();
    let conn = pipeline.into_connection();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM pick_history", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);

    // Record the outcome and read it back through the backtest.
    backtest::record_result(&conn, GAME_DATE, "Away U", "Home St.", "spread", "W").unwrap();

    let result = backtest::run_backtest(
        &conn,
        &BacktestFilters {
            season: Some(SEASON),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(result.total_picks, 1);
    assert_eq!(result.record[&Tier::Lock].wins, 1);
    assert!((result.overall_roi - 100.0 / 110.0).abs() < 1e-12);
    assert_eq!(result.calibration.len(), 1);
    assert_eq!(result.calibration[0].bucket, "8.5-10");
    assert_eq!(result.calibration[0].count, 1);
    assert_eq!(result.calibration[0].actual, 1.0);

    // Recording a second outcome for the same pick is a logged no-op.
    backtest::record_result(&conn, GAME_DATE, "Away U", "Home St.", "spread", "L").unwrap();
    let result = backtest::run_backtest(&conn, &BacktestFilters::default()).unwrap();
    assert_eq!(result.record[&Tier::Lock].wins, 1);
    assert_eq!(result.record[&Tier::Lock].losses, 0);
}

#[test]
fn unknown_date_is_an_explicit_empty_slate() {
    let mut fixture = seeded_fixture();
    let report = fixture.pipeline.analyze_slate("2025-12-25", SEASON).unwrap();
    assert_eq!(report.slate_size, 0);
    assert!(report.cards.is_empty());
}
