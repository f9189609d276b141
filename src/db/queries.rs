//! Parameterized lookups feeding the matchup context.
//!
//! Every function returns an empty container when no rows match —
//! absence of data is an expected state, not an error. Errors are
//! reserved for genuinely broken queries (missing tables, bad SQL).

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::models::{AtsRow, GameLogRow, LineRow, MarketLine, OuRow, RatingsSnapshot, StatLine};

/// Numeric columns lifted into a ratings `StatLine`.
const RATING_FIELDS: &[&str] = &[
    "rank_overall",
    "adj_em",
    "adj_o",
    "adj_o_rank",
    "adj_d",
    "adj_d_rank",
    "adj_t",
    "adj_t_rank",
    "luck",
    "luck_rank",
    "sos_adj_em",
    "sos_adj_em_rank",
    "sos_opp_o",
    "sos_opp_o_rank",
    "sos_opp_d",
    "sos_opp_d_rank",
    "ncsos_adj_em",
    "ncsos_adj_em_rank",
];

/// Numeric columns lifted into a four-factors `StatLine`.
const FOUR_FACTOR_FIELDS: &[&str] = &[
    "off_efg",
    "off_efg_rank",
    "off_to",
    "off_to_rank",
    "off_or",
    "off_or_rank",
    "off_ft_rate",
    "off_ft_rate_rank",
    "def_efg",
    "def_efg_rank",
    "def_to",
    "def_to_rank",
    "def_or",
    "def_or_rank",
    "def_ft_rate",
    "def_ft_rate_rank",
    "off_2p",
    "off_2p_rank",
    "off_3p",
    "off_3p_rank",
    "def_2p",
    "def_2p_rank",
    "def_3p",
    "def_3p_rank",
];

/// Latest snapshot row from `table`, flattened into a `StatLine`.
/// NULL columns are simply absent from the result.
fn latest_stat_line(
    conn: &Connection,
    table: &str,
    fields: &[&str],
    team: &str,
    season: i32,
) -> Result<StatLine> {
    let sql = format!(
        "SELECT {} FROM {} WHERE team = ?1 AND season = ?2 \
         ORDER BY scrape_date DESC LIMIT 1",
        fields.join(", "),
        table
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![team, season])?;

    let mut line = StatLine::new();
    if let Some(row) = rows.next()? {
        for (idx, field) in fields.iter().enumerate() {
            if let Some(value) = row.get::<_, Option<f64>>(idx)? {
                line.insert(field, value);
            }
        }
    }
    Ok(line)
}

/// Most-recent season ratings snapshot for a team, or empty.
pub fn team_ratings(conn: &Connection, team: &str, season: i32) -> Result<StatLine> {
    latest_stat_line(conn, "team_ratings", RATING_FIELDS, team, season)
}

/// Most-recent four-factors snapshot for a team, or empty.
pub fn team_four_factors(conn: &Connection, team: &str, season: i32) -> Result<StatLine> {
    latest_stat_line(conn, "four_factors", FOUR_FACTOR_FIELDS, team, season)
}

/// Full season game log for a team, newest first.
pub fn team_game_logs(conn: &Connection, team: &str, season: i32) -> Result<Vec<GameLogRow>> {
    let mut stmt = conn.prepare(
        "SELECT game_date, opponent, location, result, team_score, opp_score, \
                adj_oe, adj_de, to_pct, opp_to_pct, opp_adj_de_rank \
           FROM game_logs \
          WHERE team = ?1 AND season = ?2 \
          ORDER BY game_date DESC",
    )?;
    let rows = stmt.query_map(params![team, season], |row| {
        Ok(GameLogRow {
            game_date: row.get(0)?,
            opponent: row.get(1)?,
            location: row.get(2)?,
            result: row.get(3)?,
            team_score: row.get(4)?,
            opp_score: row.get(5)?,
            adj_oe: row.get(6)?,
            adj_de: row.get(7)?,
            to_pct: row.get(8)?,
            opp_to_pct: row.get(9)?,
            opp_adj_de_rank: row.get(10)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Season against-the-spread records for a team, newest first.
pub fn team_ats(conn: &Connection, team: &str, season: i32) -> Result<Vec<AtsRow>> {
    let mut stmt = conn.prepare(
        "SELECT game_date, opponent, location, line, ats_result \
           FROM ats_records \
          WHERE team = ?1 AND season = ?2 \
          ORDER BY game_date DESC",
    )?;
    let rows = stmt.query_map(params![team, season], |row| {
        Ok(AtsRow {
            game_date: row.get(0)?,
            opponent: row.get(1)?,
            location: row.get(2)?,
            line: row.get(3)?,
            ats_result: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Season over/under records for a team, newest first.
pub fn team_ou(conn: &Connection, team: &str, season: i32) -> Result<Vec<OuRow>> {
    let mut stmt = conn.prepare(
        "SELECT game_date, opponent, total, combined_score, ou_result \
           FROM ou_records \
          WHERE team = ?1 AND season = ?2 \
          ORDER BY game_date DESC",
    )?;
    let rows = stmt.query_map(params![team, season], |row| {
        Ok(OuRow {
            game_date: row.get(0)?,
            opponent: row.get(1)?,
            total: row.get(2)?,
            combined_score: row.get(3)?,
            ou_result: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Most-recent posted line for a specific matchup, or empty.
pub fn matchup_line(
    conn: &Connection,
    away_team: &str,
    home_team: &str,
    season: i32,
) -> Result<MarketLine> {
    let mut stmt = conn.prepare(
        "SELECT spread, total, away_ml, home_ml \
           FROM market_lines \
          WHERE away_team = ?1 AND home_team = ?2 AND season = ?3 \
          ORDER BY game_date DESC LIMIT 1",
    )?;
    let mut rows = stmt.query(params![away_team, home_team, season])?;
    if let Some(row) = rows.next()? {
        Ok(MarketLine {
            spread: row.get(0)?,
            total: row.get(1)?,
            away_ml: row.get(2)?,
            home_ml: row.get(3)?,
        })
    } else {
        Ok(MarketLine::default())
    }
}

/// Every posted line for a date, ordered by home team.
pub fn lines_for_date(conn: &Connection, game_date: &str) -> Result<Vec<LineRow>> {
    let mut stmt = conn.prepare(
        "SELECT game_date, season, away_team, home_team, spread, total, away_ml, home_ml \
           FROM market_lines \
          WHERE game_date = ?1 \
          ORDER BY home_team",
    )?;
    let rows = stmt.query_map(params![game_date], |row| {
        Ok(LineRow {
            game_date: row.get(0)?,
            season: row.get(1)?,
            away_team: row.get(2)?,
            home_team: row.get(3)?,
            spread: row.get(4)?,
            total: row.get(5)?,
            away_ml: row.get(6)?,
            home_ml: row.get(7)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Last `last_n` ratings snapshots for a team, newest first.
pub fn ratings_history(
    conn: &Connection,
    team: &str,
    season: i32,
    last_n: u32,
) -> Result<Vec<RatingsSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT scrape_date, adj_em \
           FROM team_ratings \
          WHERE team = ?1 AND season = ?2 \
          ORDER BY scrape_date DESC LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![team, season, last_n], |row| {
        Ok(RatingsSnapshot {
            scrape_date: row.get(0)?,
            adj_em: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
