//! Pick-history persistence: writing graded-out recommendations,
//! reading resolved picks back for evaluation, and recording outcomes.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::PickCard;
use crate::scoring::Tier;

/// One stored pick, as read back for evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickRow {
    pub analysis_date: String,
    pub game_date: String,
    pub season: i32,
    pub away_team: String,
    pub home_team: String,
    pub pick_type: String,
    pub pick_side: String,
    pub tier: String,
    pub composite_score: f64,
    pub spread_at_pick: Option<f64>,
    pub total_at_pick: Option<f64>,
    pub result: Option<String>,
}

const INSERT_PICK_SQL: &str = "INSERT OR REPLACE INTO pick_history ( \
        analysis_date, game_date, season, away_team, home_team, \
        pick_type, pick_side, tier, composite_score, \
        spread_at_pick, total_at_pick \
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

/// Write one row per non-skip market pick, replacing any prior row for
/// the same (analysis date, game, pick type). The whole slate commits
/// as a single transaction; an individual row failure is logged and
/// skipped rather than aborting the batch.
pub fn save_picks(
    conn: &mut Connection,
    cards: &[PickCard],
    analysis_date: &str,
) -> Result<usize> {
    let tx = conn.transaction().context("failed to begin pick write")?;
    let mut rows_written = 0usize;

    for card in cards {
        if card.spread_tier != Tier::Skip {
            let written = tx.execute(
                INSERT_PICK_SQL,
                params![
                    analysis_date,
                    card.game_date,
                    card.season,
                    card.away_team,
                    card.home_team,
                    "spread",
                    card.spread_pick,
                    card.spread_tier.as_str(),
                    card.spread_composite,
                    card.spread,
                    card.total,
                ],
            );
            match written {
                Ok(_) => rows_written += 1,
                Err(err) => warn!(
                    away = %card.away_team,
                    home = %card.home_team,
                    error = %err,
                    "failed to save spread pick"
                ),
            }
        }

        if card.total_tier != Tier::Skip {
            let written = tx.execute(
                INSERT_PICK_SQL,
                params![
                    analysis_date,
                    card.game_date,
                    card.season,
                    card.away_team,
                    card.home_team,
                    "total",
                    card.total_pick,
                    card.total_tier.as_str(),
                    card.total_composite,
                    card.spread,
                    card.total,
                ],
            );
            match written {
                Ok(_) => rows_written += 1,
                Err(err) => warn!(
                    away = %card.away_team,
                    home = %card.home_team,
                    error = %err,
                    "failed to save total pick"
                ),
            }
        }
    }

    tx.commit().context("failed to commit pick writes")?;
    if rows_written > 0 {
        info!(rows = rows_written, analysis_date, "saved picks");
    }
    Ok(rows_written)
}

/// Resolved picks (outcome recorded), optionally filtered by season and
/// game-date range, ordered by game date.
pub fn resolved_picks(
    conn: &Connection,
    season: Option<i32>,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<Vec<PickRow>> {
    let mut clauses = vec!["result IS NOT NULL".to_string()];
    let mut bind: Vec<rusqlite::types::Value> = Vec::new();

    if let Some(season) = season {
        clauses.push(format!("season = ?{}", bind.len() + 1));
        bind.push((season as i64).into());
    }
    if let Some(start) = start_date {
        clauses.push(format!("game_date >= ?{}", bind.len() + 1));
        bind.push(start.to_string().into());
    }
    if let Some(end) = end_date {
        clauses.push(format!("game_date <= ?{}", bind.len() + 1));
        bind.push(end.to_string().into());
    }

    let sql = format!(
        "SELECT analysis_date, game_date, season, away_team, home_team, \
                pick_type, pick_side, tier, composite_score, \
                spread_at_pick, total_at_pick, result \
           FROM pick_history \
          WHERE {} \
          ORDER BY game_date",
        clauses.join(" AND ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(bind), |row| {
        Ok(PickRow {
            analysis_date: row.get(0)?,
            game_date: row.get(1)?,
            season: row.get(2)?,
            away_team: row.get(3)?,
            home_team: row.get(4)?,
            pick_type: row.get(5)?,
            pick_side: row.get(6)?,
            tier: row.get(7)?,
            composite_score: row.get(8)?,
            spread_at_pick: row.get(9)?,
            total_at_pick: row.get(10)?,
            result: row.get(11)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Set the outcome on the single still-unresolved pick matching the
/// game and pick type. Returns the number of rows updated (0 when no
/// unresolved pick exists — the caller decides whether that matters).
pub fn set_result(
    conn: &Connection,
    game_date: &str,
    away_team: &str,
    home_team: &str,
    pick_type: &str,
    result: &str,
) -> Result<usize> {
    let updated = conn
        .execute(
            "UPDATE pick_history \
                SET result = ?1 \
              WHERE game_date = ?2 \
                AND away_team = ?3 \
                AND home_team = ?4 \
                AND pick_type = ?5 \
                AND result IS NULL",
            params![result, game_date, away_team, home_team, pick_type],
        )
        .context("failed to update pick result")?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn seed_pick(conn: &Connection, game_date: &str, pick_type: &str, composite: f64) {
        conn.execute(
            INSERT_PICK_SQL,
            params![
                "2025-02-01",
                game_date,
                2025,
                "Duke",
                "UNC",
                pick_type,
                "Duke",
                "STRONG",
                composite,
                -3.5,
                145.0,
            ],
        )
        .unwrap();
    }

    #[test]
    fn resolved_picks_excludes_unresolved() {
        let conn = open_in_memory().unwrap();
        seed_pick(&conn, "2025-02-01", "spread", 5.0);
        seed_pick(&conn, "2025-02-01", "total", 3.0);

        assert!(resolved_picks(&conn, None, None, None).unwrap().is_empty());

        set_result(&conn, "2025-02-01", "Duke", "UNC", "spread", "W").unwrap();
        let rows = resolved_picks(&conn, None, None, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pick_type, "spread");
        assert_eq!(rows[0].result.as_deref(), Some("W"));
    }

    #[test]
    fn resolved_picks_filters_compose() {
        let conn = open_in_memory().unwrap();
        seed_pick(&conn, "2025-01-15", "spread", 5.0);
        seed_pick(&conn, "2025-03-15", "total", 5.0);
        set_result(&conn, "2025-01-15", "Duke", "UNC", "spread", "W").unwrap();
        set_result(&conn, "2025-03-15", "Duke", "UNC", "total", "L").unwrap();

        let rows = resolved_picks(&conn, Some(2025), Some("2025-02-01"), None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].game_date, "2025-03-15");

        let rows = resolved_picks(&conn, Some(2024), None, None).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn set_result_only_touches_unresolved() {
        let conn = open_in_memory().unwrap();
        seed_pick(&conn, "2025-02-01", "spread", 5.0);

        assert_eq!(
            set_result(&conn, "2025-02-01", "Duke", "UNC", "spread", "W").unwrap(),
            1
        );
        // Already resolved: second write is a no-op.
        assert_eq!(
            set_result(&conn, "2025-02-01", "Duke", "UNC", "spread", "L").unwrap(),
            0
        );
        let rows = resolved_picks(&conn, None, None, None).unwrap();
        assert_eq!(rows[0].result.as_deref(), Some("W"));
    }

    #[test]
    fn set_result_zero_rows_for_unknown_game() {
        let conn = open_in_memory().unwrap();
        assert_eq!(
            set_result(&conn, "2025-02-01", "Duke", "UNC", "spread", "W").unwrap(),
            0
        );
    }
}
