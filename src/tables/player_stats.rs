use rusqlite::{OptionalExtension, Row, params};

use crate::model::PlayerStat;
use crate::registry::{self, Revision};
use crate::store::{Result, Store};
use crate::version::VersionNumber;

/// Stat lines are keyed by (player external id, game row). Re-reconciling a
/// game overwrites the counting stats for every observed pair; it never
/// inserts a second row.
pub trait PlayerStatsTable {
    fn init(&self) -> Result<()>;
    fn upsert(&self, stat: &PlayerStat) -> Result<()>;
    fn read_all(&self) -> Result<Vec<PlayerStat>>;
    fn read_by_game(&self, game_rowid: i64) -> Result<Vec<PlayerStat>>;
    fn read_by_player(&self, player_nhlid: i64) -> Result<Vec<PlayerStat>>;
    fn read_one(&self, game_rowid: i64, player_nhlid: i64) -> Result<Option<PlayerStat>>;
}

pub fn resolve(store: &Store, running: VersionNumber) -> Result<Box<dyn PlayerStatsTable>> {
    registry::resolve(
        "player_stats",
        running,
        &[
            Revision {
                min_version: VersionNumber::new(0, 6, 0),
                build: |store| Box::new(PlayerStatsV0_6 { store }),
            },
            Revision {
                min_version: VersionNumber::new(0, 9, 0),
                build: |store| Box::new(PlayerStatsV0_9 { store }),
            },
        ],
        store,
    )
}

const TABLE: &str = "player_stats";

/// 0.6 layout: no opponent column. The opponent passed in an upsert is
/// dropped; rows read back carry `opp_rowid = None`.
struct PlayerStatsV0_6 {
    store: Store,
}

const SELECT_V0_6: &str = "SELECT game_rowid, player_nhlid, team_rowid, goals, assists, hits, \
     blocked_shots, shots_on_goal, rowid FROM player_stats";

fn row_to_stat_v0_6(row: &Row<'_>) -> rusqlite::Result<PlayerStat> {
    Ok(PlayerStat {
        game_rowid: row.get(0)?,
        player_nhlid: row.get(1)?,
        team_rowid: row.get(2)?,
        opp_rowid: None,
        goals: row.get(3)?,
        assists: row.get(4)?,
        hits: row.get(5)?,
        blocked_shots: row.get(6)?,
        shots_on_goal: row.get(7)?,
        rowid: Some(row.get(8)?),
    })
}

impl PlayerStatsTable for PlayerStatsV0_6 {
    fn init(&self) -> Result<()> {
        self.store.create_table(
            TABLE,
            r#"
            CREATE TABLE player_stats(
                game_rowid INTEGER NOT NULL REFERENCES games(rowid),
                player_nhlid INTEGER NOT NULL,
                team_rowid INTEGER NOT NULL REFERENCES teams(rowid),
                goals INTEGER NOT NULL DEFAULT 0,
                assists INTEGER NOT NULL DEFAULT 0,
                hits INTEGER NOT NULL DEFAULT 0,
                blocked_shots INTEGER NOT NULL DEFAULT 0,
                shots_on_goal INTEGER NOT NULL DEFAULT 0,
                rowid INTEGER PRIMARY KEY AUTOINCREMENT,
                UNIQUE(game_rowid, player_nhlid)
            );
            CREATE INDEX idx_player_stats_player ON player_stats(player_nhlid);
            "#,
        )
    }

    fn upsert(&self, stat: &PlayerStat) -> Result<()> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "INSERT INTO player_stats(game_rowid, player_nhlid, team_rowid,
                                          goals, assists, hits, blocked_shots, shots_on_goal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(game_rowid, player_nhlid) DO UPDATE SET
                     team_rowid = excluded.team_rowid,
                     goals = excluded.goals,
                     assists = excluded.assists,
                     hits = excluded.hits,
                     blocked_shots = excluded.blocked_shots,
                     shots_on_goal = excluded.shots_on_goal",
                params![
                    stat.game_rowid,
                    stat.player_nhlid,
                    stat.team_rowid,
                    stat.goals,
                    stat.assists,
                    stat.hits,
                    stat.blocked_shots,
                    stat.shots_on_goal
                ],
            )?;
            Ok(())
        })
    }

    fn read_all(&self) -> Result<Vec<PlayerStat>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(SELECT_V0_6)?;
            let rows = stmt.query_map([], row_to_stat_v0_6)?;
            rows.collect()
        })
    }

    fn read_by_game(&self, game_rowid: i64) -> Result<Vec<PlayerStat>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_V0_6} WHERE game_rowid = ?1"))?;
            let rows = stmt.query_map(params![game_rowid], row_to_stat_v0_6)?;
            rows.collect()
        })
    }

    fn read_by_player(&self, player_nhlid: i64) -> Result<Vec<PlayerStat>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_V0_6} WHERE player_nhlid = ?1"))?;
            let rows = stmt.query_map(params![player_nhlid], row_to_stat_v0_6)?;
            rows.collect()
        })
    }

    fn read_one(&self, game_rowid: i64, player_nhlid: i64) -> Result<Option<PlayerStat>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT_V0_6} WHERE game_rowid = ?1 AND player_nhlid = ?2"),
                params![game_rowid, player_nhlid],
                row_to_stat_v0_6,
            )
            .optional()
        })
    }
}

/// 0.9 layout: adds the opposing team reference so stat joins can show both
/// sides without going back through the game row.
struct PlayerStatsV0_9 {
    store: Store,
}

const SELECT_V0_9: &str = "SELECT game_rowid, player_nhlid, team_rowid, opp_rowid, goals, \
     assists, hits, blocked_shots, shots_on_goal, rowid FROM player_stats";

fn row_to_stat_v0_9(row: &Row<'_>) -> rusqlite::Result<PlayerStat> {
    Ok(PlayerStat {
        game_rowid: row.get(0)?,
        player_nhlid: row.get(1)?,
        team_rowid: row.get(2)?,
        opp_rowid: row.get(3)?,
        goals: row.get(4)?,
        assists: row.get(5)?,
        hits: row.get(6)?,
        blocked_shots: row.get(7)?,
        shots_on_goal: row.get(8)?,
        rowid: Some(row.get(9)?),
    })
}

impl PlayerStatsTable for PlayerStatsV0_9 {
    fn init(&self) -> Result<()> {
        self.store.create_table(
            TABLE,
            r#"
            CREATE TABLE player_stats(
                game_rowid INTEGER NOT NULL REFERENCES games(rowid),
                player_nhlid INTEGER NOT NULL,
                team_rowid INTEGER NOT NULL REFERENCES teams(rowid),
                opp_rowid INTEGER NULL REFERENCES teams(rowid),
                goals INTEGER NOT NULL DEFAULT 0,
                assists INTEGER NOT NULL DEFAULT 0,
                hits INTEGER NOT NULL DEFAULT 0,
                blocked_shots INTEGER NOT NULL DEFAULT 0,
                shots_on_goal INTEGER NOT NULL DEFAULT 0,
                rowid INTEGER PRIMARY KEY AUTOINCREMENT,
                UNIQUE(game_rowid, player_nhlid)
            );
            CREATE INDEX idx_player_stats_player ON player_stats(player_nhlid);
            CREATE INDEX idx_player_stats_game ON player_stats(game_rowid);
            "#,
        )
    }

    fn upsert(&self, stat: &PlayerStat) -> Result<()> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "INSERT INTO player_stats(game_rowid, player_nhlid, team_rowid, opp_rowid,
                                          goals, assists, hits, blocked_shots, shots_on_goal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(game_rowid, player_nhlid) DO UPDATE SET
                     team_rowid = excluded.team_rowid,
                     opp_rowid = excluded.opp_rowid,
                     goals = excluded.goals,
                     assists = excluded.assists,
                     hits = excluded.hits,
                     blocked_shots = excluded.blocked_shots,
                     shots_on_goal = excluded.shots_on_goal",
                params![
                    stat.game_rowid,
                    stat.player_nhlid,
                    stat.team_rowid,
                    stat.opp_rowid,
                    stat.goals,
                    stat.assists,
                    stat.hits,
                    stat.blocked_shots,
                    stat.shots_on_goal
                ],
            )?;
            Ok(())
        })
    }

    fn read_all(&self) -> Result<Vec<PlayerStat>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(SELECT_V0_9)?;
            let rows = stmt.query_map([], row_to_stat_v0_9)?;
            rows.collect()
        })
    }

    fn read_by_game(&self, game_rowid: i64) -> Result<Vec<PlayerStat>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_V0_9} WHERE game_rowid = ?1"))?;
            let rows = stmt.query_map(params![game_rowid], row_to_stat_v0_9)?;
            rows.collect()
        })
    }

    fn read_by_player(&self, player_nhlid: i64) -> Result<Vec<PlayerStat>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_V0_9} WHERE player_nhlid = ?1"))?;
            let rows = stmt.query_map(params![player_nhlid], row_to_stat_v0_9)?;
            rows.collect()
        })
    }

    fn read_one(&self, game_rowid: i64, player_nhlid: i64) -> Result<Option<PlayerStat>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT_V0_9} WHERE game_rowid = ?1 AND player_nhlid = ?2"),
                params![game_rowid, player_nhlid],
                row_to_stat_v0_9,
            )
            .optional()
        })
    }
}
