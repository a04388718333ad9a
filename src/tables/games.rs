use rusqlite::{OptionalExtension, Row, params};

use crate::model::{Game, GameStatus};
use crate::registry::{self, Revision};
use crate::store::{Result, Store};
use crate::version::VersionNumber;

/// Games are created once per external id and updated in place afterwards.
/// The sync engine owns all status and score writes.
pub trait GamesTable {
    fn init(&self) -> Result<()>;
    fn create(&self, game: &Game) -> Result<i64>;
    fn read_all(&self) -> Result<Vec<Game>>;
    fn read_by_rowid(&self, rowid: i64) -> Result<Option<Game>>;
    fn read_by_nhlid(&self, nhlid: i64) -> Result<Option<Game>>;
    fn read_by_status(&self, status: GameStatus) -> Result<Vec<Game>>;
    fn update_status(&self, rowid: i64, status: GameStatus) -> Result<()>;
    fn update_score(&self, rowid: i64, home: i64, away: i64, clock: Option<&str>) -> Result<()>;
}

pub fn resolve(store: &Store, running: VersionNumber) -> Result<Box<dyn GamesTable>> {
    registry::resolve(
        "games",
        running,
        &[
            Revision {
                min_version: VersionNumber::new(0, 5, 0),
                build: |store| Box::new(GamesV0_5 { store }),
            },
            Revision {
                min_version: VersionNumber::new(0, 8, 0),
                build: |store| Box::new(GamesV0_8 { store }),
            },
        ],
        store,
    )
}

const TABLE: &str = "games";

fn parse_status(idx: usize, raw: String) -> rusqlite::Result<GameStatus> {
    GameStatus::from_stored(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown stored game status {raw}").into(),
        )
    })
}

/// 0.5 layout: no clock column. Kept registered so installs below 0.8 keep
/// their original table shape; the clock passed to `update_score` is dropped.
struct GamesV0_5 {
    store: Store,
}

const SELECT_V0_5: &str = "SELECT nhlid, start_time, status, home_team_rowid, away_team_rowid, \
     home_team_points, away_team_points, rowid FROM games";

fn row_to_game_v0_5(row: &Row<'_>) -> rusqlite::Result<Game> {
    Ok(Game {
        nhlid: row.get(0)?,
        start_time: row.get(1)?,
        status: parse_status(2, row.get(2)?)?,
        home_team_rowid: row.get(3)?,
        away_team_rowid: row.get(4)?,
        home_team_points: row.get(5)?,
        away_team_points: row.get(6)?,
        clock: None,
        rowid: Some(row.get(7)?),
    })
}

impl GamesTable for GamesV0_5 {
    fn init(&self) -> Result<()> {
        self.store.create_table(
            TABLE,
            r#"
            CREATE TABLE games(
                nhlid INTEGER NOT NULL UNIQUE,
                start_time INTEGER NOT NULL,
                status TEXT NOT NULL,
                home_team_rowid INTEGER NOT NULL REFERENCES teams(rowid),
                away_team_rowid INTEGER NOT NULL REFERENCES teams(rowid),
                home_team_points INTEGER NOT NULL DEFAULT 0,
                away_team_points INTEGER NOT NULL DEFAULT 0,
                rowid INTEGER PRIMARY KEY AUTOINCREMENT
            );
            CREATE INDEX idx_games_status ON games(status);
            "#,
        )
    }

    fn create(&self, game: &Game) -> Result<i64> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "INSERT INTO games(nhlid, start_time, status, home_team_rowid, away_team_rowid,
                                   home_team_points, away_team_points)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    game.nhlid,
                    game.start_time,
                    game.status.as_str(),
                    game.home_team_rowid,
                    game.away_team_rowid,
                    game.home_team_points,
                    game.away_team_points
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn read_all(&self) -> Result<Vec<Game>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(SELECT_V0_5)?;
            let rows = stmt.query_map([], row_to_game_v0_5)?;
            rows.collect()
        })
    }

    fn read_by_rowid(&self, rowid: i64) -> Result<Option<Game>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT_V0_5} WHERE rowid = ?1"),
                params![rowid],
                row_to_game_v0_5,
            )
            .optional()
        })
    }

    fn read_by_nhlid(&self, nhlid: i64) -> Result<Option<Game>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT_V0_5} WHERE nhlid = ?1"),
                params![nhlid],
                row_to_game_v0_5,
            )
            .optional()
        })
    }

    fn read_by_status(&self, status: GameStatus) -> Result<Vec<Game>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_V0_5} WHERE status = ?1 ORDER BY rowid"))?;
            let rows = stmt.query_map(params![status.as_str()], row_to_game_v0_5)?;
            rows.collect()
        })
    }

    fn update_status(&self, rowid: i64, status: GameStatus) -> Result<()> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "UPDATE games SET status = ?1 WHERE rowid = ?2",
                params![status.as_str(), rowid],
            )?;
            Ok(())
        })
    }

    fn update_score(&self, rowid: i64, home: i64, away: i64, _clock: Option<&str>) -> Result<()> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "UPDATE games SET home_team_points = ?1, away_team_points = ?2 WHERE rowid = ?3",
                params![home, away, rowid],
            )?;
            Ok(())
        })
    }
}

/// 0.8 layout: adds the remaining-time clock reported by box scores.
struct GamesV0_8 {
    store: Store,
}

const SELECT_V0_8: &str = "SELECT nhlid, start_time, status, home_team_rowid, away_team_rowid, \
     home_team_points, away_team_points, clock, rowid FROM games";

fn row_to_game_v0_8(row: &Row<'_>) -> rusqlite::Result<Game> {
    Ok(Game {
        nhlid: row.get(0)?,
        start_time: row.get(1)?,
        status: parse_status(2, row.get(2)?)?,
        home_team_rowid: row.get(3)?,
        away_team_rowid: row.get(4)?,
        home_team_points: row.get(5)?,
        away_team_points: row.get(6)?,
        clock: row.get(7)?,
        rowid: Some(row.get(8)?),
    })
}

impl GamesTable for GamesV0_8 {
    fn init(&self) -> Result<()> {
        self.store.create_table(
            TABLE,
            r#"
            CREATE TABLE games(
                nhlid INTEGER NOT NULL UNIQUE,
                start_time INTEGER NOT NULL,
                status TEXT NOT NULL,
                home_team_rowid INTEGER NOT NULL REFERENCES teams(rowid),
                away_team_rowid INTEGER NOT NULL REFERENCES teams(rowid),
                home_team_points INTEGER NOT NULL DEFAULT 0,
                away_team_points INTEGER NOT NULL DEFAULT 0,
                clock TEXT NULL,
                rowid INTEGER PRIMARY KEY AUTOINCREMENT
            );
            CREATE INDEX idx_games_status ON games(status);
            CREATE INDEX idx_games_start_time ON games(start_time);
            "#,
        )
    }

    fn create(&self, game: &Game) -> Result<i64> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "INSERT INTO games(nhlid, start_time, status, home_team_rowid, away_team_rowid,
                                   home_team_points, away_team_points, clock)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    game.nhlid,
                    game.start_time,
                    game.status.as_str(),
                    game.home_team_rowid,
                    game.away_team_rowid,
                    game.home_team_points,
                    game.away_team_points,
                    game.clock
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn read_all(&self) -> Result<Vec<Game>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(SELECT_V0_8)?;
            let rows = stmt.query_map([], row_to_game_v0_8)?;
            rows.collect()
        })
    }

    fn read_by_rowid(&self, rowid: i64) -> Result<Option<Game>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT_V0_8} WHERE rowid = ?1"),
                params![rowid],
                row_to_game_v0_8,
            )
            .optional()
        })
    }

    fn read_by_nhlid(&self, nhlid: i64) -> Result<Option<Game>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT_V0_8} WHERE nhlid = ?1"),
                params![nhlid],
                row_to_game_v0_8,
            )
            .optional()
        })
    }

    fn read_by_status(&self, status: GameStatus) -> Result<Vec<Game>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_V0_8} WHERE status = ?1 ORDER BY rowid"))?;
            let rows = stmt.query_map(params![status.as_str()], row_to_game_v0_8)?;
            rows.collect()
        })
    }

    fn update_status(&self, rowid: i64, status: GameStatus) -> Result<()> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "UPDATE games SET status = ?1 WHERE rowid = ?2",
                params![status.as_str(), rowid],
            )?;
            Ok(())
        })
    }

    fn update_score(&self, rowid: i64, home: i64, away: i64, clock: Option<&str>) -> Result<()> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "UPDATE games SET home_team_points = ?1, away_team_points = ?2, clock = ?3
                 WHERE rowid = ?4",
                params![home, away, clock, rowid],
            )?;
            Ok(())
        })
    }
}
