use rusqlite::{OptionalExtension, Row, params};

use crate::model::Player;
use crate::registry::{self, Revision};
use crate::store::{Result, Store};
use crate::version::VersionNumber;

/// Player identity is the external id; `upsert` moves a player between teams
/// and refreshes name/position whenever a box score says so.
pub trait PlayersTable {
    fn init(&self) -> Result<()>;
    fn create(&self, player: &Player) -> Result<i64>;
    fn read_all(&self) -> Result<Vec<Player>>;
    fn read_by_nhlid(&self, nhlid: i64) -> Result<Option<Player>>;
    fn read_by_team(&self, team_rowid: i64) -> Result<Vec<Player>>;
    fn upsert(&self, player: &Player) -> Result<()>;
}

pub fn resolve(store: &Store, running: VersionNumber) -> Result<Box<dyn PlayersTable>> {
    registry::resolve(
        "players",
        running,
        &[Revision {
            min_version: VersionNumber::new(0, 4, 0),
            build: |store| Box::new(PlayersV0_4 { store }),
        }],
        store,
    )
}

const TABLE: &str = "players";

const SELECT: &str = "SELECT nhlid, team_rowid, name, position, rowid FROM players";

struct PlayersV0_4 {
    store: Store,
}

impl PlayersTable for PlayersV0_4 {
    fn init(&self) -> Result<()> {
        self.store.create_table(
            TABLE,
            r#"
            CREATE TABLE players(
                nhlid INTEGER NOT NULL UNIQUE,
                team_rowid INTEGER NOT NULL REFERENCES teams(rowid),
                name TEXT NOT NULL,
                position TEXT NOT NULL,
                rowid INTEGER PRIMARY KEY AUTOINCREMENT
            );
            CREATE INDEX idx_players_team ON players(team_rowid);
            "#,
        )
    }

    fn create(&self, player: &Player) -> Result<i64> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "INSERT INTO players(nhlid, team_rowid, name, position)
                 VALUES (?1, ?2, ?3, ?4)",
                params![player.nhlid, player.team_rowid, player.name, player.position],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn read_all(&self) -> Result<Vec<Player>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(SELECT)?;
            let rows = stmt.query_map([], row_to_player)?;
            rows.collect()
        })
    }

    fn read_by_nhlid(&self, nhlid: i64) -> Result<Option<Player>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT} WHERE nhlid = ?1"),
                params![nhlid],
                row_to_player,
            )
            .optional()
        })
    }

    fn read_by_team(&self, team_rowid: i64) -> Result<Vec<Player>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT} WHERE team_rowid = ?1"))?;
            let rows = stmt.query_map(params![team_rowid], row_to_player)?;
            rows.collect()
        })
    }

    fn upsert(&self, player: &Player) -> Result<()> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "INSERT INTO players(nhlid, team_rowid, name, position)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(nhlid) DO UPDATE SET
                     team_rowid = excluded.team_rowid,
                     name = excluded.name,
                     position = excluded.position",
                params![player.nhlid, player.team_rowid, player.name, player.position],
            )?;
            Ok(())
        })
    }
}

fn row_to_player(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        nhlid: row.get(0)?,
        team_rowid: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
        rowid: Some(row.get(4)?),
    })
}
