use rusqlite::{OptionalExtension, Row, params};

use crate::model::Team;
use crate::registry::{self, Revision};
use crate::store::{Result, Store};
use crate::version::VersionNumber;

/// Teams are immutable after creation: `upsert` is an idempotent no-op when
/// the external id is already present.
pub trait TeamsTable {
    fn init(&self) -> Result<()>;
    fn create(&self, team: &Team) -> Result<i64>;
    fn read_all(&self) -> Result<Vec<Team>>;
    fn read_by_rowid(&self, rowid: i64) -> Result<Option<Team>>;
    fn read_by_code(&self, code: &str) -> Result<Option<Team>>;
    fn read_by_nhlid(&self, nhlid: i64) -> Result<Option<Team>>;
    fn read_by_conference(&self, conference: &str) -> Result<Vec<Team>>;
    fn read_by_division(&self, division: &str) -> Result<Vec<Team>>;
    fn upsert(&self, team: &Team) -> Result<i64>;
}

pub fn resolve(store: &Store, running: VersionNumber) -> Result<Box<dyn TeamsTable>> {
    registry::resolve(
        "teams",
        running,
        &[Revision {
            min_version: VersionNumber::new(0, 3, 0),
            build: |store| Box::new(TeamsV0_3 { store }),
        }],
        store,
    )
}

const TABLE: &str = "teams";

const SELECT: &str = "SELECT conference, division, name, code, nhlid, rowid FROM teams";

struct TeamsV0_3 {
    store: Store,
}

impl TeamsTable for TeamsV0_3 {
    fn init(&self) -> Result<()> {
        self.store.create_table(
            TABLE,
            r#"
            CREATE TABLE teams(
                conference TEXT NOT NULL,
                division TEXT NOT NULL,
                name TEXT NOT NULL,
                code TEXT NOT NULL,
                nhlid INTEGER NOT NULL UNIQUE,
                rowid INTEGER PRIMARY KEY AUTOINCREMENT
            );
            CREATE INDEX idx_teams_code ON teams(code);
            "#,
        )
    }

    fn create(&self, team: &Team) -> Result<i64> {
        self.store.with_conn(TABLE, |conn| {
            conn.execute(
                "INSERT INTO teams(conference, division, name, code, nhlid)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    team.conference,
                    team.division,
                    team.name,
                    team.code,
                    team.nhlid
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn read_all(&self) -> Result<Vec<Team>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(SELECT)?;
            let rows = stmt.query_map([], row_to_team)?;
            rows.collect()
        })
    }

    fn read_by_rowid(&self, rowid: i64) -> Result<Option<Team>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT} WHERE rowid = ?1"),
                params![rowid],
                row_to_team,
            )
            .optional()
        })
    }

    fn read_by_code(&self, code: &str) -> Result<Option<Team>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT} WHERE code = ?1"),
                params![code],
                row_to_team,
            )
            .optional()
        })
    }

    fn read_by_nhlid(&self, nhlid: i64) -> Result<Option<Team>> {
        self.store.with_conn(TABLE, |conn| {
            conn.query_row(
                &format!("{SELECT} WHERE nhlid = ?1"),
                params![nhlid],
                row_to_team,
            )
            .optional()
        })
    }

    fn read_by_conference(&self, conference: &str) -> Result<Vec<Team>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT} WHERE conference = ?1"))?;
            let rows = stmt.query_map(params![conference], row_to_team)?;
            rows.collect()
        })
    }

    fn read_by_division(&self, division: &str) -> Result<Vec<Team>> {
        self.store.with_conn(TABLE, |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT} WHERE division = ?1"))?;
            let rows = stmt.query_map(params![division], row_to_team)?;
            rows.collect()
        })
    }

    fn upsert(&self, team: &Team) -> Result<i64> {
        if let Some(existing) = self.read_by_nhlid(team.nhlid)? {
            // rowid is always set on rows read back from storage
            return Ok(existing.rowid.unwrap_or_default());
        }
        self.create(team)
    }
}

fn row_to_team(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        conference: row.get(0)?,
        division: row.get(1)?,
        name: row.get(2)?,
        code: row.get(3)?,
        nhlid: row.get(4)?,
        rowid: Some(row.get(5)?),
    })
}

#[cfg(test)]
mod tests {
    use super::{TeamsTable, resolve};
    use crate::model::Team;
    use crate::store::Store;
    use crate::version::VersionNumber;

    fn team(conference: &str, division: &str, code: &str, nhlid: i64) -> Team {
        Team {
            conference: conference.to_string(),
            division: division.to_string(),
            name: format!("Team {code}"),
            code: code.to_string(),
            nhlid,
            rowid: None,
        }
    }

    fn open_teams(dir: &tempfile::TempDir) -> Box<dyn TeamsTable> {
        let store = Store::open(&dir.path().join("test.db")).expect("open store");
        let teams = resolve(&store, VersionNumber::current()).expect("resolve");
        teams.init().expect("init");
        teams
    }

    #[test]
    fn group_lookups_by_conference_and_division() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let teams = open_teams(&dir);
        teams.create(&team("E", "M", "NYR", 3)).expect("create");
        teams.create(&team("E", "A", "DET", 17)).expect("create");
        teams.create(&team("W", "P", "SJS", 28)).expect("create");

        let east = teams.read_by_conference("E").expect("by conference");
        assert_eq!(east.len(), 2);
        assert!(east.iter().all(|t| t.conference == "E"));

        let pacific = teams.read_by_division("P").expect("by division");
        assert_eq!(pacific.len(), 1);
        assert_eq!(pacific[0].code, "SJS");

        assert!(teams.read_by_conference("X").expect("empty").is_empty());
    }
}
