use std::path::Path;

use crate::model::Team;
use crate::store::{Result, Store};
use crate::tables::games::{self, GamesTable};
use crate::tables::player_stats::{self, PlayerStatsTable};
use crate::tables::players::{self, PlayersTable};
use crate::tables::teams::{self, TeamsTable};
use crate::version::VersionNumber;

/// League roster used to seed an empty store: (conference, division, name,
/// code, external id). External ids are the provider's team ids.
const LEAGUE_TEAMS: &[(&str, &str, &str, &str, i64)] = &[
    ("E", "A", "Boston Bruins", "BOS", 6),
    ("E", "A", "Buffalo Sabres", "BUF", 7),
    ("E", "A", "Detroit Red Wings", "DET", 17),
    ("E", "A", "Florida Panthers", "FLA", 13),
    ("E", "A", "Montreal Canadiens", "MTL", 8),
    ("E", "A", "Ottawa Senators", "OTT", 9),
    ("E", "A", "Tampa Bay Lightning", "TBL", 14),
    ("E", "A", "Toronto Maple Leafs", "TOR", 10),
    ("E", "M", "Carolina Hurricanes", "CAR", 12),
    ("E", "M", "Columbus Blue Jackets", "CBJ", 29),
    ("E", "M", "New Jersey Devils", "NJD", 1),
    ("E", "M", "New York Islanders", "NYI", 2),
    ("E", "M", "New York Rangers", "NYR", 3),
    ("E", "M", "Philadelphia Flyers", "PHI", 4),
    ("E", "M", "Pittsburgh Penguins", "PIT", 5),
    ("E", "M", "Washington Capitals", "WSH", 15),
    ("W", "C", "Chicago Blackhawks", "CHI", 16),
    ("W", "C", "Colorado Avalanche", "COL", 21),
    ("W", "C", "Dallas Stars", "DAL", 25),
    ("W", "C", "Minnesota Wild", "MIN", 30),
    ("W", "C", "Nashville Predators", "NSH", 18),
    ("W", "C", "St. Louis Blues", "STL", 19),
    ("W", "C", "Utah Mammoth", "UTA", 59),
    ("W", "C", "Winnipeg Jets", "WPG", 52),
    ("W", "P", "Anaheim Ducks", "ANA", 24),
    ("W", "P", "Calgary Flames", "CGY", 20),
    ("W", "P", "Edmonton Oilers", "EDM", 22),
    ("W", "P", "Los Angeles Kings", "LAK", 26),
    ("W", "P", "San Jose Sharks", "SJS", 28),
    ("W", "P", "Seattle Kraken", "SEA", 55),
    ("W", "P", "Vancouver Canucks", "VAN", 23),
    ("W", "P", "Vegas Golden Knights", "VGK", 54),
];

pub fn seed_teams() -> Vec<Team> {
    LEAGUE_TEAMS
        .iter()
        .map(|(conference, division, name, code, nhlid)| Team {
            conference: (*conference).to_string(),
            division: (*division).to_string(),
            name: (*name).to_string(),
            code: (*code).to_string(),
            nhlid: *nhlid,
            rowid: None,
        })
        .collect()
}

/// All entity tables resolved against one running version, over one store.
///
/// Resolution happens exactly once, here; everything downstream works through
/// the table traits and never consults the registry again.
pub struct Database {
    pub teams: Box<dyn TeamsTable>,
    pub players: Box<dyn PlayersTable>,
    pub games: Box<dyn GamesTable>,
    pub player_stats: Box<dyn PlayerStatsTable>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    pub fn open(path: &Path, running: VersionNumber) -> Result<Self> {
        let store = Store::open(path)?;
        let db = Self {
            teams: teams::resolve(&store, running)?,
            players: players::resolve(&store, running)?,
            games: games::resolve(&store, running)?,
            player_stats: player_stats::resolve(&store, running)?,
        };
        db.init()?;
        Ok(db)
    }

    /// Create-if-absent across all tables. Safe to call on every startup.
    fn init(&self) -> Result<()> {
        self.teams.init()?;
        self.players.init()?;
        self.games.init()?;
        self.player_stats.init()?;
        Ok(())
    }

    /// Upserts the given teams by external id; existing rows are untouched.
    /// Returns how many rows were newly inserted.
    pub fn populate_teams(&self, teams: &[Team]) -> Result<usize> {
        let mut inserted = 0;
        for team in teams {
            if self.teams.read_by_nhlid(team.nhlid)?.is_none() {
                self.teams.create(team)?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::{Database, seed_teams};
    use crate::version::VersionNumber;

    fn open_db(dir: &tempfile::TempDir) -> Database {
        Database::open(&dir.path().join("test.db"), VersionNumber::current()).expect("open db")
    }

    #[test]
    fn open_twice_is_idempotent() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let db = open_db(&dir);
        db.populate_teams(&seed_teams()).expect("seed");
        // Re-opening re-runs init against existing tables.
        let db = open_db(&dir);
        assert_eq!(db.teams.read_all().expect("read").len(), 32);
    }

    #[test]
    fn populate_teams_is_an_upsert() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let db = open_db(&dir);
        let seeds = seed_teams();
        assert_eq!(db.populate_teams(&seeds).expect("seed"), 32);
        assert_eq!(db.populate_teams(&seeds).expect("reseed"), 0);
        assert_eq!(db.teams.read_all().expect("read").len(), 32);
    }

    #[test]
    fn too_old_version_cannot_resolve_tables() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let err = Database::open(&dir.path().join("test.db"), VersionNumber::new(0, 1, 0))
            .expect_err("nothing registered this old");
        assert!(matches!(
            err,
            crate::store::Error::NoImplementationFound { .. }
        ));
    }
}
