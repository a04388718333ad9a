use anyhow::Result;

pub const GAME_TYPE_PRESEASON: i64 = 1;
pub const GAME_TYPE_REGULAR: i64 = 2;
pub const GAME_TYPE_POSTSEASON: i64 = 3;

/// One entry from a team's season schedule.
#[derive(Debug, Clone)]
pub struct ScheduleGame {
    pub nhlid: i64,
    pub game_type: i64,
    /// ISO-8601, as handed over by the provider.
    pub start_time_utc: String,
    pub game_state: String,
    pub home_code: String,
    pub away_code: String,
}

impl ScheduleGame {
    /// Exhibition games never enter the store.
    pub fn counts_for_import(&self) -> bool {
        matches!(self.game_type, GAME_TYPE_REGULAR | GAME_TYPE_POSTSEASON)
    }
}

#[derive(Debug, Clone)]
pub struct BoxScoreTeam {
    pub code: String,
    pub score: i64,
}

/// A skater's counting stats for one game. Goalies are filtered out before
/// this struct is built.
#[derive(Debug, Clone)]
pub struct SkaterLine {
    pub nhlid: i64,
    pub name: String,
    pub position: String,
    pub goals: i64,
    pub assists: i64,
    pub hits: i64,
    pub blocked_shots: i64,
    pub shots_on_goal: i64,
}

#[derive(Debug, Clone)]
pub struct BoxScore {
    pub game_state: String,
    pub clock: Option<String>,
    pub home: BoxScoreTeam,
    pub away: BoxScoreTeam,
    /// Empty when the provider omits per-player stats, which it does for
    /// games that have not started.
    pub home_skaters: Vec<SkaterLine>,
    pub away_skaters: Vec<SkaterLine>,
}

/// External sports-data provider. The sync engine only ever talks to this
/// trait; `nhl_api::NhlApi` is the production implementation and tests plug
/// in canned ones.
pub trait DataSource {
    fn schedule_for_team(&self, team_code: &str, season: &str) -> Result<Vec<ScheduleGame>>;
    fn box_score(&self, game_nhlid: i64) -> Result<BoxScore>;
}
