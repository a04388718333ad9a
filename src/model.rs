use chrono::{FixedOffset, TimeZone};

/// Stored game status. Forward order of the state machine:
/// `Fut` -> `Live` -> `Imported` -> `Compiled`, with `Final` recognized as a
/// provider-reported terminal state that is reconciled but never auto-advanced
/// to `Compiled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Fut,
    Live,
    Imported,
    Final,
    Compiled,
}

impl GameStatus {
    /// Maps a provider game state onto a stored status, folding the states
    /// that are storage-equivalent: `CRIT` is late-game `LIVE`, `OFF` means
    /// the provider is done with the game and we have not compiled it yet.
    /// Unknown states yield `None` and the record is skipped upstream.
    pub fn from_provider(raw: &str) -> Option<Self> {
        match raw {
            "FUT" | "PRE" => Some(Self::Fut),
            "LIVE" | "CRIT" => Some(Self::Live),
            "OFF" => Some(Self::Imported),
            "FINAL" => Some(Self::Final),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fut => "FUT",
            Self::Live => "LIVE",
            Self::Imported => "IMPORTED",
            Self::Final => "FINAL",
            Self::Compiled => "COMPILED",
        }
    }

    /// Parses a stored status column. Unlike [`Self::from_provider`] this
    /// round-trips exactly what [`Self::as_str`] writes.
    pub fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "FUT" => Some(Self::Fut),
            "LIVE" => Some(Self::Live),
            "IMPORTED" => Some(Self::Imported),
            "FINAL" => Some(Self::Final),
            "COMPILED" => Some(Self::Compiled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub conference: String,
    pub division: String,
    pub name: String,
    pub code: String,
    pub nhlid: i64,
    pub rowid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub nhlid: i64,
    pub team_rowid: i64,
    pub name: String,
    pub position: String,
    pub rowid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub nhlid: i64,
    /// Scheduled start, epoch seconds UTC.
    pub start_time: i64,
    pub status: GameStatus,
    pub home_team_rowid: i64,
    pub away_team_rowid: i64,
    pub home_team_points: i64,
    pub away_team_points: i64,
    /// Remaining period clock as reported by the box score. Older games
    /// table revisions do not persist it.
    pub clock: Option<String>,
    pub rowid: Option<i64>,
}

impl Game {
    pub fn is_after(&self, now: i64) -> bool {
        self.start_time > now
    }

    /// Start time rendered in the configured fixed offset, for display.
    pub fn local_start_time(&self, offset: FixedOffset) -> String {
        format_local_start(self.start_time, offset)
    }
}

/// Epoch seconds rendered in the given fixed offset. Falls back to the raw
/// epoch value if the timestamp is unrepresentable.
pub fn format_local_start(start_time: i64, offset: FixedOffset) -> String {
    match offset.timestamp_opt(start_time, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%m/%d/%y @ %I:%M %p").to_string(),
        _ => start_time.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStat {
    pub game_rowid: i64,
    pub player_nhlid: i64,
    pub team_rowid: i64,
    /// Opposing team. Added in a later player_stats revision; the older one
    /// accepts and drops it.
    pub opp_rowid: Option<i64>,
    pub goals: i64,
    pub assists: i64,
    pub hits: i64,
    pub blocked_shots: i64,
    pub shots_on_goal: i64,
    pub rowid: Option<i64>,
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::{Game, GameStatus};

    #[test]
    fn provider_states_normalize() {
        assert_eq!(GameStatus::from_provider("CRIT"), Some(GameStatus::Live));
        assert_eq!(GameStatus::from_provider("OFF"), Some(GameStatus::Imported));
        assert_eq!(GameStatus::from_provider("FUT"), Some(GameStatus::Fut));
        assert_eq!(GameStatus::from_provider("FINAL"), Some(GameStatus::Final));
        assert_eq!(GameStatus::from_provider("PPD"), None);
    }

    #[test]
    fn stored_status_round_trips() {
        for status in [
            GameStatus::Fut,
            GameStatus::Live,
            GameStatus::Imported,
            GameStatus::Final,
            GameStatus::Compiled,
        ] {
            assert_eq!(GameStatus::from_stored(status.as_str()), Some(status));
        }
        // Provider-only spellings are not valid stored values.
        assert_eq!(GameStatus::from_stored("CRIT"), None);
        assert_eq!(GameStatus::from_stored("OFF"), None);
    }

    #[test]
    fn local_start_time_applies_offset() {
        let game = Game {
            nhlid: 1,
            start_time: 0,
            status: GameStatus::Fut,
            home_team_rowid: 1,
            away_team_rowid: 2,
            home_team_points: 0,
            away_team_points: 0,
            clock: None,
            rowid: None,
        };
        let est = FixedOffset::west_opt(5 * 3600).expect("valid offset");
        assert_eq!(game.local_start_time(est), "12/31/69 @ 07:00 PM");
    }
}
