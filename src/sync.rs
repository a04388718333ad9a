use chrono::{DateTime, FixedOffset, Offset, Utc};
use log::{info, warn};

use crate::db::Database;
use crate::model::{Game, GameStatus, Player, PlayerStat};
use crate::provider::{BoxScore, DataSource, SkaterLine};
use crate::store::Result;

/// Engine configuration, passed in at construction. No globals: the season
/// under sync and the provider's excluded team codes are caller decisions.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Provider season key, e.g. "20252026".
    pub season: String,
    /// Team codes the provider lists but we refuse to import games for
    /// (all-star rosters and similar).
    pub excluded_teams: Vec<String>,
    /// Fixed offset from UTC for rendering local start times.
    pub utc_offset_hours: i32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            season: "20252026".to_string(),
            excluded_teams: Vec::new(),
            utc_offset_hours: -5,
        }
    }
}

impl SyncConfig {
    pub fn fixed_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CompileSummary {
    pub processed: usize,
    pub compiled: usize,
    pub skipped: usize,
    pub stats_upserted: usize,
}

/// Orchestrates schedule import and status-driven box-score reconciliation.
///
/// Sweeps are synchronous and run one at a time; the mutating operations take
/// `&mut self` so a caller cannot interleave two sweeps through one engine.
/// Storage failures abort the current cycle; provider failures for a single
/// game are logged and the sweep moves on.
pub struct SyncEngine<'a, P: DataSource> {
    db: &'a Database,
    provider: &'a P,
    config: SyncConfig,
}

impl<'a, P: DataSource> SyncEngine<'a, P> {
    pub fn new(db: &'a Database, provider: &'a P, config: SyncConfig) -> Self {
        Self {
            db,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Pulls the season schedule for every known team and upserts games by
    /// external id. Games already `COMPILED` are never touched; other
    /// existing games get their status refreshed in place. Each game appears
    /// in two team schedules, which the upsert absorbs.
    pub fn import_schedules(&mut self) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for team in self.db.teams.read_all()? {
            let schedule = match self
                .provider
                .schedule_for_team(&team.code, &self.config.season)
            {
                Ok(schedule) => schedule,
                Err(err) => {
                    warn!("schedule fetch failed for {}: {err:#}", team.code);
                    continue;
                }
            };

            for entry in schedule {
                if !entry.counts_for_import() {
                    continue;
                }
                if self.is_excluded(&entry.home_code) || self.is_excluded(&entry.away_code) {
                    info!("game {} involves an excluded team, skipping", entry.nhlid);
                    summary.skipped += 1;
                    continue;
                }

                let Some(home) = self.db.teams.read_by_code(&entry.home_code)? else {
                    warn!(
                        "unknown home team {} for game {}, skipping",
                        entry.home_code, entry.nhlid
                    );
                    summary.skipped += 1;
                    continue;
                };
                let Some(away) = self.db.teams.read_by_code(&entry.away_code)? else {
                    warn!(
                        "unknown away team {} for game {}, skipping",
                        entry.away_code, entry.nhlid
                    );
                    summary.skipped += 1;
                    continue;
                };

                let Some(start_time) = parse_start_time(&entry.start_time_utc) else {
                    warn!(
                        "malformed start time {:?} for game {}, skipping",
                        entry.start_time_utc, entry.nhlid
                    );
                    summary.skipped += 1;
                    continue;
                };
                let Some(status) = GameStatus::from_provider(&entry.game_state) else {
                    warn!(
                        "unknown game state {:?} for game {}, skipping",
                        entry.game_state, entry.nhlid
                    );
                    summary.skipped += 1;
                    continue;
                };

                match self.db.games.read_by_nhlid(entry.nhlid)? {
                    Some(existing) => {
                        if existing.status == GameStatus::Compiled {
                            continue;
                        }
                        if let Some(rowid) = existing.rowid
                            && existing.status != status
                        {
                            self.db.games.update_status(rowid, status)?;
                            summary.updated += 1;
                        }
                    }
                    None => {
                        self.db.games.create(&Game {
                            nhlid: entry.nhlid,
                            start_time,
                            status,
                            home_team_rowid: home.rowid.unwrap_or_default(),
                            away_team_rowid: away.rowid.unwrap_or_default(),
                            home_team_points: 0,
                            away_team_points: 0,
                            clock: None,
                            rowid: None,
                        })?;
                        summary.inserted += 1;
                    }
                }
            }
        }

        info!(
            "schedule import: {} inserted, {} updated, {} skipped",
            summary.inserted, summary.updated, summary.skipped
        );
        Ok(summary)
    }

    /// Flips every scheduled game whose start time has passed to `LIVE`
    /// without calling the provider. Returns how many games flipped.
    pub fn update_game_states(&mut self, now: i64) -> Result<usize> {
        let mut flipped = 0;
        for game in self.db.games.read_by_status(GameStatus::Fut)? {
            if game.start_time <= now
                && let Some(rowid) = game.rowid
            {
                self.db.games.update_status(rowid, GameStatus::Live)?;
                flipped += 1;
            }
        }
        if flipped > 0 {
            info!("status sweep: {flipped} games went live");
        }
        Ok(flipped)
    }

    /// Reconciles every game currently in `status` against its box score.
    ///
    /// Per game: score and normalized status are committed first, then the
    /// skater stat lines are upserted, so a concurrent read never sees stats
    /// for a game whose score has not advanced yet. Games processed from the
    /// `IMPORTED` bucket flip to `COMPILED` once the whole bucket is done.
    pub fn compile_games_by_status(&mut self, status: GameStatus) -> Result<CompileSummary> {
        let mut summary = CompileSummary::default();
        let mut processed_rowids = Vec::new();

        for game in self.db.games.read_by_status(status)? {
            let Some(rowid) = game.rowid else {
                continue;
            };

            let box_score = match self.provider.box_score(game.nhlid) {
                Ok(box_score) => box_score,
                Err(err) => {
                    warn!("box score fetch failed for game {}: {err:#}", game.nhlid);
                    summary.skipped += 1;
                    continue;
                }
            };
            let Some(normalized) = GameStatus::from_provider(&box_score.game_state) else {
                warn!(
                    "unknown game state {:?} in box score for game {}, skipping",
                    box_score.game_state, game.nhlid
                );
                summary.skipped += 1;
                continue;
            };

            self.db.games.update_score(
                rowid,
                box_score.home.score,
                box_score.away.score,
                box_score.clock.as_deref(),
            )?;
            self.db.games.update_status(rowid, normalized)?;

            summary.stats_upserted += self.upsert_box_score_stats(rowid, &box_score)?;
            summary.processed += 1;
            processed_rowids.push(rowid);
        }

        if status == GameStatus::Imported {
            for rowid in processed_rowids {
                self.db.games.update_status(rowid, GameStatus::Compiled)?;
                summary.compiled += 1;
            }
        }

        info!(
            "reconciled {} bucket: {} processed, {} compiled, {} skipped, {} stat lines",
            status.as_str(),
            summary.processed,
            summary.compiled,
            summary.skipped,
            summary.stats_upserted
        );
        Ok(summary)
    }

    /// One full cycle: status sweep, then reconcile the `IMPORTED`, `FINAL`
    /// and `LIVE` buckets. Returns whether any games are still live.
    pub fn sync_once(&mut self, now: i64) -> Result<bool> {
        self.update_game_states(now)?;
        for status in [GameStatus::Imported, GameStatus::Final, GameStatus::Live] {
            self.compile_games_by_status(status)?;
        }
        Ok(!self.db.games.read_by_status(GameStatus::Live)?.is_empty())
    }

    fn upsert_box_score_stats(&mut self, game_rowid: i64, box_score: &BoxScore) -> Result<usize> {
        let home_team = self.db.teams.read_by_code(&box_score.home.code)?;
        let away_team = self.db.teams.read_by_code(&box_score.away.code)?;

        let mut upserted = 0;
        for (team, opp, skaters, code) in [
            (
                &home_team,
                &away_team,
                &box_score.home_skaters,
                &box_score.home.code,
            ),
            (
                &away_team,
                &home_team,
                &box_score.away_skaters,
                &box_score.away.code,
            ),
        ] {
            let Some(team) = team else {
                warn!("unknown team {code} in box score, skipping its skaters");
                continue;
            };
            let team_rowid = team.rowid.unwrap_or_default();
            let opp_rowid = opp.as_ref().and_then(|t| t.rowid);

            for skater in skaters {
                self.upsert_skater(game_rowid, team_rowid, opp_rowid, skater)?;
                upserted += 1;
            }
        }
        Ok(upserted)
    }

    fn upsert_skater(
        &mut self,
        game_rowid: i64,
        team_rowid: i64,
        opp_rowid: Option<i64>,
        skater: &SkaterLine,
    ) -> Result<()> {
        self.db.players.upsert(&Player {
            nhlid: skater.nhlid,
            team_rowid,
            name: skater.name.clone(),
            position: skater.position.clone(),
            rowid: None,
        })?;
        self.db.player_stats.upsert(&PlayerStat {
            game_rowid,
            player_nhlid: skater.nhlid,
            team_rowid,
            opp_rowid,
            goals: skater.goals,
            assists: skater.assists,
            hits: skater.hits,
            blocked_shots: skater.blocked_shots,
            shots_on_goal: skater.shots_on_goal,
            rowid: None,
        })
    }

    fn is_excluded(&self, code: &str) -> bool {
        self.config.excluded_teams.iter().any(|c| c == code)
    }
}

/// Provider timestamps are ISO-8601 with zone; epoch seconds are what we
/// store. `None` means the timestamp is malformed and the record is skipped.
pub fn parse_start_time(raw: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.timestamp())
}
