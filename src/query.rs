//! Read-only denormalized views for presentation consumers.
//!
//! Rows are composed through the entity table traits rather than raw SQL
//! joins, so the view code works unchanged across table revisions with
//! different column sets. Nothing in this module writes.

use std::collections::HashMap;

use crate::db::Database;
use crate::model::{Game, GameStatus};
use crate::store::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct GameQuery {
    pub game_rowid: Option<i64>,
    pub team_rowid: Option<i64>,
    pub statuses: Option<Vec<GameStatus>>,
}

impl GameQuery {
    pub fn by_rowid(rowid: i64) -> Self {
        Self {
            game_rowid: Some(rowid),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinGamesRow {
    pub game_rowid: i64,
    pub nhlid: i64,
    pub start_time: i64,
    pub status: GameStatus,
    pub home_code: String,
    pub away_code: String,
    pub home_team_points: i64,
    pub away_team_points: i64,
    pub clock: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StatQuery {
    pub game_rowid: Option<i64>,
    pub player_nhlid: Option<i64>,
    pub team_rowid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlayerStatsRow {
    pub game_rowid: i64,
    pub player_nhlid: i64,
    pub player_name: String,
    pub position: String,
    pub team_code: String,
    pub opp_code: Option<String>,
    pub goals: i64,
    pub assists: i64,
    pub hits: i64,
    pub blocked_shots: i64,
    pub shots_on_goal: i64,
    pub start_time: i64,
    pub status: GameStatus,
}

/// Games joined with team display codes. Supported shapes: everything, a
/// single game by rowid, by team, by status set, or team + status set. A
/// rowid combined with any other filter is rejected.
pub fn join_games(db: &Database, query: &GameQuery) -> Result<Vec<JoinGamesRow>> {
    if query.game_rowid.is_some() && (query.team_rowid.is_some() || query.statuses.is_some()) {
        return Err(Error::UnsupportedQuery(
            "game rowid cannot be combined with other game filters",
        ));
    }

    let games = if let Some(rowid) = query.game_rowid {
        db.games.read_by_rowid(rowid)?.into_iter().collect()
    } else if let Some(statuses) = &query.statuses {
        let mut games = Vec::new();
        for status in statuses {
            games.extend(db.games.read_by_status(*status)?);
        }
        games
    } else {
        db.games.read_all()?
    };

    let codes = team_codes(db)?;
    let mut rows = Vec::with_capacity(games.len());
    for game in games {
        if let Some(team_rowid) = query.team_rowid
            && game.home_team_rowid != team_rowid
            && game.away_team_rowid != team_rowid
        {
            continue;
        }
        rows.push(to_join_row(&game, &codes));
    }
    rows.sort_by_key(|row| (row.start_time, row.game_rowid));
    Ok(rows)
}

/// Stat lines joined with player and team display fields. Supported shapes:
/// everything, by game, by player, by team, or the (game, player) pair.
pub fn join_player_stats(db: &Database, query: &StatQuery) -> Result<Vec<JoinPlayerStatsRow>> {
    if query.team_rowid.is_some() && (query.game_rowid.is_some() || query.player_nhlid.is_some()) {
        return Err(Error::UnsupportedQuery(
            "team filter cannot be combined with other stat filters",
        ));
    }

    let stats = match (query.game_rowid, query.player_nhlid) {
        (Some(game_rowid), Some(player_nhlid)) => db
            .player_stats
            .read_one(game_rowid, player_nhlid)?
            .into_iter()
            .collect(),
        (Some(game_rowid), None) => db.player_stats.read_by_game(game_rowid)?,
        (None, Some(player_nhlid)) => db.player_stats.read_by_player(player_nhlid)?,
        (None, None) => db.player_stats.read_all()?,
    };

    let codes = team_codes(db)?;
    let mut rows = Vec::with_capacity(stats.len());
    for stat in stats {
        if let Some(team_rowid) = query.team_rowid
            && stat.team_rowid != team_rowid
        {
            continue;
        }
        let (player_name, position) = match db.players.read_by_nhlid(stat.player_nhlid)? {
            Some(player) => (player.name, player.position),
            None => (stat.player_nhlid.to_string(), String::new()),
        };
        let (start_time, status) = match db.games.read_by_rowid(stat.game_rowid)? {
            Some(game) => (game.start_time, game.status),
            None => (0, GameStatus::Fut),
        };
        rows.push(JoinPlayerStatsRow {
            game_rowid: stat.game_rowid,
            player_nhlid: stat.player_nhlid,
            player_name,
            position,
            team_code: code_for(&codes, stat.team_rowid),
            opp_code: stat.opp_rowid.map(|rowid| code_for(&codes, rowid)),
            goals: stat.goals,
            assists: stat.assists,
            hits: stat.hits,
            blocked_shots: stat.blocked_shots,
            shots_on_goal: stat.shots_on_goal,
            start_time,
            status,
        });
    }
    rows.sort_by_key(|row| (row.team_code.clone(), row.player_nhlid));
    Ok(rows)
}

/// Scheduled games strictly after `now`, soonest first.
pub fn upcoming_games(db: &Database, now: i64) -> Result<Vec<JoinGamesRow>> {
    let codes = team_codes(db)?;
    let mut rows = db
        .games
        .read_by_status(GameStatus::Fut)?
        .into_iter()
        .filter(|game| game.is_after(now))
        .map(|game| to_join_row(&game, &codes))
        .collect::<Vec<_>>();
    rows.sort_by_key(|row| (row.start_time, row.game_rowid));
    Ok(rows)
}

fn to_join_row(game: &Game, codes: &HashMap<i64, String>) -> JoinGamesRow {
    JoinGamesRow {
        game_rowid: game.rowid.unwrap_or_default(),
        nhlid: game.nhlid,
        start_time: game.start_time,
        status: game.status,
        home_code: code_for(codes, game.home_team_rowid),
        away_code: code_for(codes, game.away_team_rowid),
        home_team_points: game.home_team_points,
        away_team_points: game.away_team_points,
        clock: game.clock.clone(),
    }
}

fn team_codes(db: &Database) -> Result<HashMap<i64, String>> {
    Ok(db
        .teams
        .read_all()?
        .into_iter()
        .filter_map(|team| team.rowid.map(|rowid| (rowid, team.code)))
        .collect())
}

fn code_for(codes: &HashMap<i64, String>, rowid: i64) -> String {
    codes.get(&rowid).cloned().unwrap_or_else(|| "?".to_string())
}
