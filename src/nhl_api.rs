use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::provider::{BoxScore, BoxScoreTeam, DataSource, ScheduleGame, SkaterLine};

const API_BASE: &str = "https://api-web.nhle.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Blocking client for the public NHL api-web endpoints.
pub struct NhlApi {
    base: String,
}

impl NhlApi {
    pub fn new() -> Self {
        Self {
            base: API_BASE.to_string(),
        }
    }

    /// Point at a different host, for stub servers.
    pub fn with_base(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn fetch(&self, url: &str) -> Result<String> {
        let client = http_client()?;
        let resp = client.get(url).send().context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status}: {url}"));
        }
        Ok(body)
    }
}

impl Default for NhlApi {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSource for NhlApi {
    fn schedule_for_team(&self, team_code: &str, season: &str) -> Result<Vec<ScheduleGame>> {
        let url = format!("{}/club-schedule-season/{team_code}/{season}", self.base);
        let body = self.fetch(&url)?;
        parse_schedule_json(&body)
    }

    fn box_score(&self, game_nhlid: i64) -> Result<BoxScore> {
        let url = format!("{}/gamecenter/{game_nhlid}/boxscore", self.base);
        let body = self.fetch(&url)?;
        parse_box_score_json(&body)
    }
}

pub fn parse_schedule_json(raw: &str) -> Result<Vec<ScheduleGame>> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid schedule json")?;
    let games = root
        .get("games")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("schedule payload missing games array"))?;

    let mut out = Vec::with_capacity(games.len());
    for game in games {
        if let Some(entry) = parse_schedule_game(game) {
            out.push(entry);
        }
    }
    Ok(out)
}

#[derive(Deserialize)]
struct RawScheduleGame {
    id: i64,
    #[serde(rename = "gameType")]
    game_type: i64,
    #[serde(rename = "startTimeUTC")]
    start_time_utc: String,
    #[serde(rename = "gameState")]
    game_state: String,
    #[serde(rename = "homeTeam")]
    home_team: RawTeamRef,
    #[serde(rename = "awayTeam")]
    away_team: RawTeamRef,
}

#[derive(Deserialize)]
struct RawTeamRef {
    abbrev: String,
}

// Entries missing a required field are dropped, not fatal.
fn parse_schedule_game(v: &Value) -> Option<ScheduleGame> {
    let raw: RawScheduleGame = serde_json::from_value(v.clone()).ok()?;
    Some(ScheduleGame {
        nhlid: raw.id,
        game_type: raw.game_type,
        start_time_utc: raw.start_time_utc,
        game_state: raw.game_state,
        home_code: raw.home_team.abbrev,
        away_code: raw.away_team.abbrev,
    })
}

pub fn parse_box_score_json(raw: &str) -> Result<BoxScore> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid box score json")?;

    let game_state = root
        .get("gameState")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("box score missing gameState"))?
        .to_string();
    let home = parse_box_score_team(root.get("homeTeam"))
        .ok_or_else(|| anyhow!("box score missing homeTeam"))?;
    let away = parse_box_score_team(root.get("awayTeam"))
        .ok_or_else(|| anyhow!("box score missing awayTeam"))?;
    let clock = root
        .get("clock")
        .and_then(|c| c.get("timeRemaining"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    // A box score without playerByGameStats just has no skaters yet.
    let stats = root.get("playerByGameStats");
    let home_skaters = parse_skaters(stats.and_then(|s| s.get("homeTeam")));
    let away_skaters = parse_skaters(stats.and_then(|s| s.get("awayTeam")));

    Ok(BoxScore {
        game_state,
        clock,
        home,
        away,
        home_skaters,
        away_skaters,
    })
}

fn parse_box_score_team(v: Option<&Value>) -> Option<BoxScoreTeam> {
    let v = v?;
    Some(BoxScoreTeam {
        code: team_abbrev(v)?,
        score: v.get("score").and_then(|s| s.as_i64()).unwrap_or(0),
    })
}

fn parse_skaters(team: Option<&Value>) -> Vec<SkaterLine> {
    let mut out = Vec::new();
    let Some(groups) = team.and_then(|v| v.as_object()) else {
        return out;
    };
    for (group, players) in groups {
        if group == "goalies" {
            continue;
        }
        let Some(players) = players.as_array() else {
            continue;
        };
        for player in players {
            if let Some(line) = parse_skater(player) {
                out.push(line);
            }
        }
    }
    out
}

#[derive(Deserialize)]
struct RawSkater {
    #[serde(rename = "playerId")]
    player_id: i64,
    // String or {"default": ...}, resolved by display_name.
    name: Value,
    #[serde(default)]
    position: String,
    #[serde(default)]
    goals: i64,
    #[serde(default)]
    assists: i64,
    #[serde(default)]
    hits: i64,
    #[serde(rename = "blockedShots", default)]
    blocked_shots: i64,
    #[serde(rename = "sog", default)]
    shots_on_goal: i64,
}

fn parse_skater(v: &Value) -> Option<SkaterLine> {
    let raw: RawSkater = serde_json::from_value(v.clone()).ok()?;
    let name = display_name(&raw.name)?;
    Some(SkaterLine {
        nhlid: raw.player_id,
        name,
        position: raw.position,
        goals: raw.goals,
        assists: raw.assists,
        hits: raw.hits,
        blocked_shots: raw.blocked_shots,
        shots_on_goal: raw.shots_on_goal,
    })
}

fn team_abbrev(v: &Value) -> Option<String> {
    v.get("abbrev")
        .and_then(|a| a.as_str())
        .map(|s| s.to_string())
}

// Player names arrive either as a bare string or as {"default": "..."}.
fn display_name(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Object(map) => map
            .get("default")
            .and_then(|d| d.as_str())
            .map(|s| s.trim().to_string()),
        _ => None,
    }
}
