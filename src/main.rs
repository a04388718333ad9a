use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::Utc;

use rinkside::db::{Database, seed_teams};
use rinkside::model::format_local_start;
use rinkside::nhl_api::NhlApi;
use rinkside::query;
use rinkside::sync::{SyncConfig, SyncEngine};
use rinkside::version::VersionNumber;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "sync".to_string());
    let db_path = parse_db_path_arg()
        .or_else(db_path_from_env)
        .unwrap_or_else(|| PathBuf::from("rinkside.db"));

    let db = Database::open(&db_path, VersionNumber::current())?;
    db.populate_teams(&seed_teams())?;

    let config = config_from_env();
    let offset = config.fixed_offset();
    let provider = NhlApi::new();
    let mut engine = SyncEngine::new(&db, &provider, config);
    let now = Utc::now().timestamp();

    match command.as_str() {
        "import" => {
            let summary = engine.import_schedules()?;
            println!(
                "imported {} games ({} updated, {} skipped)",
                summary.inserted, summary.updated, summary.skipped
            );
        }
        "sync" => {
            let live = engine.sync_once(now)?;
            println!(
                "sync complete, {}",
                if live { "games still live" } else { "no live games" }
            );
        }
        "upcoming" => {
            for row in query::upcoming_games(&db, now)? {
                let start = format_local_start(row.start_time, offset);
                println!("{} @ {}  {}", row.away_code, row.home_code, start);
            }
        }
        other => {
            return Err(anyhow!(
                "unknown command {other}; expected import, sync or upcoming"
            ));
        }
    }

    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

fn db_path_from_env() -> Option<PathBuf> {
    let raw = std::env::var("RINKSIDE_DB").ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

fn config_from_env() -> SyncConfig {
    let mut config = SyncConfig::default();
    if let Ok(season) = std::env::var("RINKSIDE_SEASON")
        && !season.trim().is_empty()
    {
        config.season = season.trim().to_string();
    }
    if let Ok(raw) = std::env::var("RINKSIDE_EXCLUDED_TEAMS") {
        config.excluded_teams = raw
            .split([',', ';', ' '])
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .collect();
    }
    if let Ok(raw) = std::env::var("RINKSIDE_UTC_OFFSET_HOURS")
        && let Ok(hours) = raw.trim().parse::<i32>()
    {
        config.utc_offset_hours = hours;
    }
    config
}
