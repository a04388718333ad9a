//! The same logical tables resolve to different column layouts depending on
//! the running version; older layouts accept the full entity and drop the
//! fields they do not know about.

use rinkside::db::Database;
use rinkside::model::{Game, GameStatus, PlayerStat, Team};
use rinkside::version::VersionNumber;

fn seed_two_teams(db: &Database) -> (i64, i64) {
    let nyr = db
        .teams
        .create(&Team {
            conference: "E".to_string(),
            division: "M".to_string(),
            name: "New York Rangers".to_string(),
            code: "NYR".to_string(),
            nhlid: 3,
            rowid: None,
        })
        .expect("create NYR");
    let det = db
        .teams
        .create(&Team {
            conference: "E".to_string(),
            division: "A".to_string(),
            name: "Detroit Red Wings".to_string(),
            code: "DET".to_string(),
            nhlid: 17,
            rowid: None,
        })
        .expect("create DET");
    (nyr, det)
}

fn make_game(home: i64, away: i64) -> Game {
    Game {
        nhlid: 9001,
        start_time: 1000,
        status: GameStatus::Live,
        home_team_rowid: home,
        away_team_rowid: away,
        home_team_points: 0,
        away_team_points: 0,
        clock: None,
        rowid: None,
    }
}

fn make_stat(game_rowid: i64, team: i64, opp: i64) -> PlayerStat {
    PlayerStat {
        game_rowid,
        player_nhlid: 5001,
        team_rowid: team,
        opp_rowid: Some(opp),
        goals: 1,
        assists: 2,
        hits: 3,
        blocked_shots: 4,
        shots_on_goal: 5,
        rowid: None,
    }
}

#[test]
fn old_layouts_drop_clock_and_opponent() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let db =
        Database::open(&dir.path().join("old.db"), VersionNumber::new(0, 6, 0)).expect("open");
    let (nyr, det) = seed_two_teams(&db);

    let rowid = db.games.create(&make_game(nyr, det)).expect("create game");
    db.games
        .update_score(rowid, 2, 1, Some("05:00"))
        .expect("update score");
    let game = db.games.read_by_rowid(rowid).expect("read").expect("exists");
    assert_eq!(game.home_team_points, 2);
    assert_eq!(game.clock, None, "0.5 games layout has no clock column");

    db.player_stats
        .upsert(&make_stat(rowid, nyr, det))
        .expect("upsert stat");
    let stat = db
        .player_stats
        .read_one(rowid, 5001)
        .expect("read")
        .expect("exists");
    assert_eq!(stat.goals, 1);
    assert_eq!(stat.opp_rowid, None, "0.6 stats layout has no opp column");
}

#[test]
fn current_layouts_keep_clock_and_opponent() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let db =
        Database::open(&dir.path().join("new.db"), VersionNumber::current()).expect("open");
    let (nyr, det) = seed_two_teams(&db);

    let rowid = db.games.create(&make_game(nyr, det)).expect("create game");
    db.games
        .update_score(rowid, 2, 1, Some("05:00"))
        .expect("update score");
    let game = db.games.read_by_rowid(rowid).expect("read").expect("exists");
    assert_eq!(game.clock.as_deref(), Some("05:00"));

    db.player_stats
        .upsert(&make_stat(rowid, nyr, det))
        .expect("upsert stat");
    let stat = db
        .player_stats
        .read_one(rowid, 5001)
        .expect("read")
        .expect("exists");
    assert_eq!(stat.opp_rowid, Some(det));

    // Upsert with new numbers overwrites in place.
    let mut updated = make_stat(rowid, nyr, det);
    updated.goals = 3;
    db.player_stats.upsert(&updated).expect("second upsert");
    let stats = db.player_stats.read_by_game(rowid).expect("read");
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].goals, 3);
}
