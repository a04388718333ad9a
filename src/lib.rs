//! Sync engine keeping a local sqlite snapshot of NHL teams, players, games
//! and per-player game stats in step with the league's schedule and box-score
//! feeds. Table layouts are version-gated through a registry so the store can
//! evolve its column sets across releases without breaking older call sites.

pub mod db;
pub mod model;
pub mod nhl_api;
pub mod provider;
pub mod query;
pub mod registry;
pub mod store;
pub mod sync;
pub mod tables;
pub mod version;
