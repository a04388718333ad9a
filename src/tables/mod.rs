//! Versioned entity tables.
//!
//! Each entity exposes a trait describing its CRUD surface plus indexed
//! lookups, and one concrete implementation per schema revision. `resolve`
//! in each module consults the registry so the running version decides which
//! revision backs the trait object. The tables are mechanical persistence:
//! business rules (status transitions, skip policies) live in the sync engine.

pub mod games;
pub mod player_stats;
pub mod players;
pub mod teams;
