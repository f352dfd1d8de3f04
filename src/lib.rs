//! Data preparation for the SkillQuest progress dashboard: loads the dated xp
//! exports, keeps the best result per student and skill, and aggregates daily
//! and per-skill validation statistics.

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod dedup;
pub mod error;
pub mod loader;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod report;
