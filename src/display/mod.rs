//! Terminal tables for CLI output.

pub mod tables;

pub use tables::{
    TableBuilder, create_ad_table, create_audience_table, create_insight_table,
    create_leaderboard_table, create_matches_table, create_questions_table, percent,
};
