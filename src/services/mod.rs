// src/services/mod.rs

//! Store-agnostic quiz logic: leaderboard aggregation, duplicate cleanup and
//! quiz session grading.

pub mod cleanup;
pub mod leaderboard;
pub mod quiz;
