// src/services/leaderboard.rs

//! Global leaderboard: per-user score totals over every recorded attempt.

use std::collections::HashMap;

use futures::future::join_all;

use crate::{
    config::UNKNOWN_DISPLAY_NAME,
    models::attempt::{Attempt, RankedEntry},
    store::{DataStore, Document, QUIZ_RESULTS, StoreError, USERS},
};

/// Summed score of one user, before display names are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTotal {
    pub user_id: String,
    pub total_score: i64,
}

struct Tally {
    total: i64,
    /// Input position at which the running total last changed.
    reached_at: usize,
}

/// Sums scores per user and returns the best `limit` totals, highest first.
///
/// Equal totals are ordered by who reached the total first in input order.
pub fn aggregate_scores(attempts: &[Attempt], limit: usize) -> Vec<UserTotal> {
    let mut tallies: HashMap<&str, Tally> = HashMap::new();

    for (index, attempt) in attempts.iter().enumerate() {
        let tally = tallies.entry(attempt.user_id.as_str()).or_insert(Tally {
            total: 0,
            reached_at: index,
        });
        if attempt.score != 0 {
            tally.total = tally.total.saturating_add(attempt.score);
            tally.reached_at = index;
        }
    }

    let mut ranked: Vec<(&str, Tally)> = tallies.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| {
        b.total
            .cmp(&a.total)
            .then(a.reached_at.cmp(&b.reached_at))
    });
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(user_id, tally)| UserTotal {
            user_id: user_id.to_string(),
            total_score: tally.total,
        })
        .collect()
}

fn display_name(profile: Option<&Document>) -> String {
    profile
        .and_then(|doc| doc.str_field("name"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_DISPLAY_NAME)
        .to_string()
}

/// Looks up every user's profile concurrently and attaches display names.
/// Order of `totals` is preserved. Any failed lookup fails the whole call.
pub async fn resolve_display_names(
    store: &dyn DataStore,
    totals: Vec<UserTotal>,
) -> Result<Vec<RankedEntry>, StoreError> {
    let lookups = totals.iter().map(|t| store.get(USERS, &t.user_id));
    let profiles = join_all(lookups).await;

    totals
        .into_iter()
        .zip(profiles)
        .map(|(total, profile)| -> Result<RankedEntry, StoreError> {
            Ok(RankedEntry {
                display_name: display_name(profile?.as_ref()),
                user_id: total.user_id,
                total_score: total.total_score,
            })
        })
        .collect()
}

/// Fetches every attempt and builds the top-`limit` leaderboard.
pub async fn build_leaderboard(
    store: &dyn DataStore,
    limit: usize,
) -> Result<Vec<RankedEntry>, StoreError> {
    let docs = store.fetch_all(QUIZ_RESULTS).await?;
    let attempts: Vec<Attempt> = docs.iter().filter_map(Attempt::from_document).collect();

    let totals = aggregate_scores(&attempts, limit);
    tracing::debug!(
        "Aggregated {} attempts into {} leaderboard rows",
        attempts.len(),
        totals.len()
    );

    resolve_display_names(store, totals).await
}
