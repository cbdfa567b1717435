// src/services/cleanup.rs

//! Data hygiene passes.
//!
//! * Duplicate questions: records sharing the same trimmed question text, category
//!   and correct answer collapse to one canonical record (the smallest id).
//! * Invalid attempts: results claiming more questions than a session can hold.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    config::MAX_SESSION_QUESTIONS,
    models::question::{Question, QuestionKey},
    store::{DataStore, Document, QUESTIONS, QUIZ_RESULTS, StoreError},
};

/// Ids of questions to delete so that each duplicate group keeps exactly one record.
pub fn duplicate_question_ids(questions: &[Question]) -> Vec<String> {
    let mut groups: HashMap<QuestionKey, Vec<&Question>> = HashMap::new();
    for question in questions {
        groups.entry(question.key()).or_default().push(question);
    }

    let mut redundant: Vec<String> = groups
        .into_values()
        .filter(|group| group.len() > 1)
        .flat_map(|mut group| {
            group.sort_by(|a, b| a.id.cmp(&b.id));
            group.into_iter().skip(1).map(|q| q.id.clone())
        })
        .collect();

    redundant.sort();
    redundant
}

/// Ids of result documents whose question count exceeds `max_questions`.
///
/// Works on raw documents: a record too broken to parse as an attempt
/// (no `userId`, say) is still judged by its `totalQuestions` alone.
pub fn invalid_attempt_ids(results: &[Document], max_questions: usize) -> Vec<String> {
    results
        .iter()
        .filter(|doc| doc.int_field("totalQuestions").unwrap_or(0) > max_questions as i64)
        .map(|doc| doc.id.clone())
        .collect()
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub questions_scanned: usize,
    pub duplicate_questions_removed: usize,
    pub results_scanned: usize,
    pub invalid_results_removed: usize,
    /// One message per pass that failed part way.
    pub errors: Vec<String>,
}

async fn delete_all(
    store: &dyn DataStore,
    collection: &str,
    ids: &[String],
) -> Result<usize, (usize, StoreError)> {
    let mut removed = 0;
    for id in ids {
        match store.delete(collection, id).await {
            Ok(true) => {
                removed += 1;
                tracing::debug!("Deleted {} document {}", collection, id);
            }
            Ok(false) => tracing::debug!("{} document {} already gone", collection, id),
            Err(e) => return Err((removed, e)),
        }
    }
    Ok(removed)
}

async fn remove_duplicate_questions(
    store: &dyn DataStore,
    report: &mut CleanupReport,
) -> Result<(), StoreError> {
    let docs = store.fetch_all(QUESTIONS).await?;
    let questions: Vec<Question> = docs.iter().filter_map(Question::from_document).collect();
    report.questions_scanned = questions.len();

    let ids = duplicate_question_ids(&questions);
    tracing::info!(
        "Found {} duplicate questions among {}",
        ids.len(),
        questions.len()
    );

    match delete_all(store, QUESTIONS, &ids).await {
        Ok(removed) => {
            report.duplicate_questions_removed = removed;
            Ok(())
        }
        Err((removed, e)) => {
            report.duplicate_questions_removed = removed;
            Err(e)
        }
    }
}

async fn remove_invalid_results(
    store: &dyn DataStore,
    report: &mut CleanupReport,
) -> Result<(), StoreError> {
    let docs = store.fetch_all(QUIZ_RESULTS).await?;
    report.results_scanned = docs.len();

    let ids = invalid_attempt_ids(&docs, MAX_SESSION_QUESTIONS);
    tracing::info!(
        "Found {} quiz results with more than {} questions",
        ids.len(),
        MAX_SESSION_QUESTIONS
    );

    match delete_all(store, QUIZ_RESULTS, &ids).await {
        Ok(removed) => {
            report.invalid_results_removed = removed;
            Ok(())
        }
        Err((removed, e)) => {
            report.invalid_results_removed = removed;
            Err(e)
        }
    }
}

/// Runs both passes. A failing pass is logged and reported; the other still runs.
pub async fn run_cleanup(store: &dyn DataStore) -> CleanupReport {
    let mut report = CleanupReport::default();

    if let Err(e) = remove_duplicate_questions(store, &mut report).await {
        tracing::error!("Error while removing duplicate questions: {}", e);
        report
            .errors
            .push(format!("Removing duplicate questions failed: {}", e));
    }

    if let Err(e) = remove_invalid_results(store, &mut report).await {
        tracing::error!("Error while removing invalid quiz results: {}", e);
        report
            .errors
            .push(format!("Removing invalid quiz results failed: {}", e));
    }

    tracing::info!(
        "Cleanup complete: {} duplicate questions and {} invalid results removed",
        report.duplicate_questions_removed,
        report.invalid_results_removed
    );

    report
}
