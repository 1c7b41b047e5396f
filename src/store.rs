//! Persistence seam
//!
//! The engine reads and writes history only through [`TrainingStore`]. Both
//! entities are keyed by `(user_id, date)`; an upsert on an existing key
//! replaces the payload, keeps `id`/`created_at` and refreshes `updated_at`.
//! Range queries are inclusive on both ends and return rows newest first.

use crate::error::StoreError;
use crate::models::{RecoverySurvey, SessionLog, StoredRecord, StoredSession, StoredSurvey};
use chrono::{NaiveDate, Utc};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

pub trait TrainingStore: Send + Sync {
    fn find_survey(&self, user_id: &str, date: NaiveDate) -> Result<Option<StoredSurvey>, StoreError>;

    /// Insert or update the survey for its `(user_id, date)`
    fn upsert_survey(&self, survey: &RecoverySurvey) -> Result<StoredSurvey, StoreError>;

    /// Surveys dated in `[from, to]`, newest first, at most `limit` rows
    fn surveys_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<StoredSurvey>, StoreError>;

    /// Most recent survey dated in `[from, to]`
    fn latest_survey(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<StoredSurvey>, StoreError> {
        Ok(self.surveys_between(user_id, from, to, 1)?.into_iter().next())
    }

    fn find_session(&self, user_id: &str, date: NaiveDate) -> Result<Option<StoredSession>, StoreError>;

    /// Insert or update the session for its `(user_id, date)`
    fn upsert_session(&self, session: &SessionLog) -> Result<StoredSession, StoreError>;

    /// Sessions dated in `[from, to]`, newest first
    fn sessions_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StoredSession>, StoreError>;
}

type Table<T> = Mutex<BTreeMap<(String, NaiveDate), StoredRecord<T>>>;

/// Process-local store; useful for tests and one-shot CLI runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    surveys: Table<RecoverySurvey>,
    sessions: Table<SessionLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrainingStore for MemoryStore {
    fn find_survey(&self, user_id: &str, date: NaiveDate) -> Result<Option<StoredSurvey>, StoreError> {
        find(&self.surveys, user_id, date)
    }

    fn upsert_survey(&self, survey: &RecoverySurvey) -> Result<StoredSurvey, StoreError> {
        upsert(&self.surveys, &survey.user_id, survey.date, survey.clone())
    }

    fn surveys_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<StoredSurvey>, StoreError> {
        between(&self.surveys, user_id, from, to, limit)
    }

    fn find_session(&self, user_id: &str, date: NaiveDate) -> Result<Option<StoredSession>, StoreError> {
        find(&self.sessions, user_id, date)
    }

    fn upsert_session(&self, session: &SessionLog) -> Result<StoredSession, StoreError> {
        upsert(&self.sessions, &session.user_id, session.date, session.clone())
    }

    fn sessions_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StoredSession>, StoreError> {
        between(&self.sessions, user_id, from, to, usize::MAX)
    }
}

fn find<T: Clone>(
    table: &Table<T>,
    user_id: &str,
    date: NaiveDate,
) -> Result<Option<StoredRecord<T>>, StoreError> {
    let rows = table.lock().map_err(|_| StoreError::Poisoned)?;
    Ok(rows.get(&(user_id.to_string(), date)).cloned())
}

/// Lookup and write happen under one lock acquisition
fn upsert<T: Clone>(
    table: &Table<T>,
    user_id: &str,
    date: NaiveDate,
    record: T,
) -> Result<StoredRecord<T>, StoreError> {
    let mut rows = table.lock().map_err(|_| StoreError::Poisoned)?;
    let now = Utc::now();

    let stored = match rows.entry((user_id.to_string(), date)) {
        Entry::Occupied(mut entry) => {
            let row = entry.get_mut();
            row.record = record;
            row.updated_at = now;
            row.clone()
        }
        Entry::Vacant(entry) => entry
            .insert(StoredRecord {
                id: Uuid::new_v4().to_string(),
                record,
                created_at: now,
                updated_at: now,
            })
            .clone(),
    };

    Ok(stored)
}

fn between<T: Clone>(
    table: &Table<T>,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
    limit: usize,
) -> Result<Vec<StoredRecord<T>>, StoreError> {
    let rows = table.lock().map_err(|_| StoreError::Poisoned)?;
    // BTreeMap::range panics on an inverted range
    if from > to {
        return Ok(Vec::new());
    }

    let start = (user_id.to_string(), from);
    let end = (user_id.to_string(), to);
    Ok(rows
        .range(start..=end)
        .rev()
        .take(limit)
        .map(|(_, row)| row.clone())
        .collect())
}
