use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    MuscleSoreness, RecoverySurvey, SessionLog, StoredRecord, StoredSession, StoredSurvey,
};
use crate::store::TrainingStore;

const SURVEY_COLUMNS: &str = "id, user_id, date, chest_soreness, back_soreness, legs_soreness, \
     arms_soreness, shoulders_soreness, core_soreness, overall_soreness, sleep_quality, \
     energy_level, motivation, notes, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, user_id, date, session_rpe, duration_minutes, total_load, \
     rpe_load, exercise_count, notes, created_at, updated_at";

/// SQLite-backed training store
///
/// One connection behind a mutex. Each upsert is a single
/// `INSERT ... ON CONFLICT(user_id, date) DO UPDATE ... RETURNING` statement,
/// so there is no read-then-write window.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create or open a database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path.as_ref())?;

        // Enable WAL mode for better concurrent access
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        debug!(path = %db_path.as_ref().display(), journal_mode = %mode, "Opened training database");

        Self::with_connection(conn)
    }

    /// Private database that disappears with the store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Initialize database schema with tables and indexes
    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS recovery_surveys (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,

                -- Soreness, 0-10
                chest_soreness INTEGER NOT NULL,
                back_soreness INTEGER NOT NULL,
                legs_soreness INTEGER NOT NULL,
                arms_soreness INTEGER NOT NULL,
                shoulders_soreness INTEGER NOT NULL,
                core_soreness INTEGER NOT NULL,
                overall_soreness INTEGER NOT NULL,

                -- Wellness, 1-10
                sleep_quality INTEGER NOT NULL,
                energy_level INTEGER NOT NULL,
                motivation INTEGER NOT NULL,

                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,

                UNIQUE (user_id, date)
            );

            CREATE TABLE IF NOT EXISTS session_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                session_rpe INTEGER NOT NULL,

                -- Decimals are stored as text to keep them exact
                duration_minutes TEXT NOT NULL,
                total_load TEXT NOT NULL,
                rpe_load TEXT NOT NULL,

                exercise_count INTEGER NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,

                UNIQUE (user_id, date)
            );
            "#,
        )?;

        info!("Training store schema ready");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn survey_from_row(row: &Row) -> rusqlite::Result<StoredSurvey> {
        Ok(StoredRecord {
            id: row.get("id")?,
            record: RecoverySurvey {
                user_id: row.get("user_id")?,
                date: row.get("date")?,
                muscles: MuscleSoreness {
                    chest: row.get("chest_soreness")?,
                    back: row.get("back_soreness")?,
                    legs: row.get("legs_soreness")?,
                    arms: row.get("arms_soreness")?,
                    shoulders: row.get("shoulders_soreness")?,
                    core: row.get("core_soreness")?,
                },
                overall_soreness: row.get("overall_soreness")?,
                sleep_quality: row.get("sleep_quality")?,
                energy_level: row.get("energy_level")?,
                motivation: row.get("motivation")?,
                notes: row.get("notes")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn session_from_row(row: &Row) -> rusqlite::Result<StoredSession> {
        Ok(StoredRecord {
            id: row.get("id")?,
            record: SessionLog {
                user_id: row.get("user_id")?,
                date: row.get("date")?,
                session_rpe: row.get("session_rpe")?,
                duration_minutes: decimal_column(row, "duration_minutes")?,
                total_load: decimal_column(row, "total_load")?,
                rpe_load: decimal_column(row, "rpe_load")?,
                exercise_count: row.get("exercise_count")?,
                notes: row.get("notes")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl TrainingStore for SqliteStore {
    fn find_survey(&self, user_id: &str, date: NaiveDate) -> Result<Option<StoredSurvey>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {SURVEY_COLUMNS} FROM recovery_surveys WHERE user_id = ?1 AND date = ?2"),
            params![user_id, date],
            Self::survey_from_row,
        )
        .optional()
        .map_err(store_error)
    }

    fn upsert_survey(&self, survey: &RecoverySurvey) -> Result<StoredSurvey, StoreError> {
        let conn = self.lock()?;
        let muscles = &survey.muscles;

        conn.query_row(
            &format!(
                r#"
                INSERT INTO recovery_surveys (
                    id, user_id, date, chest_soreness, back_soreness, legs_soreness,
                    arms_soreness, shoulders_soreness, core_soreness, overall_soreness,
                    sleep_quality, energy_level, motivation, notes, created_at, updated_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15
                )
                ON CONFLICT (user_id, date) DO UPDATE SET
                    chest_soreness = excluded.chest_soreness,
                    back_soreness = excluded.back_soreness,
                    legs_soreness = excluded.legs_soreness,
                    arms_soreness = excluded.arms_soreness,
                    shoulders_soreness = excluded.shoulders_soreness,
                    core_soreness = excluded.core_soreness,
                    overall_soreness = excluded.overall_soreness,
                    sleep_quality = excluded.sleep_quality,
                    energy_level = excluded.energy_level,
                    motivation = excluded.motivation,
                    notes = excluded.notes,
                    updated_at = excluded.updated_at
                RETURNING {SURVEY_COLUMNS}
                "#
            ),
            params![
                Uuid::new_v4().to_string(),
                survey.user_id,
                survey.date,
                muscles.chest,
                muscles.back,
                muscles.legs,
                muscles.arms,
                muscles.shoulders,
                muscles.core,
                survey.overall_soreness,
                survey.sleep_quality,
                survey.energy_level,
                survey.motivation,
                survey.notes,
                Utc::now(),
            ],
            Self::survey_from_row,
        )
        .map_err(store_error)
    }

    fn surveys_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<StoredSurvey>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SURVEY_COLUMNS} FROM recovery_surveys \
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 \
             ORDER BY date DESC LIMIT ?4"
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![user_id, from, to, limit], Self::survey_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)?;

        Ok(rows)
    }

    fn find_session(&self, user_id: &str, date: NaiveDate) -> Result<Option<StoredSession>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM session_logs WHERE user_id = ?1 AND date = ?2"),
            params![user_id, date],
            Self::session_from_row,
        )
        .optional()
        .map_err(store_error)
    }

    fn upsert_session(&self, session: &SessionLog) -> Result<StoredSession, StoreError> {
        let conn = self.lock()?;

        conn.query_row(
            &format!(
                r#"
                INSERT INTO session_logs (
                    id, user_id, date, session_rpe, duration_minutes, total_load,
                    rpe_load, exercise_count, notes, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
                ON CONFLICT (user_id, date) DO UPDATE SET
                    session_rpe = excluded.session_rpe,
                    duration_minutes = excluded.duration_minutes,
                    total_load = excluded.total_load,
                    rpe_load = excluded.rpe_load,
                    exercise_count = excluded.exercise_count,
                    notes = excluded.notes,
                    updated_at = excluded.updated_at
                RETURNING {SESSION_COLUMNS}
                "#
            ),
            params![
                Uuid::new_v4().to_string(),
                session.user_id,
                session.date,
                session.session_rpe,
                session.duration_minutes.to_string(),
                session.total_load.to_string(),
                session.rpe_load.to_string(),
                session.exercise_count,
                session.notes,
                Utc::now(),
            ],
            Self::session_from_row,
        )
        .map_err(store_error)
    }

    fn sessions_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StoredSession>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM session_logs \
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 \
             ORDER BY date DESC"
        ))?;

        let rows = stmt
            .query_map(params![user_id, from, to], Self::session_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)?;

        Ok(rows)
    }
}

fn decimal_column(row: &Row, column: &str) -> rusqlite::Result<Decimal> {
    let text: String = row.get(column)?;
    let index = row.as_ref().column_index(column)?;
    text.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

/// Rows that decode badly are reported as corrupt rather than as driver errors
fn store_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
            StoreError::Corrupt(format!("column {column}: {source}"))
        }
        rusqlite::Error::IntegralValueOutOfRange(column, value) => {
            StoreError::Corrupt(format!("column {column}: {value} is out of range"))
        }
        rusqlite::Error::InvalidColumnType(column, name, kind) => {
            StoreError::Corrupt(format!("column {column} ({name}): unexpected {kind} value"))
        }
        other => StoreError::Sqlite(other),
    }
}
