use thiserror::Error;

/// SQLSTATE for exclusion-constraint violations, raised by the
/// no-overlapping-rules constraint on `availability_rules`.
const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::Database(db) if is_conflict(db.as_ref()) => DatabaseError::Duplicate,
            _ => DatabaseError::Sqlx(err),
        }
    }
}

/// Unique and exclusion violations both mean "a constrained row already
/// exists"; callers treat them uniformly as `Duplicate`.
fn is_conflict(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.is_unique_violation() || db.code().as_deref() == Some(EXCLUSION_VIOLATION)
}

impl DatabaseError {
    /// True when an insert bounced off a UNIQUE or EXCLUDE constraint.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::Duplicate)
    }
}
