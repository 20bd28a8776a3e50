use thiserror::Error;

/// Domain-neutral storage sentinels.
///
/// Backend-specific error codes are folded into these here, at the repository
/// boundary; HTTP status mapping happens later in the handlers' error tables.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate value for unique constraint: {0}")]
    Duplicate(String),

    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return DbError::NotFound;
        }
        if let sqlx::Error::Database(db) = &err {
            // Postgres class 23: integrity constraint violations
            match db.code().as_deref() {
                Some("23505") => {
                    return DbError::Duplicate(db.constraint().unwrap_or("unknown").to_string())
                }
                Some("23503") => {
                    return DbError::ForeignKey(db.constraint().unwrap_or("unknown").to_string())
                }
                _ => {}
            }
        }
        DbError::Sqlx(err)
    }
}
