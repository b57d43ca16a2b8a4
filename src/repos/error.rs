/**
 * Responsibility
 * - What the repos tell the layers above when storage fails
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepoError {
    /// Give unique-constraint violations (SQLSTATE 23505) their own meaning.
    pub fn from_sqlx(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            return RepoError::Conflict(conflict.to_string());
        }
        RepoError::Db(e)
    }
}
