//! Errors surfaced by repository operations.

use crate::model::Resource;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(Resource),

    /// A write would break a uniqueness constraint.
    #[error("{0} conflicts with an existing record")]
    Conflict(Resource),

    /// Any other store failure, left unclassified.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Narrow a failed write into a domain error.
    ///
    /// Unique violations become [`StoreError::Conflict`] on `resource`, and a
    /// missing foreign-key target becomes [`StoreError::NotFound`] on `owner`.
    /// Everything else keeps its cause and stays unclassified.
    pub fn from_write(err: sqlx::Error, resource: Resource, owner: Option<Resource>) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                log::warn!(
                    "{} write rejected by constraint {:?}",
                    resource,
                    db_err.constraint()
                );
                return StoreError::Conflict(resource);
            }
            if let Some(owner) = owner {
                if db_err.is_foreign_key_violation() {
                    return StoreError::NotFound(owner);
                }
            }
        }

        StoreError::Other(anyhow::Error::new(err).context(format!("Failed to save {}", resource)))
    }
}
