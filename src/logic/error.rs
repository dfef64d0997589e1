use thiserror::Error;

use crate::logic::validate::ValidationErrors;
use crate::store::StoreError;

/// Failure of a resource operation, before it is mapped to a response.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
