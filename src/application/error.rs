use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("resource not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },
    #[error("storage failure: {0}")]
    StorageFailure(String),
    #[error("database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for ApplicationError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => ApplicationError::NotFound,
            other => ApplicationError::DatabaseError(other.to_string()),
        }
    }
}
