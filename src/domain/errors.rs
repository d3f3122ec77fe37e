use super::models::Field;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("photo is {size} bytes, the limit is {limit} bytes")]
    PhotoTooLarge { size: usize, limit: usize },

    #[error("unsupported photo format: {0} (JPG or PNG expected)")]
    UnsupportedPhoto(String),

    #[error("could not read photo {path}: {reason}")]
    PhotoRead { path: String, reason: String },

    #[error("child slot {0} does not exist")]
    ChildOutOfRange(usize),

    #[error("field '{}' does not hold free text", .0.code())]
    NotTextField(Field),
}

pub type DomainResult<T> = Result<T, DomainError>;
