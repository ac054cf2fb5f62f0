//! Error types for ByteBucket.

use thiserror::Error;

use crate::multipart::MultipartError;

/// Classification of a storage failure, independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced row does not exist.
    ForeignKeyConstraint,
    /// A uniqueness rule would be violated.
    UniqueConstraint,
    /// A required value is missing or empty.
    NotNullConstraint,
    /// The targeted row (or blob) does not exist.
    NoRowsAffected,
    /// Anything else reported by the database engine or the filesystem.
    EngineFailure,
}

/// Common error type for ByteBucket.
#[derive(Error, Debug)]
pub enum BucketError {
    /// Foreign key constraint violation.
    #[error("foreign key constraint: {0}")]
    ForeignKeyConstraint(String),

    /// Unique constraint violation.
    #[error("unique constraint: {0}")]
    UniqueConstraint(String),

    /// Not-null (or non-empty) constraint violation.
    #[error("not null constraint: {0}")]
    NotNullConstraint(String),

    /// The operation targeted something that does not exist.
    #[error("no rows affected: {0}")]
    NoRowsAffected(String),

    /// Generic database engine error.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed multipart request body.
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

impl BucketError {
    /// Get the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BucketError::ForeignKeyConstraint(_) => ErrorKind::ForeignKeyConstraint,
            BucketError::UniqueConstraint(_) => ErrorKind::UniqueConstraint,
            BucketError::NotNullConstraint(_) => ErrorKind::NotNullConstraint,
            BucketError::NoRowsAffected(_) => ErrorKind::NoRowsAffected,
            BucketError::Database(_)
            | BucketError::Io(_)
            | BucketError::Config(_)
            | BucketError::Multipart(_) => ErrorKind::EngineFailure,
        }
    }

    /// Get the human-readable message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            BucketError::ForeignKeyConstraint(msg)
            | BucketError::UniqueConstraint(msg)
            | BucketError::NotNullConstraint(msg)
            | BucketError::NoRowsAffected(msg)
            | BucketError::Database(msg)
            | BucketError::Config(msg) => msg.clone(),
            BucketError::Io(e) => e.to_string(),
            BucketError::Multipart(e) => e.to_string(),
        }
    }

    /// Classify a sqlx error, using relation-specific messages for constraint violations.
    pub(crate) fn from_sqlx(err: sqlx::Error, messages: &ConstraintMessages) -> Self {
        use sqlx::error::ErrorKind as SqlxKind;

        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.kind() {
                SqlxKind::ForeignKeyViolation => {
                    return BucketError::ForeignKeyConstraint(messages.foreign_key.to_string())
                }
                SqlxKind::UniqueViolation => {
                    return BucketError::UniqueConstraint(messages.unique.to_string())
                }
                SqlxKind::NotNullViolation | SqlxKind::CheckViolation => {
                    return BucketError::NotNullConstraint(messages.not_null.to_string())
                }
                _ => {}
            }
        }
        BucketError::Database(err.to_string())
    }
}

/// Messages reported when a statement on a given relation violates a constraint.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConstraintMessages {
    pub foreign_key: &'static str,
    pub unique: &'static str,
    pub not_null: &'static str,
}

// Conversion from sqlx errors
impl From<sqlx::Error> for BucketError {
    fn from(e: sqlx::Error) -> Self {
        BucketError::from_sqlx(
            e,
            &ConstraintMessages {
                foreign_key: "Referenced row doesn't exist",
                unique: "Row already exists",
                not_null: "Required value is missing",
            },
        )
    }
}

/// Result type alias for ByteBucket operations.
pub type Result<T> = std::result::Result<T, BucketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_error_display() {
        let err = BucketError::UniqueConstraint("A tag with this name already exists".to_string());
        assert_eq!(
            err.to_string(),
            "unique constraint: A tag with this name already exists"
        );
        assert_eq!(err.message(), "A tag with this name already exists");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            BucketError::ForeignKeyConstraint(String::new()).kind(),
            ErrorKind::ForeignKeyConstraint
        );
        assert_eq!(
            BucketError::NotNullConstraint(String::new()).kind(),
            ErrorKind::NotNullConstraint
        );
        assert_eq!(
            BucketError::NoRowsAffected(String::new()).kind(),
            ErrorKind::NoRowsAffected
        );
        assert_eq!(
            BucketError::Database(String::new()).kind(),
            ErrorKind::EngineFailure
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: BucketError = io_err.into();
        assert!(matches!(err, BucketError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_non_database_sqlx_error_is_engine_failure() {
        let err: BucketError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
    }
}
