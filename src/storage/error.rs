//! Error types for the storage module

use thiserror::Error;

/// Result type for repository operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Repository errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// No household with this identifier
    #[error("household {id} not found")]
    NotFound { id: i64 },

    /// A member in an update belongs to another household
    #[error("member {member_id} does not belong to household {household_id}")]
    ForeignMember { member_id: i64, household_id: i64 },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// True when the request referenced something missing or foreign
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ForeignMember { .. })
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            Self::Io(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StorageError::not_found(42);
        assert_eq!(err.to_string(), "household 42 not found");
        assert!(err.is_not_found());
        assert!(!err.is_recoverable());
    }
}
