//! Household persistence
//!
//! SQLite through `rusqlite` for the service, plus an in-memory mock for
//! tests. Both sit behind [`DirectoryRepository`].

pub mod error;
pub mod repository;

pub use error::{StorageError, StorageResult};
pub use repository::{
    create_mock_repository, create_sqlite_repository, DirectoryRepository, ListQuery,
    MockDirectoryRepository, Page, SharedDirectoryRepository, SortField, SortOrder,
    SqliteDirectoryRepository, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
