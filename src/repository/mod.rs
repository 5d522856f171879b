//! Persistence for extracted architecture records.

mod memory;
mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::StorageError;
use crate::models::ArchitectureRecord;

pub use memory::InMemoryArchitectureRepository;
pub use sqlite::SqliteDocumentStore;

/// Append-only document collection of architecture records.
///
/// There is no per-record update or delete, so concurrent writers never
/// contend over the same record.
#[async_trait]
pub trait ArchitectureRepository: Send + Sync {
    /// Append a record and return its identifier.
    async fn insert(&self, record: &ArchitectureRecord) -> Result<String, StorageError>;

    async fn list_all(&self) -> Result<Vec<ArchitectureRecord>, StorageError>;

    /// Remove every record and return how many were removed.
    async fn delete_all(&self) -> Result<u64, StorageError>;

    /// Release the underlying connection. Later calls fail with
    /// [`StorageError::Closed`] where the backend holds a connection.
    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Where records live, derived from the store connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    SqliteInMemory,
    SqliteFile(PathBuf),
}

impl StoreLocation {
    /// `memory://` keeps records in process, `sqlite::memory:` uses an
    /// in-memory SQLite database, and `sqlite://<dir>` or a bare directory
    /// path stores `<dir>/<database>.sqlite`. Any other `scheme://` is
    /// rejected.
    pub fn parse(uri: &str, database: &str) -> Result<Self, StorageError> {
        if database.is_empty() {
            return Err(StorageError::Config {
                reason: "database name must not be empty".to_string(),
            });
        }

        let location = match uri {
            "memory://" => Self::Memory,
            "sqlite::memory:" => Self::SqliteInMemory,
            _ if !uri.starts_with("sqlite://") && uri.contains("://") => {
                return Err(StorageError::Config {
                    reason: format!("unsupported store connection string '{}'", uri),
                });
            }
            _ => {
                let dir = uri.strip_prefix("sqlite://").unwrap_or(uri);
                if dir.is_empty() {
                    return Err(StorageError::Config {
                        reason: format!("store connection string '{}' has no path", uri),
                    });
                }
                Self::SqliteFile(PathBuf::from(dir).join(format!("{}.sqlite", database)))
            }
        };

        Ok(location)
    }
}

/// Open the store once; the returned handle is shared by every request.
pub fn connect(
    location: &StoreLocation,
    collection: &str,
) -> Result<Arc<dyn ArchitectureRepository>, StorageError> {
    let repository: Arc<dyn ArchitectureRepository> = match location {
        StoreLocation::Memory => Arc::new(InMemoryArchitectureRepository::new()),
        StoreLocation::SqliteInMemory => Arc::new(SqliteDocumentStore::open_in_memory(collection)?),
        StoreLocation::SqliteFile(path) => Arc::new(SqliteDocumentStore::open(path, collection)?),
    };

    info!("Connected to {:?} store, collection '{}'", location, collection);
    Ok(repository)
}
