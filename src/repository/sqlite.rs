//! SQLite-backed document collection.
//!
//! Each collection is a table of JSON documents keyed by an internal
//! autoincrement column that never leaves this module.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::ArchitectureRepository;
use crate::error::StorageError;
use crate::models::ArchitectureRecord;

pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Option<Connection>>>,
    collection: String,
}

impl SqliteDocumentStore {
    pub fn open(db_path: &Path, collection: &str) -> Result<Self, StorageError> {
        validate_collection(collection)?;

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened document store at {}", db_path.display());

        Self::with_schema(conn, collection)
    }

    pub fn open_in_memory(collection: &str) -> Result<Self, StorageError> {
        validate_collection(collection)?;
        Self::with_schema(Connection::open_in_memory()?, collection)
    }

    fn with_schema(conn: Connection, collection: &str) -> Result<Self, StorageError> {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{collection}" (
                _key     INTEGER PRIMARY KEY AUTOINCREMENT,
                document TEXT NOT NULL
            );
            "#
        ))?;
        debug!("Collection '{}' ready", collection);

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            collection: collection.to_string(),
        })
    }

    /// Run blocking SQLite work on the blocking pool.
    async fn with_connection<T, F>(&self, work: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection, &str) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();

        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let conn = guard.as_ref().ok_or(StorageError::Closed)?;
            work(conn, &collection)
        })
        .await?
    }
}

fn validate_collection(name: &str) -> Result<(), StorageError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::Config {
            reason: format!("invalid collection name '{}'", name),
        })
    }
}

#[async_trait]
impl ArchitectureRepository for SqliteDocumentStore {
    async fn insert(&self, record: &ArchitectureRecord) -> Result<String, StorageError> {
        let document = serde_json::to_string(record)?;
        let id = record.id.clone();

        self.with_connection(move |conn, collection| {
            conn.execute(
                &format!(r#"INSERT INTO "{collection}" (document) VALUES (?1)"#),
                params![document],
            )?;
            Ok(())
        })
        .await?;

        debug!("Inserted document {}", id);
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<ArchitectureRecord>, StorageError> {
        self.with_connection(|conn, collection| {
            let mut stmt =
                conn.prepare(&format!(r#"SELECT document FROM "{collection}" ORDER BY _key"#))?;
            let documents = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            documents
                .iter()
                .map(|document| serde_json::from_str(document).map_err(StorageError::from))
                .collect()
        })
        .await
    }

    async fn delete_all(&self) -> Result<u64, StorageError> {
        self.with_connection(|conn, collection| {
            let removed = conn.execute(&format!(r#"DELETE FROM "{collection}""#), [])?;
            Ok(removed as u64)
        })
        .await
    }

    async fn close(&self) -> Result<(), StorageError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match guard.take() {
                Some(conn) => conn.close().map_err(|(_, e)| StorageError::from(e)),
                None => Ok(()),
            }
        })
        .await??;

        info!("Document store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_must_be_identifiers() {
        assert!(validate_collection("architectures").is_ok());
        assert!(validate_collection("_arch_2").is_ok());
        assert!(validate_collection("").is_err());
        assert!(validate_collection("2arch").is_err());
        assert!(validate_collection("arch\"; DROP TABLE x; --").is_err());
        assert!(validate_collection("with space").is_err());
    }
}
