pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use error::StoreError;
pub use store::{PasteStore, UserLookup, UserStore};

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

const READER_POOL_SIZE: usize = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store with a single writer and a pool of read-only
/// connections. All writes are serialized through the writer mutex, so every
/// statement is observed either fully applied or not at all.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Single-connection database that lives only as long as the value.
    /// Reads go through the writer connection.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let writer = Connection::open_in_memory()?;
        writer.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        if self.readers.is_empty() {
            return self.with_conn_mut(f);
        }
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("reader lock poisoned: {}", e)))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self
            .writer
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("writer lock poisoned: {}", e)))?;
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pastebox_types::models::{Paste, Privacy};
    use tempfile::TempDir;

    fn paste(id: i64) -> Paste {
        Paste {
            id,
            title: format!("paste {}", id),
            body: format!("body {}", id),
            created_at: Utc::now(),
            expires_at: None,
            delete_after_read: false,
            privacy: Privacy::Public,
            password_hash: None,
            syntax: String::new(),
            owner_id: None,
        }
    }

    fn file_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("pastebox.db")).unwrap();
        assert_eq!(db.readers.len(), READER_POOL_SIZE);
        (dir, db)
    }

    #[test]
    fn readers_see_committed_writes() {
        let (_dir, db) = file_db();

        db.insert_paste(&paste(1)).unwrap();
        // Cycle through every reader connection.
        for _ in 0..READER_POOL_SIZE * 2 {
            let owned = db.get_paste(1, Utc::now()).unwrap().unwrap();
            assert_eq!(owned.paste.body, "body 1");
        }

        assert!(db.delete_paste(1).unwrap());
        for _ in 0..READER_POOL_SIZE * 2 {
            assert!(db.get_paste(1, Utc::now()).unwrap().is_none());
        }
    }

    #[test]
    fn concurrent_create_get_and_burn() {
        const THREADS: i64 = 8;
        const PER_THREAD: i64 = 50;

        let (_dir, db) = file_db();

        std::thread::scope(|s| {
            for t in 0..THREADS {
                let db = &db;
                s.spawn(move || {
                    for i in 0..PER_THREAD {
                        let id = t * 1000 + i;
                        db.insert_paste(&paste(id)).unwrap();

                        let owned = db.get_paste(id, Utc::now()).unwrap().unwrap();
                        assert_eq!(owned.paste.body, format!("body {}", id));

                        if i % 2 == 0 {
                            assert!(db.delete_paste(id).unwrap());
                            assert!(db.get_paste(id, Utc::now()).unwrap().is_none());
                        }
                    }
                });
            }
        });

        let left = db.list_pastes(None, Utc::now()).unwrap();
        assert_eq!(left.len() as i64, THREADS * PER_THREAD / 2);
        assert!(left.iter().all(|p| p.id % 1000 % 2 == 1));
    }

    #[test]
    fn reopening_keeps_data_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pastebox.db");

        Database::open(&path).unwrap().insert_paste(&paste(9)).unwrap();

        let db = Database::open(&path).unwrap();
        assert!(db.get_paste(9, Utc::now()).unwrap().is_some());
    }
}
