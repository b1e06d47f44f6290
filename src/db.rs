use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Params, Transaction};
use rusqlite_migration::Migrations;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, StoreError};

/// Trait for types that can be read back from a query row.
pub trait Entity: Serialize + DeserializeOwned {}

// Blanket implementation for any type that meets the requirements
impl<T> Entity for T where T: Serialize + DeserializeOwned {}

/// Handle to the SQLite database. Cloning is cheap; all clones share one
/// connection behind a read/write lock, so writers are serialized and the
/// database transaction manager is the only consistency mechanism.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        // Cascade deletes from translations/images to their blog are
        // enforced by the schema and require foreign keys to be on.
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Db {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self, migrations: &Migrations) -> Result<()> {
        let mut conn = self.write_lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| StoreError::Storage(e.into()))?;
        Ok(())
    }

    /// Calls the supplied closure with a database transaction. Commits if
    /// the closure returns Ok, otherwise rolls back; the lock and the
    /// transaction are released on every exit path.
    pub fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let mut conn = self.write_lock()?;
        let txn = conn.transaction()?;
        let result = f(&txn)?;
        txn.commit()?;
        Ok(result)
    }

    /// Runs a single read statement, mapping each row onto `T` by column
    /// name. Reads are non-transactional and observe any committed state.
    pub fn query<T: Entity, P: Params>(&self, sql: &str, params: P) -> Result<Vec<T>> {
        let conn = self.read_lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = serde_rusqlite::from_rows::<T>(stmt.query(params)?)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Storage(e.into()))?;
        Ok(rows)
    }

    /// Cheap liveness probe for health checks.
    pub fn ping(&self) -> Result<()> {
        let conn = self.read_lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn read_lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Storage(anyhow::anyhow!("failed to acquire read lock")))
    }

    fn write_lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Storage(anyhow::anyhow!("failed to acquire write lock")))
    }
}

#[cfg(test)]
mod tests {
    use rusqlite_migration::{Migrations, M};
    use serde::{Deserialize, Serialize};

    use super::Db;
    use crate::error::StoreError;

    #[derive(Serialize, Deserialize, Clone, Default, Debug)]
    pub struct Note {
        pub id: i64,
        pub body: String,
    }

    fn notes_db() -> anyhow::Result<Db> {
        let db = Db::open_memory()?;
        let migrations = Migrations::new(vec![M::up(
            "CREATE TABLE notes (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                body TEXT NOT NULL
            );",
        )]);
        db.migrate(&migrations)?;
        Ok(db)
    }

    #[test]
    fn open_memory() -> anyhow::Result<()> {
        let _ = Db::open_memory()?;
        Ok(())
    }

    #[test]
    fn transaction_commits_on_ok() -> anyhow::Result<()> {
        let db = notes_db()?;
        db.transaction(|txn| {
            txn.execute("INSERT INTO notes (body) VALUES ('first')", [])?;
            txn.execute("INSERT INTO notes (body) VALUES ('second')", [])?;
            Ok(())
        })?;

        let notes: Vec<Note> = db.query("SELECT id, body FROM notes ORDER BY id", [])?;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].body, "first");
        Ok(())
    }

    #[test]
    fn transaction_rolls_back_on_err() -> anyhow::Result<()> {
        let db = notes_db()?;
        let result = db.transaction(|txn| {
            txn.execute("INSERT INTO notes (body) VALUES ('doomed')", [])?;
            Err::<(), _>(StoreError::Validation("forced failure".to_string()))
        });
        assert!(result.is_err());

        // The insert before the failure must not be observable.
        let notes: Vec<Note> = db.query("SELECT id, body FROM notes", [])?;
        assert!(notes.is_empty());
        Ok(())
    }

    #[test]
    fn query_with_parameters() -> anyhow::Result<()> {
        let db = notes_db()?;
        db.transaction(|txn| {
            txn.execute("INSERT INTO notes (body) VALUES ('keep')", [])?;
            txn.execute("INSERT INTO notes (body) VALUES ('skip')", [])?;
            Ok(())
        })?;

        let notes: Vec<Note> =
            db.query("SELECT id, body FROM notes WHERE body = ?1", ["keep"])?;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].body, "keep");
        Ok(())
    }
}
