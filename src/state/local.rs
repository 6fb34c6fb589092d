use rusqlite::{Connection, OptionalExtension, Result as SqlResult};
use std::path::{Path, PathBuf};

/// The LocalStore is the device-scoped persistence backend.
///
/// It is a small key/value table inside a SQLite file in the user's
/// data directory. Each logical slot (roster, catalog, configuration,
/// active session) is an independent row, so rewriting one slot can
/// never corrupt another. Parsing slot contents is the caller's job;
/// this layer only moves strings in and out.
pub struct LocalStore {
    conn: Connection,
    db_path: PathBuf,
}

impl LocalStore {
    /// Open the store in the user's data directory.
    ///
    /// The database file is created at:
    /// - Linux: ~/.local/share/family-vault/vault.db
    /// - macOS: ~/Library/Application Support/family-vault/vault.db
    /// - Windows: %APPDATA%\family-vault\vault.db
    pub fn open() -> SqlResult<Self> {
        Self::open_at(&Self::default_db_path())
    }

    /// Open the store at an explicit path (parent directories are created)
    pub fn open_at(db_path: &Path) -> SqlResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .expect("Failed to create application data directory");
        }

        let conn = Connection::open(db_path)?;
        let store = LocalStore {
            conn,
            db_path: db_path.to_path_buf(),
        };
        store.init_schema()?;

        println!("📁 Local store initialized at: {}", db_path.display());

        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = LocalStore {
            conn,
            db_path: PathBuf::from(":memory:"),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Where the database lives by default
    fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .expect("Could not determine user data directory");

        path.push("family-vault");
        path.push("vault.db");
        path
    }

    fn init_schema(&self) -> SqlResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS slots (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Read a slot. A missing key is `None`, never an error.
    pub fn get(&self, key: &str) -> Option<String> {
        self.conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .unwrap_or_else(|e| {
                eprintln!("⚠️  Failed to read slot '{}': {}", key, e);
                None
            })
    }

    /// Write a slot, replacing any previous value
    pub fn set(&self, key: &str, value: &str) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO slots (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Delete a slot. Deleting a missing key is fine.
    pub fn remove(&self, key: &str) -> SqlResult<()> {
        self.conn.execute("DELETE FROM slots WHERE key = ?1", [key])?;
        Ok(())
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.get("nothing_here"), None);
    }

    #[test]
    fn test_set_get_overwrite() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set("greeting", "hello").unwrap();
        assert_eq!(store.get("greeting").as_deref(), Some("hello"));

        store.set("greeting", "hi again").unwrap();
        assert_eq!(store.get("greeting").as_deref(), Some("hi again"));
    }

    #[test]
    fn test_slots_are_independent() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set("small", "x").unwrap();

        // A very large write to one slot must not disturb another
        let big = "y".repeat(512 * 1024);
        store.set("big", &big).unwrap();

        assert_eq!(store.get("small").as_deref(), Some("x"));
        assert_eq!(store.get("big").map(|v| v.len()), Some(big.len()));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
        store.remove("k").unwrap();
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = std::env::temp_dir().join(format!("family-vault-test-{}", std::process::id()));
        let db_path = dir.join("vault.db");

        {
            let store = LocalStore::open_at(&db_path).unwrap();
            store.set("k", "survives").unwrap();
        }

        let store = LocalStore::open_at(&db_path).unwrap();
        assert_eq!(store.get("k").as_deref(), Some("survives"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
