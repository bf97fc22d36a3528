use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{
    params, Connection, Error, OpenFlags, OptionalExtension, Row, TransactionBehavior,
};

use crate::domain::{FileRecord, MetadataStore, RenameOutcome, User};

const CACHE_SIZE: &str = "4096";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const FILE_COLUMNS: &str = "id, user_id, display_name, storage_name, checksum, size";

pub enum Mode {
    ReadWrite,
    ReadOnly,
}

/// SQLite backed [`MetadataStore`].
///
/// Every operation opens its own connection so the store can be shared
/// between tasks without locking.
#[derive(Debug, Clone)]
pub struct Sqlite {
    path: PathBuf,
}

impl MetadataStore for Sqlite {
    type Err = Error;

    fn new_database(&self) -> Result<(), Self::Err> {
        let conn = self.open(Mode::ReadWrite)?;
        conn.pragma_update(None, "encoding", "UTF-8")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                  id             INTEGER PRIMARY KEY AUTOINCREMENT,
                  login          TEXT NOT NULL UNIQUE,
                  password_hash  TEXT NOT NULL
                  )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                  access_token  TEXT PRIMARY KEY,
                  user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
                  )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS files (
                  id            INTEGER PRIMARY KEY AUTOINCREMENT,
                  user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                  display_name  TEXT NOT NULL,
                  storage_name  TEXT NOT NULL UNIQUE,
                  checksum      TEXT NOT NULL,
                  size          INTEGER NOT NULL
                  )",
            [],
        )?;

        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS unique_user_file_ix ON files(user_id, display_name)",
            [],
        )?;

        Ok(())
    }

    fn add_user(&self, login: &str, password_hash: &str) -> Result<Option<i64>, Self::Err> {
        let conn = self.open(Mode::ReadWrite)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (login, password_hash) VALUES (?1, ?2)",
            params![login, password_hash],
        )?;
        Ok((inserted > 0).then(|| conn.last_insert_rowid()))
    }

    fn find_user_by_login(&self, login: &str) -> Result<Option<User>, Self::Err> {
        let conn = self.open(Mode::ReadOnly)?;
        conn.query_row(
            "SELECT id, login, password_hash FROM users WHERE login = ?1",
            params![login],
            user,
        )
        .optional()
    }

    fn save_session(&self, token: &str, user_id: i64) -> Result<bool, Self::Err> {
        let conn = self.open(Mode::ReadWrite)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO sessions (access_token, user_id) VALUES (?1, ?2)",
            params![token, user_id],
        )?;
        Ok(inserted > 0)
    }

    fn delete_session(&self, token: &str) -> Result<usize, Self::Err> {
        let conn = self.open(Mode::ReadWrite)?;
        conn.execute(
            "DELETE FROM sessions WHERE access_token = ?1",
            params![token],
        )
    }

    fn find_user_by_session_token(&self, token: &str) -> Result<Option<User>, Self::Err> {
        let conn = self.open(Mode::ReadOnly)?;
        conn.query_row(
            "SELECT u.id, u.login, u.password_hash
               FROM users u
               JOIN sessions s ON s.user_id = u.id
              WHERE s.access_token = ?1",
            params![token],
            user,
        )
        .optional()
    }

    fn save_file_record(&self, record: &FileRecord) -> Result<i64, Self::Err> {
        let conn = self.open(Mode::ReadWrite)?;
        conn.prepare_cached(
            "INSERT INTO files (id, user_id, display_name, storage_name, checksum, size)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    user_id = excluded.user_id,
                    display_name = excluded.display_name,
                    storage_name = excluded.storage_name,
                    checksum = excluded.checksum,
                    size = excluded.size",
        )?
        .execute(params![
            record.id,
            record.user_id,
            record.display_name,
            record.storage_name,
            record.checksum,
            i64::try_from(record.size).unwrap_or(i64::MAX),
        ])?;

        Ok(record.id.unwrap_or_else(|| conn.last_insert_rowid()))
    }

    fn delete_file_record(&self, user_id: i64, display_name: &str) -> Result<usize, Self::Err> {
        let conn = self.open(Mode::ReadWrite)?;
        conn.execute(
            "DELETE FROM files WHERE user_id = ?1 AND display_name = ?2",
            params![user_id, display_name],
        )
    }

    fn get_file_record(
        &self,
        user_id: i64,
        display_name: &str,
    ) -> Result<Option<FileRecord>, Self::Err> {
        let conn = self.open(Mode::ReadOnly)?;
        conn.query_row(
            &format!("SELECT {FILE_COLUMNS} FROM files WHERE user_id = ?1 AND display_name = ?2"),
            params![user_id, display_name],
            file_record,
        )
        .optional()
    }

    fn list_file_records(&self, user_id: i64, limit: u32) -> Result<Vec<FileRecord>, Self::Err> {
        let conn = self.open(Mode::ReadOnly)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ?1 ORDER BY display_name LIMIT ?2"
        ))?;
        let records = stmt
            .query_map(params![user_id, limit], file_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn rename_file_record(
        &self,
        user_id: i64,
        display_name: &str,
        new_display_name: &str,
    ) -> Result<RenameOutcome, Self::Err> {
        let mut conn = self.open(Mode::ReadWrite)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let target_exists = tx
            .prepare("SELECT 1 FROM files WHERE user_id = ?1 AND display_name = ?2")?
            .exists(params![user_id, new_display_name])?;
        if target_exists {
            return Ok(RenameOutcome::TargetExists);
        }

        let updated = tx.execute(
            "UPDATE files SET display_name = ?3 WHERE user_id = ?1 AND display_name = ?2",
            params![user_id, display_name, new_display_name],
        )?;
        if updated == 0 {
            return Ok(RenameOutcome::SourceMissing);
        }

        tx.commit()?;
        Ok(RenameOutcome::Renamed)
    }
}

impl Sqlite {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn open(&self, mode: Mode) -> Result<Connection, Error> {
        let conn = match mode {
            Mode::ReadWrite => Connection::open(&self.path),
            Mode::ReadOnly => {
                Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            }
        }?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "cache_size", CACHE_SIZE)?;
        Ok(conn)
    }
}

fn user(row: &Row<'_>) -> Result<User, Error> {
    Ok(User {
        id: row.get(0)?,
        login: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

fn file_record(row: &Row<'_>) -> Result<FileRecord, Error> {
    let size: i64 = row.get(5)?;
    Ok(FileRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        display_name: row.get(2)?,
        storage_name: row.get(3)?,
        checksum: row.get(4)?,
        size: u64::try_from(size).unwrap_or_default(),
    })
}
