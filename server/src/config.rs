use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DB_FILE: &str = "cloudstore.db";
const CURRENT_DIR: &str = "./";
const FILES_DIR: &str = "files";
const PORT: u16 = 5000;
const MAX_BODY: usize = 2 * 1024 * 1024 * 1024; /* 2GB */
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Server settings read from `CLOUDSTORE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub db: PathBuf,
    /// Root directory of stored files
    pub files_dir: PathBuf,
    pub port: u16,
    pub max_body: usize,
    pub request_timeout: Duration,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        let dir = PathBuf::from(var("CLOUDSTORE_DATA_DIR").unwrap_or_else(|| CURRENT_DIR.into()));
        let db_file = var("CLOUDSTORE_DATA_FILE").unwrap_or_else(|| DB_FILE.into());
        let files_dir = var("CLOUDSTORE_FILES_DIR")
            .map_or_else(|| dir.join(FILES_DIR), PathBuf::from);

        Self {
            db: dir.join(db_file),
            files_dir,
            port: parsed("CLOUDSTORE_PORT", PORT),
            max_body: parsed("CLOUDSTORE_MAX_BODY", MAX_BODY),
            request_timeout: Duration::from_secs(parsed(
                "CLOUDSTORE_REQUEST_TIMEOUT",
                REQUEST_TIMEOUT_SECS,
            )),
        }
    }

    /// Settings for a store rooted at `dir`, other values default.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            db: dir.join(DB_FILE),
            files_dir: dir.join(FILES_DIR),
            port: PORT,
            max_body: MAX_BODY,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parsed<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match var(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("invalid {name} value '{raw}', using {default}");
            default
        }),
        None => default,
    }
}
