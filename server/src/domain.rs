use std::fmt::{Debug, Display};

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
}

/// Metadata of a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// `None` until the record is first saved
    pub id: Option<i64>,
    pub user_id: i64,
    /// User visible name, unique among the owner's files
    pub display_name: String,
    /// Name of the file under the storage root, unique across all users
    pub storage_name: String,
    /// Lowercase hex SHA-256 of the content
    pub checksum: String,
    pub size: u64,
}

/// Result of [`MetadataStore::rename_file_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    TargetExists,
    SourceMissing,
}

/// Persistent users, sessions and file metadata.
///
/// Implementations must be safe to call from many tasks at once, the store is
/// the only synchronization point of the services built on top of it.
pub trait MetadataStore: Send + Sync {
    type Err: std::error::Error + Debug + Display + Send + Sync + 'static;

    fn new_database(&self) -> Result<(), Self::Err>;

    /// Inserts a user. Returns `None` when the login is already taken.
    fn add_user(&self, login: &str, password_hash: &str) -> Result<Option<i64>, Self::Err>;

    fn find_user_by_login(&self, login: &str) -> Result<Option<User>, Self::Err>;

    /// Binds `token` to the user. Returns `false` when the token is already in use.
    fn save_session(&self, token: &str, user_id: i64) -> Result<bool, Self::Err>;

    /// Returns the number of sessions removed.
    fn delete_session(&self, token: &str) -> Result<usize, Self::Err>;

    fn find_user_by_session_token(&self, token: &str) -> Result<Option<User>, Self::Err>;

    /// Inserts the record when `id` is `None`, otherwise updates the row with that id.
    fn save_file_record(&self, record: &FileRecord) -> Result<i64, Self::Err>;

    /// Returns the number of rows removed.
    fn delete_file_record(&self, user_id: i64, display_name: &str) -> Result<usize, Self::Err>;

    fn get_file_record(
        &self,
        user_id: i64,
        display_name: &str,
    ) -> Result<Option<FileRecord>, Self::Err>;

    /// At most `limit` records of the user ordered by display name.
    fn list_file_records(&self, user_id: i64, limit: u32) -> Result<Vec<FileRecord>, Self::Err>;

    /// Changes the display name of a record atomically.
    ///
    /// The target check, the source lookup and the update observe one snapshot.
    fn rename_file_record(
        &self,
        user_id: i64,
        display_name: &str,
        new_display_name: &str,
    ) -> Result<RenameOutcome, Self::Err>;
}
