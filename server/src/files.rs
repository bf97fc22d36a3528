use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{File, OpenOptions};
use tokio::io::{self, AsyncRead};

use crate::auth::{SessionAuthenticator, MAX_ATTEMPTS};
use crate::checksum;
use crate::domain::{FileRecord, MetadataStore, RenameOutcome};
use crate::error::ServiceError;
use crate::naming::StorageNameGenerator;

/// Opened stored file ready to be sent to the owner.
#[derive(Debug)]
pub struct Download {
    pub file: File,
    /// Name the file is presented under, never the storage name
    pub display_name: String,
    pub size: u64,
    pub checksum: String,
}

/// Upload, rename, delete, download and listing of a user's files.
///
/// Keeps the files under `root` and their metadata in the store consistent:
/// a committed record always points at an existing file of the recorded size.
pub struct FileStorageService<S> {
    store: Arc<S>,
    sessions: SessionAuthenticator<S>,
    names: StorageNameGenerator,
    root: PathBuf,
}

impl<S: MetadataStore> FileStorageService<S> {
    pub fn new(
        store: Arc<S>,
        sessions: SessionAuthenticator<S>,
        names: StorageNameGenerator,
        root: PathBuf,
    ) -> Self {
        Self {
            store,
            sessions,
            names,
            root,
        }
    }

    /// Stores `content` under `display_name`, replacing a file with the same name.
    ///
    /// The replaced file is removed before the new one is written and is not
    /// restored if the upload fails later.
    pub async fn upload<R>(
        &self,
        raw_token: &str,
        display_name: &str,
        content: &mut R,
        declared_size: Option<u64>,
    ) -> Result<(), ServiceError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let user = self.sessions.resolve(raw_token)?;

        if let Some(existing) = self
            .store
            .get_file_record(user.id, display_name)
            .map_err(ServiceError::store)?
        {
            self.remove_stored(&existing.storage_name).await?;
            self.store
                .delete_file_record(user.id, display_name)
                .map_err(ServiceError::store)?;
            tracing::info!("file: {display_name} of user {} replaced", user.id);
        }

        let (storage_name, file) = self.create_stored(display_name).await?;
        let mut pending = PendingFile::new(self.root.join(&storage_name));
        let copied = write_stored(file, content).await?;

        if let Some(declared) = declared_size.filter(|d| *d != copied.size) {
            tracing::warn!(
                "file: {display_name} declared size {declared} but {} bytes received",
                copied.size
            );
        }

        let record = FileRecord {
            id: None,
            user_id: user.id,
            display_name: display_name.to_owned(),
            storage_name,
            checksum: copied.checksum,
            size: copied.size,
        };
        let id = self
            .store
            .save_file_record(&record)
            .map_err(ServiceError::store)?;
        pending.commit();

        tracing::info!(
            "file: {display_name} read: {} file id: {id} user: {}",
            record.size,
            user.id
        );
        Ok(())
    }

    /// Removes the file. Only the caller whose metadata delete removed the row
    /// touches the filesystem, concurrent callers get `FileNotFound`.
    pub async fn delete(&self, raw_token: &str, display_name: &str) -> Result<(), ServiceError> {
        let user = self.sessions.resolve(raw_token)?;
        let record = self.find(user.id, display_name)?;

        let removed = self
            .store
            .delete_file_record(user.id, display_name)
            .map_err(ServiceError::store)?;
        if removed == 0 {
            return Err(ServiceError::FileNotFound(display_name.to_owned()));
        }

        self.remove_stored(&record.storage_name).await?;
        tracing::info!("file: {display_name} of user {} deleted", user.id);
        Ok(())
    }

    /// Changes the display name. Metadata only, the stored file is untouched.
    pub fn rename(
        &self,
        raw_token: &str,
        display_name: &str,
        new_display_name: &str,
    ) -> Result<(), ServiceError> {
        let user = self.sessions.resolve(raw_token)?;
        match self
            .store
            .rename_file_record(user.id, display_name, new_display_name)
            .map_err(ServiceError::store)?
        {
            RenameOutcome::Renamed => {
                tracing::info!("file: {display_name} renamed to {new_display_name}");
                Ok(())
            }
            RenameOutcome::TargetExists => {
                Err(ServiceError::FileAlreadyExists(new_display_name.to_owned()))
            }
            RenameOutcome::SourceMissing => {
                Err(ServiceError::FileNotFound(display_name.to_owned()))
            }
        }
    }

    /// Opens the stored file. The checksum is the one recorded at upload time.
    pub async fn download(
        &self,
        raw_token: &str,
        display_name: &str,
    ) -> Result<Download, ServiceError> {
        let user = self.sessions.resolve(raw_token)?;
        let record = self.find(user.id, display_name)?;
        let file = File::open(self.root.join(&record.storage_name)).await?;
        Ok(Download {
            file,
            display_name: record.display_name,
            size: record.size,
            checksum: record.checksum,
        })
    }

    /// Up to `limit` files of the user ordered by display name.
    pub fn list(&self, raw_token: &str, limit: i64) -> Result<Vec<FileRecord>, ServiceError> {
        let user = self.sessions.resolve(raw_token)?;
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        self.store
            .list_file_records(user.id, limit)
            .map_err(ServiceError::store)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find(&self, user_id: i64, display_name: &str) -> Result<FileRecord, ServiceError> {
        self.store
            .get_file_record(user_id, display_name)
            .map_err(ServiceError::store)?
            .ok_or_else(|| ServiceError::FileNotFound(display_name.to_owned()))
    }

    async fn create_stored(&self, display_name: &str) -> Result<(String, File), ServiceError> {
        for _ in 0..MAX_ATTEMPTS {
            let storage_name = self.names.generate(display_name);
            let created = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.root.join(&storage_name))
                .await;
            match created {
                Ok(file) => return Ok((storage_name, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::warn!("storage name collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Exhausted("storage name"))
    }

    async fn remove_stored(&self, storage_name: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.root.join(storage_name)).await {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("stored file {storage_name} already missing");
                Ok(())
            }
            other => other,
        }
    }
}

async fn write_stored<R>(mut file: File, content: &mut R) -> io::Result<checksum::Copied>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let copied = checksum::copy_and_hash(content, &mut file).await?;
    file.sync_all().await?;
    Ok(copied)
}

/// Removes a freshly written storage file unless the upload committed.
///
/// Dropping happens on copy failure, metadata failure and when the upload
/// future itself is dropped.
struct PendingFile {
    path: PathBuf,
    committed: bool,
}

impl PendingFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::error!("upload failed, removed {}", self.path.display()),
            Err(e) => tracing::error!("upload failed, {} not removed: {e}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_file_removed_when_not_committed() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial");
        std::fs::write(&path, b"ab").unwrap();

        // Act
        drop(PendingFile::new(path.clone()));

        // Assert
        assert!(!path.exists());
    }

    #[test]
    fn pending_file_kept_when_committed() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("complete");
        std::fs::write(&path, b"ab").unwrap();

        // Act
        let mut pending = PendingFile::new(path.clone());
        pending.commit();
        drop(pending);

        // Assert
        assert!(path.exists());
    }
}
