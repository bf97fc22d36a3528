use sha2::{Digest, Sha256};
use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of [`copy_and_hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Copied {
    /// Lowercase hex encoded SHA-256 of all bytes copied
    pub checksum: String,
    /// Number of bytes copied
    pub size: u64,
}

/// Copies `source` to `destination` until EOF, hashing every byte on the way.
///
/// Memory use is bounded by a single buffer regardless of the stream length.
/// On error `destination` may hold a partial write, discarding it is up to the caller.
pub async fn copy_and_hash<R, W>(source: &mut R, destination: &mut W) -> io::Result<Copied>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut size = 0u64;

    loop {
        let read = source.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        let chunk = &buffer[..read];
        hasher.update(chunk);
        destination.write_all(chunk).await?;
        size += read as u64;
    }
    destination.flush().await?;

    Ok(Copied {
        checksum: hex::encode(hasher.finalize()),
        size,
    })
}
