use std::path::{Path, PathBuf};

use comfy_table::{
    presets::UTF8_HORIZONTAL_ONLY, Attribute, Cell, CellAlignment, ContentArrangement, Table,
};
use futures::TryStreamExt;
use kernel::{
    Credentials, ErrorResponse, FileEntry, LoginResponse, RenameRequest, AUTH_TOKEN_HEADER,
    CHECKSUM_HEADER,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use resource::Resource;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::{ReaderStream, StreamReader};

pub mod resource;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server URI '{0}'")]
    Uri(String),
    #[error("invalid file path '{0}'")]
    Path(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("server responded {status}: {message}")]
    Server { status: u16, message: String },
}

/// File saved by [`download_file`].
pub struct Downloaded {
    pub path: PathBuf,
    pub size: u64,
    pub checksum: Option<String>,
}

pub async fn register(uri: &str, credentials: &Credentials) -> Result<(), ClientError> {
    let resource = endpoint(uri, "registration")?;
    let response = Client::new()
        .post(resource.to_string())
        .json(credentials)
        .send()
        .await?;
    check(response).await?;
    Ok(())
}

/// Returns the access token of the new session.
pub async fn login(uri: &str, credentials: &Credentials) -> Result<String, ClientError> {
    let resource = endpoint(uri, "login")?;
    let response = Client::new()
        .post(resource.to_string())
        .json(credentials)
        .send()
        .await?;
    let reply: LoginResponse = check(response).await?.json().await?;
    Ok(reply.auth_token)
}

pub async fn logout(uri: &str, token: &str) -> Result<(), ClientError> {
    let resource = endpoint(uri, "logout")?;
    let response = Client::new()
        .post(resource.to_string())
        .header(AUTH_TOKEN_HEADER, token)
        .send()
        .await?;
    check(response).await?;
    Ok(())
}

/// Streams a local file to the server under its own file name.
pub async fn upload_file(uri: &str, token: &str, path: &Path) -> Result<String, ClientError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ClientError::Path(path.display().to_string()))?
        .to_owned();

    let mut resource = endpoint(uri, "file")?;
    resource.append_query("filename", &filename);

    let f = File::open(path).await?;
    let length = f.metadata().await?.len();
    let body = reqwest::Body::wrap_stream(ReaderStream::new(f));
    let part = Part::stream_with_length(body, length).file_name(filename.clone());
    let form = Form::new().part("file", part);

    let response = Client::new()
        .post(resource.to_string())
        .header(AUTH_TOKEN_HEADER, token)
        .multipart(form)
        .send()
        .await?;
    check(response).await?;
    Ok(filename)
}

/// Saves file `filename` into `target_dir` streaming it from the server.
pub async fn download_file(
    uri: &str,
    token: &str,
    filename: &str,
    target_dir: &Path,
) -> Result<Downloaded, ClientError> {
    let local_name = Path::new(filename)
        .file_name()
        .ok_or_else(|| ClientError::Path(filename.to_owned()))?;
    let path = target_dir.join(local_name);

    let mut resource = endpoint(uri, "file")?;
    resource.append_query("filename", filename);

    let response = Client::new()
        .get(resource.to_string())
        .header(AUTH_TOKEN_HEADER, token)
        .send()
        .await?;
    let response = check(response).await?;
    let checksum = response
        .headers()
        .get(CHECKSUM_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let stream = response.bytes_stream().map_err(std::io::Error::other);
    let mut reader = StreamReader::new(stream);
    let mut out = File::create(&path).await?;
    let size = tokio::io::copy(&mut reader, &mut out).await?;
    out.flush().await?;

    Ok(Downloaded {
        path,
        size,
        checksum,
    })
}

pub async fn rename_file(
    uri: &str,
    token: &str,
    filename: &str,
    new_filename: &str,
) -> Result<(), ClientError> {
    let mut resource = endpoint(uri, "file")?;
    resource.append_query("filename", filename);
    let body = RenameRequest {
        filename: new_filename.to_owned(),
    };
    let response = Client::new()
        .put(resource.to_string())
        .header(AUTH_TOKEN_HEADER, token)
        .json(&body)
        .send()
        .await?;
    check(response).await?;
    Ok(())
}

pub async fn delete_file(uri: &str, token: &str, filename: &str) -> Result<(), ClientError> {
    let mut resource = endpoint(uri, "file")?;
    resource.append_query("filename", filename);
    let response = Client::new()
        .delete(resource.to_string())
        .header(AUTH_TOKEN_HEADER, token)
        .send()
        .await?;
    check(response).await?;
    Ok(())
}

pub async fn list_files(uri: &str, token: &str, limit: i64) -> Result<Vec<FileEntry>, ClientError> {
    let mut resource = endpoint(uri, "list")?;
    resource.append_query("limit", &limit.to_string());
    let response = Client::new()
        .get(resource.to_string())
        .header(AUTH_TOKEN_HEADER, token)
        .send()
        .await?;
    Ok(check(response).await?.json().await?)
}

#[must_use]
pub fn files_table(files: &[FileEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120)
        .set_header(vec![
            Cell::new("File").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
        ]);

    for f in files {
        table.add_row(vec![
            Cell::new(&f.filename),
            Cell::new(f.size).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn endpoint(uri: &str, path: &str) -> Result<Resource, ClientError> {
    let mut resource = Resource::new(uri).ok_or_else(|| ClientError::Uri(uri.to_owned()))?;
    resource.append_path(path);
    Ok(resource)
}

/// Turns non success replies into [`ClientError::Server`] using the JSON error body when present.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.message)
        .unwrap_or(text);
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}
