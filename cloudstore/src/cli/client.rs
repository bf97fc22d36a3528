use std::path::Path;

use client::ClientError;
use kernel::Credentials;

pub async fn register(uri: &str, credentials: &Credentials) -> Result<(), ClientError> {
    client::register(uri, credentials).await?;
    println!("user {} registered", credentials.login);
    Ok(())
}

pub async fn login(uri: &str, credentials: &Credentials) -> Result<(), ClientError> {
    let token = client::login(uri, credentials).await?;
    println!("{token}");
    Ok(())
}

pub async fn logout(uri: &str, token: &str) -> Result<(), ClientError> {
    client::logout(uri, token).await?;
    println!("logged out");
    Ok(())
}

pub async fn upload(uri: &str, token: &str, file: &str) -> Result<(), ClientError> {
    let filename = client::upload_file(uri, token, Path::new(file)).await?;
    println!("file {file} uploaded as {filename}");
    Ok(())
}

pub async fn download(
    uri: &str,
    token: &str,
    filename: &str,
    output: &str,
) -> Result<(), ClientError> {
    let downloaded = client::download_file(uri, token, filename, Path::new(output)).await?;
    println!(
        "file {filename} saved to {} ({} bytes)",
        downloaded.path.display(),
        downloaded.size
    );
    if let Some(checksum) = downloaded.checksum {
        println!("sha256: {checksum}");
    }
    Ok(())
}

pub async fn rename(
    uri: &str,
    token: &str,
    filename: &str,
    new_filename: &str,
) -> Result<(), ClientError> {
    client::rename_file(uri, token, filename, new_filename).await?;
    println!("file {filename} renamed to {new_filename}");
    Ok(())
}

pub async fn delete(uri: &str, token: &str, filename: &str) -> Result<(), ClientError> {
    client::delete_file(uri, token, filename).await?;
    println!("file {filename} deleted");
    Ok(())
}

pub async fn list(uri: &str, token: &str, limit: i64) -> Result<(), ClientError> {
    let files = client::list_files(uri, token, limit).await?;
    println!("{}", client::files_table(&files));
    Ok(())
}
