use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use kernel::CHECKSUM_HEADER;
use tokio_util::io::ReaderStream;

use crate::files::Download;

/// Streams a stored file under its display name.
pub struct FileReply {
    download: Download,
}

impl FileReply {
    #[must_use]
    pub fn new(download: Download) -> Self {
        Self { download }
    }

    fn content_disposition(&self) -> String {
        let file_name = name_from_path(&self.download.display_name).replace('"', "\\\"");
        format!(r#"attachment; filename="{file_name}""#)
    }
}

/// Last component of a path like name, so clients never get directories.
fn name_from_path(path: &str) -> &str {
    if let Some(ix) = path.rfind(&['\\', '/']) {
        &path[ix + 1..]
    } else {
        path
    }
}

impl IntoResponse for FileReply {
    fn into_response(self) -> Response {
        let attachment = self.content_disposition();
        let len = self.download.size.to_string();
        let checksum = self.download.checksum.clone();

        let stream = ReaderStream::new(self.download.file);
        let mut res = Body::from_stream(stream).into_response();
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        if let Ok(val) = HeaderValue::from_str(attachment.as_str()) {
            res.headers_mut().insert(header::CONTENT_DISPOSITION, val);
        }
        if let Ok(val) = HeaderValue::from_str(len.as_str()) {
            res.headers_mut().insert(header::CONTENT_LENGTH, val);
        }
        if let Ok(val) = HeaderValue::from_str(checksum.as_str()) {
            res.headers_mut().insert(CHECKSUM_HEADER, val);
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("file.ext", "file.ext")]
    #[case("dir/file.ext", "file.ext")]
    #[case("dir\\file.ext", "file.ext")]
    #[case("dir1\\dir2\\file.ext", "file.ext")]
    #[case("dir1/dir2/file.ext", "file.ext")]
    #[trace]
    fn name_from_path_tests(#[case] path: &str, #[case] expected: &str) {
        // Act
        let name = name_from_path(path);

        // Assert
        assert_eq!(name, expected);
    }

    #[tokio::test]
    async fn headers_use_display_name() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x".repeat(100));
        tokio::fs::write(&path, b"ab").await.unwrap();
        let download = Download {
            file: tokio::fs::File::open(&path).await.unwrap(),
            display_name: "a \"b\".txt".to_owned(),
            size: 2,
            checksum: "fb8e20fc".to_owned(),
        };

        // Act
        let res = FileReply::new(download).into_response();

        // Assert
        let headers = res.headers();
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            r#"attachment; filename="a \"b\".txt""#
        );
        assert_eq!(headers[header::CONTENT_LENGTH], "2");
        assert_eq!(headers[CHECKSUM_HEADER], "fb8e20fc");
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    }
}
