#![warn(clippy::unwrap_in_result)]
#![warn(clippy::unwrap_used)]

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Header that carries the session access token.
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// Header that carries the hex encoded SHA-256 of a downloaded file.
pub const CHECKSUM_HEADER: &str = "x-checksum-sha256";

/// Login and password pair used for registration and login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    /// User login, case-sensitive
    pub login: String,
    /// Plaintext password
    pub password: String,
}

/// Successful login reply.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Opaque access token to pass in the `auth-token` header
    #[serde(rename = "auth-token")]
    pub auth_token: String,
}

/// Body of a rename request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenameRequest {
    /// New display name of the file
    pub filename: String,
}

/// Represents a file owned by the current user.
///
/// Only the user visible attributes are exposed, the on-disk
/// name never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileEntry {
    /// Display name, unique within the owner's files
    pub filename: String,
    /// Size of the file in bytes
    pub size: u64,
}

/// Error reply body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable description of the failure
    pub message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_uses_header_name() {
        // Arrange
        let response = LoginResponse {
            auth_token: "abc".to_owned(),
        };

        // Act
        let json = serde_json::to_string(&response).unwrap();

        // Assert
        assert_eq!(json, r#"{"auth-token":"abc"}"#);
    }

    #[test]
    fn file_entry_from_json() {
        // Arrange
        let json = r#"{"filename":"a.txt","size":2}"#;

        // Act
        let entry: FileEntry = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(
            entry,
            FileEntry {
                filename: "a.txt".to_owned(),
                size: 2
            }
        );
    }
}
