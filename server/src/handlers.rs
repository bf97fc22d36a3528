#![allow(clippy::unused_async)]
use crate::error::ServiceError;
use crate::file_reply::FileReply;
use crate::{ApiDoc, AppState};
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::TryStreamExt;
use kernel::{
    Credentials, ErrorResponse, FileEntry, LoginResponse, RenameRequest, AUTH_TOKEN_HEADER,
};
use serde::Deserialize;
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::io::StreamReader;
use utoipa::OpenApi;

const FILE_FIELD: &str = "file";

#[derive(Deserialize)]
pub struct FileQuery {
    filename: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    limit: i64,
}

/// Registers a new user.
#[utoipa::path(
    post,
    path = "/registration",
    request_body = Credentials,
    responses(
        (status = 200, description = "User registered"),
        (status = 400, description = "Login already taken", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "users",
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Response {
    let result = execute(state, move |s| {
        s.accounts
            .register(&credentials.login, &credentials.password)
    })
    .await;
    reply(result.map(|()| StatusCode::OK))
}

/// Opens a session and returns its access token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Unknown login or wrong password", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "users",
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Response {
    let result = execute(state, move |s| {
        s.accounts.login(&credentials.login, &credentials.password)
    })
    .await;
    reply(result.map(|auth_token| Json(LoginResponse { auth_token })))
}

/// Closes the session of the token.
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session closed"),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "users",
    params(
        ("auth-token" = String, Header, description = "Access token")
    ),
)]
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let token = auth_token(&headers).to_owned();
    let result = execute(state, move |s| s.accounts.logout(&token)).await;
    reply(result.map(|()| StatusCode::OK))
}

/// Uploads the `file` part of a multipart form, replacing a file with the same name.
#[utoipa::path(
    post,
    path = "/file",
    responses(
        (status = 200, description = "File stored"),
        (status = 400, description = "Malformed form", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "files",
    params(
        ("auth-token" = String, Header, description = "Access token"),
        ("filename" = String, Query, description = "Display name of the file")
    ),
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FileQuery>,
    mut multipart: Multipart,
) -> Response {
    let token = auth_token(&headers);
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return bad_request(format!("form has no '{FILE_FIELD}' part")),
            Err(e) => return bad_request(e.to_string()),
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let declared_size = field
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let reader = StreamReader::new(field.map_err(io::Error::other));
        futures::pin_mut!(reader);

        let result = state
            .files
            .upload(token, &query.filename, &mut reader, declared_size)
            .await;
        return reply(result.map(|()| StatusCode::OK));
    }
}

/// Deletes a file.
#[utoipa::path(
    delete,
    path = "/file",
    responses(
        (status = 200, description = "File deleted"),
        (status = 400, description = "File not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "files",
    params(
        ("auth-token" = String, Header, description = "Access token"),
        ("filename" = String, Query, description = "Display name of the file")
    ),
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FileQuery>,
) -> Response {
    let result = state
        .files
        .delete(auth_token(&headers), &query.filename)
        .await;
    reply(result.map(|()| StatusCode::OK))
}

/// Gets file binary content by display name.
#[utoipa::path(
    get,
    path = "/file",
    responses(
        (
            status = 200,
            description = "File binary content",
            body = String,
            content_type = "application/octet-stream"
        ),
        (status = 400, description = "File not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "files",
    params(
        ("auth-token" = String, Header, description = "Access token"),
        ("filename" = String, Query, description = "Display name of the file")
    ),
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FileQuery>,
) -> Response {
    let result = state
        .files
        .download(auth_token(&headers), &query.filename)
        .await;
    reply(result.map(FileReply::new))
}

/// Renames a file.
#[utoipa::path(
    put,
    path = "/file",
    request_body = RenameRequest,
    responses(
        (status = 200, description = "File renamed"),
        (status = 400, description = "File not found or new name taken", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "files",
    params(
        ("auth-token" = String, Header, description = "Access token"),
        ("filename" = String, Query, description = "Current display name of the file")
    ),
)]
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FileQuery>,
    Json(body): Json<RenameRequest>,
) -> Response {
    let token = auth_token(&headers).to_owned();
    let result = execute(state, move |s| {
        s.files.rename(&token, &query.filename, &body.filename)
    })
    .await;
    reply(result.map(|()| StatusCode::OK))
}

/// Lists files of the current user ordered by name.
#[utoipa::path(
    get,
    path = "/list",
    responses(
        (status = 200, description = "Files listed", body = [FileEntry]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "files",
    params(
        ("auth-token" = String, Header, description = "Access token"),
        ("limit" = i64, Query, description = "Maximum number of files returned")
    ),
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let token = auth_token(&headers).to_owned();
    let result = execute(state, move |s| s.files.list(&token, query.limit)).await;
    reply(result.map(|records| {
        let entries: Vec<FileEntry> = records
            .into_iter()
            .map(|r| FileEntry {
                filename: r.display_name,
                size: r.size,
            })
            .collect();
        Json(entries)
    }))
}

pub async fn openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

fn auth_token(headers: &HeaderMap) -> &str {
    headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn reply<R: IntoResponse>(result: Result<R, ServiceError>) -> Response {
    match result {
        Ok(response) => response.into_response(),
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!("Error: {e}");
            } else {
                tracing::info!("{e}");
            }
            (status, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
    }
}

fn bad_request(message: String) -> Response {
    tracing::info!("{message}");
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

/// Runs store bound work off the async workers.
async fn execute<F, R>(state: Arc<AppState>, action: F) -> Result<R, ServiceError>
where
    F: FnOnce(&AppState) -> Result<R, ServiceError> + Send + 'static,
    R: Send + 'static,
{
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(move || action(&state))
        .await
        .map_err(|e| ServiceError::Io(io::Error::other(e)))?;
    tracing::debug!("DB query time: {:?}", start.elapsed());
    result
}
