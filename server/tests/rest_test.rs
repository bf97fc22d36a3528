use futures::channel::oneshot;
use futures::channel::oneshot::Sender;
use kernel::{
    Credentials, ErrorResponse, FileEntry, LoginResponse, RenameRequest, AUTH_TOKEN_HEADER,
    CHECKSUM_HEADER,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serial_test::serial;
use server::config::Config;
use tempfile::TempDir;
use test_context::{test_context, AsyncTestContext};
use tokio::task::JoinHandle;

struct RestContext {
    base: String,
    client: Client,
    shutdown: Sender<()>,
    join: JoinHandle<()>,
    _dir: TempDir,
}

impl AsyncTestContext for RestContext {
    async fn setup() -> RestContext {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::in_dir(dir.path());
        RestContext::start(dir, &config).await
    }

    async fn teardown(self) {
        self.shutdown.send(()).unwrap_or_default();
        self.join.await.unwrap_or_default();
    }
}

impl RestContext {
    async fn start(dir: TempDir, config: &Config) -> RestContext {
        server::init_storage(config).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (send, recv) = oneshot::channel::<()>();
        let app = server::create_routes(config);
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { recv.await.unwrap_or_default() })
                .await
                .unwrap();
        });

        RestContext {
            base: format!("http://127.0.0.1:{port}"),
            client: Client::new(),
            shutdown: send,
            join: task,
            _dir: dir,
        }
    }

    fn uri(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn register(&self, login: &str, password: &str) -> StatusCode {
        let credentials = Credentials {
            login: login.to_owned(),
            password: password.to_owned(),
        };
        self.client
            .post(self.uri("/registration"))
            .json(&credentials)
            .send()
            .await
            .unwrap()
            .status()
    }

    async fn login(&self, login: &str, password: &str) -> reqwest::Response {
        let credentials = Credentials {
            login: login.to_owned(),
            password: password.to_owned(),
        };
        self.client
            .post(self.uri("/login"))
            .json(&credentials)
            .send()
            .await
            .unwrap()
    }

    async fn signed_in(&self) -> String {
        assert_eq!(self.register("alice", "pw1").await, StatusCode::OK);
        let response: LoginResponse = self.login("alice", "pw1").await.json().await.unwrap();
        response.auth_token
    }

    async fn upload(&self, token: &str, name: &str, content: &[u8]) -> StatusCode {
        let part = Part::bytes(content.to_vec()).file_name(name.to_owned());
        let form = Form::new().part("file", part);
        self.client
            .post(self.uri("/file"))
            .header(AUTH_TOKEN_HEADER, token)
            .query(&[("filename", name)])
            .multipart(form)
            .send()
            .await
            .unwrap()
            .status()
    }

    async fn download(&self, token: &str, name: &str) -> reqwest::Response {
        self.client
            .get(self.uri("/file"))
            .header(AUTH_TOKEN_HEADER, token)
            .query(&[("filename", name)])
            .send()
            .await
            .unwrap()
    }

    async fn list(&self, token: &str, limit: i64) -> reqwest::Response {
        self.client
            .get(self.uri("/list"))
            .header(AUTH_TOKEN_HEADER, token)
            .query(&[("limit", limit)])
            .send()
            .await
            .unwrap()
    }
}

#[test_context(RestContext)]
#[tokio::test]
#[serial]
async fn upload_list_download(ctx: &mut RestContext) {
    // Arrange
    let token = ctx.signed_in().await;

    // Act
    let uploaded = ctx.upload(&token, "a.txt", b"ab").await;
    let listed: Vec<FileEntry> = ctx.list(&token, 10).await.json().await.unwrap();
    let downloaded = ctx.download(&token, "a.txt").await;

    // Assert
    assert_eq!(uploaded, StatusCode::OK);
    assert_eq!(
        listed,
        vec![FileEntry {
            filename: "a.txt".to_owned(),
            size: 2
        }]
    );
    assert_eq!(downloaded.status(), StatusCode::OK);
    let headers = downloaded.headers().clone();
    assert_eq!(
        headers["content-disposition"],
        r#"attachment; filename="a.txt""#
    );
    assert_eq!(
        headers[CHECKSUM_HEADER],
        "fb8e20fc2e4c3f248c60c39bd652f3c1347298bb977b8b4d5903b85055620603"
    );
    assert_eq!(downloaded.bytes().await.unwrap().as_ref(), b"ab");
}

#[test_context(RestContext)]
#[tokio::test]
#[serial]
async fn duplicate_registration(ctx: &mut RestContext) {
    // Arrange
    ctx.register("alice", "pw1").await;

    // Act
    let status = ctx.register("alice", "pw2").await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test_context(RestContext)]
#[tokio::test]
#[serial]
async fn login_with_wrong_password(ctx: &mut RestContext) {
    // Arrange
    ctx.register("alice", "pw1").await;

    // Act
    let response = ctx.login("alice", "wrong").await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test_context(RestContext)]
#[tokio::test]
#[serial]
async fn missing_or_unknown_token(ctx: &mut RestContext) {
    // Act
    let missing = ctx
        .client
        .get(ctx.uri("/list"))
        .query(&[("limit", 10)])
        .send()
        .await
        .unwrap();
    let unknown = ctx.download("unknown", "a.txt").await;

    // Assert
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[test_context(RestContext)]
#[tokio::test]
#[serial]
async fn rename_then_old_name_missing(ctx: &mut RestContext) {
    // Arrange
    let token = ctx.signed_in().await;
    ctx.upload(&token, "a.txt", b"ab").await;

    // Act
    let renamed = ctx
        .client
        .put(ctx.uri("/file"))
        .header(AUTH_TOKEN_HEADER, &token)
        .query(&[("filename", "a.txt")])
        .json(&RenameRequest {
            filename: "b.txt".to_owned(),
        })
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(renamed.status(), StatusCode::OK);
    let old = ctx.download(&token, "a.txt").await;
    assert_eq!(old.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = old.json().await.unwrap();
    assert_eq!(error.message, "File 'a.txt' does not exist");
    let new = ctx.download(&token, "b.txt").await;
    assert_eq!(new.status(), StatusCode::OK);
    assert_eq!(
        new.headers()["content-disposition"],
        r#"attachment; filename="b.txt""#
    );
}

#[test_context(RestContext)]
#[tokio::test]
#[serial]
async fn delete_twice(ctx: &mut RestContext) {
    // Arrange
    let token = ctx.signed_in().await;
    ctx.upload(&token, "a.txt", b"ab").await;
    let delete = || {
        ctx.client
            .delete(ctx.uri("/file"))
            .header(AUTH_TOKEN_HEADER, &token)
            .query(&[("filename", "a.txt")])
            .send()
    };

    // Act
    let first = delete().await.unwrap();
    let second = delete().await.unwrap();

    // Assert
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[test_context(RestContext)]
#[tokio::test]
#[serial]
async fn logout_closes_session(ctx: &mut RestContext) {
    // Arrange
    let token = ctx.signed_in().await;

    // Act
    let logout = ctx
        .client
        .post(ctx.uri("/logout"))
        .header(AUTH_TOKEN_HEADER, format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(logout.status(), StatusCode::OK);
    assert_eq!(ctx.list(&token, 10).await.status(), StatusCode::UNAUTHORIZED);
}

#[test_context(RestContext)]
#[tokio::test]
#[serial]
async fn upload_without_file_part(ctx: &mut RestContext) {
    // Arrange
    let token = ctx.signed_in().await;
    let form = Form::new().text("other", "value");

    // Act
    let response = ctx
        .client
        .post(ctx.uri("/file"))
        .header(AUTH_TOKEN_HEADER, &token)
        .query(&[("filename", "a.txt")])
        .multipart(form)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.list(&token, 10).await.json::<Vec<FileEntry>>().await.unwrap().is_empty());
}

#[test_context(RestContext)]
#[tokio::test]
#[serial]
async fn openapi_document(ctx: &mut RestContext) {
    // Act
    let response = ctx
        .client
        .get(ctx.uri("/api-docs/openapi.json"))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = response.json().await.unwrap();
    assert!(doc["paths"]["/file"].is_object());
    assert!(doc["paths"]["/list"].is_object());
}

#[tokio::test]
#[serial]
async fn body_over_limit_rejected() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::in_dir(dir.path());
    config.max_body = 64;
    let files_dir = config.files_dir.clone();
    let ctx = RestContext::start(dir, &config).await;
    let token = ctx.signed_in().await;

    // Act
    let status = ctx.upload(&token, "big.bin", &[7u8; 4096]).await;

    // Assert
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(std::fs::read_dir(&files_dir).unwrap().count(), 0);
    assert!(ctx
        .list(&token, 10)
        .await
        .json::<Vec<FileEntry>>()
        .await
        .unwrap()
        .is_empty());
    ctx.teardown().await;
}
