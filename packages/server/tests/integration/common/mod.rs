use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;

// `::` disambiguates the workspace crate from this test module.
use ::common::ImageStore;
use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use server::state::AppState;
use server::utils::hash;

pub const ADMIN_PASSWORD: &str = "integration-admin-pass";

/// Hashing is slow on purpose; do it once per test binary.
static ADMIN_HASH: OnceLock<String> = OnceLock::new();

fn admin_password_hash() -> String {
    ADMIN_HASH
        .get_or_init(|| hash::hash_password(ADMIN_PASSWORD).expect("Failed to hash test password"))
        .clone()
}

pub mod routes {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ME: &str = "/api/v1/auth/me";
    pub const ENTRIES: &str = "/api/v1/entries";
    pub const ADMIN_ENTRIES: &str = "/api/v1/admin/entries";

    pub fn entry(id: i32) -> String {
        format!("/api/v1/entries/{id}")
    }

    pub fn entries_page(page: u64) -> String {
        format!("/api/v1/entries?page={page}")
    }

    pub fn admin_entry(id: i32) -> String {
        format!("/api/v1/admin/entries/{id}")
    }
}

/// A running test server backed by a temp-dir SQLite file and image store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub upload_dir: PathBuf,
    _tmp: tempfile::TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");

        // A file-backed database: in-memory SQLite would give each pooled
        // connection its own empty database.
        let db_url = format!("sqlite://{}?mode=rwc", tmp.path().join("test.db").display());
        server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let mut opts = ConnectOptions::new(&db_url);
        opts.max_connections(5).min_connections(1);
        let db = Database::connect(opts)
            .await
            .expect("Failed to connect to test database");

        let upload_dir = tmp.path().join("uploads");
        let images = Arc::new(
            ImageStore::new(upload_dir.clone())
                .await
                .expect("Failed to create image store"),
        );

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                admin_password_hash: admin_password_hash(),
            },
            storage: StorageConfig {
                upload_dir: upload_dir.clone(),
                max_upload_mb: 8,
            },
        };

        let state = AppState {
            db: db.clone(),
            images,
            config,
        };
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            upload_dir,
            _tmp: tmp,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Log in as the admin and return the bearer token.
    pub async fn login(&self) -> String {
        let res = self
            .post_json(routes::LOGIN, &serde_json::json!({"password": ADMIN_PASSWORD}))
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);
        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_multipart(&self, path: &str, form: Form, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Fetch a raw (non-JSON) resource such as a media file.
    pub async fn get_raw(&self, path: &str) -> (u16, Option<String>, Vec<u8>) {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        (status, content_type, bytes)
    }

    /// Create a minimal text-only entry via the API and return its `id`.
    pub async fn create_entry(&self, token: &str, entry_date: &str, title: &str) -> i32 {
        let form = entry_form(Some(entry_date), title, "Some *markdown* body.");
        let res = self
            .post_multipart(routes::ADMIN_ENTRIES, form, token)
            .await;
        assert_eq!(res.status, 201, "create_entry failed: {}", res.text);
        res.id()
    }

    /// Count regular files anywhere under the image store root.
    pub fn stored_file_count(&self) -> usize {
        fn walk(dir: &Path, count: &mut usize) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, count);
                } else {
                    *count += 1;
                }
            }
        }

        let mut count = 0;
        walk(&self.upload_dir, &mut count);
        count
    }

    /// Whether the file behind a `/media/...` URL exists on disk.
    pub fn stored_file_exists(&self, media_url: &str) -> bool {
        let relative = media_url
            .strip_prefix("/media/")
            .expect("asset URL should start with /media/");
        self.upload_dir.join(relative).is_file()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}

/// Multipart form with the basic text fields every entry submission carries.
pub fn entry_form(entry_date: Option<&str>, title: &str, body_markdown: &str) -> Form {
    let mut form = Form::new()
        .text("title", title.to_string())
        .text("body_markdown", body_markdown.to_string());
    if let Some(date) = entry_date {
        form = form.text("entry_date", date.to_string());
    }
    form
}

/// A fake image part. The server validates the filename extension, not the
/// bytes, so any payload works.
pub fn image_part(filename: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec()).file_name(filename.to_string())
}
