use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use prometheus_client::registry::Registry;
use serde_json::Value;
use shared::{
    config::Hashing,
    errors::{RepositoryError, ServiceError},
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tempfile::TempDir;
use tower::ServiceExt;
use user::{
    abstract_trait::{
        media::MediaUploaderTrait,
        user::repository::{UserCommandRepositoryTrait, UserQueryRepositoryTrait},
    },
    di::DependenciesInject,
    domain::{requests::user::CreateUserRequest, response::media::UploadedMedia},
    handler::AppRouter,
    model::user::User as UserModel,
    service::command::{UserCommandService, UserCommandServiceDeps},
    state::AppState,
};

const BOUNDARY: &str = "----registration-test-boundary";

#[derive(Default)]
struct InMemoryUsers {
    users: Mutex<Vec<UserModel>>,
}

#[async_trait]
impl UserQueryRepositoryTrait for InMemoryUsers {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserModel>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserModel>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl UserCommandRepositoryTrait for InMemoryUsers {
    async fn create_user(&self, req: &CreateUserRequest) -> Result<UserModel, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = UserModel {
            id: users.len() as i32 + 1,
            username: req.username.clone(),
            email: req.email.clone(),
            full_name: req.full_name.clone(),
            avatar: req.avatar.clone(),
            cover_image: req.cover_image.clone(),
            password: req.password.clone(),
            refresh_token: Some("never-exposed".into()),
            created_at: None,
            updated_at: None,
        };
        users.push(user.clone());
        Ok(user)
    }
}

/// Reads the staged file like a real uploader would; empty or missing files
/// are treated as failed uploads.
struct RecordingMedia {
    fail_all: bool,
    uploaded: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl MediaUploaderTrait for RecordingMedia {
    async fn upload(&self, local_path: &Path) -> Result<Option<UploadedMedia>, ServiceError> {
        if self.fail_all {
            return Ok(None);
        }

        let Ok(bytes) = std::fs::read(local_path) else {
            return Ok(None);
        };
        if bytes.is_empty() {
            return Ok(None);
        }

        let mut uploaded = self.uploaded.lock().unwrap();
        uploaded.push(bytes);

        Ok(Some(UploadedMedia {
            url: format!("https://cdn.example/{}.png", uploaded.len()),
            ..Default::default()
        }))
    }
}

struct Harness {
    app: Router,
    users: Arc<InMemoryUsers>,
    media: Arc<RecordingMedia>,
    upload_dir: TempDir,
}

fn harness(fail_uploads: bool) -> Harness {
    let users = Arc::new(InMemoryUsers::default());
    let media = Arc::new(RecordingMedia {
        fail_all: fail_uploads,
        uploaded: Mutex::new(Vec::new()),
    });
    let upload_dir = tempfile::tempdir().unwrap();

    let mut registry = Registry::default();
    let service = UserCommandService::new(
        UserCommandServiceDeps {
            hash: Arc::new(Hashing::with_cost(4)),
            media: media.clone(),
            query: users.clone(),
            command: users.clone(),
        },
        &mut registry,
    )
    .unwrap();

    let di_container = DependenciesInject {
        user_command: Arc::new(service),
    };

    let state = AppState::with_dependencies(
        di_container,
        upload_dir.path().to_path_buf(),
        registry,
    );

    Harness {
        app: AppRouter::build(Arc::new(state)),
        users,
        media,
        upload_dir,
    }
}

#[derive(Default)]
struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    fn into_request(mut self) -> Request<Body> {
        self.buf
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/users/register")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.buf))
            .unwrap()
    }
}

fn jane_fields() -> MultipartBody {
    MultipartBody::default()
        .text("fullName", "Jane Doe")
        .text("email", "jane@x.com")
        .text("username", "JaneD")
        .text("password", "secret")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn staged_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[tokio::test]
async fn registers_user_and_returns_sanitized_record() {
    let h = harness(false);

    let request = jane_fields()
        .file("avatar", "me.png", b"avatar-bytes")
        .into_request();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User registered successfully!");
    assert_eq!(body["data"]["username"], "janed");
    assert_eq!(body["data"]["fullName"], "Jane Doe");
    assert_eq!(body["data"]["coverImage"], "");
    assert_eq!(body["data"]["avatar"], "https://cdn.example/1.png");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("refreshToken").is_none());

    assert_eq!(
        h.media.uploaded.lock().unwrap().as_slice(),
        &[b"avatar-bytes".to_vec()]
    );
    assert_eq!(h.users.users.lock().unwrap().len(), 1);
    assert!(staged_files(h.upload_dir.path()).is_empty());
}

#[tokio::test]
async fn stores_cover_image_and_uses_first_file_per_key() {
    let h = harness(false);

    let request = jane_fields()
        .file("avatar", "me.png", b"first-avatar")
        .file("avatar", "ignored.png", b"second-avatar")
        .file("coverImage", "cover.jpg", b"cover-bytes")
        .into_request();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["avatar"], "https://cdn.example/1.png");
    assert_eq!(body["data"]["coverImage"], "https://cdn.example/2.png");
    assert_eq!(
        h.media.uploaded.lock().unwrap().as_slice(),
        &[b"first-avatar".to_vec(), b"cover-bytes".to_vec()]
    );
    assert!(staged_files(h.upload_dir.path()).is_empty());
}

#[tokio::test]
async fn duplicate_username_in_other_case_is_conflict() {
    let h = harness(false);

    let first = jane_fields()
        .file("avatar", "me.png", b"avatar")
        .into_request();
    let (status, _) = send(&h.app, first).await;
    assert_eq!(status, StatusCode::CREATED);

    let second = MultipartBody::default()
        .text("fullName", "Other Jane")
        .text("email", "other@x.com")
        .text("username", "JANED")
        .text("password", "secret")
        .file("avatar", "me.png", b"avatar")
        .into_request();

    let (status, body) = send(&h.app, second).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["statusCode"], 409);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User with email or username already exists");
    assert_eq!(h.users.users.lock().unwrap().len(), 1);
    assert!(staged_files(h.upload_dir.path()).is_empty());
}

#[tokio::test]
async fn blank_field_is_bad_request() {
    let h = harness(false);

    let request = MultipartBody::default()
        .text("fullName", "Jane Doe")
        .text("email", "   ")
        .text("username", "JaneD")
        .text("password", "secret")
        .file("avatar", "me.png", b"avatar")
        .into_request();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
    assert!(h.users.users.lock().unwrap().is_empty());
    assert!(staged_files(h.upload_dir.path()).is_empty());
}

#[tokio::test]
async fn missing_field_is_bad_request() {
    let h = harness(false);

    let request = MultipartBody::default()
        .text("fullName", "Jane Doe")
        .text("email", "jane@x.com")
        .text("username", "JaneD")
        .file("avatar", "me.png", b"avatar")
        .into_request();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
}

#[tokio::test]
async fn missing_avatar_is_bad_request_even_with_cover() {
    let h = harness(false);

    let request = jane_fields()
        .file("coverImage", "cover.png", b"cover")
        .into_request();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Avatar file is required");
    assert!(h.media.uploaded.lock().unwrap().is_empty());
    assert!(h.users.users.lock().unwrap().is_empty());
    assert!(staged_files(h.upload_dir.path()).is_empty());
}

#[tokio::test]
async fn empty_unnamed_avatar_part_counts_as_missing() {
    let h = harness(false);

    let request = jane_fields().file("avatar", "", b"").into_request();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Avatar file is required");
}

#[tokio::test]
async fn text_part_named_avatar_is_not_a_file() {
    let h = harness(false);

    let request = jane_fields().text("avatar", "not-a-file").into_request();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Avatar file is required");
    assert!(h.media.uploaded.lock().unwrap().is_empty());
    assert!(staged_files(h.upload_dir.path()).is_empty());
}

#[tokio::test]
async fn long_full_name_is_accepted() {
    let h = harness(false);
    let full_name = "J".repeat(300);

    let request = MultipartBody::default()
        .text("fullName", &full_name)
        .text("email", "jane@x.com")
        .text("username", "JaneD")
        .text("password", "secret")
        .file("avatar", "me.png", b"avatar")
        .into_request();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["fullName"], full_name.as_str());
}

#[tokio::test]
async fn failed_avatar_upload_is_internal_error() {
    let h = harness(true);

    let request = jane_fields()
        .file("avatar", "me.png", b"avatar")
        .into_request();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["message"], "Error uploading avatar to Cloudinary");
    assert!(h.users.users.lock().unwrap().is_empty());
    assert!(staged_files(h.upload_dir.path()).is_empty());
}

#[tokio::test]
async fn non_multipart_body_is_bad_request() {
    let h = harness(false);

    let request = Request::builder()
        .method("POST")
        .uri("/api/users/register")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"fullName":"Jane Doe"}"#))
        .unwrap();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let h = harness(false);

    let request = jane_fields()
        .file("avatar", "me.png", b"avatar")
        .into_request();
    send(&h.app, request).await;

    let health = h
        .app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let metrics = h
        .app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(metrics.status(), StatusCode::OK);

    let bytes = metrics.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("user_command_service_request_counter"));
}
