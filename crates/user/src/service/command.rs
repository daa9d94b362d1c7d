use crate::{
    abstract_trait::{
        media::DynMediaUploader,
        user::{
            repository::{DynUserCommandRepository, DynUserQueryRepository},
            service::UserCommandServiceTrait,
        },
    },
    domain::{
        requests::user::{CreateUserRequest, RegisterUserRequest},
        response::{api::ApiResponse, user::UserResponse},
    },
    repository::command::DUPLICATE_USER_MESSAGE,
};
use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use opentelemetry::{
    Context, KeyValue,
    global::{self, BoxedTracer},
    trace::{Span, SpanKind, TraceContextExt, Tracer},
};
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::DynHashing,
    errors::{RepositoryError, ServiceError},
    utils::{Method, Metrics, Status as StatusUtils, TracingContext},
};
use tokio::time::Instant;
use tracing::{error, info, warn};
use validator::Validate;

pub const FIELDS_REQUIRED_MESSAGE: &str = "All fields are required";
pub const AVATAR_REQUIRED_MESSAGE: &str = "Avatar file is required";
pub const AVATAR_UPLOAD_FAILED_MESSAGE: &str = "Error uploading avatar to Cloudinary";
pub const READ_BACK_FAILED_MESSAGE: &str = "Something went wrong while registering the user";
pub const REGISTERED_MESSAGE: &str = "User registered successfully!";

#[derive(Clone)]
pub struct UserCommandService {
    pub hash: DynHashing,
    pub media: DynMediaUploader,
    pub query: DynUserQueryRepository,
    pub command: DynUserCommandRepository,
    pub metrics: Metrics,
}

pub struct UserCommandServiceDeps {
    pub hash: DynHashing,
    pub media: DynMediaUploader,
    pub query: DynUserQueryRepository,
    pub command: DynUserCommandRepository,
}

impl UserCommandService {
    pub fn new(deps: UserCommandServiceDeps, registry: &mut Registry) -> Result<Self> {
        let metrics = Metrics::new();
        metrics.register("user_command_service", registry);

        let UserCommandServiceDeps {
            hash,
            media,
            query,
            command,
        } = deps;

        Ok(Self {
            hash,
            media,
            query,
            command,
            metrics,
        })
    }

    fn get_tracer(&self) -> BoxedTracer {
        global::tracer("user-command-service")
    }

    fn start_tracing(&self, operation_name: &str, attributes: Vec<KeyValue>) -> TracingContext {
        let start_time = Instant::now();
        let tracer = self.get_tracer();
        let mut span = tracer
            .span_builder(operation_name.to_string())
            .with_kind(SpanKind::Server)
            .with_attributes(attributes)
            .start(&tracer);

        info!("Starting operation: {operation_name}");

        span.add_event(
            "Operation started",
            vec![KeyValue::new("operation", operation_name.to_string())],
        );

        let cx = Context::current_with_span(span);
        TracingContext { cx, start_time }
    }

    async fn complete_tracing_success(
        &self,
        tracing_ctx: &TracingContext,
        method: Method,
        message: &str,
    ) {
        self.complete_tracing_internal(tracing_ctx, method, true, message)
            .await;
    }

    async fn complete_tracing_error(
        &self,
        tracing_ctx: &TracingContext,
        method: Method,
        error_message: &str,
    ) {
        self.complete_tracing_internal(tracing_ctx, method, false, error_message)
            .await;
    }

    async fn complete_tracing_internal(
        &self,
        tracing_ctx: &TracingContext,
        method: Method,
        is_success: bool,
        message: &str,
    ) {
        let status_str = if is_success { "SUCCESS" } else { "ERROR" };
        let status = if is_success {
            StatusUtils::Success
        } else {
            StatusUtils::Error
        };
        let elapsed = tracing_ctx.start_time.elapsed().as_secs_f64();

        tracing_ctx.cx.span().add_event(
            "Operation completed",
            vec![
                KeyValue::new("status", status_str),
                KeyValue::new("duration_secs", elapsed.to_string()),
                KeyValue::new("message", message.to_string()),
            ],
        );

        if is_success {
            info!("✅ Operation completed successfully: {message}");
        } else {
            error!("❌ Operation failed: {message}");
        }

        self.metrics.record(method, status, elapsed);

        tracing_ctx.cx.span().end();
    }

    async fn fail(
        &self,
        tracing_ctx: &TracingContext,
        method: Method,
        err: ServiceError,
    ) -> ServiceError {
        self.complete_tracing_error(tracing_ctx, method, &err.to_string())
            .await;
        err
    }
}

#[async_trait]
impl UserCommandServiceTrait for UserCommandService {
    async fn register_user(
        &self,
        req: &RegisterUserRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError> {
        let method = Method::Post;
        let tracing_ctx = self.start_tracing(
            "RegisterUser",
            vec![
                KeyValue::new("component", "user"),
                KeyValue::new("operation", "register"),
                KeyValue::new("user.email", req.email.clone().unwrap_or_default()),
            ],
        );

        if let Err(errors) = req.validate() {
            let field_errors = errors.field_errors();
            let fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
            warn!("⚠️ Registration rejected, missing or blank fields: {fields:?}");

            return Err(self
                .fail(
                    &tracing_ctx,
                    method,
                    ServiceError::Validation(vec![FIELDS_REQUIRED_MESSAGE.into()]),
                )
                .await);
        }

        // validate() guarantees every text field is present
        let (Some(full_name), Some(email), Some(username), Some(password)) = (
            req.full_name.as_deref(),
            req.email.as_deref(),
            req.username.as_deref(),
            req.password.as_deref(),
        ) else {
            return Err(self
                .fail(
                    &tracing_ctx,
                    method,
                    ServiceError::Validation(vec![FIELDS_REQUIRED_MESSAGE.into()]),
                )
                .await);
        };

        let username = username.to_lowercase();

        info!("📝 Registering user: username={username} email={email}");

        match self.query.find_by_username_or_email(&username, email).await {
            Ok(None) => {}
            Ok(Some(existing)) => {
                warn!(
                    "⚠️ Username or email already registered (existing id={})",
                    existing.id
                );
                return Err(self
                    .fail(
                        &tracing_ctx,
                        method,
                        ServiceError::Repo(RepositoryError::AlreadyExists(
                            DUPLICATE_USER_MESSAGE.into(),
                        )),
                    )
                    .await);
            }
            Err(e) => {
                error!("❌ Duplicate check failed: {e:?}");
                return Err(self.fail(&tracing_ctx, method, ServiceError::Repo(e)).await);
            }
        }

        let Some(avatar_local_path) = req.avatar_local_path.as_deref() else {
            return Err(self
                .fail(
                    &tracing_ctx,
                    method,
                    ServiceError::Validation(vec![AVATAR_REQUIRED_MESSAGE.into()]),
                )
                .await);
        };

        let avatar = match self.media.upload(avatar_local_path).await {
            Ok(Some(media)) if media.has_url() => media,
            Ok(_) => {
                return Err(self
                    .fail(
                        &tracing_ctx,
                        method,
                        ServiceError::Upload(AVATAR_UPLOAD_FAILED_MESSAGE.into()),
                    )
                    .await);
            }
            Err(e) => {
                error!("❌ Avatar upload errored: {e:?}");
                return Err(self
                    .fail(
                        &tracing_ctx,
                        method,
                        ServiceError::Upload(AVATAR_UPLOAD_FAILED_MESSAGE.into()),
                    )
                    .await);
            }
        };

        // a failed cover upload does not block registration
        let cover_image = match req.cover_image_local_path.as_deref() {
            Some(path) => match self.media.upload(path).await {
                Ok(Some(media)) if media.has_url() => media.url,
                Ok(_) => {
                    warn!("⚠️ Cover image upload returned no url, continuing without it");
                    String::new()
                }
                Err(e) => {
                    warn!("⚠️ Cover image upload errored, continuing without it: {e:?}");
                    String::new()
                }
            },
            None => String::new(),
        };

        let hashed_password = match self.hash.hash_password(password).await {
            Ok(hash) => hash,
            Err(e) => {
                error!("❌ Failed to hash password: {:?}", e);
                return Err(self
                    .fail(
                        &tracing_ctx,
                        method,
                        ServiceError::Internal("Failed to hash password".into()),
                    )
                    .await);
            }
        };

        let create_req = CreateUserRequest {
            username,
            email: email.to_string(),
            full_name: full_name.to_string(),
            avatar: avatar.url,
            cover_image,
            password: hashed_password,
        };

        let new_user = match self.command.create_user(&create_req).await {
            Ok(user) => {
                info!("✅ User row created: id={}", user.id);
                user
            }
            Err(e) => {
                error!("❌ Failed to create user '{}': {e:?}", create_req.username);
                return Err(self.fail(&tracing_ctx, method, ServiceError::Repo(e)).await);
            }
        };

        let created_user = match self.query.find_by_id(new_user.id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                error!("❌ User id={} vanished right after insert", new_user.id);
                return Err(self
                    .fail(
                        &tracing_ctx,
                        method,
                        ServiceError::Internal(READ_BACK_FAILED_MESSAGE.into()),
                    )
                    .await);
            }
            Err(e) => {
                error!("❌ Failed to read back user id={}: {e:?}", new_user.id);
                return Err(self
                    .fail(
                        &tracing_ctx,
                        method,
                        ServiceError::Internal(READ_BACK_FAILED_MESSAGE.into()),
                    )
                    .await);
            }
        };

        let response = ApiResponse::new(
            StatusCode::CREATED,
            UserResponse::from(created_user),
            REGISTERED_MESSAGE,
        );

        self.complete_tracing_success(&tracing_ctx, method, "User registered successfully")
            .await;

        info!(
            "✅ User registered successfully: {} (ID: {})",
            response.data.username, response.data.id
        );

        Ok(response)
    }
}
