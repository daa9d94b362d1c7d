use crate::{
    abstract_trait::user::service::DynUserCommandService,
    domain::{
        requests::user::RegisterUserForm,
        response::{api::ApiResponse, user::UserResponse},
    },
    middleware::multipart::RegisterMultipart,
    state::AppState,
};
use axum::{Extension, Json, response::IntoResponse, routing::post};
use shared::errors::{ErrorResponse, HttpError};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body(content = RegisterUserForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "User registered", body = ApiResponse<UserResponse>),
        (status = 400, description = "Missing fields or avatar", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Upload or storage failure", body = ErrorResponse)
    ),
    tag = "User"
)]
pub async fn register_user_handler(
    Extension(service): Extension<DynUserCommandService>,
    RegisterMultipart { fields, staged }: RegisterMultipart,
) -> Result<impl IntoResponse, HttpError> {
    let result = service.register_user(&fields).await;

    staged.cleanup().await;

    let response = result?;
    Ok((response.status(), Json(response)))
}

pub fn user_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/users/register", post(register_user_handler))
        .layer(Extension(app_state.di_container.user_command.clone()))
        .with_state(app_state)
}
