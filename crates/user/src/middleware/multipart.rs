use crate::domain::requests::user::RegisterUserRequest;
use axum::{
    extract::{
        FromRef, FromRequest, Multipart, Request,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
};
use shared::errors::HttpError;
use std::path::{Path, PathBuf};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

/// Directory where incoming files are written before they are uploaded.
#[derive(Debug, Clone)]
pub struct UploadDir(pub PathBuf);

/// Files written to the upload directory for the current request.
#[derive(Debug, Default)]
pub struct StagedFiles {
    paths: Vec<PathBuf>,
}

impl StagedFiles {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub async fn cleanup(self) {
        for path in self.paths {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!("🧹 Removed staged file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("⚠️ Failed to remove staged file {}: {e}", path.display()),
            }
        }
    }
}

/// Extracts the registration form from a `multipart/form-data` body.
///
/// Text parts fill the optional fields of [`RegisterUserRequest`]; the first
/// `avatar` and `coverImage` files are streamed into the [`UploadDir`] and
/// their paths recorded. Later files under the same key are ignored.
pub struct RegisterMultipart {
    pub fields: RegisterUserRequest,
    pub staged: StagedFiles,
}

impl<S> FromRequest<S> for RegisterMultipart
where
    S: Send + Sync,
    UploadDir: FromRef<S>,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let UploadDir(dir) = UploadDir::from_ref(state);

        let mut multipart = Multipart::from_request(req, state).await.map_err(|rejection| {
            HttpError::BadRequest(format!("Invalid multipart body: {}", rejection.body_text()))
        })?;

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            HttpError::Internal(format!("Failed to prepare upload directory: {e}"))
        })?;

        let mut fields = RegisterUserRequest::default();
        let mut staged = StagedFiles::default();

        match read_parts(&mut multipart, &dir, &mut fields, &mut staged).await {
            Ok(()) => Ok(Self { fields, staged }),
            Err(err) => {
                staged.cleanup().await;
                Err(err)
            }
        }
    }
}

async fn read_parts(
    multipart: &mut Multipart,
    dir: &Path,
    fields: &mut RegisterUserRequest,
    staged: &mut StagedFiles,
) -> Result<(), HttpError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let text_slot = match name.as_str() {
            "fullName" => Some(&mut fields.full_name),
            "email" => Some(&mut fields.email),
            "username" => Some(&mut fields.username),
            "password" => Some(&mut fields.password),
            _ => None,
        };

        if let Some(slot) = text_slot {
            let value = field.text().await.map_err(multipart_error)?;
            if slot.is_none() {
                *slot = Some(value);
            }
            continue;
        }

        let file_slot = match name.as_str() {
            "avatar" => &mut fields.avatar_local_path,
            "coverImage" => &mut fields.cover_image_local_path,
            _ => {
                warn!("⚠️ Skipping unexpected multipart field {name:?}");
                continue;
            }
        };

        if file_slot.is_some() {
            // drain so the stream can move on to the next part
            field.bytes().await.map_err(multipart_error)?;
            continue;
        }

        if let Some(path) = stage_file(dir, field, staged).await? {
            *file_slot = Some(path);
        }
    }

    Ok(())
}

async fn stage_file(
    dir: &Path,
    mut field: Field<'_>,
    staged: &mut StagedFiles,
) -> Result<Option<PathBuf>, HttpError> {
    // a plain text part under a file key is not a file
    let Some(original_name) = field.file_name().map(str::to_string) else {
        warn!("⚠️ Ignoring non-file part {:?}", field.name().unwrap_or_default());
        field.bytes().await.map_err(multipart_error)?;
        return Ok(None);
    };

    let extension = Path::new(&original_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let path = dir.join(format!("{}{extension}", Uuid::new_v4()));

    let mut file = File::create(&path)
        .await
        .map_err(|e| HttpError::Internal(format!("Failed to stage upload: {e}")))?;
    staged.paths.push(path.clone());

    let mut written = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk)
            .await
            .map_err(|e| HttpError::Internal(format!("Failed to stage upload: {e}")))?;
        written += chunk.len();
    }

    file.flush()
        .await
        .map_err(|e| HttpError::Internal(format!("Failed to stage upload: {e}")))?;

    // an untouched file input arrives as an empty part without a name
    if written == 0 && original_name.is_empty() {
        return Ok(None);
    }

    info!(
        "📥 Staged {:?} ({written} bytes) at {}",
        original_name,
        path.display()
    );

    Ok(Some(path))
}

fn multipart_error(err: MultipartError) -> HttpError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HttpError::PayloadTooLarge(err.body_text())
    } else {
        HttpError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}
