use crate::domain::response::media::UploadedMedia;
use anyhow::Result;
use async_trait::async_trait;
use shared::errors::ServiceError;
use std::{path::Path, sync::Arc};

pub type DynMediaUploader = Arc<dyn MediaUploaderTrait + Send + Sync>;

#[async_trait]
pub trait MediaUploaderTrait {
    /// Uploads a local file. `Ok(None)` means the host did not store it; `Err`
    /// is reserved for misconfiguration.
    async fn upload(&self, local_path: &Path) -> Result<Option<UploadedMedia>, ServiceError>;
}
