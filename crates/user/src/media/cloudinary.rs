use crate::{
    abstract_trait::media::MediaUploaderTrait, config::CloudinaryConfig,
    domain::response::media::UploadedMedia,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use sha2::{Digest, Sha256};
use shared::errors::ServiceError;
use std::{path::Path, time::Duration};
use tracing::{error, info, warn};

/// Signed uploads against the Cloudinary upload API.
#[derive(Clone)]
pub struct CloudinaryUploader {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build Cloudinary HTTP client")?;

        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/auto/upload",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Signs the request parameters: `key=value` pairs sorted by key, joined
    /// with `&`, with the API secret appended, hashed with SHA-256.
    pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let digest = Sha256::digest(format!("{to_sign}{api_secret}").as_bytes());
        format!("{digest:x}")
    }

    async fn send(&self, local_path: &Path) -> Result<UploadedMedia, String> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| format!("failed to read {}: {e}", local_path.display()))?;

        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = Self::sign(
            &[("timestamp", timestamp.clone())],
            &self.config.api_secret,
        );

        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature)
            .part("file", Part::bytes(data).file_name(file_name));

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("upload rejected with {status}: {body}"));
        }

        response
            .json::<UploadedMedia>()
            .await
            .map_err(|e| format!("invalid upload response: {e}"))
    }
}

#[async_trait]
impl MediaUploaderTrait for CloudinaryUploader {
    async fn upload(&self, local_path: &Path) -> Result<Option<UploadedMedia>, ServiceError> {
        if local_path.as_os_str().is_empty() {
            return Ok(None);
        }

        info!("☁️ Uploading {} to Cloudinary", local_path.display());

        match self.send(local_path).await {
            Ok(media) if media.has_url() => {
                info!("✅ File uploaded to Cloudinary: {}", media.url);
                Ok(Some(media))
            }
            Ok(_) => {
                warn!(
                    "⚠️ Cloudinary response for {} carried no url",
                    local_path.display()
                );
                Ok(None)
            }
            Err(e) => {
                error!("❌ Cloudinary upload failed: {e}");
                Ok(None)
            }
        }
    }
}
