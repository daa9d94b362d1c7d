use serde::{Deserialize, Serialize};

/// What the media host hands back for a stored file. Only `url` is kept on
/// the user record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadedMedia {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub secure_url: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl UploadedMedia {
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}
