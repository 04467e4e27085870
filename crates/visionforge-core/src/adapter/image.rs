//! Base64 image payloads for provider requests.

use base64::Engine;

use crate::types::ImageSource;

/// Base64-encoded image ready to send to a provider.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Read and encode an item's image.
    pub async fn load(source: &ImageSource) -> std::io::Result<Self> {
        match source {
            ImageSource::File { path, media_type } => {
                let bytes = tokio::fs::read(path).await?;
                Ok(Self::from_bytes(&bytes, media_type))
            }
            ImageSource::Bytes {
                media_type, data, ..
            } => Ok(Self::from_bytes(data, media_type)),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}
