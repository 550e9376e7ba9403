use base64ct::{Base64, Encoding};
use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Transient local preview of the selected image. Never sent to the
/// analysis endpoint; dropped when the screen no longer shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub id: Uuid,
    pub content_type: String,
    pub body: Bytes,
}

impl Preview {
    pub fn url(&self) -> String {
        preview_url(self.id)
    }
}

pub fn preview_url(id: Uuid) -> String {
    format!("/food-analysis/preview/{}", id)
}

/// A selected image in both of its forms.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data_uri: String,
    pub preview: Preview,
}

impl ImageUpload {
    pub fn new(content_type: Option<&str>, body: Bytes) -> Self {
        let content_type = content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        if !is_image(&content_type) {
            debug!(%content_type, "non-image upload accepted");
        }
        let data_uri = to_data_uri(&content_type, &body);
        Self {
            data_uri,
            preview: Preview {
                id: Uuid::new_v4(),
                content_type,
                body,
            },
        }
    }
}

pub fn to_data_uri(content_type: &str, body: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, Base64::encode_string(body))
}

fn is_image(ct: &str) -> bool {
    ct.starts_with("image/")
}
