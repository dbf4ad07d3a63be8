//! Portfolio image hosting via the Cloudinary upload API.
//!
//! Files are checked against the allow-list and the size ceiling before any
//! upload starts. Uploads run concurrently; the returned URLs keep the order
//! of the input files. An upload that succeeds while a later step fails leaves
//! the hosted image in place.

use chrono::Utc;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::ImageStoreConfig;

/// Cloudinary API base URL.
const BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Most images accepted in one upload request.
pub const MAX_IMAGES_PER_UPLOAD: usize = 5;

const ALLOWED_TYPES: &[&str] = &["jpeg", "jpg", "png"];

/// Errors that can occur when validating or hosting images.
#[derive(Debug, Error)]
pub enum ImageStoreError {
    /// File is not a JPEG or PNG by declared type or extension.
    #[error("Only JPEG and PNG images are allowed")]
    UnsupportedType,

    /// File exceeds [`MAX_IMAGE_BYTES`].
    #[error("Each image must be 5MB or smaller")]
    TooLarge,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Upload task panicked or was cancelled.
    #[error("upload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One file received from a client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check the declared content type, the file extension and the size.
    ///
    /// Content is not sniffed; a mislabelled file passes if both labels agree.
    ///
    /// # Errors
    ///
    /// Returns `ImageStoreError::UnsupportedType` or `ImageStoreError::TooLarge`.
    pub fn validate(&self) -> Result<(), ImageStoreError> {
        let mime_ok = self
            .content_type
            .to_ascii_lowercase()
            .strip_prefix("image/")
            .is_some_and(|subtype| ALLOWED_TYPES.contains(&subtype));
        let ext_ok = self
            .file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ALLOWED_TYPES.contains(&ext.to_ascii_lowercase().as_str()));

        if !(mime_ok && ext_ok) {
            return Err(ImageStoreError::UnsupportedType);
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageStoreError::TooLarge);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Cloudinary client for signed image uploads.
#[derive(Clone)]
pub struct ImageStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    folder: String,
}

impl ImageStore {
    /// Create a new image store client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ImageStoreConfig) -> Result<Self, ImageStoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
        })
    }

    /// Upload every image and return their hosted URLs in input order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; images uploaded before it stay hosted.
    pub async fn upload_all(&self, images: Vec<ImageUpload>) -> Result<Vec<String>, ImageStoreError> {
        let handles: Vec<_> = images
            .into_iter()
            .map(|image| {
                let store = self.clone();
                tokio::spawn(async move { store.upload(image).await })
            })
            .collect();

        let mut urls = Vec::with_capacity(handles.len());
        for handle in handles {
            urls.push(handle.await??);
        }
        Ok(urls)
    }

    /// Upload one image.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Cloudinary rejects the upload.
    pub async fn upload(&self, image: ImageUpload) -> Result<String, ImageStoreError> {
        let url = format!("{BASE_URL}/{}/image/upload", self.cloud_name);
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let file = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ImageStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        tracing::debug!(url = %body.secure_url, "Image uploaded");
        Ok(body.secure_url)
    }
}

/// Sign upload parameters: sorted `key=value` pairs joined by `&`, followed
/// by the API secret, hashed with SHA-256.
fn sign(params: &[(&str, &str)], api_secret: &SecretString) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by_key(|(k, _)| *k);
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.expose_secret().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: &str, len: usize) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0; len],
        }
    }

    #[test]
    fn test_accepts_jpeg_and_png() {
        assert!(upload("cake.jpg", "image/jpeg", 10).validate().is_ok());
        assert!(upload("cake.JPEG", "image/jpeg", 10).validate().is_ok());
        assert!(upload("cake.png", "image/png", 10).validate().is_ok());
    }

    #[test]
    fn test_rejects_mismatched_or_other_types() {
        assert!(matches!(
            upload("cake.gif", "image/gif", 10).validate(),
            Err(ImageStoreError::UnsupportedType)
        ));
        assert!(matches!(
            upload("cake.png", "application/pdf", 10).validate(),
            Err(ImageStoreError::UnsupportedType)
        ));
        assert!(matches!(
            upload("cake", "image/png", 10).validate(),
            Err(ImageStoreError::UnsupportedType)
        ));
    }

    #[test]
    fn test_size_ceiling() {
        assert!(upload("a.png", "image/png", MAX_IMAGE_BYTES).validate().is_ok());
        assert!(matches!(
            upload("a.png", "image/png", MAX_IMAGE_BYTES + 1).validate(),
            Err(ImageStoreError::TooLarge)
        ));
    }

    #[test]
    fn test_signature_sorts_params() {
        let secret = SecretString::from("abcd");
        let a = sign(&[("timestamp", "1"), ("folder", "f")], &secret);
        let b = sign(&[("folder", "f"), ("timestamp", "1")], &secret);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
