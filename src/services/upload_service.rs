use crate::error::{AppError, AppResult};
use crate::utils::generate_upload_file_name;
use std::path::PathBuf;

/// Public prefix under which stored proofs are referenced.
pub const PAYMENT_UPLOAD_PREFIX: &str = "/uploads/payments";

/// Image received with a checkout, held in memory until the order is known to be online.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Disk storage for proof-of-payment images.
#[derive(Clone)]
pub struct UploadService {
    upload_dir: PathBuf,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(upload_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn check_image(&self, content_type: &str) -> AppResult<()> {
        if !content_type.starts_with("image/") {
            return Err(AppError::ValidationError(
                "Not an image! Please upload an image.".to_string(),
            ));
        }
        Ok(())
    }

    /// Writes the file and returns the relative path stored on the order.
    pub async fn save_payment_proof(&self, file: UploadedFile) -> AppResult<String> {
        self.check_image(&file.content_type)?;
        if file.data.len() > self.max_bytes {
            return Err(AppError::ValidationError(format!(
                "Payment screenshot exceeds {} bytes",
                self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let name = generate_upload_file_name(file.file_name.as_deref());
        tokio::fs::write(self.upload_dir.join(&name), &file.data).await?;

        log::info!("Stored payment screenshot {name} ({} bytes)", file.data.len());
        Ok(format!("{PAYMENT_UPLOAD_PREFIX}/{name}"))
    }

    /// Deletes a proof stored by `save_payment_proof`, given the path it returned.
    pub async fn remove_payment_proof(&self, stored_path: &str) {
        let Some(name) = stored_path
            .strip_prefix(PAYMENT_UPLOAD_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
        else {
            log::warn!("Refusing to remove unexpected upload path {stored_path}");
            return;
        };

        if let Err(e) = tokio::fs::remove_file(self.upload_dir.join(name)).await {
            log::error!("Failed to remove payment screenshot {name}: {e}");
        }
    }
}
