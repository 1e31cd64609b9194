use base64::Engine as _;
use image::ImageFormat;
use thiserror::Error;

/// Largest accepted custom background, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Extensions offered by the file picker.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("image is {size} bytes, the limit is 10 MB")]
    TooLarge { size: usize },
    #[error("only JPEG and PNG images are supported")]
    UnsupportedFormat,
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
}

/// Validate picked file bytes and encode them as a `data:` URL.
pub fn prepare_upload(bytes: &[u8]) -> Result<String, UploadError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { size: bytes.len() });
    }

    let mime = match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        _ => return Err(UploadError::UnsupportedFormat),
    };

    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, encoded))
}

/// Read a picked file from disk and validate it.
///
/// The size is checked from metadata before reading so oversized files are never loaded.
pub async fn read_upload(path: std::path::PathBuf) -> Result<String, UploadError> {
    let display = path.display().to_string();
    let read_err = |e: std::io::Error| UploadError::Read {
        path: display.clone(),
        reason: e.to_string(),
    };

    let meta = tokio::fs::metadata(&path).await.map_err(read_err)?;
    if meta.len() > MAX_UPLOAD_BYTES as u64 {
        return Err(UploadError::TooLarge {
            size: usize::try_from(meta.len()).unwrap_or(usize::MAX),
        });
    }

    let bytes = tokio::fs::read(&path).await.map_err(read_err)?;
    prepare_upload(&bytes)
}

/// Decode the payload of a base64 `data:` URL.
pub fn decode_data_url(data_url: &str) -> Option<Vec<u8>> {
    let rest = data_url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    base64::engine::general_purpose::STANDARD.decode(payload).ok()
}
