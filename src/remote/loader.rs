//! Off-screen loading of background images.

use rust_embed::RustEmbed;
use thiserror::Error;

use super::FetchError;
use crate::core::background::ImageSource;
use crate::core::upload::decode_data_url;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

const DEFAULT_BACKGROUND: &str = "default-background.png";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("built-in background is missing")]
    MissingAsset,
    #[error("image reference is not a base64 data URL")]
    InvalidDataUrl,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("decoder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A fully decoded image, ready to hand to the renderer.
#[derive(Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

pub fn default_background_bytes() -> Option<Vec<u8>> {
    Assets::get(DEFAULT_BACKGROUND).map(|file| file.data.into_owned())
}

async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status()));
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Decode raw bytes into RGBA pixels.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, image::ImageError> {
    let img = image::load_from_memory(bytes)?.into_rgba8();
    let (width, height) = img.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba: img.into_raw(),
    })
}

/// Obtain and decode the image behind `source` without touching the screen.
pub async fn load(client: reqwest::Client, source: ImageSource) -> Result<DecodedImage, LoadError> {
    let bytes = match &source {
        ImageSource::Default => default_background_bytes().ok_or(LoadError::MissingAsset)?,
        ImageSource::Remote(url) => fetch_bytes(&client, url).await?,
        ImageSource::Embedded(data_url) => {
            decode_data_url(data_url).ok_or(LoadError::InvalidDataUrl)?
        }
    };
    log::debug!("Decoding {} ({} bytes)", source.describe(), bytes.len());

    let decoded = tokio::task::spawn_blocking(move || decode(&bytes)).await??;
    Ok(decoded)
}
