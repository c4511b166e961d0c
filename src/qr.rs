//! Payment-request QR code rendering.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use qrcode::types::QrError as EncodeError;

/// Pixels per QR module.
pub const MODULE_SIZE: u32 = 10;

type Result<T> = std::result::Result<T, QrError>;

#[derive(thiserror::Error, Debug)]
pub enum QrError {
    #[error("cannot encode payload: {0}")]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("encoder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Render `payload` as a black-on-white QR symbol.
///
/// Error correction is level L and the smallest version holding the payload
/// is picked.
pub fn render(payload: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)?;

    Ok(code
        .render::<Luma<u8>>()
        .dark_color(Luma([0]))
        .light_color(Luma([255]))
        .quiet_zone(true)
        .module_dimensions(MODULE_SIZE, MODULE_SIZE)
        .build())
}

/// Render `payload` into a PNG file at `path`, creating its directory.
fn write(path: &Path, payload: &str) -> Result<()> {
    let image = render(payload)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Writes QR images to one fixed file.
///
/// Every call overwrites the previous image. Concurrent callers are not
/// serialized and may interleave their writes.
#[derive(Debug, Clone)]
pub struct QrEncoder {
    path: PathBuf,
}

impl QrEncoder {
    /// Create a new [`QrEncoder`] writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output path of every generated image.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode `payload`, save it as PNG and return where it was written.
    ///
    /// Encoding and the file write run on the blocking thread pool.
    pub async fn generate(&self, payload: &str) -> Result<&Path> {
        let path = self.path.clone();
        let owned = payload.to_owned();
        tokio::task::spawn_blocking(move || write(&path, &owned)).await??;

        tracing::debug!(path = %self.path.display(), size = payload.len(), "qr code written");
        Ok(&self.path)
    }
}
