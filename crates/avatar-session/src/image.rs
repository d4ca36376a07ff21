//! Background images stored inline as `data:` URLs.

use crate::error::SessionError;
use base64::Engine;
use std::path::Path;

/// Largest image accepted as a background.
pub const MAX_BACKGROUND_BYTES: usize = 5 * 1024 * 1024;

/// Detects the image type from the first bytes of a file.
pub fn detect_content_type(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF] {
        Some("image/jpeg")
    } else if data.len() >= 8 && data[..8] == [137, 80, 78, 71, 13, 10, 26, 10] {
        Some("image/png")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else if data.len() >= 12 && &data[4..8] == b"ftyp" && matches!(&data[8..12], b"avif" | b"avis") {
        Some("image/avif")
    } else if data.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

/// SVG has no magic number, so it is the one type taken from the extension.
fn is_svg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Reads a local image file into a data URL.
pub async fn read_data_url(path: &Path) -> Result<String, SessionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SessionError::Image(format!("failed to read {}: {e}", path.display())))?;

    if bytes.is_empty() {
        return Err(SessionError::Image(format!("{} is empty", path.display())));
    }
    if bytes.len() > MAX_BACKGROUND_BYTES {
        return Err(SessionError::Image(format!(
            "{} is {} bytes, limit is {MAX_BACKGROUND_BYTES}",
            path.display(),
            bytes.len()
        )));
    }

    let mime = match detect_content_type(&bytes) {
        Some(mime) => mime,
        None if is_svg_path(path) => "image/svg+xml",
        None => {
            return Err(SessionError::Image(format!(
                "unsupported image type: {}",
                path.display()
            )))
        }
    };
    Ok(encode_data_url(mime, &bytes))
}
