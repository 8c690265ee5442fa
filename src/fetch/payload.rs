//! Payload decoding
//!
//! Turns a fetched body into a self-describing `data:` URL that can be
//! stored and displayed as-is.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::FetchError;

/// Encodes `body` as `data:<mime>;base64,<body>`.
///
/// The MIME type is taken from `content_type` when it names an image,
/// otherwise it is sniffed from the leading bytes. Bodies that are not
/// recognisably an image fail with [`FetchError::Decode`].
pub fn encode_data_url(content_type: Option<&str>, body: &[u8]) -> Result<String, FetchError> {
    let mime = match content_type.and_then(declared_image_type) {
        Some(mime) => mime,
        None => sniff_image_type(body)
            .map(str::to_string)
            .ok_or_else(|| {
                FetchError::Decode(format!(
                    "body is not an image (content type: {})",
                    content_type.unwrap_or("none")
                ))
            })?,
    };

    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(body)))
}

/// Returns the MIME essence of `content_type` if it is an `image/*` type.
fn declared_image_type(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence
        .strip_prefix("image/")
        .filter(|subtype| !subtype.is_empty())
        .map(|_| essence.clone())
}

/// Identifies common image formats by their magic bytes.
pub fn sniff_image_type(body: &[u8]) -> Option<&'static str> {
    if body.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if body.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if body.starts_with(b"GIF87a") || body.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if body.len() >= 12 && &body[0..4] == b"RIFF" && &body[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if body.starts_with(b"BM") {
        return Some("image/bmp");
    }

    let head = &body[..body.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start();
    if (trimmed.starts_with("<svg") || trimmed.starts_with("<?xml")) && trimmed.contains("<svg") {
        return Some("image/svg+xml");
    }
    None
}
