//! Base64 previews for thumbnail images.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::file::ImageFile;

/// Encodes an image as a `data:` URL, the same shape a browser file
/// reader produces and the same shape server candidates arrive in.
pub fn data_url(image: &ImageFile) -> String {
    format!(
        "data:{};base64,{}",
        image.mime_type,
        STANDARD.encode(&image.data)
    )
}

/// Returns the raw base64 payload of a `data:` URL, or the input unchanged
/// when it is already bare base64.
pub fn strip_data_url(value: &str) -> &str {
    match value.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, payload)| payload),
        None => value,
    }
}
