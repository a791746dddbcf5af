use vidflow_protocol::constants::{MAX_THUMBNAIL_BYTES, MAX_VIDEO_BYTES};

use crate::IntakeError;
use crate::file::{ImageFile, SelectedFile};

/// Validates a video before anything else runs.
///
/// Rejects:
/// - Types not starting with `video/`
/// - Sizes at or above `max_bytes` (defaults to 500 MiB when `None`)
pub fn validate_video_file(file: &SelectedFile, max_bytes: Option<u64>) -> Result<(), IntakeError> {
    if !file.mime_type.starts_with("video/") {
        return Err(IntakeError::UnsupportedType(file.mime_type.clone()));
    }

    let limit = max_bytes.unwrap_or(MAX_VIDEO_BYTES);
    if file.size >= limit {
        return Err(IntakeError::TooLarge {
            size: file.size,
            limit,
        });
    }

    Ok(())
}

/// Validates a custom thumbnail image.
///
/// Rejects types not starting with `image/` and images larger than
/// `max_bytes` (defaults to 2 MiB when `None`). An image of exactly the
/// ceiling is accepted.
pub fn validate_thumbnail_file(image: &ImageFile, max_bytes: Option<u64>) -> Result<(), IntakeError> {
    if !image.mime_type.starts_with("image/") {
        return Err(IntakeError::UnsupportedType(image.mime_type.clone()));
    }

    let limit = max_bytes.unwrap_or(MAX_THUMBNAIL_BYTES);
    if image.size() > limit {
        return Err(IntakeError::TooLarge {
            size: image.size(),
            limit,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(mime: &str, size: u64) -> SelectedFile {
        SelectedFile::new("clip", mime, size)
    }

    #[test]
    fn accepts_small_mp4() {
        assert!(validate_video_file(&video("video/mp4", 10 * 1024 * 1024), None).is_ok());
    }

    #[test]
    fn accepts_empty_video() {
        assert!(validate_video_file(&video("video/webm", 0), None).is_ok());
    }

    #[test]
    fn rejects_non_video_types() {
        for mime in ["image/png", "application/pdf", "text/plain", "", "videos/mp4"] {
            let err = validate_video_file(&video(mime, 10), None).unwrap_err();
            assert!(err.is_type_error(), "{mime} should be a type error");
        }
    }

    #[test]
    fn rejects_at_size_ceiling() {
        let err = validate_video_file(&video("video/mp4", 524_288_000), None).unwrap_err();
        assert!(err.is_size_error());
    }

    #[test]
    fn accepts_just_below_ceiling() {
        assert!(validate_video_file(&video("video/mp4", 524_287_999), None).is_ok());
    }

    #[test]
    fn type_checked_before_size() {
        let err = validate_video_file(&video("image/png", u64::MAX), None).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn custom_video_limit() {
        assert!(validate_video_file(&video("video/mp4", 100), Some(100)).is_err());
        assert!(validate_video_file(&video("video/mp4", 99), Some(100)).is_ok());
    }

    #[test]
    fn thumbnail_accepts_image_at_ceiling() {
        let image = ImageFile::new("t.png", "image/png", vec![0; 2 * 1024 * 1024]);
        assert!(validate_thumbnail_file(&image, None).is_ok());
    }

    #[test]
    fn thumbnail_rejects_over_ceiling() {
        let image = ImageFile::new("t.png", "image/png", vec![0; 2 * 1024 * 1024 + 1]);
        let err = validate_thumbnail_file(&image, None).unwrap_err();
        assert!(err.is_size_error());
    }

    #[test]
    fn thumbnail_rejects_non_image() {
        let image = ImageFile::new("t.mp4", "video/mp4", vec![0; 10]);
        let err = validate_thumbnail_file(&image, None).unwrap_err();
        assert!(err.is_type_error());
    }
}
