use crate::domain::error::PipelineError;
use crate::domain::error::PipelineError::InvalidKeyError;
use crate::domain::size::ThumbnailSize;

const THUMB_PREFIX: &str = "thumb";
const SEPARATOR: &str = "/";
const MIN_SEGMENTS: usize = 3;

/// Rewrites `<category>/<subcategory>/<rest...>` into `thumb/<size>/<rest...>`.
///
/// The destination lives in the same bucket as the source, so only the key changes.
pub fn derive_thumbnail_key(key: &str, size: ThumbnailSize) -> Result<String, PipelineError> {
    let segments: Vec<&str> = key.split(SEPARATOR).collect();
    if segments.len() < MIN_SEGMENTS {
        return Err(InvalidKeyError {
            key: key.to_string(),
        });
    }

    let size = size.to_string();
    let derived: Vec<&str> = [THUMB_PREFIX, size.as_str()]
        .into_iter()
        .chain(segments.into_iter().skip(2))
        .collect();
    Ok(derived.join(SEPARATOR))
}

/// Keys under `thumb/` are outputs of this pipeline; their notifications are not reprocessed.
pub fn is_thumbnail_key(key: &str) -> bool {
    key.split(SEPARATOR).next() == Some(THUMB_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(px: u32) -> ThumbnailSize {
        ThumbnailSize::new(px).unwrap()
    }

    #[test]
    fn replaces_first_two_segments() {
        let key = "image/png/ea/eg/ad/photo.png";
        assert_eq!(
            derive_thumbnail_key(key, size(200)).unwrap(),
            "thumb/200/ea/eg/ad/photo.png"
        );
        assert_eq!(
            derive_thumbnail_key(key, size(400)).unwrap(),
            "thumb/400/ea/eg/ad/photo.png"
        );
    }

    #[test]
    fn keeps_segment_count() {
        let key = "a/b/c/d";
        let derived = derive_thumbnail_key(key, size(800)).unwrap();
        assert_eq!(derived.split('/').count(), key.split('/').count());
        assert!(derived.ends_with("/c/d"));
    }

    #[test]
    fn minimum_segment_count_is_accepted() {
        assert_eq!(
            derive_thumbnail_key("uploads/raw/cat.gif", size(200)).unwrap(),
            "thumb/200/cat.gif"
        );
    }

    #[test]
    fn empty_trailing_segment_is_preserved() {
        assert_eq!(derive_thumbnail_key("a/b/", size(200)).unwrap(), "thumb/200/");
    }

    #[test]
    fn short_keys_are_rejected() {
        for key in ["flatfile.jpg", "image/flatfile.jpg", ""] {
            match derive_thumbnail_key(key, size(200)) {
                Err(InvalidKeyError { key: rejected }) => assert_eq!(rejected, key),
                other => panic!("expected InvalidKeyError for {key:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let key = "image/jpeg/2024/holiday.jpg";
        assert_eq!(
            derive_thumbnail_key(key, size(400)).unwrap(),
            derive_thumbnail_key(key, size(400)).unwrap()
        );
    }

    #[test]
    fn recognises_derived_keys() {
        assert!(is_thumbnail_key("thumb/200/a/b.png"));
        assert!(is_thumbnail_key("thumb"));
        assert!(!is_thumbnail_key("thumbs/200/a/b.png"));
        assert!(!is_thumbnail_key("image/thumb/a.png"));
        assert!(!is_thumbnail_key("/thumb/200/a.png"));
    }
}
