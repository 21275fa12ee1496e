use courier_backends::MediaKind;

use crate::error::{Error, Result};

const IMAGE_SUFFIXES: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".img"];
const VIDEO_SUFFIXES: &[&str] = &[".mp4", ".avi", ".mov", ".pdf"];
const FILE_SUFFIXES: &[&str] = &[".doc", ".docx", ".xls", ".xlsx", ".zip", ".rar", ".txt"];

/// Classify a request body into a media kind.
///
/// Anything that is not an `http(s)://` URL is plain text. A URL must end
/// in a recognized suffix; an unknown suffix rejects the whole dispatch
/// before anything is sent.
pub fn classify(body: &str) -> Result<MediaKind> {
    if !body.starts_with("http://") && !body.starts_with("https://") {
        return Ok(MediaKind::Text);
    }

    let lower = body.to_lowercase();
    if IMAGE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        Ok(MediaKind::Image)
    } else if VIDEO_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        Ok(MediaKind::Video)
    } else if FILE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        Ok(MediaKind::File)
    } else {
        Err(Error::unsupported_media(body))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("https://x/y.png", MediaKind::Image)]
    #[case("https://x/y.JPG", MediaKind::Image)]
    #[case("https://x/y.mp4", MediaKind::Video)]
    #[case("https://x/y.pdf", MediaKind::Video)]
    #[case("https://x/y.docx", MediaKind::File)]
    #[case("http://x/y.zip", MediaKind::File)]
    #[case("hello", MediaKind::Text)]
    #[case("see https://x/y.png", MediaKind::Text)]
    fn classifies_bodies(#[case] body: &str, #[case] expected: MediaKind) {
        assert_eq!(classify(body).unwrap(), expected);
    }

    #[test]
    fn unknown_url_suffix_is_rejected() {
        let err = classify("https://x/y.unknownext").unwrap_err();
        assert!(matches!(err, Error::UnsupportedMedia { .. }));
    }
}
