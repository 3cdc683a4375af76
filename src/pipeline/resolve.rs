//! Image-source resolution: one markdown image source → renderable URL.
//!
//! Remote, `data:` and `file:` URLs are already renderable and pass through
//! untouched. Anything else is treated as an Anki media filename, loaded from
//! the [`MediaStore`] and turned into a self-contained `data:` URL so the
//! viewer needs no access to Anki's media folder.
//!
//! Resolution never fails: every problem (undecodable name, missing file,
//! store error) degrades to returning the source unchanged.

use super::mime::guess_mime_type;
use crate::media_store::MediaStore;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_RENDERABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:https?:|data:|file:)").unwrap());

/// Whether the viewer can render `source` without a lookup.
pub fn is_renderable(source: &str) -> bool {
    RE_RENDERABLE.is_match(source.trim())
}

/// Resolve one image source against the media store.
///
/// Returns the original `source` (untrimmed) when it is already renderable
/// or cannot be resolved; otherwise `data:<mime>;base64,<payload>` with the
/// payload exactly as the store returned it.
pub async fn resolve_image_source<S>(source: &str, store: &S) -> String
where
    S: MediaStore + ?Sized,
{
    let trimmed = source.trim();
    if trimmed.is_empty() || is_renderable(trimmed) {
        return source.to_string();
    }

    let filename = media_filename(trimmed);
    if filename.is_empty() {
        return source.to_string();
    }

    match store.retrieve(&filename).await {
        Ok(Some(payload)) if !payload.is_empty() => {
            debug!("Inlined media '{}' ({} base64 bytes)", filename, payload.len());
            format!("data:{};base64,{}", guess_mime_type(&filename), payload)
        }
        Ok(_) => {
            debug!("Media '{}' not found, keeping source", filename);
            source.to_string()
        }
        Err(e) => {
            debug!("Media lookup for '{}' failed, keeping source: {}", filename, e);
            source.to_string()
        }
    }
}

/// Derive the media-store filename from a relative image source.
///
/// Drops any query string or fragment, then percent-decodes. A name that
/// does not decode to UTF-8 is used as written.
pub fn media_filename(source: &str) -> String {
    let path = source.split(['?', '#']).next().unwrap_or_default();
    match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_store::testing::StubStore;

    #[tokio::test]
    async fn absolute_sources_pass_through() {
        let store = StubStore::default().with_file("x", "AAAA");
        for source in [
            "https://x/y.png",
            "http://x/y.png",
            "HTTPS://X/Y.PNG",
            "data:image/png;base64,AAA",
            "file:///tmp/a.gif",
            "  https://x/padded.png  ",
            "",
            "   ",
        ] {
            let resolved = resolve_image_source(source, &store).await;
            assert_eq!(resolved, source);
        }
        assert_eq!(store.calls(), 0, "absolute sources never hit the store");
    }

    #[tokio::test]
    async fn relative_source_becomes_data_url() {
        let store = StubStore::default().with_file("pic.png", "Zm9v");
        let resolved = resolve_image_source("pic.png", &store).await;
        assert_eq!(resolved, "data:image/png;base64,Zm9v");
    }

    #[tokio::test]
    async fn missing_file_keeps_source() {
        let store = StubStore::default();
        let resolved = resolve_image_source("pic.png", &store).await;
        assert_eq!(resolved, "pic.png");
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn empty_payload_keeps_source() {
        let store = StubStore::default().with_file("pic.png", "");
        let resolved = resolve_image_source("pic.png", &store).await;
        assert_eq!(resolved, "pic.png");
    }

    #[tokio::test]
    async fn store_error_keeps_source() {
        let store = StubStore {
            fail: true,
            ..Default::default()
        };
        let resolved = resolve_image_source("pic.png", &store).await;
        assert_eq!(resolved, "pic.png");
    }

    #[tokio::test]
    async fn query_and_fragment_are_stripped_before_lookup() {
        let store = StubStore::default().with_file("my pic.jpg", "Zm9v");
        let resolved = resolve_image_source("my%20pic.jpg?v=2#top", &store).await;
        assert_eq!(resolved, "data:image/jpeg;base64,Zm9v");
        assert_eq!(store.requested(), vec!["my pic.jpg".to_string()]);
    }

    #[tokio::test]
    async fn query_only_source_is_left_alone() {
        let store = StubStore::default();
        let resolved = resolve_image_source("?v=1", &store).await;
        assert_eq!(resolved, "?v=1");
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn media_filename_decoding() {
        assert_eq!(media_filename("a%20b.png"), "a b.png");
        assert_eq!(media_filename("caf%C3%A9.png"), "café.png");
        assert_eq!(media_filename("a.png#frag"), "a.png");
        // Not valid UTF-8 once decoded: fall back to the raw name.
        assert_eq!(media_filename("%FF.png"), "%FF.png");
    }

    #[test]
    fn renderable_detection() {
        assert!(is_renderable("Data:image/gif;base64,R0lG"));
        assert!(!is_renderable("paste-123.png"));
        assert!(!is_renderable("ftp://x/y.png"));
    }
}
