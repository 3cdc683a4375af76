//! MIME type guessing for inlined card images.
//!
//! Only image types a markdown viewer can actually draw get a specific type;
//! everything else is `application/octet-stream`.

/// Fallback for unknown or missing extensions.
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Guess the MIME type of a media file from its extension.
///
/// The extension is the lowercased text after the last `.`; a name without
/// a dot has no recognised extension.
pub fn guess_mime_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "apng" => "image/apng",
        "avif" => "image/avif",
        "gif" => "image/gif",
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "svg" | "svgz" => "image/svg+xml",
        "webp" => "image/webp",
        _ => DEFAULT_MIME,
    }
}
