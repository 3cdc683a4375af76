//! Media inlining: rewrite markdown image sources into renderable URLs.
//!
//! ## Algorithm
//!
//! 1. Scan the markdown for `![alt](source "title")` and collect the *set* of
//!    sources. The same image often appears on both card sides, so
//!    duplicates collapse before any lookup.
//! 2. Resolve every unique source concurrently and await them together;
//!    total latency tracks the slowest lookup, not the sum.
//! 3. Rewrite only the occurrences whose source actually changed. Anything
//!    left unresolved stays byte-identical, title included.
//!
//! The scan only has to recognise the image syntax the translator itself
//! emits.

use super::resolve::resolve_image_source;
use crate::media_store::MediaStore;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

static RE_MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!\[([^\]]*)\]\((\S+?)(?:\s+"([^"]*)")?\)"#).unwrap());

/// Collect the unique image sources referenced in `markdown`.
pub fn image_sources(markdown: &str) -> BTreeSet<&str> {
    RE_MARKDOWN_IMAGE
        .captures_iter(markdown)
        .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
        .filter(|source| !source.is_empty())
        .collect()
}

/// Inline every resolvable image in `markdown`.
///
/// Returns the input unchanged, without touching the store, when it contains
/// no images.
pub async fn inline_media<S>(markdown: &str, store: &S) -> String
where
    S: MediaStore + ?Sized,
{
    let sources = image_sources(markdown);
    if sources.is_empty() {
        return markdown.to_string();
    }
    debug!("Resolving {} unique image source(s)", sources.len());

    let resolved: HashMap<&str, String> = join_all(sources.into_iter().map(|source| async move {
        (source, resolve_image_source(source, store).await)
    }))
    .await
    .into_iter()
    .collect();

    RE_MARKDOWN_IMAGE
        .replace_all(markdown, |caps: &regex::Captures<'_>| {
            let source = &caps[2];
            match resolved.get(source) {
                Some(new_source) if new_source != source => {
                    let alt = &caps[1];
                    match caps.get(3).map(|m| m.as_str()) {
                        Some(title) if !title.is_empty() => {
                            format!("![{}]({} \"{}\")", alt, new_source, title)
                        }
                        _ => format!("![{}]({})", alt, new_source),
                    }
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
