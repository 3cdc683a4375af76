//! Markup translation: sanitised card HTML → Markdown.
//!
//! Generic HTML→Markdown conversion is delegated to `htmd`, configured for
//! ATX headings and fenced code blocks. The sanitising rules from
//! [`super::sanitize`] are installed on the same converter.
//!
//! Three deterministic passes then run on the Markdown, in this order:
//!
//! 1. `[sound:FILE]` → ``Audio: `FILE` ``
//! 2. collapse runs of blank lines outside fenced code blocks
//! 3. trim leading/trailing whitespace

use super::sanitize;
use htmd::options::{CodeBlockStyle, HeadingStyle, Options};
use htmd::HtmlToMarkdown;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static CONVERTER: Lazy<HtmlToMarkdown> = Lazy::new(|| {
    let options = Options {
        heading_style: HeadingStyle::Atx,
        code_block_style: CodeBlockStyle::Fenced,
        ..Default::default()
    };
    sanitize::install(HtmlToMarkdown::builder().options(options)).build()
});

/// Translate card HTML into Markdown.
///
/// Never fails: malformed HTML is handled by the tolerant HTML5 parser, and
/// if the converter still reports an error the input text goes through the
/// post-processing passes unchanged.
pub fn translate(html: &str) -> String {
    let markdown = match CONVERTER.convert(html) {
        Ok(md) => md,
        Err(e) => {
            warn!("HTML conversion failed, keeping raw card text: {}", e);
            html.to_string()
        }
    };

    let s = rewrite_audio_tags(&markdown);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Pass 1: Audio tags ───────────────────────────────────────────────────────
//
// The converter escapes markdown punctuation in text nodes, so the marker may
// arrive as `\[sound:a\_b.mp3\]`. Escapes are optional around the brackets
// and removed from the captured filename. The filename never contains `]`,
// so an empty `[sound:]` is left as it is.

static RE_SOUND_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\?\[sound:((?:[^\]\\]|\\[^\]])+?)\\?\]").unwrap());

static RE_MARKDOWN_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\([!-/:-@\[-`{-~])").unwrap());

fn rewrite_audio_tags(input: &str) -> String {
    RE_SOUND_TAG
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let filename = RE_MARKDOWN_ESCAPE.replace_all(&caps[1], "$1");
            format!("Audio: `{}`", filename)
        })
        .into_owned()
}

// ── Pass 2: Blank lines ──────────────────────────────────────────────────────

/// Collapse consecutive blank lines to one, leaving fenced code untouched.
///
/// Custom rules emit their own surrounding newlines, which stack up with the
/// converter's block separators.
fn collapse_blank_lines(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut fence: Option<(char, usize)> = None;
    let mut previous_blank = false;

    for line in input.split('\n') {
        if let Some((ch, len, rest)) = fence_marker(line) {
            match fence {
                None => fence = Some((ch, len)),
                Some((open_ch, open_len))
                    if ch == open_ch && len >= open_len && rest.trim().is_empty() =>
                {
                    fence = None
                }
                Some(_) => {}
            }
        }

        if fence.is_none() && line.trim().is_empty() {
            if previous_blank {
                continue;
            }
            previous_blank = true;
            result.push('\n');
            continue;
        }

        previous_blank = false;
        result.push_str(line);
        result.push('\n');
    }

    result.pop();
    result
}

/// Fence character, run length and trailing text of a ```` ``` ```` or `~~~` line.
fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then(|| (ch, len, &trimmed[len..]))
}
