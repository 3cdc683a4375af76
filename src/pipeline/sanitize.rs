//! Structural sanitising: the Anki-specific rules applied during translation.
//!
//! Anki renders card HTML in a webview that applies the note type's CSS and
//! JS. A markdown viewer applies neither, so `<style>` and `<script>` bodies
//! would otherwise leak into the output as plain text.
//!
//! The answer side of most note types repeats the question followed by
//! `<hr id=answer>`. That marker is the only structural boundary between the
//! two halves, so it must survive as a visible divider.
//!
//! Both rules run inside the translator, on parsed elements, so attribute
//! quoting, tag case and self-closing forms are already normalised.

use htmd::{Element, HtmlToMarkdownBuilder};

/// Elements dropped together with everything inside them.
pub const SKIPPED_TAGS: [&str; 4] = ["head", "noscript", "script", "style"];

/// Markdown emitted for `<hr id="answer">`.
pub const ANSWER_DIVIDER: &str = "\n\n---\n\n";

/// Markdown emitted for any other `<hr>`.
///
/// Kept distinct from [`ANSWER_DIVIDER`] so the answer boundary stays
/// recognisable in the output.
pub const THEMATIC_BREAK: &str = "\n\n* * *\n\n";

/// Attribute value marking the question/answer boundary.
const ANSWER_ID: &str = "answer";

/// Install the sanitising rules on a translator builder.
pub fn install(builder: HtmlToMarkdownBuilder) -> HtmlToMarkdownBuilder {
    builder
        .skip_tags(SKIPPED_TAGS.to_vec())
        .add_handler(vec!["hr"], |element: Element| {
            let is_answer = element
                .attrs
                .iter()
                .any(|attr| is_answer_marker(&attr.name.local, &attr.value));
            if is_answer {
                Some(ANSWER_DIVIDER.to_string())
            } else {
                Some(THEMATIC_BREAK.to_string())
            }
        })
}

/// Whether an attribute is `id=answer`, ignoring the case of the value.
fn is_answer_marker(name: &str, value: &str) -> bool {
    name == "id" && value.eq_ignore_ascii_case(ANSWER_ID)
}
