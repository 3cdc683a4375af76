//! Conversion entry points.
//!
//! [`convert`] is the synchronous half (sanitise + translate) and
//! [`inline_media`] the asynchronous half (media lookup). They are usually
//! composed as `inline_media(&convert(html), store)`, which
//! [`convert_with_media`] does for one fragment and [`convert_card`] does for
//! both sides of a card at once.

use crate::card::{CardContent, ConversionResult};
use crate::config::ReviewConfig;
use crate::media_store::MediaStore;
use crate::pipeline::{media, translate};
use std::time::Instant;
use tracing::debug;

/// Convert Anki card HTML into Markdown.
///
/// Drops `<style>`/`<script>`, keeps `<hr id=answer>` as a `---` divider and
/// rewrites `[sound:…]` tags as readable text. Image sources are left as
/// they are; see [`inline_media`].
pub fn convert(html: impl AsRef<str>) -> String {
    translate::translate(html.as_ref())
}

/// Replace relative image sources in `markdown` with `data:` URLs.
///
/// Each distinct source is looked up once and all lookups run concurrently.
/// Sources that cannot be resolved are left untouched.
pub async fn inline_media<S>(markdown: &str, store: &S) -> String
where
    S: MediaStore + ?Sized,
{
    media::inline_media(markdown, store).await
}

/// [`convert`] followed by [`inline_media`].
pub async fn convert_with_media<S>(html: impl AsRef<str>, store: &S) -> String
where
    S: MediaStore + ?Sized,
{
    let markdown = convert(html);
    inline_media(&markdown, store).await
}

/// Convert both sides of a card concurrently.
///
/// Media inlining is skipped when `config.inline_media` is false.
pub async fn convert_card<S>(card: &CardContent, store: &S, config: &ReviewConfig) -> ConversionResult
where
    S: MediaStore + ?Sized,
{
    let start = Instant::now();

    let side = |html: &str| {
        let markdown = convert(html);
        async move {
            if config.inline_media {
                inline_media(&markdown, store).await
            } else {
                markdown
            }
        }
    };

    let (question_markdown, answer_markdown) =
        tokio::join!(side(&card.question), side(&card.answer));

    debug!(
        "Converted card {} in {}ms",
        card.card_id,
        start.elapsed().as_millis()
    );

    ConversionResult {
        question_markdown,
        answer_markdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardId;
    use crate::media_store::testing::StubStore;

    fn card(question: &str, answer: &str) -> CardContent {
        CardContent {
            card_id: CardId(1),
            question: question.into(),
            answer: answer.into(),
        }
    }

    #[tokio::test]
    async fn convert_card_both_sides() {
        let store = StubStore::default().with_file("cat.png", "Zm9v");
        let c = card(
            r#"<p>What is this?</p><img src="cat.png">"#,
            r#"<p>What is this?</p><img src="cat.png"><hr id=answer><p>A cat</p>"#,
        );
        let result = convert_card(&c, &store, &ReviewConfig::default()).await;

        assert!(result.question_markdown.contains("data:image/png;base64,Zm9v"));
        assert!(result.answer_markdown.contains("data:image/png;base64,Zm9v"));
        assert!(result.answer_markdown.contains("---"));
        assert!(result.answer_markdown.ends_with("A cat"));
    }

    #[tokio::test]
    async fn convert_card_without_media() {
        let store = StubStore::default().with_file("cat.png", "Zm9v");
        let config = ReviewConfig::builder().inline_media(false).build().unwrap();
        let result = convert_card(&card(r#"<img src="cat.png">"#, "<p>x</p>"), &store, &config).await;
        assert!(result.question_markdown.contains("(cat.png)"));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn convert_with_media_composes() {
        let store = StubStore::default().with_file("a.svg", "PHN2Zz4=");
        let md = convert_with_media(r#"<p>[sound:a.mp3]</p><img src="a.svg" alt="diagram">"#, &store).await;
        assert!(md.contains("Audio: `a.mp3`"), "got: {md:?}");
        assert!(md.contains("![diagram](data:image/svg+xml;base64,PHN2Zz4=)"), "got: {md:?}");
    }
}
