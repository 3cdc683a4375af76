//! # anki2md
//!
//! Convert Anki card HTML into self-contained Markdown.
//!
//! Anki renders a card's question and answer as HTML fragments that assume
//! Anki's own webview: `<style>` blocks, `<hr id=answer>` markers, bare
//! `[sound:…]` tags and images referencing files in the collection's media
//! folder. This crate turns such a fragment into Markdown that renders
//! anywhere: the divider survives as `---`, audio becomes readable text and
//! every local image is inlined as a `data:` URL.
//!
//! ## Pipeline Overview
//!
//! ```text
//! card HTML
//!  │
//!  ├─ 1. Sanitise   drop <style>/<script>, <hr id=answer> → ---
//!  ├─ 2. Translate  HTML → Markdown (ATX headings, fenced code)
//!  ├─ 3. Audio      [sound:x.mp3] → Audio: `x.mp3`
//!  ├─ 4. Scan       collect distinct image sources
//!  ├─ 5. Resolve    concurrent media lookups → data: URLs
//!  └─ 6. Rewrite    replace only the sources that resolved
//! ```
//!
//! Steps 1–3 are synchronous ([`convert`]); steps 4–6 need a [`MediaStore`]
//! ([`inline_media`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anki2md::{convert_with_media, AnkiConnect, ReviewConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReviewConfig::default();
//!     let anki = AnkiConnect::new(&config)?;
//!     let html = r#"<p>Kanji for "tree"?</p><hr id=answer><img src="ki.png">"#;
//!     println!("{}", convert_with_media(html, &anki).await);
//!     Ok(())
//! }
//! ```
//!
//! For a full fetch → show → answer loop see [`ReviewSession`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `anki2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! anki2md = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod anki;
pub mod card;
pub mod config;
pub mod convert;
pub mod error;
pub mod media_store;
pub mod pipeline;
pub mod scheduler;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use anki::AnkiConnect;
pub use card::{CardContent, CardId, ConversionResult, Ease};
pub use config::{ReviewConfig, ReviewConfigBuilder, Strategy};
pub use convert::{convert, convert_card, convert_with_media, inline_media};
pub use error::Anki2MdError;
pub use media_store::{DirMediaStore, MediaStore};
pub use pipeline::mime::guess_mime_type;
pub use pipeline::resolve::resolve_image_source;
pub use scheduler::{scheduler_for, DirectLookup, GuiSession, Scheduler};
pub use session::{FetchOutcome, RequestId, ReviewCard, ReviewSession};
