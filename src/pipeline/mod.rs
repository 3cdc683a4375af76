//! Pipeline stages for Anki HTML-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! is testable on its own and none depends on a later one.
//!
//! ## Data Flow
//!
//! ```text
//! sanitize ──▶ translate ──▶ media ──▶ resolve ──▶ mime
//! (rules)       (htmd)       (scan)    (lookup)    (extension)
//! ```
//!
//! 1. [`sanitize`]  — drop `<style>`/`<script>` and turn `<hr id=answer>`
//!    into a markdown divider; installed as rules on the translator
//! 2. [`translate`] — generic HTML→Markdown plus `[sound:…]` rewriting and
//!    whitespace tidy-up
//! 3. [`media`]     — find markdown images, resolve each unique source once,
//!    concurrently, and rewrite the ones that changed
//! 4. [`resolve`]   — turn one relative media filename into a `data:` URL via
//!    the media store; the only stage with I/O
//! 5. [`mime`]      — extension-based MIME type for the `data:` URL

pub mod media;
pub mod mime;
pub mod resolve;
pub mod sanitize;
pub mod translate;
