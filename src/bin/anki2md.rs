//! CLI binary for anki2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ReviewConfig` and prints results.

use anki2md::{
    convert, inline_media, scheduler_for, AnkiConnect, CardId, ConversionResult, DirMediaStore,
    Ease, FetchOutcome, MediaStore, ReviewConfig, ReviewSession, Strategy,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner shown while Anki is busy ─────────────────────────────────────────

/// Spinner on stderr; hidden when `enabled` is false so callers need no branches.
fn spinner(enabled: bool, prefix: &'static str, msg: &str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(prefix);
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert exported card HTML, inlining images from the media folder
  anki2md convert card.html --media-dir ~/.local/share/Anki2/User\ 1/collection.media

  # Convert from stdin, resolving images through a running Anki
  cat card.html | anki2md convert --anki

  # Show the next due card of a deck
  anki2md review --deck "Japanese::Core 2k"

  # Show it and grade it "good"
  anki2md review --deck Japanese --answer good

  # Mirror Anki's own reviewer instead of searching for due cards
  anki2md review --deck Japanese --strategy gui

  # Check that AnkiConnect is reachable
  anki2md ping

ENVIRONMENT VARIABLES:
  ANKI_CONNECT_URL   AnkiConnect endpoint (default http://127.0.0.1:8765)
  ANKI_CONNECT_KEY   AnkiConnect API key, if the add-on requires one
  RUST_LOG           Override the log filter (e.g. anki2md=debug)

SETUP:
  1. Install the AnkiConnect add-on (code 2055492159) and restart Anki.
  2. Keep Anki running while using `review`, `ping` or `convert --anki`.
"#;

/// Convert Anki card HTML to self-contained Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "anki2md",
    version,
    about = "Convert Anki card HTML to self-contained Markdown",
    long_about = "Convert Anki card HTML to Markdown: styles and scripts are dropped, the \
answer divider is kept, sound tags become readable text and local images are inlined as \
data: URLs. Talks to a running Anki through the AnkiConnect add-on.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// AnkiConnect endpoint URL.
    #[arg(long, global = true, env = "ANKI_CONNECT_URL", default_value = anki2md::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// AnkiConnect API key.
    #[arg(long, global = true, env = "ANKI_CONNECT_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "ANKI2MD_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "ANKI2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "ANKI2MD_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an HTML file (or stdin) to Markdown.
    Convert {
        /// HTML file to convert; reads stdin when omitted.
        file: Option<PathBuf>,

        /// Resolve images from this collection.media directory.
        #[arg(long, conflicts_with = "anki")]
        media_dir: Option<PathBuf>,

        /// Resolve images through AnkiConnect.
        #[arg(long)]
        anki: bool,

        /// Output JSON instead of Markdown.
        #[arg(long)]
        json: bool,
    },

    /// Show the next due card of a deck, optionally grading it.
    Review {
        /// Deck name, including parents (e.g. "Lang::Japanese").
        #[arg(long, short)]
        deck: String,

        /// How the next card is chosen.
        #[arg(long, value_enum, default_value = "direct")]
        strategy: StrategyArg,

        /// Grade to submit after showing the card: again, hard, good, easy or 1–4.
        #[arg(long, value_parser = parse_ease)]
        answer: Option<Ease>,

        /// Leave image sources as they are.
        #[arg(long)]
        no_media: bool,

        /// Output JSON instead of Markdown.
        #[arg(long)]
        json: bool,
    },

    /// Print the AnkiConnect API version.
    Ping,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum StrategyArg {
    Direct,
    Gui,
}

impl From<StrategyArg> for Strategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Direct => Strategy::DirectLookup,
            StrategyArg::Gui => Strategy::GuiSession,
        }
    }
}

fn parse_ease(s: &str) -> std::result::Result<Ease, String> {
    s.parse::<Ease>().map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct ConvertOutput<'a> {
    markdown: &'a str,
}

#[derive(Serialize)]
struct ReviewOutput<'a> {
    deck: &'a str,
    card_id: Option<CardId>,
    #[serde(flatten)]
    markdown: Option<&'a ConversionResult>,
    answered: Option<Ease>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let global = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Convert {
            file,
            media_dir,
            anki,
            json,
        } => run_convert(global, file.as_ref(), media_dir.as_ref(), *anki, *json).await,
        Command::Review {
            deck,
            strategy,
            answer,
            no_media,
            json,
        } => {
            let config = build_config(global, strategy.clone().into(), !no_media)?;
            run_review(global, config, deck, *answer, *json).await
        }
        Command::Ping => run_ping(global).await,
    }
}

/// Map global CLI args to `ReviewConfig`.
fn build_config(global: &GlobalArgs, strategy: Strategy, inline_media: bool) -> Result<ReviewConfig> {
    let mut builder = ReviewConfig::builder()
        .endpoint(global.endpoint.clone())
        .request_timeout_secs(global.timeout)
        .strategy(strategy)
        .inline_media(inline_media);
    if let Some(ref key) = global.api_key {
        builder = builder.api_key(key.clone());
    }
    builder.build().context("Invalid configuration")
}

// ── convert ──────────────────────────────────────────────────────────────────

async fn run_convert(
    global: &GlobalArgs,
    file: Option<&PathBuf>,
    media_dir: Option<&PathBuf>,
    anki: bool,
    json: bool,
) -> Result<()> {
    let html = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let store: Option<Arc<dyn MediaStore>> = if let Some(dir) = media_dir {
        Some(Arc::new(DirMediaStore::new(dir.clone())))
    } else if anki {
        let config = build_config(global, Strategy::default(), true)?;
        Some(Arc::new(
            AnkiConnect::new(&config).context("Failed to create AnkiConnect client")?,
        ))
    } else {
        None
    };

    let markdown = convert(&html);
    let markdown = match store {
        Some(store) => {
            let bar = spinner(!global.quiet && !json, "Inlining", "resolving media…");
            let out = inline_media(&markdown, store.as_ref()).await;
            bar.finish_and_clear();
            out
        }
        None => markdown,
    };

    if json {
        let out = serde_json::to_string_pretty(&ConvertOutput {
            markdown: &markdown,
        })
        .context("Failed to serialise output")?;
        println!("{out}");
    } else {
        write_markdown(&markdown)?;
    }
    Ok(())
}

// ── review ───────────────────────────────────────────────────────────────────

async fn run_review(
    global: &GlobalArgs,
    config: ReviewConfig,
    deck: &str,
    answer: Option<Ease>,
    json: bool,
) -> Result<()> {
    let client = Arc::new(AnkiConnect::new(&config).context("Failed to create AnkiConnect client")?);
    let scheduler = scheduler_for(config.strategy, client.clone());
    let session = ReviewSession::new(scheduler, client, deck, config);

    let bar = spinner(!global.quiet && !json, "Fetching", &format!("next card in '{deck}'…"));
    let outcome = session.load_next().await;
    bar.finish_and_clear();

    let card = match outcome.with_context(|| format!("Failed to fetch the next card in '{deck}'"))? {
        FetchOutcome::Applied(card) => card,
        FetchOutcome::Empty | FetchOutcome::Stale => {
            if json {
                print_review_json(deck, None, None)?;
            } else if !global.quiet {
                eprintln!("{} No cards due in {}", green("✔"), bold(deck));
            }
            return Ok(());
        }
    };

    if !json {
        write_card(&card.markdown)?;
    }

    if let Some(ease) = answer {
        let bar = spinner(!global.quiet && !json, "Answering", &format!("card {}…", card.card_id));
        let result = session.answer(ease).await;
        bar.finish_and_clear();
        if let Err(e) = result {
            if !global.quiet {
                eprintln!("{} Card {} was not graded", red("✘"), card.card_id);
            }
            return Err(e).context("Failed to submit answer");
        }
        if !global.quiet && !json {
            eprintln!(
                "{} Card {} graded {}",
                green("✔"),
                card.card_id,
                bold(ease.label())
            );
        }
    }

    if json {
        print_review_json(deck, Some((card.card_id, &card.markdown)), answer)?;
    }
    Ok(())
}

fn print_review_json(
    deck: &str,
    card: Option<(CardId, &ConversionResult)>,
    answered: Option<Ease>,
) -> Result<()> {
    let out = ReviewOutput {
        deck,
        card_id: card.map(|(id, _)| id),
        markdown: card.map(|(_, md)| md),
        answered,
    };
    let json = serde_json::to_string_pretty(&out).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

/// Print the answer side, which already repeats the question above its divider.
///
/// Cards without an answer divider get the question printed first.
fn write_card(markdown: &ConversionResult) -> Result<()> {
    if has_answer_divider(&markdown.answer_markdown) {
        write_markdown(&markdown.answer_markdown)
    } else {
        write_markdown(&format!(
            "{}\n\n---\n\n{}",
            markdown.question_markdown, markdown.answer_markdown
        ))
    }
}

/// Whether `markdown` has a divider line of its own, not just `---` inside text.
fn has_answer_divider(markdown: &str) -> bool {
    markdown.lines().any(|line| line.trim() == "---")
}

// ── ping ─────────────────────────────────────────────────────────────────────

async fn run_ping(global: &GlobalArgs) -> Result<()> {
    let config = build_config(global, Strategy::default(), true)?;
    let client = AnkiConnect::new(&config).context("Failed to create AnkiConnect client")?;
    let version = client
        .version()
        .await
        .with_context(|| format!("AnkiConnect at {} did not answer", client.endpoint()))?;
    if global.quiet {
        println!("{version}");
    } else {
        println!(
            "{} AnkiConnect {}  {}",
            green("✔"),
            bold(&format!("v{version}")),
            dim(client.endpoint())
        );
    }
    Ok(())
}

fn write_markdown(markdown: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(markdown.as_bytes())
        .context("Failed to write to stdout")?;
    // Ensure a trailing newline on stdout.
    if !markdown.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_must_be_its_own_line() {
        assert!(has_answer_divider("Q\n\n---\n\nA"));
        assert!(!has_answer_divider("a --- b"));
        assert!(!has_answer_divider("```\nx---y\n```"));
        assert!(!has_answer_divider("----"));
    }
}
