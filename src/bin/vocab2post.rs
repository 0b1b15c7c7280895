//! CLI binary for vocab2post.
//!
//! A thin shim over the library crate that maps flags and environment
//! variables (a `.env` file is honoured) to `Settings` and either serves the
//! webhook or runs a single job in the foreground.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vocab2post::pipeline::fetch::is_url;
use vocab2post::pipeline::llm::backend_from_settings;
use vocab2post::pipeline::vocab::{generative_words, heuristic_words};
use vocab2post::{
    build_router, DocumentFetcher, HttpFetcher, PdfiumExtractor, Pipeline, Settings,
    SettingsBuilder, SpawnDispatcher, TextExtractor, VocabularyStrategy,
};

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the webhook on 127.0.0.1:8940
  vocab2post serve

  # Submit a job to a running server
  curl -X POST localhost:8940/webhook -H 'Content-Type: application/json' \
       -d '{"url": "https://example.com/list.pdf"}'

  # Run one job in the foreground and print the report
  vocab2post run https://example.com/list.pdf --json

  # Only show which words would be used (no CMS; the model only with
  # --strategy generative, which needs AI_API_KEY or AI_PROVIDER)
  vocab2post words https://example.com/list.pdf

ENVIRONMENT VARIABLES (also read from ./.env):
  WP_URL            WordPress posts endpoint (…/wp-json/wp/v2/posts)
  WP_USER           WordPress user name
  WP_APP_PASSWORD   WordPress application password
  AI_API_KEY        Key for the messages endpoint
  AI_API_URL        Messages endpoint (default https://api.anthropic.com/v1/messages)
  AI_PROVIDER       Use an edgequake-llm provider instead (openai, gemini, ollama, …)
  AI_MODEL          Model identifier
  PORT              Listen port (default 8940)
  PDFIUM_LIB_PATH   Path to an existing libpdfium; skips the auto-download
"#;

/// Turn vocabulary-list PDFs into generated passages published to WordPress.
#[derive(Parser, Debug)]
#[command(
    name = "vocab2post",
    version,
    about = "Turn vocabulary-list PDFs into generated passages published to WordPress",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// WordPress posts endpoint.
    #[arg(long, global = true, env = "WP_URL")]
    wp_url: Option<String>,

    /// WordPress user name.
    #[arg(long, global = true, env = "WP_USER")]
    wp_user: Option<String>,

    /// WordPress application password.
    #[arg(long, global = true, env = "WP_APP_PASSWORD", hide_env_values = true)]
    wp_app_password: Option<String>,

    /// API key for the messages endpoint.
    #[arg(long, global = true, env = "AI_API_KEY", hide_env_values = true)]
    ai_api_key: Option<String>,

    /// Messages-style completion endpoint.
    #[arg(long, global = true, env = "AI_API_URL")]
    ai_api_url: Option<String>,

    /// edgequake-llm provider name; overrides the messages endpoint.
    #[arg(long, global = true, env = "AI_PROVIDER")]
    ai_provider: Option<String>,

    /// Model identifier.
    #[arg(long, global = true, env = "AI_MODEL")]
    model: Option<String>,

    /// Max output tokens per model call.
    #[arg(long, global = true, env = "AI_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Vocabulary strategy: heuristic or generative.
    #[arg(long, global = true, env = "VOCAB_STRATEGY", default_value = "heuristic")]
    strategy: String,

    /// Split the words into related groups and publish one post per group.
    #[arg(long, global = true, env = "GROUP_WORDS")]
    group_words: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "VOCAB2POST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "VOCAB2POST_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the webhook and submission page.
    Serve {
        /// Listen address.
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: String,

        /// Listen port.
        #[arg(long, env = "PORT", default_value_t = 8940)]
        port: u16,
    },
    /// Run one job in the foreground.
    Run {
        /// PDF URL.
        url: String,

        /// Print the job report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the vocabulary found in a PDF without generating anything.
    Words {
        /// PDF URL.
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Settings come from the environment; load .env before clap reads it.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Serve { host, port } => serve(&cli, host, *port).await,
        Command::Run { url, json } => run(&cli, url, *json).await,
        Command::Words { url } => words(&cli, url).await,
    }
}

async fn serve(cli: &Cli, host: &str, port: u16) -> Result<()> {
    let settings = build_settings(cli)?;
    let settings = Settings {
        host: host.to_string(),
        port,
        ..settings
    };

    // Fetch pdfium now rather than inside the first job.
    match tokio::task::spawn_blocking(|| pdfium_auto::ensure_pdfium_library(None)).await {
        Ok(Ok(path)) => tracing::info!("PDFium ready at {}", path.display()),
        Ok(Err(e)) => tracing::warn!("PDFium not available yet: {e}"),
        Err(e) => tracing::warn!("PDFium setup task failed: {e}"),
    }

    let pipeline = Arc::new(Pipeline::from_settings(&settings).context("Invalid configuration")?);
    let app = build_router(Arc::new(SpawnDispatcher::new(pipeline)));

    let addr = settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn run(cli: &Cli, url: &str, json: bool) -> Result<()> {
    if !is_url(url) {
        bail!("'{url}' is not an http(s) URL");
    }
    let settings = build_settings(cli)?;
    let pipeline = Pipeline::from_settings(&settings).context("Invalid configuration")?;
    let report = pipeline.run(url).await.context("Job failed")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else {
        for post in &report.posts {
            println!("{}  ({} words)", post.title, post.words.len());
        }
        if !cli.quiet {
            eprintln!(
                "Published {} post(s) from {} words in {}ms",
                report.posts.len(),
                report.stats.word_count,
                report.stats.total_duration_ms
            );
        }
    }
    Ok(())
}

async fn words(cli: &Cli, url: &str) -> Result<()> {
    if !is_url(url) {
        bail!("'{url}' is not an http(s) URL");
    }
    let settings = settings_builder(cli)?
        .build_for_extraction()
        .context("Invalid configuration")?;

    let document = HttpFetcher::from_settings(&settings).fetch(url).await?;
    let text = PdfiumExtractor.extract_text(&document).await?;
    let words = match settings.vocabulary_strategy {
        VocabularyStrategy::Heuristic => heuristic_words(&text),
        VocabularyStrategy::Generative => {
            let backend = backend_from_settings(&settings).context("Invalid configuration")?;
            generative_words(&*backend, &text).await?
        }
    };
    print_words(&words);
    Ok(())
}

fn print_words(words: &[String]) {
    for w in words {
        println!("{w}");
    }
}

/// Map CLI args to a `SettingsBuilder`.
fn settings_builder(cli: &Cli) -> Result<SettingsBuilder> {
    let mut builder = Settings::builder()
        .wp_url(cli.wp_url.clone().unwrap_or_default())
        .wp_user(cli.wp_user.clone().unwrap_or_default())
        .wp_app_password(cli.wp_app_password.clone().unwrap_or_default())
        .max_tokens(cli.max_tokens)
        .vocabulary_strategy(cli.strategy.parse()?)
        .group_words(cli.group_words);

    if let Some(ref key) = cli.ai_api_key {
        builder = builder.ai_api_key(key);
    }
    if let Some(ref url) = cli.ai_api_url {
        builder = builder.ai_api_url(url);
    }
    if let Some(ref provider) = cli.ai_provider {
        builder = builder.ai_provider(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    Ok(builder)
}

/// Fully validated settings for commands that publish.
fn build_settings(cli: &Cli) -> Result<Settings> {
    settings_builder(cli)?
        .build()
        .context("Invalid configuration")
}
