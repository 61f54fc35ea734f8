//! dharma-qa CLI: ask questions about Eastern religious texts.

use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use dharma_qa::books;
use dharma_qa::client::{QaBackend, QaClient};
use dharma_qa::config::ClientConfig;
use dharma_qa::error::QaError;
use dharma_qa::form::QueryForm;
use dharma_qa::page::PageController;
use dharma_qa::paths::QaPaths;
use dharma_qa::results::{ResultsView, render_plain};

#[derive(Parser)]
#[command(
    name = "dharma-qa",
    version,
    about = "Ask questions about Buddhism, Hinduism, Taoism and other Eastern traditions"
)]
struct Cli {
    /// Backend base URL (overrides DHARMA_QA_API_URL and the config file).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path to the config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (the default).
    Tui,

    /// Ask one question and print the answer with its sources.
    Ask {
        /// The question.
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Number of sources (1-10); out-of-range or non-numeric input is clamped.
        #[arg(long)]
        top_k: Option<String>,

        /// Restrict the search to one book id (e.g. RBI_007).
        #[arg(long)]
        book: Option<String>,

        /// Let the backend use its AI tools.
        #[arg(long)]
        tools: bool,

        /// Show technical details for every source.
        #[arg(long)]
        details: bool,

        /// Print the raw JSON response instead of formatted text.
        #[arg(long)]
        json: bool,
    },

    /// List the books available for filtering.
    Books,

    /// Check that the backend is reachable.
    Health,
}

/// Where log output goes.
enum LogTarget {
    Stderr,
    File(PathBuf),
    /// The TUI owns the terminal and no state dir is available.
    Discard,
}

fn init_tracing(target: LogTarget) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match target {
        LogTarget::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .into_diagnostic()?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        LogTarget::Discard => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    // The TUI owns the terminal, so its logs go to a file.
    let log_target = if matches!(command, Commands::Tui) {
        match QaPaths::resolve() {
            Ok(paths) => {
                paths.ensure_state_dir()?;
                LogTarget::File(paths.log_file())
            }
            Err(_) => LogTarget::Discard,
        }
    } else {
        LogTarget::Stderr
    };
    init_tracing(log_target)?;

    let config_path = QaPaths::config_file_or(cli.config, QaPaths::resolve)?;
    let config = ClientConfig::resolve(&config_path, cli.api_url.as_deref())?;
    tracing::debug!(api_url = %config.api_url, config = %config_path.display(), "resolved config");

    match command {
        Commands::Tui => {
            dharma_qa::tui::launch(&config)?;
        }

        Commands::Ask {
            question,
            top_k,
            book,
            tools,
            details,
            json,
        } => {
            let client = QaClient::from_config(&config);

            let mut form = QueryForm::new(config.default_top_k);
            form.set_query(question.join(" "));
            if let Some(top_k) = top_k {
                form.set_top_k_input(top_k);
            }
            form.set_using_tools(tools);

            let mut request = form.build_request().ok_or(QaError::EmptyQuestion)?;
            if let Some(book_id) = book.filter(|b| !b.trim().is_empty()) {
                if !books::is_known(&book_id) {
                    tracing::warn!(book_id = %book_id, "book id has no known title; filtering anyway");
                }
                request = request.with_book(book_id);
            }

            let mut page = PageController::new();
            page.submit(&client, &request);
            if let Some(message) = page.error() {
                return Err(QaError::QueryFailed {
                    message: message.to_string(),
                }
                .into());
            }

            if let Some(response) = page.visible_results() {
                if json {
                    println!("{}", serde_json::to_string_pretty(response).into_diagnostic()?);
                } else {
                    print!(
                        "{}",
                        render_plain(&ResultsView::from_response(response), details)
                    );
                }
            }
        }

        Commands::Books => {
            let client = QaClient::from_config(&config);
            let resp = client.fetch_books()?;
            if resp.books.is_empty() {
                println!("No books available.");
            } else {
                println!("Books ({}):", resp.books.len());
                for book in &resp.books {
                    println!("  {:<10} {}", book.id, book.title);
                }
            }
        }

        Commands::Health => {
            let client = QaClient::from_config(&config);
            let status = client.health_check()?;
            println!("{}: {}", client.base_url(), status.status);
        }
    }

    Ok(())
}
