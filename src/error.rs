//! Top-level diagnostic error type for dharma-qa.
//!
//! Subsystems define their own error enums next to the code that raises
//! them; `QaError` wraps them transparently so codes and help text reach the
//! user unchanged.

use miette::Diagnostic;
use thiserror::Error;

use crate::client::ClientError;
use crate::config::ConfigError;
use crate::paths::PathError;

#[derive(Debug, Error, Diagnostic)]
pub enum QaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error("the question is empty")]
    #[diagnostic(
        code(dharma::ask::empty_question),
        help("Pass the question as arguments, e.g. `dharma-qa ask What is karma?`")
    )]
    EmptyQuestion,

    #[error("{message}")]
    #[diagnostic(
        code(dharma::ask::failed),
        help("Run `dharma-qa health` to check the backend, or set RUST_LOG=debug for details.")
    )]
    QueryFailed { message: String },

    #[error("terminal error")]
    #[diagnostic(
        code(dharma::tui::terminal),
        help("The TUI needs an interactive terminal; use `dharma-qa ask` in scripts.")
    )]
    Terminal {
        #[source]
        source: std::io::Error,
    },
}

pub type QaResult<T> = std::result::Result<T, QaError>;
