//! XDG-compliant path resolution for dharma-qa.
//!
//! Only two locations matter to a thin client: where the optional config
//! file lives and where the TUI writes its log.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

const APP_DIR: &str = "dharma-qa";

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(dharma::paths::no_home),
        help("Set the HOME environment variable or pass --config explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(dharma::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Global XDG directories for dharma-qa.
#[derive(Debug, Clone)]
pub struct QaPaths {
    /// `$XDG_CONFIG_HOME/dharma-qa/`
    pub config_dir: PathBuf,
    /// `$XDG_STATE_HOME/dharma-qa/`
    pub state_dir: PathBuf,
}

impl QaPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join(APP_DIR);

        let state_dir = std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/state"))
            .join(APP_DIR);

        Ok(Self {
            config_dir,
            state_dir,
        })
    }

    /// Path to the client config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Path to the TUI log file.
    pub fn log_file(&self) -> PathBuf {
        self.state_dir.join("dharma-qa.log")
    }

    /// Config file to load: `explicit` when given, otherwise the XDG default.
    ///
    /// `resolve` runs only when no explicit path was passed, so `--config`
    /// works without `HOME`.
    pub fn config_file_or(
        explicit: Option<PathBuf>,
        resolve: impl FnOnce() -> PathResult<Self>,
    ) -> PathResult<PathBuf> {
        match explicit {
            Some(path) => Ok(path),
            None => resolve().map(|paths| paths.config_file()),
        }
    }

    /// Create the state directory. Idempotent.
    pub fn ensure_state_dir(&self) -> PathResult<()> {
        std::fs::create_dir_all(&self.state_dir).map_err(|e| PathError::CreateDir {
            path: self.state_dir.display().to_string(),
            source: e,
        })
    }
}
