//! HTTP client for the question-answering backend.
//!
//! `QaClient` issues exactly one attempt per call: no retry, no backoff and
//! no timeout beyond what the transport imposes. Callers that want to swap
//! the transport (tests, the TUI worker) go through the [`QaBackend`] trait.

use miette::Diagnostic;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::types::{BooksResponse, HealthStatus, QueryRequest, QueryResponse};

// ---------------------------------------------------------------------------
// Client error
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    #[error("request to {url} failed: {message}")]
    #[diagnostic(
        code(dharma::client::request),
        help("Is the backend running? Check --api-url or DHARMA_QA_API_URL.")
    )]
    Request { url: String, message: String },

    #[error("backend answered {url} with HTTP {status}: {message}")]
    #[diagnostic(
        code(dharma::client::status),
        help("The backend rejected the request; see its logs for details.")
    )]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("unexpected response from {url}: {message}")]
    #[diagnostic(
        code(dharma::client::response),
        help("Backend version mismatch?")
    )]
    Response { url: String, message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// The three backend operations the UI depends on.
pub trait QaBackend: Send + Sync {
    /// `GET /`: liveness only.
    fn health_check(&self) -> ClientResult<HealthStatus>;

    /// `GET /books`: the books available for filtering.
    fn fetch_books(&self) -> ClientResult<BooksResponse>;

    /// `POST /query`: answer a question.
    fn query(&self, request: &QueryRequest) -> ClientResult<QueryResponse>;
}

// ---------------------------------------------------------------------------
// QaClient
// ---------------------------------------------------------------------------

/// Blocking HTTP connection to a backend instance.
#[derive(Clone)]
pub struct QaClient {
    base_url: String,
    http: ureq::Agent,
}

impl QaClient {
    /// Client for `base_url`; a trailing slash is ignored.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: ureq::Agent::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.api_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .call()
            .map_err(|e| map_ureq_error(&url, e))?;
        decode(&url, resp)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let resp = self
            .http
            .post(&url)
            .send_json(body)
            .map_err(|e| map_ureq_error(&url, e))?;
        decode(&url, resp)
    }
}

impl QaBackend for QaClient {
    fn health_check(&self) -> ClientResult<HealthStatus> {
        self.get_json("/")
    }

    fn fetch_books(&self) -> ClientResult<BooksResponse> {
        self.get_json("/books")
    }

    fn query(&self, request: &QueryRequest) -> ClientResult<QueryResponse> {
        self.post_json("/query", request)
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> ClientError {
    match err {
        ureq::Error::Status(status, resp) => ClientError::Status {
            url: url.to_string(),
            status,
            message: resp.status_text().to_string(),
        },
        ureq::Error::Transport(t) => ClientError::Request {
            url: url.to_string(),
            message: t.to_string(),
        },
    }
}

fn decode<T: DeserializeOwned>(url: &str, resp: ureq::Response) -> ClientResult<T> {
    resp.into_json().map_err(|e| ClientError::Response {
        url: url.to_string(),
        message: format!("failed to parse JSON: {e}"),
    })
}
