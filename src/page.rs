//! Page controller: request, loading and error state for one session.
//!
//! Every submission gets a [`RequestTicket`] from a monotonically increasing
//! sequence. Only the outcome of the most recent ticket is committed, so a
//! slow response can never overwrite the state of a newer request.

use crate::client::{ClientResult, QaBackend};
use crate::types::{QueryRequest, QueryResponse};

/// Message shown for any failed query, whatever the cause.
pub const QUERY_FAILED_MESSAGE: &str =
    "Failed to get response. Please check if the backend is running and try again.";

/// Identifies one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Results / loading / error state.
#[derive(Debug, Default)]
pub struct PageController {
    results: Option<QueryResponse>,
    is_loading: bool,
    error: Option<String>,
    last_issued: u64,
}

impl PageController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a submission: set loading, clear the error, issue a ticket.
    pub fn begin(&mut self) -> RequestTicket {
        self.last_issued += 1;
        self.is_loading = true;
        self.error = None;
        RequestTicket(self.last_issued)
    }

    /// Commit the outcome of `ticket`. Returns `false` for a stale ticket,
    /// whose outcome is discarded.
    ///
    /// On failure the previous results are kept but the fixed
    /// [`QUERY_FAILED_MESSAGE`] is set.
    pub fn complete(&mut self, ticket: RequestTicket, result: ClientResult<QueryResponse>) -> bool {
        if ticket.0 != self.last_issued {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.last_issued,
                "discarding stale query response"
            );
            return false;
        }
        match result {
            Ok(response) => {
                tracing::info!(
                    passages = response.relevant_texts.len(),
                    "query answered"
                );
                self.results = Some(response);
            }
            Err(e) => {
                tracing::error!(error = %e, "query failed");
                self.error = Some(QUERY_FAILED_MESSAGE.to_string());
            }
        }
        self.is_loading = false;
        true
    }

    /// Run a whole submission inline against `backend`.
    pub fn submit(&mut self, backend: &dyn QaBackend, request: &QueryRequest) {
        let ticket = self.begin();
        tracing::info!(
            top_k = request.top_k,
            book = request.book_filter().unwrap_or("all"),
            using_tools = request.using_tools,
            "submitting query"
        );
        let result = backend.query(request);
        self.complete(ticket, result);
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Last successful response, regardless of loading.
    pub fn results(&self) -> Option<&QueryResponse> {
        self.results.as_ref()
    }

    /// Results to render: hidden while a request is in flight.
    pub fn visible_results(&self) -> Option<&QueryResponse> {
        if self.is_loading {
            None
        } else {
            self.results.as_ref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;

    fn answer(text: &str) -> QueryResponse {
        QueryResponse {
            answer: text.into(),
            relevant_texts: Vec::new(),
        }
    }

    fn failure() -> ClientError {
        ClientError::Status {
            url: "http://localhost:8000/query".into(),
            status: 500,
            message: "Internal Server Error".into(),
        }
    }

    #[test]
    fn begin_sets_loading_and_clears_error() {
        let mut page = PageController::new();
        let t = page.begin();
        page.complete(t, Err(failure()));
        assert_eq!(page.error(), Some(QUERY_FAILED_MESSAGE));

        page.begin();
        assert!(page.is_loading());
        assert_eq!(page.error(), None);
    }

    #[test]
    fn success_commits_results() {
        let mut page = PageController::new();
        let t = page.begin();
        assert!(page.visible_results().is_none());
        assert!(page.complete(t, Ok(answer("Karma is intentional action."))));
        assert!(!page.is_loading());
        assert_eq!(
            page.visible_results().map(|r| r.answer.as_str()),
            Some("Karma is intentional action.")
        );
    }

    #[test]
    fn failure_keeps_previous_results_but_sets_message() {
        let mut page = PageController::new();
        let t = page.begin();
        page.complete(t, Ok(answer("first")));

        let t = page.begin();
        assert!(page.visible_results().is_none(), "hidden while loading");
        page.complete(t, Err(failure()));
        assert_eq!(page.error(), Some(QUERY_FAILED_MESSAGE));
        assert_eq!(page.results().map(|r| r.answer.as_str()), Some("first"));
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut page = PageController::new();
        let older = page.begin();
        let newer = page.begin();
        assert!(older < newer);

        assert!(page.complete(newer, Ok(answer("fresh"))));
        assert!(!page.complete(older, Ok(answer("stale"))));
        assert_eq!(page.results().map(|r| r.answer.as_str()), Some("fresh"));

        // A stale failure must not clear loading for a pending newer request.
        let pending = page.begin();
        assert!(!page.complete(newer, Err(failure())));
        assert!(page.is_loading());
        assert_eq!(page.error(), None);
        assert!(page.complete(pending, Ok(answer("latest"))));
    }
}
