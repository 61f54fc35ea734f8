// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # dharma-qa
//!
//! A terminal client for a question-answering service over Eastern
//! religious texts. The backend does retrieval and answering; this crate
//! collects the question, sends it, and presents the answer with its
//! supporting passages.
//!
//! ## Architecture
//!
//! - **Wire types** (`types`): request, response, passage and book shapes
//! - **HTTP client** (`client`): `QaClient` over `ureq`, behind the `QaBackend` trait
//! - **Form** (`form`): question, result count, book filter, tool flag
//! - **Results view** (`results`): badges, captions, relevance, details
//! - **Page controller** (`page`): loading/error state with stale-response guard
//! - **TUI** (`tui`): ratatui front end with background network calls
//!
//! ## Library usage
//!
//! ```no_run
//! use dharma_qa::client::QaClient;
//! use dharma_qa::form::QueryForm;
//! use dharma_qa::page::PageController;
//! use dharma_qa::results::{ResultsView, render_plain};
//!
//! let client = QaClient::new("http://localhost:8000");
//! let mut form = QueryForm::default();
//! form.load_books(&client);
//! form.set_query("What is the concept of karma in Buddhism?");
//!
//! let mut page = PageController::new();
//! if let Some(request) = form.build_request() {
//!     page.submit(&client, &request);
//! }
//! if let Some(response) = page.visible_results() {
//!     print!("{}", render_plain(&ResultsView::from_response(response), false));
//! }
//! ```

pub mod books;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod page;
pub mod paths;
pub mod results;
pub mod tui;
pub mod types;
