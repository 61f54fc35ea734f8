//! Query form state and validation.
//!
//! The form owns everything the user edits before asking: the question,
//! the result count, the optional book filter and the tool-use flag. It also
//! owns the book list used for the filter, which is loaded once and is
//! best-effort: when the backend cannot list books the filter silently
//! offers only "All books".

use crate::client::{ClientResult, QaBackend};
use crate::types::{Book, BooksResponse, DEFAULT_TOP_K, MAX_TOP_K, MIN_TOP_K, QueryRequest};

/// Label of the unfiltered option in the book selector.
pub const ALL_BOOKS_LABEL: &str = "All books";

/// Clamp any integer into the accepted result-count range.
pub fn clamp_top_k(n: i64) -> u32 {
    n.clamp(i64::from(MIN_TOP_K), i64::from(MAX_TOP_K)) as u32
}

/// Normalize a numeric result count: zero means [`DEFAULT_TOP_K`], anything
/// else is clamped. Shared by typed input, the config file and form seeding.
pub fn normalize_top_k(n: i64) -> u32 {
    if n == 0 {
        DEFAULT_TOP_K
    } else {
        clamp_top_k(n)
    }
}

/// Interpret free-form result-count input.
///
/// Reads a leading integer (leading whitespace, optional sign, digits;
/// anything after the digits is ignored). No digits, or a value of zero,
/// gives [`DEFAULT_TOP_K`]. Everything else is clamped to
/// [`MIN_TOP_K`]..=[`MAX_TOP_K`], saturating on overflow.
pub fn parse_top_k(input: &str) -> u32 {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return DEFAULT_TOP_K;
    }

    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    let value = if negative { -magnitude } else { magnitude };
    normalize_top_k(value)
}

/// Editable form state.
#[derive(Debug, Clone)]
pub struct QueryForm {
    query: String,
    top_k_input: String,
    top_k: u32,
    selected_book: Option<String>,
    using_tools: bool,
    books: Vec<Book>,
    loading_books: bool,
}

impl Default for QueryForm {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl QueryForm {
    /// An empty form whose result count starts at `initial_top_k`
    /// (normalized like typed input).
    ///
    /// The book list counts as loading until [`finish_book_load`] runs.
    ///
    /// [`finish_book_load`]: Self::finish_book_load
    pub fn new(initial_top_k: u32) -> Self {
        let top_k = normalize_top_k(i64::from(initial_top_k));
        Self {
            query: String::new(),
            top_k_input: top_k.to_string(),
            top_k,
            selected_book: None,
            using_tools: false,
            books: Vec::new(),
            loading_books: true,
        }
    }

    // -- question ------------------------------------------------------------

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn push_query_char(&mut self, c: char) {
        self.query.push(c);
    }

    pub fn pop_query_char(&mut self) {
        self.query.pop();
    }

    // -- result count --------------------------------------------------------

    /// Effective result count.
    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    /// Raw text in the result-count field while it is being edited.
    pub fn top_k_input(&self) -> &str {
        &self.top_k_input
    }

    /// Replace the result-count text; the effective count follows [`parse_top_k`].
    pub fn set_top_k_input(&mut self, input: impl Into<String>) {
        self.top_k_input = input.into();
        self.top_k = parse_top_k(&self.top_k_input);
    }

    pub fn push_top_k_char(&mut self, c: char) {
        let mut input = std::mem::take(&mut self.top_k_input);
        input.push(c);
        self.set_top_k_input(input);
    }

    pub fn pop_top_k_char(&mut self) {
        let mut input = std::mem::take(&mut self.top_k_input);
        input.pop();
        self.set_top_k_input(input);
    }

    /// Rewrite the field text to the effective count (on leaving the field).
    pub fn normalize_top_k_input(&mut self) {
        self.top_k_input = self.top_k.to_string();
    }

    pub fn increment_top_k(&mut self) {
        self.top_k = (self.top_k + 1).min(MAX_TOP_K);
        self.normalize_top_k_input();
    }

    pub fn decrement_top_k(&mut self) {
        self.top_k = self.top_k.saturating_sub(1).max(MIN_TOP_K);
        self.normalize_top_k_input();
    }

    // -- tools ---------------------------------------------------------------

    pub fn using_tools(&self) -> bool {
        self.using_tools
    }

    pub fn set_using_tools(&mut self, using_tools: bool) {
        self.using_tools = using_tools;
    }

    pub fn toggle_tools(&mut self) {
        self.using_tools = !self.using_tools;
    }

    // -- books ---------------------------------------------------------------

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn is_loading_books(&self) -> bool {
        self.loading_books
    }

    /// Mark the book list as loading.
    pub fn begin_book_load(&mut self) {
        self.loading_books = true;
    }

    /// Record the outcome of a book-list fetch.
    ///
    /// Failures are logged and leave the list empty; they are never shown to
    /// the user.
    pub fn finish_book_load(&mut self, result: ClientResult<BooksResponse>) {
        match result {
            Ok(resp) => {
                tracing::info!(count = resp.books.len(), "loaded book list");
                self.books = resp.books;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load books; offering all books only");
                self.books.clear();
            }
        }
        let still_listed = self
            .selected_book
            .as_ref()
            .is_none_or(|id| self.books.iter().any(|b| &b.id == id));
        if !still_listed {
            self.selected_book = None;
        }
        self.loading_books = false;
    }

    /// Fetch the book list synchronously.
    pub fn load_books(&mut self, backend: &dyn QaBackend) {
        self.begin_book_load();
        let result = backend.fetch_books();
        self.finish_book_load(result);
    }

    /// Selector entries: "All books" first, then loaded books in backend order.
    pub fn book_options(&self) -> Vec<(Option<&str>, &str)> {
        std::iter::once((None, ALL_BOOKS_LABEL))
            .chain(
                self.books
                    .iter()
                    .map(|b| (Some(b.id.as_str()), b.title.as_str())),
            )
            .collect()
    }

    pub fn selected_book(&self) -> Option<&str> {
        self.selected_book.as_deref()
    }

    /// Title shown in the selector for the current selection.
    pub fn selected_book_label(&self) -> &str {
        match &self.selected_book {
            None => ALL_BOOKS_LABEL,
            Some(id) => self
                .books
                .iter()
                .find(|b| &b.id == id)
                .map(|b| b.title.as_str())
                .unwrap_or(id.as_str()),
        }
    }

    /// Select a book by id, or `None` for all books.
    ///
    /// Ignored while the book list is loading or when the id is not listed.
    pub fn select_book(&mut self, book_id: Option<&str>) {
        if self.loading_books {
            return;
        }
        match book_id {
            None => self.selected_book = None,
            Some(id) if self.books.iter().any(|b| b.id == id) => {
                self.selected_book = Some(id.to_string());
            }
            Some(id) => tracing::debug!(book_id = id, "ignoring unknown book selection"),
        }
    }

    fn selected_index(&self) -> usize {
        match &self.selected_book {
            None => 0,
            Some(id) => self
                .books
                .iter()
                .position(|b| &b.id == id)
                .map_or(0, |i| i + 1),
        }
    }

    fn select_index(&mut self, index: usize) {
        self.selected_book = match index {
            0 => None,
            i => self.books.get(i - 1).map(|b| b.id.clone()),
        };
    }

    pub fn select_next_book(&mut self) {
        if self.loading_books {
            return;
        }
        let count = self.books.len() + 1;
        self.select_index((self.selected_index() + 1) % count);
    }

    pub fn select_prev_book(&mut self) {
        if self.loading_books {
            return;
        }
        let count = self.books.len() + 1;
        self.select_index((self.selected_index() + count - 1) % count);
    }

    // -- submission ----------------------------------------------------------

    /// Whether the submit action is available.
    pub fn can_submit(&self, in_flight: bool) -> bool {
        !in_flight && !self.query.trim().is_empty()
    }

    /// Build the request, or `None` when the trimmed question is empty.
    pub fn build_request(&self) -> Option<QueryRequest> {
        let query = self.query.trim();
        if query.is_empty() {
            return None;
        }
        let mut request = QueryRequest::new(query)
            .with_top_k(self.top_k)
            .with_tools(self.using_tools);
        if let Some(book_id) = &self.selected_book {
            request = request.with_book(book_id.clone());
        }
        Some(request)
    }

    /// Hand a validated request to `on_submit`. Returns whether it ran.
    pub fn submit(&self, on_submit: impl FnOnce(QueryRequest)) -> bool {
        match self.build_request() {
            Some(request) => {
                on_submit(request);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;

    fn books() -> BooksResponse {
        BooksResponse {
            books: vec![
                Book {
                    id: "RBI_002".into(),
                    title: "An Sĩ Toàn Thư".into(),
                },
                Book {
                    id: "RBI_007".into(),
                    title: "Quan Âm Thị Kính".into(),
                },
            ],
        }
    }

    fn loaded_form() -> QueryForm {
        let mut form = QueryForm::default();
        form.finish_book_load(Ok(books()));
        form
    }

    #[test]
    fn parse_top_k_clamps_and_defaults() {
        assert_eq!(parse_top_k("3"), 3);
        assert_eq!(parse_top_k("10"), 10);
        assert_eq!(parse_top_k("11"), 10);
        assert_eq!(parse_top_k("-4"), 1);
        assert_eq!(parse_top_k(""), 5);
        assert_eq!(parse_top_k("abc"), 5);
        assert_eq!(parse_top_k("-"), 5);
        assert_eq!(parse_top_k("0"), 5);
    }

    #[test]
    fn parse_top_k_reads_leading_integer() {
        assert_eq!(parse_top_k("  7"), 7);
        assert_eq!(parse_top_k("2.9"), 2);
        assert_eq!(parse_top_k("8 sources"), 8);
        assert_eq!(parse_top_k("+6"), 6);
        assert_eq!(parse_top_k("99999999999999999999999"), 10);
        assert_eq!(parse_top_k("-99999999999999999999999"), 1);
    }

    #[test]
    fn every_input_lands_in_range() {
        for input in ["", " ", "x", "0", "1", "5", "10", "100", "-1", "3x", "1e3"] {
            let k = parse_top_k(input);
            assert!((MIN_TOP_K..=MAX_TOP_K).contains(&k), "{input:?} -> {k}");
        }
    }

    #[test]
    fn top_k_editing() {
        let mut form = QueryForm::default();
        assert_eq!(form.top_k(), 5);
        form.pop_top_k_char();
        assert_eq!(form.top_k_input(), "");
        assert_eq!(form.top_k(), 5);
        form.push_top_k_char('8');
        assert_eq!(form.top_k(), 8);
        form.push_top_k_char('0');
        assert_eq!(form.top_k(), 10);
        form.normalize_top_k_input();
        assert_eq!(form.top_k_input(), "10");
        form.increment_top_k();
        assert_eq!(form.top_k(), 10);
        for _ in 0..20 {
            form.decrement_top_k();
        }
        assert_eq!(form.top_k(), 1);
    }

    #[test]
    fn initial_top_k_is_normalized() {
        assert_eq!(QueryForm::new(0).top_k(), DEFAULT_TOP_K);
        assert_eq!(QueryForm::new(50).top_k(), 10);
    }

    #[test]
    fn blank_query_never_submits() {
        let mut form = QueryForm::default();
        for q in ["", "   ", "\n\t "] {
            form.set_query(q);
            let mut called = false;
            assert!(!form.submit(|_| called = true));
            assert!(!called);
            assert!(!form.can_submit(false));
        }
    }

    #[test]
    fn request_is_trimmed_and_carries_fields() {
        let mut form = loaded_form();
        form.set_query("  What is karma?  ");
        form.set_top_k_input("3");
        form.toggle_tools();

        let mut sent = None;
        assert!(form.submit(|req| sent = Some(req)));
        let req = sent.unwrap();
        assert_eq!(req.query, "What is karma?");
        assert_eq!(req.top_k, 3);
        assert!(req.using_tools);
        assert!(req.metadata_filter.is_empty());
    }

    #[test]
    fn selected_book_becomes_filter() {
        let mut form = loaded_form();
        form.set_query("q");
        form.select_book(Some("RBI_007"));
        let req = form.build_request().unwrap();
        assert_eq!(req.book_filter(), Some("RBI_007"));

        form.select_book(None);
        let req = form.build_request().unwrap();
        assert!(!req.metadata_filter.contains_key("book_id"));
    }

    #[test]
    fn submit_disabled_while_in_flight() {
        let mut form = QueryForm::default();
        form.set_query("q");
        assert!(form.can_submit(false));
        assert!(!form.can_submit(true));
    }

    #[test]
    fn failed_book_load_leaves_only_all_books() {
        let mut form = QueryForm::default();
        assert!(form.is_loading_books());
        form.finish_book_load(Err(ClientError::Request {
            url: "http://localhost:8000/books".into(),
            message: "connection refused".into(),
        }));
        assert!(!form.is_loading_books());
        assert_eq!(form.book_options(), vec![(None, ALL_BOOKS_LABEL)]);
    }

    #[test]
    fn selection_cycles_and_is_locked_while_loading() {
        let mut form = QueryForm::default();
        form.select_next_book();
        assert_eq!(form.selected_book(), None);

        form.finish_book_load(Ok(books()));
        form.select_next_book();
        assert_eq!(form.selected_book(), Some("RBI_002"));
        assert_eq!(form.selected_book_label(), "An Sĩ Toàn Thư");
        form.select_next_book();
        assert_eq!(form.selected_book(), Some("RBI_007"));
        form.select_next_book();
        assert_eq!(form.selected_book(), None);
        form.select_prev_book();
        assert_eq!(form.selected_book(), Some("RBI_007"));
    }

    #[test]
    fn unknown_selection_is_ignored() {
        let mut form = loaded_form();
        form.select_book(Some("XYZ"));
        assert_eq!(form.selected_book(), None);
        assert_eq!(form.selected_book_label(), ALL_BOOKS_LABEL);
    }
}
