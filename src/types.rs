//! Wire types exchanged with the question-answering backend.
//!
//! The passage shape follows the richer contract (with `book_id`,
//! `chapter_id` and `page`). Every provenance field defaults when absent so
//! that responses from backends speaking the narrower shape still decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Smallest number of passages a query may request.
pub const MIN_TOP_K: u32 = 1;
/// Largest number of passages a query may request.
pub const MAX_TOP_K: u32 = 10;
/// Passage count used when none (or an unusable one) is given.
pub const DEFAULT_TOP_K: u32 = 5;

/// Metadata key used to restrict retrieval to a single book.
pub const BOOK_ID_FILTER_KEY: &str = "book_id";

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default)]
    pub metadata_filter: BTreeMap<String, String>,
    #[serde(default)]
    pub using_tools: bool,
}

impl QueryRequest {
    /// A request with default count, no filter and tools disabled.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            metadata_filter: BTreeMap::new(),
            using_tools: false,
        }
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    /// Restrict retrieval to one book. A blank id means all books and
    /// leaves the filter untouched.
    pub fn with_book(mut self, book_id: impl Into<String>) -> Self {
        let book_id = book_id.into();
        if !book_id.trim().is_empty() {
            self.metadata_filter
                .insert(BOOK_ID_FILTER_KEY.to_string(), book_id);
        }
        self
    }

    pub fn with_tools(mut self, using_tools: bool) -> Self {
        self.using_tools = using_tools;
        self
    }

    /// The book this request is restricted to, if any.
    pub fn book_filter(&self) -> Option<&str> {
        self.metadata_filter
            .get(BOOK_ID_FILTER_KEY)
            .map(String::as_str)
    }
}

/// A supporting passage returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantText {
    pub text: String,
    pub score: f64,
    #[serde(default)]
    pub sentence_id: String,
    #[serde(default)]
    pub book_id: String,
    #[serde(default)]
    pub chapter_id: String,
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

/// Body returned by `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    /// Passages in the backend's relevance order.
    #[serde(default)]
    pub relevant_texts: Vec<RelevantText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
}

/// Body returned by `GET /books`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

/// Body returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_empty_filter_as_object() {
        let req = QueryRequest::new("What is karma?");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["query"], "What is karma?");
        assert_eq!(json["top_k"], 5);
        assert_eq!(json["metadata_filter"], serde_json::json!({}));
        assert_eq!(json["using_tools"], false);
    }

    #[test]
    fn request_with_book_sets_single_filter_key() {
        let req = QueryRequest::new("q").with_book("RBI_007").with_top_k(3);
        assert_eq!(req.book_filter(), Some("RBI_007"));
        assert_eq!(req.metadata_filter.len(), 1);
        assert_eq!(req.top_k, 3);
    }

    #[test]
    fn blank_book_id_sends_no_filter() {
        for blank in ["", "   "] {
            let req = QueryRequest::new("q").with_book(blank);
            assert_eq!(req.book_filter(), None);
            let json = serde_json::to_value(&req).unwrap();
            assert_eq!(json["metadata_filter"], serde_json::json!({}));
        }
    }

    #[test]
    fn narrow_passage_shape_decodes_with_defaults() {
        let json = r#"{
            "answer": "Karma is action.",
            "relevant_texts": [
                {"text": "t", "score": 0.5, "book_id": "RBI_002", "chapter_id": "3", "page": "12"}
            ]
        }"#;
        let resp: QueryResponse = serde_json::from_str(json).unwrap();
        let passage = &resp.relevant_texts[0];
        assert_eq!(passage.book_id, "RBI_002");
        assert!(passage.sentence_id.is_empty());
        assert!(passage.meta.is_empty());
    }

    #[test]
    fn rich_passage_shape_keeps_meta() {
        let json = r#"{
            "text": "t", "score": 1.2, "sentence_id": "s-1",
            "meta": {"volume": "II", "line": 4}
        }"#;
        let passage: RelevantText = serde_json::from_str(json).unwrap();
        assert_eq!(passage.sentence_id, "s-1");
        assert!(passage.book_id.is_empty());
        assert_eq!(passage.meta["volume"], "II");
        assert_eq!(passage.meta["line"], 4);
    }

    #[test]
    fn missing_passage_list_is_empty() {
        let resp: QueryResponse = serde_json::from_str(r#"{"answer": "a"}"#).unwrap();
        assert!(resp.relevant_texts.is_empty());
    }
}
