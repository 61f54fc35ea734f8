//! Static book id → display title table.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Known books. Kept in sync with the backend's id map.
const BOOK_TITLES: &[(&str, &str)] = &[
    ("RBI_002", "An Sĩ Toàn Thư"),
    ("RBI_007", "Quan Âm Thị Kính"),
    ("RBI_008", "Thiền Uyển Tập Anh"),
    ("RBI_010", "Kinh Tương Ưng Bộ"),
];

static BOOK_ID_TO_NAME: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| BOOK_TITLES.iter().copied().collect());

/// Resolve a book id to its display title; unknown ids are returned unchanged.
pub fn book_name(book_id: &str) -> &str {
    BOOK_ID_TO_NAME.get(book_id).copied().unwrap_or(book_id)
}

/// Whether `book_id` has a known title.
pub fn is_known(book_id: &str) -> bool {
    BOOK_ID_TO_NAME.contains_key(book_id)
}
