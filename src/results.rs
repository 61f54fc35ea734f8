//! Results view model: what to show for an answer and its passages.
//!
//! Everything here is derived from a [`QueryResponse`] without owned state,
//! so the TUI widgets and the plain-text renderer agree on labels, captions
//! and relevance figures.

use std::fmt::Write;

use crate::books::book_name;
use crate::types::{QueryResponse, RelevantText};

/// Relevance as a percentage (`score * 100`), unbounded.
pub fn relevance_percent(score: f64) -> f64 {
    score * 100.0
}

/// Relevance label with one decimal, e.g. `"87.3%"`.
pub fn format_relevance(score: f64) -> String {
    format!("{:.1}%", relevance_percent(score))
}

/// Width of the relevance bar in percent: capped at 100, floored at 0.
pub fn bar_width(score: f64) -> f64 {
    relevance_percent(score).clamp(0.0, 100.0)
}

/// Badge for a passage: the book title, or a positional fallback.
pub fn badge_label(passage: &RelevantText, index: usize) -> String {
    if passage.book_id.is_empty() {
        format!("Source {}", index + 1)
    } else {
        book_name(&passage.book_id).to_string()
    }
}

/// `Chapter {c}, Page {p}`, only when both are present.
pub fn location_caption(passage: &RelevantText) -> Option<String> {
    if passage.chapter_id.is_empty() || passage.page.is_empty() {
        return None;
    }
    Some(format!(
        "Chapter {}, Page {}",
        passage.chapter_id, passage.page
    ))
}

/// Technical details: provenance fields that are present, then every meta key.
pub fn detail_lines(passage: &RelevantText) -> Vec<(String, String)> {
    let mut lines = Vec::new();
    for (label, value) in [
        ("Book ID", &passage.book_id),
        ("Chapter ID", &passage.chapter_id),
        ("Page", &passage.page),
        ("Sentence ID", &passage.sentence_id),
    ] {
        if !value.is_empty() {
            lines.push((label.to_string(), value.clone()));
        }
    }
    for (key, value) in &passage.meta {
        let shown = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        lines.push((key.clone(), shown));
    }
    lines
}

/// One supporting passage, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PassageView {
    /// Zero-based position in backend order.
    pub index: usize,
    pub badge: String,
    pub caption: Option<String>,
    pub relevance: String,
    pub bar_width: f64,
    pub text: String,
    pub details: Vec<(String, String)>,
}

impl PassageView {
    pub fn new(passage: &RelevantText, index: usize) -> Self {
        Self {
            index,
            badge: badge_label(passage, index),
            caption: location_caption(passage),
            relevance: format_relevance(passage.score),
            bar_width: bar_width(passage.score),
            text: passage.text.clone(),
            details: detail_lines(passage),
        }
    }

    /// Whether an expandable detail panel is offered.
    pub fn has_details(&self) -> bool {
        !self.details.is_empty()
    }
}

/// A full answer with its passages.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    /// The answer, verbatim.
    pub answer: String,
    pub passages: Vec<PassageView>,
}

impl ResultsView {
    pub fn from_response(response: &QueryResponse) -> Self {
        Self {
            answer: response.answer.clone(),
            passages: response
                .relevant_texts
                .iter()
                .enumerate()
                .map(|(i, p)| PassageView::new(p, i))
                .collect(),
        }
    }

    /// Heading of the sources section, absent when there are no passages.
    pub fn sources_heading(&self) -> Option<String> {
        if self.passages.is_empty() {
            None
        } else {
            Some(format!("Relevant Sources ({})", self.passages.len()))
        }
    }
}

/// Text bar of `cells` characters filled in proportion to `width_percent`.
pub fn text_bar(width_percent: f64, cells: usize) -> String {
    let filled = ((width_percent / 100.0) * cells as f64).round() as usize;
    let filled = filled.min(cells);
    format!("{}{}", "█".repeat(filled), "░".repeat(cells - filled))
}

/// Render the whole view as plain text for non-interactive output.
pub fn render_plain(view: &ResultsView, show_details: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Answer");
    let _ = writeln!(out, "{}", view.answer);

    if let Some(heading) = view.sources_heading() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{heading}");
        for p in &view.passages {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "[{}] Relevance: {} {}",
                p.badge,
                p.relevance,
                text_bar(p.bar_width, 10)
            );
            if let Some(caption) = &p.caption {
                let _ = writeln!(out, "    {caption}");
            }
            let _ = writeln!(out, "    {}", p.text);
            if show_details && p.has_details() {
                for (label, value) in &p.details {
                    let _ = writeln!(out, "      {label}: {value}");
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(score: f64) -> RelevantText {
        RelevantText {
            text: "All conditioned things are impermanent.".into(),
            score,
            sentence_id: String::new(),
            book_id: String::new(),
            chapter_id: String::new(),
            page: String::new(),
            meta: serde_json::Map::new(),
        }
    }

    #[test]
    fn relevance_formatting() {
        assert_eq!(format_relevance(0.873), "87.3%");
        assert_eq!(format_relevance(0.0), "0.0%");
        assert_eq!(format_relevance(1.5), "150.0%");
        assert!((bar_width(0.873) - 87.3).abs() < 1e-9);
        assert_eq!(bar_width(1.5), 100.0);
        assert_eq!(bar_width(-0.2), 0.0);
    }

    #[test]
    fn badge_resolves_or_falls_back() {
        let mut p = passage(0.5);
        assert_eq!(badge_label(&p, 2), "Source 3");
        p.book_id = "RBI_007".into();
        assert_eq!(badge_label(&p, 2), "Quan Âm Thị Kính");
        p.book_id = "XYZ".into();
        assert_eq!(badge_label(&p, 0), "XYZ");
    }

    #[test]
    fn caption_needs_chapter_and_page() {
        let mut p = passage(0.5);
        p.chapter_id = "4".into();
        assert_eq!(location_caption(&p), None);
        p.page = "17".into();
        assert_eq!(location_caption(&p).as_deref(), Some("Chapter 4, Page 17"));
        p.chapter_id.clear();
        assert_eq!(location_caption(&p), None);
    }

    #[test]
    fn details_skip_empty_fields() {
        let mut p = passage(0.5);
        assert!(detail_lines(&p).is_empty());

        p.book_id = "RBI_008".into();
        p.sentence_id = "s-42".into();
        p.meta.insert("volume".into(), "II".into());
        p.meta.insert("line".into(), serde_json::json!(4));
        let lines = detail_lines(&p);
        assert_eq!(
            lines,
            vec![
                ("Book ID".to_string(), "RBI_008".to_string()),
                ("Sentence ID".to_string(), "s-42".to_string()),
                ("line".to_string(), "4".to_string()),
                ("volume".to_string(), "II".to_string()),
            ]
        );
    }

    #[test]
    fn view_preserves_answer_and_order() {
        let mut first = passage(0.9);
        first.book_id = "RBI_002".into();
        let response = QueryResponse {
            answer: "Line one.\nLine two.\n".into(),
            relevant_texts: vec![first, passage(0.95), passage(0.1)],
        };
        let view = ResultsView::from_response(&response);
        assert_eq!(view.answer, response.answer);
        let badges: Vec<_> = view.passages.iter().map(|p| p.badge.as_str()).collect();
        assert_eq!(badges, ["An Sĩ Toàn Thư", "Source 2", "Source 3"]);
        assert_eq!(view.sources_heading().as_deref(), Some("Relevant Sources (3)"));
    }

    #[test]
    fn no_passages_no_sources_section() {
        let view = ResultsView::from_response(&QueryResponse {
            answer: "Nothing found.".into(),
            relevant_texts: Vec::new(),
        });
        assert_eq!(view.sources_heading(), None);
        let text = render_plain(&view, true);
        assert!(!text.contains("Relevant Sources"));
        assert!(text.contains("Nothing found."));
    }

    #[test]
    fn text_bar_is_bounded() {
        assert_eq!(text_bar(0.0, 4), "░░░░");
        assert_eq!(text_bar(100.0, 4), "████");
        assert_eq!(text_bar(50.0, 4), "██░░");
    }

    #[test]
    fn plain_render_shows_details_on_request() {
        let mut p = passage(0.873);
        p.book_id = "RBI_007".into();
        p.chapter_id = "2".into();
        p.page = "9".into();
        let view = ResultsView::from_response(&QueryResponse {
            answer: "A\nB".into(),
            relevant_texts: vec![p],
        });

        let brief = render_plain(&view, false);
        assert!(brief.contains("A\nB\n"));
        assert!(brief.contains("[Quan Âm Thị Kính] Relevance: 87.3%"));
        assert!(brief.contains("Chapter 2, Page 9"));
        assert!(!brief.contains("Book ID"));

        let full = render_plain(&view, true);
        assert!(full.contains("Book ID: RBI_007"));
    }
}
