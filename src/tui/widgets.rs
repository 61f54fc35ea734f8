//! TUI widget rendering: question form, error panel, answer and sources.

use std::collections::BTreeSet;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::form::QueryForm;
use crate::page::PageController;
use crate::results::{ResultsView, text_bar};

use super::Focus;

/// Cells in the relevance bar.
const BAR_CELLS: usize = 10;

/// Everything the renderer reads from the app.
pub struct Screen<'a> {
    pub api_url: &'a str,
    pub form: &'a QueryForm,
    pub page: &'a PageController,
    pub view: Option<&'a ResultsView>,
    pub focus: Focus,
    pub selected_passage: usize,
    pub expanded: &'a BTreeSet<usize>,
    pub scroll_offset: u16,
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!(" {title} "))
}

/// Color of the relevance bar for a given width.
fn bar_color(width: f64) -> Color {
    if width >= 70.0 {
        Color::Green
    } else if width >= 40.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Lines for the answer and its sources.
pub fn results_lines(
    view: &ResultsView,
    selected: Option<usize>,
    expanded: &BTreeSet<usize>,
) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled("● ", Style::default().fg(Color::Green)),
        Span::styled("Answer", Style::default().add_modifier(Modifier::BOLD)),
    ])];
    lines.extend(view.answer.lines().map(|l| Line::raw(l.to_string())));

    let Some(heading) = view.sources_heading() else {
        return lines;
    };
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("● ", Style::default().fg(Color::Blue)),
        Span::styled(heading, Style::default().add_modifier(Modifier::BOLD)),
    ]));

    for p in &view.passages {
        let is_selected = selected == Some(p.index);
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw(if is_selected { "▶ " } else { "  " }),
            Span::styled(
                format!(" {} ", p.badge),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::LightBlue)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  Relevance: {} ", p.relevance),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                text_bar(p.bar_width, BAR_CELLS),
                Style::default().fg(bar_color(p.bar_width)),
            ),
        ]));
        if let Some(caption) = &p.caption {
            lines.push(Line::styled(
                format!("    {caption}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::raw(format!("    {}", p.text)));

        if p.has_details() {
            if expanded.contains(&p.index) {
                lines.push(Line::styled(
                    "    ▾ Technical details",
                    Style::default().fg(Color::DarkGray),
                ));
                for (label, value) in &p.details {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("      {label}: "),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(value.clone()),
                    ]));
                }
            } else {
                lines.push(Line::styled(
                    "    ▸ Show technical details",
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
    }
    lines
}

fn render_form(frame: &mut Frame, screen: &Screen, query_area: Rect, options_area: Rect, submit_area: Rect) {
    let form = screen.form;
    let busy = screen.page.is_loading();

    let query = Paragraph::new(form.query())
        .block(field_block(
            "Ask your question about Buddhism",
            screen.focus == Focus::Query,
        ))
        .wrap(Wrap { trim: false });
    frame.render_widget(query, query_area);

    let [top_k_area, book_area, tools_area] = Layout::horizontal([
        Constraint::Percentage(30),
        Constraint::Percentage(45),
        Constraint::Percentage(25),
    ])
    .areas(options_area);

    let top_k = Paragraph::new(form.top_k_input())
        .block(field_block("Number of sources (1-10)", screen.focus == Focus::TopK));
    frame.render_widget(top_k, top_k_area);

    let book_label = if form.is_loading_books() {
        "Loading books...".to_string()
    } else {
        format!("◂ {} ▸", form.selected_book_label())
    };
    let book = Paragraph::new(book_label)
        .block(field_block("Filter by book", screen.focus == Focus::Book));
    frame.render_widget(book, book_area);

    let check = if form.using_tools() { "[x]" } else { "[ ]" };
    let tools = Paragraph::new(format!("{check} Use AI tools"))
        .block(field_block("Tools", screen.focus == Focus::Tools));
    frame.render_widget(tools, tools_area);

    let (label, style) = if busy {
        ("[ Searching... ]", Style::default().fg(Color::DarkGray))
    } else if form.can_submit(busy) {
        (
            "[ Ask Question ]  (Enter)",
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("[ Ask Question ]", Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(Paragraph::new(Line::styled(label, style)), submit_area);
}

fn render_body(frame: &mut Frame, screen: &Screen, area: Rect) {
    let mut area = area;

    if let Some(message) = screen.page.error() {
        let [error_area, rest] =
            Layout::vertical([Constraint::Length(4), Constraint::Fill(1)]).areas(area);
        let error = Paragraph::new(Line::styled(message, Style::default().fg(Color::Red)))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red))
                    .title(" Error "),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(error, error_area);
        area = rest;
    }

    if screen.page.is_loading() {
        let loading = Paragraph::new(Line::styled(
            "Processing your question...",
            Style::default().fg(Color::Yellow),
        ))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(loading, area);
        return;
    }

    let Some(view) = screen.view.filter(|_| screen.page.visible_results().is_some()) else {
        return;
    };
    let selected = (screen.focus == Focus::Results).then_some(screen.selected_passage);
    let results = Paragraph::new(results_lines(view, selected, screen.expanded))
        .block(field_block("Results", screen.focus == Focus::Results))
        .wrap(Wrap { trim: false })
        .scroll((screen.scroll_offset, 0));
    frame.render_widget(results, area);
}

/// Main TUI layout rendering.
pub fn render(frame: &mut Frame, screen: &Screen) {
    let [header_area, query_area, options_area, submit_area, body_area, status_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " dharma-qa ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " :: Eastern Religion Chatbot :: backend: {} ",
            screen.api_url
        )),
    ]));
    frame.render_widget(header, header_area);

    render_form(frame, screen, query_area, options_area, submit_area);
    render_body(frame, screen, body_area);

    let status = Paragraph::new(Line::styled(
        " Tab: next field | Enter: ask / toggle details | ←→: adjust | Space: toggle | PgUp/PgDn: scroll | Esc: quit ",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(status, status_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QueryResponse, RelevantText};

    fn view() -> ResultsView {
        let mut meta = serde_json::Map::new();
        meta.insert("volume".into(), "II".into());
        ResultsView::from_response(&QueryResponse {
            answer: "First line\nSecond line".into(),
            relevant_texts: vec![RelevantText {
                text: "passage".into(),
                score: 0.873,
                sentence_id: String::new(),
                book_id: "RBI_007".into(),
                chapter_id: String::new(),
                page: String::new(),
                meta,
            }],
        })
    }

    fn flatten(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    #[test]
    fn answer_lines_preserve_newlines() {
        let text = flatten(&results_lines(&view(), None, &BTreeSet::new()));
        assert_eq!(text[1], "First line");
        assert_eq!(text[2], "Second line");
        assert!(text.iter().any(|l| l.contains("Relevant Sources (1)")));
        assert!(text.iter().any(|l| l.contains("Quan Âm Thị Kính") && l.contains("87.3%")));
    }

    #[test]
    fn crlf_answer_leaves_no_carriage_returns() {
        let mut v = view();
        v.answer = "First line\r\nSecond line\r\n".into();
        let text = flatten(&results_lines(&v, None, &BTreeSet::new()));
        assert_eq!(text[1], "First line");
        assert_eq!(text[2], "Second line");
        assert!(text.iter().all(|l| !l.contains('\r')));
    }

    #[test]
    fn details_expand_on_demand() {
        let collapsed = flatten(&results_lines(&view(), Some(0), &BTreeSet::new()));
        assert!(collapsed.iter().any(|l| l.contains("Show technical details")));
        assert!(!collapsed.iter().any(|l| l.contains("volume: II")));

        let expanded = flatten(&results_lines(&view(), Some(0), &BTreeSet::from([0])));
        assert!(expanded.iter().any(|l| l.contains("Book ID: RBI_007")));
        assert!(expanded.iter().any(|l| l.contains("volume: II")));
        assert!(expanded.iter().any(|l| l.starts_with("▶ ")));
    }
}
