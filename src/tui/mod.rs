//! ratatui-based terminal page for asking questions.
//!
//! The TUI shows the query form, an error panel, a loading indicator and the
//! answer with its sources. Backend calls run on background threads (see
//! [`worker`]); the event loop only polls for their outcomes.

pub mod widgets;
pub mod worker;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::client::{QaBackend, QaClient};
use crate::config::ClientConfig;
use crate::error::{QaError, QaResult};
use crate::form::QueryForm;
use crate::page::PageController;
use crate::results::ResultsView;

use self::widgets::Screen;
use self::worker::{Worker, WorkerEvent};

/// Lines moved per PageUp / PageDown.
const SCROLL_STEP: u16 = 10;

/// The focused input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Query,
    TopK,
    Book,
    Tools,
    Results,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Query,
        Focus::TopK,
        Focus::Book,
        Focus::Tools,
        Focus::Results,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// TUI application state.
pub struct QaTui {
    api_url: String,
    form: QueryForm,
    page: PageController,
    worker: Worker,
    view: Option<ResultsView>,
    focus: Focus,
    selected_passage: usize,
    expanded: BTreeSet<usize>,
    scroll_offset: u16,
    should_quit: bool,
}

impl QaTui {
    pub fn new(api_url: impl Into<String>, default_top_k: u32, backend: Arc<dyn QaBackend>) -> Self {
        Self {
            api_url: api_url.into(),
            form: QueryForm::new(default_top_k),
            page: PageController::new(),
            worker: Worker::new(backend),
            view: None,
            focus: Focus::Query,
            selected_passage: 0,
            expanded: BTreeSet::new(),
            scroll_offset: 0,
            should_quit: false,
        }
    }

    pub fn form(&self) -> &QueryForm {
        &self.form
    }

    pub fn page(&self) -> &PageController {
        &self.page
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Kick off the one-time book list load.
    pub fn start(&mut self) {
        self.form.begin_book_load();
        self.worker.spawn_book_load();
    }

    /// Run the TUI event loop.
    pub fn run(&mut self) -> QaResult<()> {
        self.start();
        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal);
        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> QaResult<()> {
        loop {
            self.drain_worker_events();

            terminal
                .draw(|frame| {
                    let screen = Screen {
                        api_url: &self.api_url,
                        form: &self.form,
                        page: &self.page,
                        view: self.view.as_ref(),
                        focus: self.focus,
                        selected_passage: self.selected_passage,
                        expanded: &self.expanded,
                        scroll_offset: self.scroll_offset,
                    };
                    widgets::render(frame, &screen);
                })
                .map_err(|source| QaError::Terminal { source })?;

            if self.should_quit {
                return Ok(());
            }

            if event::poll(Duration::from_millis(100)).map_err(|source| QaError::Terminal { source })? {
                if let Event::Key(key) = event::read().map_err(|source| QaError::Terminal { source })? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    self.handle_key(key.code, key.modifiers);
                }
            }
        }
    }

    /// Apply finished background calls to form and page state.
    pub fn drain_worker_events(&mut self) {
        while let Some(event) = self.worker.try_recv() {
            match event {
                WorkerEvent::Books(result) => self.form.finish_book_load(result),
                WorkerEvent::Answer { ticket, result } => {
                    if self.page.complete(ticket, result) {
                        self.refresh_view();
                    }
                }
            }
        }
    }

    fn refresh_view(&mut self) {
        let fresh = self.page.results().map(ResultsView::from_response);
        if fresh != self.view {
            self.view = fresh;
            self.selected_passage = 0;
            self.expanded.clear();
            self.scroll_offset = 0;
        }
    }

    fn submit(&mut self) {
        if !self.form.can_submit(self.page.is_loading()) {
            return;
        }
        self.form.submit(|request| {
            let ticket = self.page.begin();
            tracing::info!(
                ticket = ticket.sequence(),
                top_k = request.top_k,
                book = request.book_filter().unwrap_or("all"),
                using_tools = request.using_tools,
                "submitting query"
            );
            self.worker.spawn_query(ticket, request);
        });
    }

    fn set_focus(&mut self, focus: Focus) {
        if self.focus == Focus::TopK && focus != Focus::TopK {
            self.form.normalize_top_k_input();
        }
        self.focus = focus;
    }

    fn passage_count(&self) -> usize {
        self.view.as_ref().map_or(0, |v| v.passages.len())
    }

    fn toggle_selected_details(&mut self) {
        if self.selected_passage >= self.passage_count() {
            return;
        }
        if !self.expanded.remove(&self.selected_passage) {
            self.expanded.insert(self.selected_passage);
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab => {
                self.set_focus(self.focus.next());
                return;
            }
            KeyCode::BackTab => {
                self.set_focus(self.focus.prev());
                return;
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
                return;
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_add(SCROLL_STEP);
                return;
            }
            _ => {}
        }

        if self.focus == Focus::Results {
            self.handle_results_key(code);
            return;
        }

        if code == KeyCode::Enter {
            self.submit();
            return;
        }

        // Inputs are disabled while a request is in flight.
        if self.page.is_loading() {
            return;
        }

        match (self.focus, code) {
            (Focus::Query, KeyCode::Char(c)) => self.form.push_query_char(c),
            (Focus::Query, KeyCode::Backspace) => self.form.pop_query_char(),

            (Focus::TopK, KeyCode::Char(c)) if c.is_ascii_digit() || c == '-' || c == '+' => {
                self.form.push_top_k_char(c);
            }
            (Focus::TopK, KeyCode::Backspace) => self.form.pop_top_k_char(),
            (Focus::TopK, KeyCode::Up | KeyCode::Right) => self.form.increment_top_k(),
            (Focus::TopK, KeyCode::Down | KeyCode::Left) => self.form.decrement_top_k(),

            (Focus::Book, KeyCode::Right | KeyCode::Down) => self.form.select_next_book(),
            (Focus::Book, KeyCode::Left | KeyCode::Up) => self.form.select_prev_book(),

            (Focus::Tools, KeyCode::Char(' ')) => self.form.toggle_tools(),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => {
                self.selected_passage = self.selected_passage.saturating_sub(1);
            }
            KeyCode::Down => {
                let last = self.passage_count().saturating_sub(1);
                self.selected_passage = (self.selected_passage + 1).min(last);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected_details(),
            KeyCode::Home => self.scroll_offset = 0,
            _ => {}
        }
    }
}

/// Launch the TUI against the configured backend.
pub fn launch(config: &ClientConfig) -> QaResult<()> {
    let backend: Arc<dyn QaBackend> = Arc::new(QaClient::from_config(config));
    tracing::info!(api_url = %config.api_url, "starting TUI");
    let mut tui = QaTui::new(&config.api_url, config.default_top_k, backend);
    tui.run()
}
