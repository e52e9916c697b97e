//! Generic list screen: one instance per entity page.
//!
//! Renders a `ListController`'s state and turns keys into controller calls.
//! Controller calls run on spawned tasks; the screen reads state straight
//! from the controller's watch channel at render time.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tracing::debug;

use fieldops_core::{Dialog, ListController, ListState, Notification, PageSpec};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::sub_tabs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    Columns,
}

pub struct EntityListScreen {
    controller: ListController,
    state: watch::Receiver<ListState>,
    action_tx: Option<UnboundedSender<Action>>,
    focused: bool,
    mounted: bool,
    mode: Mode,
    selected: usize,
    filter_index: usize,
    search_input: String,
    column_cursor: usize,
}

/// Value after `current` in a filter's option cycle. The cycle ends on
/// `all`, which clears the filter.
pub fn next_filter_value<'a>(options: &[&'a str], current: Option<&str>) -> &'a str {
    let next = match current {
        None => 0,
        Some(value) => options
            .iter()
            .position(|o| o.eq_ignore_ascii_case(value))
            .map_or(0, |i| i + 1),
    };
    options.get(next).copied().unwrap_or("all")
}

impl EntityListScreen {
    pub fn new(controller: ListController) -> Self {
        let state = controller.subscribe();
        Self {
            controller,
            state,
            action_tx: None,
            focused: false,
            mounted: false,
            mode: Mode::Browse,
            selected: 0,
            filter_index: 0,
            search_input: String::new(),
            column_cursor: 0,
        }
    }

    fn spec(&self) -> &'static PageSpec {
        self.controller.spec()
    }

    /// Run a controller call in the background.
    fn spawn<F, Fut>(&self, call: F)
    where
        F: FnOnce(ListController) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(call(self.controller.clone()));
    }

    fn notify_error(&self, message: String) {
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::Notify(Notification::error(message)));
        }
    }

    fn item_count(&self) -> usize {
        self.state.borrow().result.items.len()
    }

    fn selected_index(&self) -> usize {
        self.selected.min(self.item_count().saturating_sub(1))
    }

    fn selected_id(&self) -> Option<String> {
        let state = self.state.borrow();
        state.result.items.get(self.selected_index()).and_then(|e| e.id())
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.item_count();
        if len == 0 {
            return;
        }
        self.selected = self.selected_index().saturating_add_signed(delta).min(len - 1);
    }

    // ── Key handling per mode ────────────────────────────────────────

    fn handle_dialog_key(&self, dialog: &Dialog, key: KeyEvent) {
        match dialog {
            Dialog::ConfirmDelete { .. } => match key.code {
                KeyCode::Char('y' | 'Y') => {
                    let page = self.spec().id;
                    self.spawn(move |c| async move {
                        // Failures are toasted by the controller.
                        if let Err(e) = c.confirm_delete().await {
                            debug!(page, error = %e, "delete failed");
                        }
                    });
                }
                KeyCode::Char('n' | 'N') | KeyCode::Esc => self.controller.cancel_dialog(),
                _ => {}
            },
            Dialog::Locked { .. } => self.controller.cancel_dialog(),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                self.search_input.push(c);
                self.controller.set_search_term(self.search_input.clone());
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                self.controller.set_search_term(self.search_input.clone());
            }
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                self.selected = 0;
                self.spawn(|c| async move {
                    c.submit_search().await;
                });
            }
            KeyCode::Esc => self.mode = Mode::Browse,
            _ => {}
        }
    }

    fn handle_columns_key(&mut self, key: KeyEvent) {
        let columns = self.spec().columns;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.column_cursor = (self.column_cursor + 1).min(columns.len().saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.column_cursor = self.column_cursor.saturating_sub(1);
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(column) = columns.get(self.column_cursor) {
                    if let Err(e) = self.controller.toggle_column(column.key) {
                        self.notify_error(e.to_string());
                    }
                }
            }
            KeyCode::Char('a') => self.controller.show_all_columns(),
            KeyCode::Char('A') => self.controller.hide_all_columns(),
            KeyCode::Char('r') => self.controller.reset_columns(),
            KeyCode::Char('c') | KeyCode::Esc => self.mode = Mode::Browse,
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        let spec = self.spec();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') => self.selected = 0,
            KeyCode::Char('G') => self.selected = self.item_count().saturating_sub(1),

            KeyCode::Char('/') => {
                self.search_input = self.state.borrow().pending_search.clone();
                self.mode = Mode::Search;
            }
            KeyCode::Enter => self.spawn(|c| async move {
                c.submit_search().await;
            }),

            KeyCode::Char('F') => {
                if !spec.filters.is_empty() {
                    self.filter_index = (self.filter_index + 1) % spec.filters.len();
                }
            }
            KeyCode::Char('f') => {
                let Some(filter) = spec.filters.get(self.filter_index) else {
                    return;
                };
                let current = self.state.borrow().query.filters.get(filter.key).cloned();
                let value = next_filter_value(filter.options, current.as_deref());
                self.selected = 0;
                self.spawn(move |c| async move {
                    if let Err(e) = c.set_filter(filter.key, value).await {
                        debug!(error = %e, "filter rejected");
                    }
                });
            }
            KeyCode::Char('x') => {
                self.selected = 0;
                self.spawn(|c| async move {
                    c.clear_filters().await;
                });
            }

            KeyCode::Char('n') | KeyCode::Right => {
                self.selected = 0;
                self.spawn(|c| async move {
                    c.next_page().await;
                });
            }
            KeyCode::Char('p') | KeyCode::Left => {
                self.selected = 0;
                self.spawn(|c| async move {
                    c.prev_page().await;
                });
            }

            KeyCode::Char('c') => {
                self.column_cursor = 0;
                self.mode = Mode::Columns;
            }

            KeyCode::Char('d') => {
                let Some(id) = self.selected_id() else {
                    return;
                };
                let tx = self.action_tx.clone();
                self.spawn(move |c| async move {
                    if let Err(e) = c.request_delete(&id).await {
                        let message = e.user_message(&format!("Could not load {} '{id}'", spec.noun));
                        if let Some(tx) = tx {
                            let _ = tx.send(Action::Notify(Notification::error(message)));
                        }
                    }
                });
            }

            KeyCode::Char('R') => self.spawn(|c| async move {
                c.refresh().await;
            }),

            _ => {}
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_header(&self, frame: &mut Frame, area: Rect, state: &ListState) {
        let spec = self.spec();
        let search = if self.mode == Mode::Search {
            Line::from(vec![
                Span::styled(" Search: ", theme::key_hint_key()),
                Span::styled(format!("{}▏", self.search_input), theme::table_row()),
            ])
        } else if state.query.search.is_empty() {
            Line::from(Span::styled(" / to search", theme::key_hint()))
        } else {
            Line::from(vec![
                Span::styled(" Search: ", theme::key_hint()),
                Span::styled(state.query.search.clone(), theme::table_row()),
            ])
        };

        let chips: Vec<String> = spec
            .filters
            .iter()
            .map(|f| {
                let value = state.query.filters.get(f.key).map_or("all", String::as_str);
                format!("{}: {value}", f.label)
            })
            .collect();
        let mut filters = sub_tabs::render_sub_tabs(&chips, self.filter_index);
        filters.spans.insert(0, Span::raw(" "));

        frame.render_widget(Paragraph::new(vec![search, filters]), area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, state: &ListState) {
        let columns = state.visible_columns();
        if columns.is_empty() {
            let text = Paragraph::new(" All columns are hidden. Press c to choose columns.")
                .style(theme::key_hint());
            frame.render_widget(text, area);
            return;
        }
        if state.result.is_empty() {
            let message = if state.is_loading {
                " Loading…".to_owned()
            } else {
                format!(" No {}s match.", self.spec().noun)
            };
            frame.render_widget(Paragraph::new(message).style(theme::key_hint()), area);
            return;
        }

        let header = Row::new(
            columns
                .iter()
                .map(|c| Cell::from(c.label).style(theme::table_header())),
        );
        let rows = state.result.items.iter().map(|item| {
            Row::new(columns.iter().map(|c| Cell::from(item.display(c.key))))
                .style(theme::table_row())
        });
        let widths = vec![Constraint::Fill(1); columns.len()];

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut table_state = TableState::default();
        table_state.select(Some(self.selected_index()));
        frame.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, state: &ListState) {
        let position = if state.result.total_pages == 0 {
            " No records".to_owned()
        } else {
            format!(
                " Page {} of {} · {} total",
                state.query.page, state.result.total_pages, state.result.total_count
            )
        };
        let mut spans = vec![Span::styled(position, theme::table_row())];
        if state.is_loading {
            spans.push(Span::styled("  loading…", Style::default().fg(theme::YELLOW)));
        }
        for (key, hint) in [
            ("n/p", "page"),
            ("f/F", "filter"),
            ("x", "clear"),
            ("c", "columns"),
            ("d", "delete"),
            ("R", "refresh"),
        ] {
            spans.push(Span::styled(format!("  {key} "), theme::key_hint_key()));
            spans.push(Span::styled(hint, theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_column_picker(&self, frame: &mut Frame, area: Rect, state: &ListState) {
        let columns = self.spec().columns;
        let height = u16::try_from(columns.len()).unwrap_or(u16::MAX).saturating_add(4);
        let popup = centered(area, 40, height);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Columns ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let mut lines: Vec<Line> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mark = if state.columns.is_visible(c.key) { "[x]" } else { "[ ]" };
                let style = if i == self.column_cursor {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };
                Line::from(Span::styled(format!(" {mark} {}", c.label), style))
            })
            .collect();
        lines.push(Line::from(vec![
            Span::styled(" space ", theme::key_hint_key()),
            Span::styled("toggle ", theme::key_hint()),
            Span::styled("a/A ", theme::key_hint_key()),
            Span::styled("all/none ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("reset", theme::key_hint()),
        ]));
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_dialog(frame: &mut Frame, area: Rect, dialog: &Dialog) {
        let (title, message, color, hint) = match dialog {
            Dialog::ConfirmDelete { label, .. } => (
                " Confirm ",
                format!("Delete '{label}'?"),
                theme::YELLOW,
                vec![
                    Span::styled(" y ", theme::key_hint_key()),
                    Span::styled("delete    ", theme::key_hint()),
                    Span::styled("n ", theme::key_hint_key()),
                    Span::styled("cancel", theme::key_hint()),
                ],
            ),
            Dialog::Locked { message, .. } => (
                " Cannot delete ",
                message.clone(),
                theme::RED,
                vec![Span::styled(" any key to close", theme::key_hint())],
            ),
        };

        let popup = centered(area, 60, 5);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let text = vec![
            Line::from(Span::styled(format!(" {message}"), theme::table_row())),
            Line::from(""),
            Line::from(hint),
        ];
        frame.render_widget(Paragraph::new(text), inner);
    }
}

/// A `width` x `height` rectangle centered in `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

impl Component for EntityListScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let dialog = self.state.borrow().dialog.clone();
        if let Some(dialog) = dialog {
            self.handle_dialog_key(&dialog, key);
            return Ok(None);
        }
        match self.mode {
            Mode::Search => self.handle_search_key(key),
            Mode::Columns => self.handle_columns_key(key),
            Mode::Browse => self.handle_browse_key(key),
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let state = self.state.borrow().clone();
        let spec = self.spec();

        let block = Block::default()
            .title(format!(" {} ", spec.title))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let error_height = u16::from(state.error.is_some());
        let layout = Layout::vertical([
            Constraint::Length(2),            // search + filters
            Constraint::Length(error_height), // last fetch error
            Constraint::Min(1),               // table
            Constraint::Length(1),            // footer
        ])
        .split(inner);

        self.render_header(frame, layout[0], &state);
        if let Some(ref error) = state.error {
            frame.render_widget(
                Paragraph::new(format!(" {error}")).style(theme::error_text()),
                layout[1],
            );
        }
        self.render_table(frame, layout[2], &state);
        self.render_footer(frame, layout[3], &state);

        if self.mode == Mode::Columns {
            self.render_column_picker(frame, inner, &state);
        }
        if let Some(ref dialog) = state.dialog {
            Self::render_dialog(frame, inner, dialog);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused && !self.mounted {
            self.mounted = true;
            self.spawn(|c| async move {
                c.mount().await;
            });
        }
    }

    fn captures_input(&self) -> bool {
        self.mode != Mode::Browse || self.state.borrow().dialog.is_some()
    }
}
