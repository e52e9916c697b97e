//! Opportunity pipeline: one column per stage, cards moved with h/l.
//!
//! A worker task owns the [`Pipeline`] and serializes loads and moves.
//! After every command it publishes a fresh [`BoardView`] snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

use fieldops_core::model::catalog::OPPORTUNITIES;
use fieldops_core::{
    Board, Notification, PIPELINE_STAGES, Pipeline, RestClient, RestSource, StageChange,
};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

/// Immutable board snapshot handed to the render side.
#[derive(Debug, Default)]
pub struct BoardView {
    pub board: Board,
    /// Card id → display label.
    pub labels: HashMap<String, String>,
}

impl BoardView {
    fn from_pipeline(pipeline: &Pipeline) -> Self {
        let board = pipeline.board().clone();
        let labels = board
            .stages()
            .flat_map(|(_, ids)| ids.iter())
            .map(|id| {
                let label = pipeline.card(id).map_or_else(|| id.clone(), |e| e.label());
                (id.clone(), label)
            })
            .collect();
        Self { board, labels }
    }

    fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map_or(id, String::as_str)
    }
}

#[derive(Debug)]
enum BoardCommand {
    Reload,
    Shift { card: String, offset: isize },
}

pub struct PipelineScreen {
    client: Arc<RestClient>,
    commands: Option<UnboundedSender<BoardCommand>>,
    view: Arc<BoardView>,
    focused: bool,
    /// First load has been requested.
    requested: bool,
    loading: bool,
    stage: usize,
    card: usize,
    /// Card to keep selected once the next snapshot arrives.
    follow: Option<String>,
}

impl PipelineScreen {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            client,
            commands: None,
            view: Arc::new(BoardView {
                board: Board::new(PIPELINE_STAGES),
                labels: HashMap::new(),
            }),
            focused: false,
            requested: false,
            loading: false,
            stage: 0,
            card: 0,
            follow: None,
        }
    }

    fn send(&mut self, command: BoardCommand) {
        if let Some(tx) = &self.commands {
            self.loading = tx.send(command).is_ok();
        }
    }

    fn stage_len(&self, index: usize) -> usize {
        self.view
            .board
            .stages()
            .nth(index)
            .map_or(0, |(_, cards)| cards.len())
    }

    fn selected_card(&self) -> Option<String> {
        self.view
            .board
            .stages()
            .nth(self.stage)
            .and_then(|(_, cards)| cards.get(self.card))
            .cloned()
    }

    fn clamp_cursor(&mut self) {
        self.stage = self.stage.min(PIPELINE_STAGES.len().saturating_sub(1));
        self.card = self.card.min(self.stage_len(self.stage).saturating_sub(1));
    }

    fn apply_view(&mut self, view: Arc<BoardView>) {
        self.view = view;
        self.loading = false;
        if let Some(card) = self.follow.take() {
            if let Some((stage, index)) = self.view.board.locate(&card) {
                self.stage = self
                    .view
                    .board
                    .stages()
                    .position(|(s, _)| s == stage)
                    .unwrap_or(self.stage);
                self.card = index;
            }
        }
        self.clamp_cursor();
    }

    fn render_stage(&self, frame: &mut Frame, area: Rect, index: usize, stage: &str, cards: &[String]) {
        let active = self.focused && index == self.stage;
        let block = Block::default()
            .title(format!(" {stage} ({}) ", cards.len()))
            .title_style(if active {
                theme::title_style()
            } else {
                theme::table_header()
            })
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<Line> = cards
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let style = if active && i == self.card {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };
                Line::from(Span::styled(format!(" {}", self.view.label(id)), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Drain board commands until the screen goes away.
async fn run_worker(
    mut pipeline: Pipeline,
    mut commands: mpsc::UnboundedReceiver<BoardCommand>,
    action_tx: UnboundedSender<Action>,
) {
    while let Some(command) = commands.recv().await {
        debug!(?command, "pipeline command");
        let notice = match command {
            BoardCommand::Reload => match pipeline.load().await {
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "pipeline load failed");
                    Some(Notification::error(e.user_message("Failed to load pipeline")))
                }
            },
            BoardCommand::Shift { card, offset } => match pipeline.shift_card(&card, offset).await {
                Ok(Some(StageChange { to, .. })) => {
                    let label = pipeline.card(&card).map_or_else(|| card.clone(), |e| e.label());
                    Some(Notification::success(format!("Moved '{label}' to {to}")))
                }
                Ok(None) => None,
                Err(e) => Some(Notification::error(e.user_message("Failed to move opportunity"))),
            },
        };

        let view = Arc::new(BoardView::from_pipeline(&pipeline));
        if action_tx.send(Action::BoardLoaded(view)).is_err() {
            break;
        }
        if let Some(notice) = notice {
            let _ = action_tx.send(Action::Notify(notice));
        }
    }
}

impl Component for PipelineScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        let source = Arc::new(RestSource::new(Arc::clone(&self.client), &OPPORTUNITIES));
        let pipeline = Pipeline::new(&OPPORTUNITIES, PIPELINE_STAGES, source);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(pipeline, rx, action_tx));
        self.commands = Some(tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Left => {
                self.stage = self.stage.saturating_sub(1);
                self.clamp_cursor();
            }
            KeyCode::Right => {
                self.stage += 1;
                self.clamp_cursor();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.card += 1;
                self.clamp_cursor();
            }
            KeyCode::Char('k') | KeyCode::Up => self.card = self.card.saturating_sub(1),
            KeyCode::Char(c @ ('h' | 'l')) => {
                if let Some(card) = self.selected_card() {
                    let offset = if c == 'h' { -1 } else { 1 };
                    self.follow = Some(card.clone());
                    self.send(BoardCommand::Shift { card, offset });
                }
            }
            KeyCode::Char('R') => self.send(BoardCommand::Reload),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::BoardLoaded(view) = action {
            self.apply_view(Arc::clone(view));
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Pipeline ")
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

        let [board_area, footer_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        let stages: Vec<(&str, &[String])> = self.view.board.stages().collect();
        let columns = Layout::horizontal(vec![Constraint::Fill(1); stages.len()]).split(board_area);
        for (index, ((stage, cards), column)) in stages.iter().zip(columns.iter()).enumerate() {
            self.render_stage(frame, *column, index, stage, cards);
        }

        let mut spans = Vec::new();
        if self.loading {
            spans.push(Span::styled(
                " loading…",
                Style::default().fg(theme::YELLOW).add_modifier(Modifier::ITALIC),
            ));
        }
        for (key, hint) in [("←/→", "stage"), ("j/k", "card"), ("h/l", "move"), ("R", "reload")] {
            spans.push(Span::styled(format!("  {key} "), theme::key_hint_key()));
            spans.push(Span::styled(hint, theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), footer_area);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused && !self.requested {
            self.requested = true;
            self.send(BoardCommand::Reload);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fieldops_core::Entity;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn screen_with(cards: &[(u32, &str)]) -> PipelineScreen {
        let entities: Vec<Entity> = cards
            .iter()
            .map(|(id, stage)| Entity::try_from(json!({ "id": id, "stage": stage })).unwrap())
            .collect();
        let board = Board::from_entities(PIPELINE_STAGES, &entities, "stage");
        let client = Arc::new(RestClient::new("http://127.0.0.1:9", &Default::default()).unwrap());
        let mut screen = PipelineScreen::new(client);
        screen.apply_view(Arc::new(BoardView {
            board,
            labels: HashMap::new(),
        }));
        screen
    }

    #[test]
    fn cursor_follows_moved_card() {
        let mut screen = screen_with(&[(1, "lead"), (2, "qualified"), (3, "qualified")]);
        screen.follow = Some("1".into());
        let moved = screen_with(&[(2, "qualified"), (3, "qualified"), (1, "qualified")]);
        screen.apply_view(Arc::clone(&moved.view));
        assert_eq!((screen.stage, screen.card), (1, 2));
        assert_eq!(screen.selected_card().as_deref(), Some("1"));
    }

    #[test]
    fn cursor_is_clamped_to_stage_length() {
        let mut screen = screen_with(&[(1, "lead")]);
        screen.card = 5;
        screen.clamp_cursor();
        assert_eq!(screen.card, 0);
        screen.stage = 99;
        screen.clamp_cursor();
        assert_eq!(screen.stage, PIPELINE_STAGES.len() - 1);
        assert_eq!(screen.selected_card(), None);
    }

    #[test]
    fn labels_fall_back_to_id() {
        let view = BoardView::default();
        assert_eq!(view.label("42"), "42");
    }
}
