//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use fieldops_core::{Notification, NotificationLevel};

use crate::action::Action;
use crate::component::Component;
use crate::screen::ScreenId;
use crate::screens::{ScreenContext, create_screens};
use crate::terminal::{Input, InputEvent, Session};
use crate::theme;

/// How long a toast stays on screen.
const TOAST_TTL: Duration = Duration::from_secs(3);

/// Redraw pace, ~30 FPS.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn toast_expired(shown: Instant, now: Instant) -> bool {
    now.saturating_duration_since(shown) >= TOAST_TTL
}

/// Top-level application state and event loop.
pub struct App {
    /// Current active screen.
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    /// All screen components, keyed by ScreenId.
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    /// Latest toast and when it was shown.
    notification: Option<(Notification, Instant)>,
    /// Shown in the status bar.
    api_url: String,
    /// Toasts raised by list controllers, bridged into actions.
    toasts: Option<mpsc::UnboundedReceiver<Notification>>,
    bridge_cancel: CancellationToken,
    /// Action sender, cloned into every screen.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Drained by the main loop.
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(
        ctx: &ScreenContext,
        toasts: mpsc::UnboundedReceiver<Notification>,
        api_url: String,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens(ctx).into_iter().collect();

        Self {
            active_screen: ScreenId::Customers,
            previous_screen: None,
            screens,
            running: true,
            help_visible: false,
            notification: None,
            api_url,
            toasts: Some(toasts),
            bridge_cancel: CancellationToken::new(),
            action_tx,
            action_rx,
        }
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        // Focus the initial screen
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Forward controller toasts into the action loop until cancelled.
    fn spawn_notification_bridge(&mut self) {
        let Some(mut toasts) = self.toasts.take() else {
            return;
        };
        let tx = self.action_tx.clone();
        let cancel = self.bridge_cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    toast = toasts.recv() => {
                        let Some(toast) = toast else { break };
                        if tx.send(Action::Notify(toast)).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut session = Session::start()?;
        self.init_screens()?;
        self.spawn_notification_bridge();
        let mut input = Input::spawn(FRAME_INTERVAL);

        info!("TUI event loop started");

        while self.running {
            let Some(event) = input.recv().await else {
                break;
            };

            let redraw = match event {
                InputEvent::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                    false
                }
                InputEvent::Invalidate => true,
                InputEvent::Frame => {
                    self.expire_toast(Instant::now());
                    true
                }
            };

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
            }
            if redraw && self.running {
                session.draw(|frame| self.render(frame))?;
            }
        }

        self.bridge_cancel.cancel();
        info!("TUI event loop ended");
        Ok(())
    }

    fn expire_toast(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|(_, shown)| toast_expired(*shown, now))
        {
            self.notification = None;
        }
    }

    /// Map a key event to an action. Global keys are handled here unless
    /// the active screen is taking text input.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (key.modifiers, key.code) {
            return Ok(Some(Action::Quit));
        }

        let capturing = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_input());

        if !capturing {
            match (key.modifiers, key.code) {
                (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
                (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('?')) => {
                    return Ok(Some(Action::ToggleHelp));
                }
                (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='7')) => {
                    let n = c as u8 - b'0';
                    if let Some(screen) = ScreenId::from_number(n) {
                        return Ok(Some(Action::SwitchScreen(screen)));
                    }
                }
                (KeyModifiers::NONE, KeyCode::Tab) => {
                    return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
                }
                (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                    return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
                }
                (KeyModifiers::NONE, KeyCode::Esc) => {
                    if self.notification.is_some() {
                        return Ok(Some(Action::DismissNotification));
                    }
                    return Ok(Some(Action::GoBack));
                }
                _ => {}
            }
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    /// Process a single action: update app state and propagate to screens.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.previous_screen = Some(self.active_screen);
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                }
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Notify(notification) => {
                debug!(level = ?notification.level, message = %notification.message, "toast");
                self.notification = Some((notification.clone(), Instant::now()));
            }

            Action::DismissNotification => self.notification = None,

            // Board snapshots go to the pipeline screen even when it is not
            // in front.
            Action::BoardLoaded(_) => {
                if let Some(screen) = self.screens.get_mut(&ScreenId::Pipeline) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if let Some((ref notification, _)) = self.notification {
            Self::render_toast(frame, layout[0], notification);
        }
        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::raw(" "),
            Span::styled("● ", Style::default().fg(theme::GREEN)),
            Span::styled(self.api_url.clone(), theme::table_row()),
            Span::styled(" │ ? help  Tab next  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    /// One-line toast in the top-right corner of the content area.
    fn render_toast(frame: &mut Frame, area: Rect, notification: &Notification) {
        let (icon, color) = match notification.level {
            NotificationLevel::Success => ("✓", theme::GREEN),
            NotificationLevel::Error => ("✗", theme::RED),
            NotificationLevel::Warning => ("!", theme::YELLOW),
            NotificationLevel::Info => ("i", theme::CYAN),
        };
        let text = format!(" {icon} {} ", notification.message);
        let width = u16::try_from(text.chars().count())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(area.width);
        if width == 0 || area.height < 3 {
            return;
        }
        let toast = Rect::new(area.x + area.width - width, area.y, width, 3);
        frame.render_widget(Clear, toast);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(toast);
        frame.render_widget(block, toast);
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(color))),
            inner,
        );
    }

    /// Render the help overlay centered on screen.
    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_width = 64u16.min(area.width.saturating_sub(4));
        let help_height = 26u16.min(area.height.saturating_sub(4));
        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(Clear, help_area);
        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let section = |title: &'static str| {
            [
                Line::from(Span::styled(format!("  {title}"), Style::default().fg(theme::CYAN))),
                Line::from(Span::styled(
                    format!("  {}", "─".repeat(title.chars().count())),
                    theme::key_hint(),
                )),
            ]
        };
        let row = |key: &'static str, text: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(text, theme::key_hint()),
            ])
        };

        let mut help_text = vec![Line::from("")];
        help_text.extend(section("Navigation"));
        help_text.extend([
            row("1-7", "Jump to screen"),
            row("Tab", "Next screen"),
            row("j/k ↑/↓", "Move up/down"),
            row("g/G", "Top / bottom"),
            row("n/p ←/→", "Next / previous page"),
            row("Esc", "Back / close"),
        ]);
        help_text.push(Line::from(""));
        help_text.extend(section("Lists"));
        help_text.extend([
            row("/", "Edit search, Enter to apply"),
            row("f / F", "Cycle filter value / filter"),
            row("x", "Clear filters"),
            row("c", "Choose columns"),
            row("d", "Delete selected record"),
            row("R", "Refresh"),
        ]);
        help_text.push(Line::from(""));
        help_text.extend(section("Pipeline"));
        help_text.extend([
            row("←/→", "Select stage"),
            row("h/l", "Move card to previous / next stage"),
        ]);
        help_text.push(Line::from(""));
        help_text.push(row("q", "Quit"));
        help_text.push(Line::from(Span::styled(
            "                         Esc or ? to close",
            theme::key_hint(),
        )));

        frame.render_widget(Paragraph::new(help_text), inner);
    }
}
