//! All possible UI actions. Actions are the sole mechanism for app-level
//! state changes; list state itself lives in each screen's controller.

use std::sync::Arc;

use fieldops_core::Notification;

use crate::screen::ScreenId;
use crate::screens::pipeline::BoardView;

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,

    // ── Pipeline ──────────────────────────────────────────────────
    BoardLoaded(Arc<BoardView>),
}
