//! Horizontal chip bar for use within screens (filter chips on list pages).

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::theme;

/// Renders a horizontal bar with the active label highlighted.
///
/// The active label gets the accent color in brackets; the rest are dim.
pub fn render_sub_tabs(labels: &[String], active_index: usize) -> Line<'static> {
    let mut spans = Vec::with_capacity(labels.len() * 2);

    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme::key_hint()));
        }

        if i == active_index {
            spans.push(Span::styled(
                format!("[{label}]"),
                theme::tab_active().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(label.clone(), theme::tab_inactive()));
        }
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_label_is_bracketed() {
        let labels = vec!["Status: all".to_owned(), "Priority: high".to_owned()];
        let line = render_sub_tabs(&labels, 1);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "Status: all  [Priority: high]");
    }
}
