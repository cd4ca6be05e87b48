use std::borrow::Cow;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// One `[key] label` entry in a footer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionHint {
    pub key: Cow<'static, str>,
    pub label: Cow<'static, str>,
    pub enabled: bool,
    /// Lower priorities are dropped first when the footer is too narrow
    pub priority: u8,
}

impl ActionHint {
    pub fn new(
        key: impl Into<Cow<'static, str>>,
        label: impl Into<Cow<'static, str>>,
        priority: u8,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            enabled: true,
            priority,
        }
    }

    pub fn disabled(
        key: impl Into<Cow<'static, str>>,
        label: impl Into<Cow<'static, str>>,
        priority: u8,
    ) -> Self {
        Self {
            enabled: false,
            ..Self::new(key, label, priority)
        }
    }

    fn width(&self) -> usize {
        // "[key] label"
        self.key.chars().count() + 3 + self.label.chars().count()
    }
}

const GAP: &str = "  ";
const MORE: &str = "(? more)";

/// Indices of the hints that fit on one line of `width`, in original order.
fn fit_hints(hints: &[ActionHint], width: usize) -> (Vec<usize>, bool) {
    let mut kept: Vec<usize> = (0..hints.len()).collect();
    let mut dropped = false;

    loop {
        let mut total: usize = kept.iter().map(|&i| hints[i].width()).sum();
        total += GAP.len() * kept.len().saturating_sub(1);
        if dropped {
            total += GAP.len() + MORE.len();
        }
        if total <= width || kept.is_empty() {
            return (kept, dropped);
        }
        // Drop the lowest priority; among equals, the right-most
        let Some(pos) = kept
            .iter()
            .enumerate()
            .min_by_key(|(_, i)| (hints[**i].priority, std::cmp::Reverse(**i)))
            .map(|(pos, _)| pos)
        else {
            return (kept, dropped);
        };
        kept.remove(pos);
        dropped = true;
    }
}

pub fn render_action_bar(frame: &mut Frame, area: Rect, hints: &[ActionHint]) {
    let block = Block::default().borders(Borders::TOP);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let (kept, dropped) = fit_hints(hints, inner.width as usize);
    let mut spans = Vec::new();
    for (n, &i) in kept.iter().enumerate() {
        if n > 0 {
            spans.push(Span::raw(GAP));
        }
        let hint = &hints[i];
        let (key_style, label_style) = if hint.enabled {
            (
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                Style::default(),
            )
        } else {
            let dim = Style::default().fg(Color::DarkGray);
            (dim, dim)
        };
        spans.push(Span::styled(format!("[{}]", hint.key), key_style));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(hint.label.clone(), label_style));
    }
    if dropped {
        spans.push(Span::raw(GAP));
        spans.push(Span::styled(MORE, Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        inner,
    );
}

/// Status text in place of the hints.
pub fn render_action_bar_message(frame: &mut Frame, area: Rect, message: &str, style: Style) {
    let block = Block::default().borders(Borders::TOP);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(message).style(style).alignment(Alignment::Center),
        inner,
    );
}

/// Hints as aligned `key  label` lines for the help overlay.
pub fn format_help_lines(hints: &[ActionHint]) -> Vec<String> {
    let key_width = hints
        .iter()
        .map(|hint| hint.key.chars().count())
        .max()
        .unwrap_or(0);
    hints
        .iter()
        .map(|hint| format!("  {:<width$}  {}", hint.key, hint.label, width = key_width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<ActionHint> {
        vec![
            ActionHint::new("Enter", "Details", 9),
            ActionHint::new("c", "Close", 5),
            ActionHint::new("f", "Filter", 1),
        ]
    }

    #[test]
    fn test_all_hints_fit_when_wide() {
        let (kept, dropped) = fit_hints(&hints(), 200);
        assert_eq!(kept, vec![0, 1, 2]);
        assert!(!dropped);
    }

    #[test]
    fn test_lowest_priority_dropped_first() {
        // "[Enter] Details  [c] Close  (? more)" is 36 wide
        let (kept, dropped) = fit_hints(&hints(), 36);
        assert_eq!(kept, vec![0, 1]);
        assert!(dropped);
    }

    #[test]
    fn test_format_help_lines_aligns_keys() {
        let lines = format_help_lines(&hints());
        assert_eq!(lines[0], "  Enter  Details");
        assert_eq!(lines[1], "  c      Close");
    }
}
