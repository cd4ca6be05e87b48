use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear},
};

/// Regions of a rendered dialog.
#[derive(Clone, Copy, Debug)]
pub struct ModalLayout {
    pub area: Rect,
    pub body: Rect,
    pub footer: Rect,
}

/// Clear a centered box, draw its border and split the inside into a body and
/// a footer of `footer_height` rows.
pub fn render_modal(
    frame: &mut Frame,
    area: Rect,
    max_width: u16,
    max_height: u16,
    footer_height: u16,
    title: &str,
    border_style: Style,
) -> ModalLayout {
    let dialog = centered_area(area, max_width, max_height);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(border_style.bold())
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(dialog);
    frame.render_widget(block, dialog);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
        .split(inner);

    ModalLayout {
        area: dialog,
        body: chunks[0],
        footer: chunks[1],
    }
}

pub fn centered_area(area: Rect, max_width: u16, max_height: u16) -> Rect {
    let width = area.width.min(max_width);
    let height = area.height.min(max_height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

/// Anchor a box of at most `width` x `height` to the top-right corner.
pub fn top_right_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = area.width.min(width);
    let height = area.height.min(height);
    Rect::new(area.x + area.width - width, area.y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_area_clamps_to_parent() {
        let parent = Rect::new(0, 0, 40, 10);
        let area = centered_area(parent, 60, 6);
        assert_eq!(area, Rect::new(0, 2, 40, 6));
    }

    #[test]
    fn test_top_right_area() {
        let parent = Rect::new(0, 0, 80, 24);
        assert_eq!(top_right_area(parent, 30, 5), Rect::new(50, 0, 30, 5));
    }
}
