use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::preview::{PreviewView, LOADING_PLACEHOLDER};
use crate::theme::ThemeColors;

/// Preview widget that renders the selected entry's preview.
pub struct PreviewWidget<'a> {
    view: PreviewView<'a>,
    theme: &'a ThemeColors,
}

impl<'a> PreviewWidget<'a> {
    pub fn new(view: PreviewView<'a>, theme: &'a ThemeColors) -> Self {
        Self { view, theme }
    }

    /// Area left for content once the left border is drawn.
    pub fn inner(area: Rect) -> Rect {
        Block::default().borders(Borders::LEFT).inner(area)
    }
}

impl<'a> Widget for PreviewWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(self.theme.preview_border_fg));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let lines = match self.view {
            PreviewView::Ready(lines) => lines,
            PreviewView::Loading => {
                let line = Line::from(Span::styled(
                    LOADING_PLACEHOLDER,
                    Style::default()
                        .fg(self.theme.preview_fg)
                        .add_modifier(Modifier::ITALIC),
                ));
                buf.set_line(inner.x, inner.y, &line, inner.width);
                return;
            }
        };

        let base = Style::default().fg(self.theme.preview_fg);
        for (i, line) in lines.iter().take(inner.height as usize).enumerate() {
            let y = inner.y + i as u16;
            buf.set_style(Rect::new(inner.x, y, inner.width, 1), base);
            buf.set_line(inner.x, y, line, inner.width);
        }
    }
}
