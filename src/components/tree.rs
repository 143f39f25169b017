use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::fs::node::NodeKind;
use crate::preview::text::clip;
use crate::theme::ThemeColors;
use crate::viewport::TreeLine;

const SELECTION_ARROW: &str = " <-";
const HIDES_HIDDEN_SUFFIX: &str = "◦";
/// Room kept after a name for the ellipsis and the selection arrow.
const NAME_RESERVE: usize = 6;

/// Tree widget that renders an already windowed slice of tree lines.
pub struct TreeWidget<'a> {
    lines: &'a [TreeLine],
    theme: &'a ThemeColors,
}

impl<'a> TreeWidget<'a> {
    pub fn new(lines: &'a [TreeLine], theme: &'a ThemeColors) -> Self {
        Self { lines, theme }
    }

    /// Shorten a name so indent, name and arrow fit in `width` columns.
    fn fit_name(name: &str, indent: &str, width: usize) -> String {
        let indent_width = indent.width();
        if indent_width + name.width() > width.saturating_sub(NAME_RESERVE) {
            let budget = width.saturating_sub(indent_width + NAME_RESERVE);
            format!("{}...", clip(name, budget))
        } else {
            name.to_string()
        }
    }

    fn name_style(&self, line: &TreeLine) -> Style {
        let style = match line.kind {
            Some(NodeKind::Directory) => Style::default().fg(self.theme.tree_dir_fg),
            Some(NodeKind::Symlink) => Style::default().fg(self.theme.tree_link_fg),
            _ => Style::default().fg(self.theme.tree_file_fg),
        };
        if line.marked {
            style
                .bg(self.theme.tree_marked_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    fn render_line(&self, line: &TreeLine, width: usize) -> Line<'static> {
        let mut spans = vec![
            Span::styled(
                line.indent.clone(),
                Style::default().fg(self.theme.tree_indent_fg),
            ),
            Span::styled(
                Self::fit_name(&line.name, &line.indent, width),
                self.name_style(line),
            ),
        ];
        if line.hides_hidden {
            spans.push(Span::raw(HIDES_HIDDEN_SUFFIX));
        }
        if line.selected {
            spans.push(Span::styled(
                SELECTION_ARROW,
                Style::default().fg(self.theme.tree_arrow_fg),
            ));
        }
        Line::from(spans)
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        for (i, line) in self.lines.iter().take(area.height as usize).enumerate() {
            let rendered = self.render_line(line, width);
            buf.set_line(area.x, area.y + i as u16, &rendered, area.width);
        }
    }
}
