use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::theme::ThemeColors;

/// A single keybinding entry for display.
struct KeyEntry {
    key: &'static str,
    description: &'static str,
}

/// A category of keybindings.
struct KeyCategory {
    name: &'static str,
    entries: &'static [KeyEntry],
}

const NAVIGATION_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "j / ↓",
        description: "Select next entry",
    },
    KeyEntry {
        key: "k / ↑",
        description: "Select previous entry",
    },
    KeyEntry {
        key: "l / →",
        description: "Enter selected directory",
    },
    KeyEntry {
        key: "h / ←",
        description: "Move up a directory",
    },
    KeyEntry {
        key: "gg",
        description: "Select first entry",
    },
    KeyEntry {
        key: "G",
        description: "Select last entry",
    },
    KeyEntry {
        key: "Enter",
        description: "Expand/collapse directory or open file",
    },
];

const OPERATION_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "Tab / S-Tab",
        description: "Toggle mark and move down/up",
    },
    KeyEntry {
        key: "d",
        description: "Move marked entries (then p to paste)",
    },
    KeyEntry {
        key: "y",
        description: "Copy marked entries (then p to paste)",
    },
    KeyEntry {
        key: "D",
        description: "Delete marked entries (y to confirm)",
    },
    KeyEntry {
        key: "r",
        description: "Rename selected entry",
    },
    KeyEntry {
        key: "a / A",
        description: "Create file / directory here",
    },
    KeyEntry {
        key: "e",
        description: "Edit selected file in $EDITOR",
    },
];

const GENERAL_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "H",
        description: "Toggle hidden files in this directory",
    },
    KeyEntry {
        key: "?",
        description: "Toggle help",
    },
    KeyEntry {
        key: "Esc",
        description: "Clear error / cancel operation",
    },
    KeyEntry {
        key: "q / Ctrl+c",
        description: "Quit",
    },
];

const CATEGORIES: &[KeyCategory] = &[
    KeyCategory {
        name: "Navigation",
        entries: NAVIGATION_KEYS,
    },
    KeyCategory {
        name: "Operations",
        entries: OPERATION_KEYS,
    },
    KeyCategory {
        name: "General",
        entries: GENERAL_KEYS,
    },
];

/// Width of the key column.
const KEY_WIDTH: usize = 14;

/// Keybinding pane shown above the preview.
pub struct HelpPane<'a> {
    theme: &'a ThemeColors,
}

impl<'a> HelpPane<'a> {
    pub fn new(theme: &'a ThemeColors) -> Self {
        Self { theme }
    }

    fn build_content_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for category in CATEGORIES {
            lines.push(Line::from(Span::styled(
                category.name,
                Style::default()
                    .fg(self.theme.help_fg)
                    .add_modifier(Modifier::BOLD),
            )));
            for entry in category.entries {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{:<width$}", entry.key, width = KEY_WIDTH),
                        Style::default().fg(self.theme.help_fg),
                    ),
                    Span::styled(
                        entry.description,
                        Style::default().fg(self.theme.preview_fg),
                    ),
                ]));
            }
        }
        lines
    }

    /// Rows the pane needs, bottom border included.
    pub fn height() -> u16 {
        let content: usize = CATEGORIES.iter().map(|c| c.entries.len() + 1).sum();
        content as u16 + 1
    }
}

impl<'a> Widget for HelpPane<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(self.theme.preview_border_fg));
        let inner = block.inner(area);
        block.render(area, buf);

        for (i, line) in self
            .build_content_lines()
            .iter()
            .take(inner.height as usize)
            .enumerate()
        {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}
