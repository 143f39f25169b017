use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::fs::node::{NodeKind, NodeMeta};
use crate::theme::ThemeColors;

const HELP_HINT: &str = "Press ? to toggle help";
const SIZE_UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Rows taken by the heading.
pub const HEADING_HEIGHT: u16 = 4;

/// Human-readable size in binary units.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit > 1 {
        format!("{:.2} {}", size, SIZE_UNITS[unit])
    } else {
        format!("{:.0} {}", size, SIZE_UNITS[unit])
    }
}

/// `ls`-style permission string with a leading type character.
pub fn format_permissions(kind: NodeKind, mode: u32) -> String {
    let mut s = String::with_capacity(10);
    s.push(match kind {
        NodeKind::Directory => 'd',
        NodeKind::Symlink => 'L',
        NodeKind::File => '-',
        NodeKind::Other => '?',
    });
    let flags = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    for (bit, ch) in flags {
        s.push(if mode & bit != 0 { ch } else { '-' });
    }
    s
}

pub fn format_mtime(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => DateTime::<Local>::from(time)
            .format("%d %b %y %H:%M")
            .to_string(),
        None => "--".to_string(),
    }
}

/// Path relative to the root, or the path itself if it lies outside.
pub fn relative_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}

/// Pre-formatted heading text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub path: String,
    pub permissions: String,
    pub modified: String,
    pub size: String,
    pub operation: String,
    pub input: Option<String>,
    pub error: String,
}

impl Heading {
    pub fn from_app(app: &App) -> Self {
        let tree = &app.tree;
        let root = &tree.node(tree.root()).path;

        let (path, meta) = match tree.selected_node() {
            Some(node) => (relative_path(root, &node.path), Some(&node.meta)),
            // Empty directory
            None => (format!("{}/...", tree.current_node().path.display()), None),
        };
        let (permissions, modified, size) = match meta {
            Some(NodeMeta {
                kind,
                size,
                modified,
                mode,
            }) => (
                format_permissions(*kind, *mode),
                format_mtime(*modified),
                format_size(*size),
            ),
            None => ("--".to_string(), "--".to_string(), format_size(0)),
        };

        let mut operation = format!(": {}", app.mode.label());
        let marked: Vec<String> = tree
            .marked_paths()
            .iter()
            .map(|p| relative_path(root, p))
            .collect();
        if !marked.is_empty() {
            operation.push_str(&format!(" [{}]", marked.join(", ")));
        }

        Self {
            path: format!("> {path}"),
            permissions,
            modified,
            size,
            operation,
            input: app.mode.input().map(str::to_string),
            error: app.error.clone().unwrap_or_default(),
        }
    }
}

/// Heading widget: selected path, file info, operation bar and error bar.
pub struct StatusBarWidget<'a> {
    heading: &'a Heading,
    theme: &'a ThemeColors,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(heading: &'a Heading, theme: &'a ThemeColors) -> Self {
        Self { heading, theme }
    }

    fn lines(&self, width: usize) -> [Line<'static>; 4] {
        let h = self.heading;
        let gap = width.saturating_sub(h.path.width() + HELP_HINT.width());
        let path_line = Line::from(vec![
            Span::styled(h.path.clone(), Style::default().fg(self.theme.selected_path_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(HELP_HINT, Style::default().fg(self.theme.help_fg)),
        ]);

        let sep = || Span::styled(" │ ", Style::default().fg(self.theme.finfo_sep_fg));
        let finfo = Line::from(vec![
            Span::styled(
                h.permissions.clone(),
                Style::default().fg(self.theme.finfo_permissions_fg),
            ),
            sep(),
            Span::styled(h.modified.clone(), Style::default().fg(self.theme.finfo_fg)),
            sep(),
            Span::styled(h.size.clone(), Style::default().fg(self.theme.finfo_fg)),
        ]);

        let mut op_spans = vec![Span::styled(
            h.operation.clone(),
            Style::default().fg(self.theme.operation_bar_fg),
        )];
        if let Some(input) = &h.input {
            op_spans.push(Span::raw(" │ "));
            op_spans.push(Span::styled(
                input.clone(),
                Style::default().bg(self.theme.operation_input_bg),
            ));
            op_spans.push(Span::raw(" │"));
        }

        let error = Line::from(Span::styled(
            h.error.clone(),
            Style::default().fg(self.theme.error_fg),
        ));

        [path_line, finfo, Line::from(op_spans), error]
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        for (i, line) in self
            .lines(area.width as usize)
            .iter()
            .take(area.height as usize)
            .enumerate()
        {
            buf.set_line(area.x, area.y + i as u16, line, area.width);
        }
    }
}
