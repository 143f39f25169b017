use std::ops::Range;

use crate::fs::node::{NodeId, NodeKind};
use crate::fs::tree::Tree;

const INDENT_PARENT: &str = "│  ";
const INDENT_CURRENT: &str = "├─ ";
const INDENT_CURRENT_LAST: &str = "└─ ";
const INDENT_EMPTY: &str = "   ";

/// Name shown on the placeholder line of an expanded empty directory.
pub const EMPTY_DIR_PLACEHOLDER: &str = "...";

/// One row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    /// Box-drawing prefix, empty for the root.
    pub indent: String,
    pub name: String,
    /// `None` for the empty-directory placeholder.
    pub node: Option<NodeId>,
    pub kind: Option<NodeKind>,
    pub marked: bool,
    pub selected: bool,
    /// Directory that currently hides dot-files.
    pub hides_hidden: bool,
}

/// Flatten the tree in depth-first pre-order, entering expanded directories only.
///
/// Returns the lines and the index of the selected one.
pub fn tree_lines(tree: &Tree) -> (Vec<TreeLine>, usize) {
    let selected = tree.selected_child();
    let mut lines = Vec::new();
    let mut selected_line = 0;

    // (node, indent inherited from the parent, last sibling)
    let mut stack: Vec<(NodeId, String, bool)> = vec![(tree.root(), String::new(), false)];

    while let Some((id, parent_indent, is_last)) = stack.pop() {
        let node = tree.node(id);

        let (indent, child_indent) = if id == tree.root() {
            (String::new(), String::new())
        } else if is_last {
            (
                format!("{parent_indent}{INDENT_CURRENT_LAST}"),
                format!("{parent_indent}{INDENT_EMPTY}"),
            )
        } else {
            (
                format!("{parent_indent}{INDENT_CURRENT}"),
                format!("{parent_indent}{INDENT_PARENT}"),
            )
        };

        let is_selected = selected == Some(id);
        if is_selected {
            selected_line = lines.len();
        }
        lines.push(TreeLine {
            indent,
            name: node.name.clone(),
            node: Some(id),
            kind: Some(node.meta.kind),
            marked: tree.is_marked(id),
            selected: is_selected,
            hides_hidden: node.is_dir() && !node.show_hidden,
        });

        if !node.expanded {
            continue;
        }
        if node.children.is_empty() && id == tree.current() {
            selected_line = lines.len();
            lines.push(TreeLine {
                indent: format!("{child_indent}{INDENT_CURRENT_LAST}"),
                name: EMPTY_DIR_PLACEHOLDER.to_string(),
                node: None,
                kind: None,
                marked: false,
                selected: true,
                hides_hidden: false,
            });
        }
        let last = node.children.len().saturating_sub(1);
        for (i, &child) in node.children.iter().enumerate().rev() {
            stack.push((child, child_indent.clone(), i == last));
        }
    }

    (lines, selected_line)
}

/// Sticky scroll window over the flattened tree.
///
/// The offset persists between renders and only moves when the selection
/// comes within `padding` lines of either edge.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    offset: usize,
    padding: usize,
}

impl Viewport {
    pub fn new(padding: usize) -> Self {
        Self { offset: 0, padding }
    }

    #[cfg(test)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Compute the visible range of `total` lines for a window of `height` rows
    /// with the selection at line `selected`.
    pub fn window(&mut self, total: usize, selected: usize, height: usize) -> Range<usize> {
        let max_offset = total.saturating_sub(height);
        let mut offset = self.offset.min(max_offset);

        if selected + 1 + self.padding > height + offset {
            offset = (selected + 1 + self.padding)
                .saturating_sub(height)
                .min(max_offset);
        }
        if selected < self.padding + offset {
            offset = selected.saturating_sub(self.padding);
        }

        self.offset = offset;
        offset..(offset + height).min(total)
    }
}
