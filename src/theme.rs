//! Theme data model: the built-in palette used by every widget.

use ratatui::style::Color;

// ── Runtime theme colors ─────────────────────────────────────────────────────

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Heading
    pub selected_path_fg: Color,
    pub finfo_permissions_fg: Color,
    pub finfo_fg: Color,
    pub finfo_sep_fg: Color,
    pub operation_bar_fg: Color,
    pub operation_input_bg: Color,
    pub error_fg: Color,
    pub help_fg: Color,

    // Tree panel
    pub tree_file_fg: Color,
    pub tree_dir_fg: Color,
    pub tree_link_fg: Color,
    pub tree_marked_bg: Color,
    pub tree_arrow_fg: Color,
    pub tree_indent_fg: Color,

    // Preview panel
    pub preview_fg: Color,
    pub preview_border_fg: Color,
}

// ── Built-in palette ─────────────────────────────────────────────────────────

/// Muted dark palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        selected_path_fg: Color::Rgb(116, 172, 109),     // #74ac6d
        finfo_permissions_fg: Color::Rgb(172, 164, 109), // #aca46d
        finfo_fg: Color::Rgb(230, 230, 230),             // #e6e6e6
        finfo_sep_fg: Color::Rgb(43, 43, 43),            // #2b2b2b
        operation_bar_fg: Color::Rgb(230, 230, 230),
        operation_input_bg: Color::Rgb(60, 60, 60), // #3c3c3c
        error_fg: Color::Rgb(172, 109, 116),        // #ac6d74
        help_fg: Color::Rgb(172, 164, 109),

        tree_file_fg: Color::Rgb(230, 230, 230),
        tree_dir_fg: Color::Rgb(109, 116, 172),  // #6d74ac
        tree_link_fg: Color::Rgb(109, 172, 164), // #6daca4
        tree_marked_bg: Color::Rgb(54, 54, 54),  // #363636
        tree_arrow_fg: Color::Rgb(172, 164, 109),
        tree_indent_fg: Color::Rgb(54, 54, 54),

        preview_fg: Color::Rgb(168, 168, 168), // #a8a8a8
        preview_border_fg: Color::Rgb(54, 54, 54),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
