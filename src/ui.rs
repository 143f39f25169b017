use ratatui::{
    layout::{Constraint, Layout, Rect},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::components::help::HelpPane;
use crate::components::preview::PreviewWidget;
use crate::components::status_bar::{Heading, StatusBarWidget, HEADING_HEIGHT};
use crate::components::tree::TreeWidget;
use crate::preview::Dimensions;
use crate::theme::{self, ThemeColors};
use crate::viewport::tree_lines;

const MIN_WIDTH: u16 = 10;
const MIN_HEIGHT: u16 = 10;
const TOO_SMALL: &str = "too small =(";

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        frame.render_widget(Paragraph::new(TOO_SMALL), area);
        return;
    }

    let theme = theme::dark_theme();
    let [heading_area, body] =
        Layout::vertical([Constraint::Length(HEADING_HEIGHT), Constraint::Min(0)]).areas(area);
    let [tree_area, side_area] =
        Layout::horizontal([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).areas(body);

    let heading = Heading::from_app(app);
    frame.render_widget(StatusBarWidget::new(&heading, &theme), heading_area);

    render_tree(app, frame, tree_area, &theme);
    render_side(app, frame, side_area, &theme);
}

fn render_tree(app: &mut App, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
    let (lines, selected) = tree_lines(&app.tree);
    let window = app
        .viewport
        .window(lines.len(), selected, area.height as usize);
    frame.render_widget(TreeWidget::new(&lines[window], theme), area);
}

/// Help pane on top when toggled, preview of the selection below it.
fn render_side(app: &mut App, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
    let preview_area = if app.show_help {
        let help_height = HelpPane::height().min(area.height);
        let [help_area, rest] =
            Layout::vertical([Constraint::Length(help_height), Constraint::Min(0)]).areas(area);
        frame.render_widget(HelpPane::new(theme), help_area);
        rest
    } else {
        area
    };

    if preview_area.height == 0 {
        return;
    }
    let Some(path) = app.tree.selected_node().map(|n| n.path.clone()) else {
        return;
    };
    let Some(pipeline) = app.preview.as_mut() else {
        return;
    };

    let inner = PreviewWidget::inner(preview_area);
    let dim = Dimensions {
        width: inner.width as usize,
        height: inner.height as usize,
    };
    let view = pipeline.request(&path, dim);
    frame.render_widget(PreviewWidget::new(view, theme), preview_area);
}
