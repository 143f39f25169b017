use std::fmt::Display;
use std::io;
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::fs::node::NodeKind;
use crate::fs::tree::Tree;
use crate::fs::watcher::ChangeSignal;
use crate::opener::Launch;
use crate::preview::{Preview, PreviewPipeline};
use crate::viewport::Viewport;

/// Active operation mode. Exactly one at a time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    /// Marked entries wait for `p` to be moved into the current directory.
    Move,
    /// Marked entries wait for `p` to be copied into the current directory.
    Copy,
    DeleteConfirm,
    RenameInput(String),
    CreateFileInput(String),
    CreateDirInput(String),
    /// First `g` of a chord; holds the mode to return to.
    GoPrefix(Box<Mode>),
}

impl Mode {
    /// Label shown in the operation bar.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "",
            Mode::Move => "moving",
            Mode::Copy => "copying",
            Mode::DeleteConfirm => "confirm removing (y/n) of",
            Mode::RenameInput(_) => "renaming",
            Mode::CreateFileInput(_) => "enter new file name:",
            Mode::CreateDirInput(_) => "enter new directory name:",
            Mode::GoPrefix(_) => "g",
        }
    }

    /// Text buffer of an input mode.
    pub fn input(&self) -> Option<&str> {
        match self {
            Mode::RenameInput(buf) | Mode::CreateFileInput(buf) | Mode::CreateDirInput(buf) => {
                Some(buf)
            }
            _ => None,
        }
    }

    /// Whether the mode operates on the mark set.
    pub fn uses_marks(&self) -> bool {
        match self {
            Mode::Move | Mode::Copy | Mode::DeleteConfirm | Mode::RenameInput(_) => true,
            Mode::GoPrefix(previous) => previous.uses_marks(),
            _ => false,
        }
    }

    pub fn input_mut(&mut self) -> Option<&mut String> {
        match self {
            Mode::RenameInput(buf) | Mode::CreateFileInput(buf) | Mode::CreateDirInput(buf) => {
                Some(buf)
            }
            _ => None,
        }
    }
}

/// External program command lines, captured from config at start-up.
#[derive(Debug, Clone)]
pub struct Launchers {
    pub editor: String,
    pub opener: String,
}

/// Main application state.
pub struct App {
    pub tree: Tree,
    pub mode: Mode,
    /// Single overwritable user-visible error.
    pub error: Option<String>,
    pub show_help: bool,
    pub should_quit: bool,
    pub viewport: Viewport,
    /// `None` when previews are disabled.
    pub preview: Option<PreviewPipeline>,
    /// Program the main loop should run with the terminal suspended.
    pub pending_launch: Option<Launch>,
    launchers: Launchers,
}

impl App {
    pub fn new(
        tree: Tree,
        preview: Option<PreviewPipeline>,
        padding: usize,
        launchers: Launchers,
    ) -> Self {
        Self {
            tree,
            mode: Mode::Idle,
            error: None,
            show_help: false,
            should_quit: false,
            viewport: Viewport::new(padding),
            preview,
            pending_launch: None,
            launchers,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Show an error in the error bar, replacing the previous one.
    pub fn set_error(&mut self, err: impl Display) {
        let message = err.to_string();
        tracing::warn!("{}", message);
        self.error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            self.set_error(e);
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ── Navigation ───────────────────────────────────────────────────────────

    /// Enter the selected directory. Files are ignored.
    pub fn enter_selected(&mut self) {
        match self.tree.enter_selected() {
            Ok(()) | Err(AppError::NotADirectory(_)) => {}
            Err(e) => self.set_error(e),
        }
    }

    /// Open a selected file with the opener, or expand/collapse a directory.
    pub fn open_or_toggle_selected(&mut self) {
        let Some(node) = self.tree.selected_node() else {
            return;
        };
        if node.meta.kind == NodeKind::File {
            let path = node.path.clone();
            self.request_launch(&self.launchers.opener.clone(), path);
        } else {
            let result = self.tree.toggle_selected();
            self.report(result);
        }
    }

    /// Open the selected regular file in the editor.
    pub fn edit_selected(&mut self) {
        let Some(node) = self.tree.selected_node() else {
            return;
        };
        if node.meta.kind == NodeKind::File {
            let path = node.path.clone();
            self.request_launch(&self.launchers.editor.clone(), path);
        }
    }

    fn request_launch(&mut self, command_line: &str, path: PathBuf) {
        match Launch::new(command_line, &path) {
            Some(launch) => self.pending_launch = Some(launch),
            None => self.set_error(AppError::InvalidPath(format!(
                "no command configured to open {}",
                path.display()
            ))),
        }
    }

    pub fn toggle_hidden(&mut self) {
        let result = self.tree.toggle_hidden_current();
        self.report(result);
    }

    // ── Modes ────────────────────────────────────────────────────────────────

    /// Enter a mode that works on the mark set, marking the selection if
    /// nothing is marked yet. Stays idle in an empty directory.
    fn start_marked_mode(&mut self, mode: Mode) {
        if self.tree.marked_count() > 0 || self.tree.mark_selected() {
            self.mode = mode;
        }
    }

    pub fn start_move(&mut self) {
        self.start_marked_mode(Mode::Move);
    }

    pub fn start_copy(&mut self) {
        self.start_marked_mode(Mode::Copy);
    }

    pub fn start_delete(&mut self) {
        self.start_marked_mode(Mode::DeleteConfirm);
    }

    /// Mark the selection and edit its name, provided it would be the only
    /// mark. A refused rename leaves the mark set as it was.
    pub fn start_rename(&mut self) {
        let Some(selected) = self.tree.selected_child() else {
            return;
        };
        let marked = self.tree.marked_count() + usize::from(!self.tree.is_marked(selected));
        if marked != 1 {
            self.set_error(AppError::SingleMarkRequired(marked));
            return;
        }
        self.tree.mark_selected();
        let name = self.tree.node(selected).name.clone();
        self.mode = Mode::RenameInput(name);
    }

    pub fn start_create_file(&mut self) {
        self.tree.clear_marks();
        self.mode = Mode::CreateFileInput(String::new());
    }

    pub fn start_create_dir(&mut self) {
        self.tree.clear_marks();
        self.mode = Mode::CreateDirInput(String::new());
    }

    /// Esc: drop marks, the pending operation and the error.
    pub fn cancel(&mut self) {
        self.tree.clear_marks();
        self.mode = Mode::Idle;
        self.clear_error();
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    pub fn paste_move(&mut self) {
        let dest = self.tree.current();
        self.mutate(|tree| tree.move_marked_into(dest), true);
    }

    pub fn paste_copy(&mut self) {
        let dest = self.tree.current();
        self.mutate(|tree| tree.copy_marked_into(dest), true);
    }

    pub fn delete_marked(&mut self) {
        self.mutate(Tree::delete_marked, false);
    }

    pub fn rename_marked(&mut self, new_name: &str) {
        self.mutate(|tree| tree.rename_marked(new_name), false);
    }

    pub fn create_file(&mut self, name: &str) {
        let dir = self.tree.current();
        self.mutate(|tree| tree.create_file_in(dir, name).map(drop), true);
    }

    pub fn create_dir(&mut self, name: &str) {
        let dir = self.tree.current();
        self.mutate(|tree| tree.create_dir_in(dir, name).map(drop), true);
    }

    /// Run a tree mutation, then re-list the directories it touched: those
    /// holding marked entries and, if `into_current`, the current one.
    fn mutate(&mut self, op: impl FnOnce(&mut Tree) -> Result<()>, into_current: bool) {
        let mut dirs = self.tree.marked_parent_dirs();
        if into_current {
            dirs.push(self.tree.current_node().path.clone());
        }

        let result = op(&mut self.tree);
        self.mode = Mode::Idle;

        for dir in &dirs {
            if let Some(preview) = self.preview.as_mut() {
                preview.evict(dir);
            }
            match self.tree.refresh_dir(dir) {
                Ok(()) => {}
                Err(AppError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(dir = %dir.display(), "refresh failed: {}", e),
            }
        }
        self.report(result);
    }

    // ── Background events ────────────────────────────────────────────────────

    /// Apply a change signal from the watch bridge.
    pub fn handle_fs_change(&mut self, signal: ChangeSignal) {
        tracing::debug!(path = %signal.path.display(), kind = ?signal.kind, "change signal");

        if let Some(preview) = self.preview.as_mut() {
            preview.evict(&signal.path);
            if signal.is_structural() {
                if let Some(parent) = signal.path.parent() {
                    preview.evict(parent);
                }
            }
        }

        match self.tree.apply_change(&signal) {
            Ok(()) => {}
            // The directory went away before we got to it; its own removal signal follows.
            Err(AppError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %signal.path.display(), "parent vanished");
            }
            Err(e) => self.set_error(e),
        }

        if self.mode.uses_marks() && self.tree.marked_count() == 0 {
            tracing::debug!(mode = ?self.mode, "marked entries gone, back to idle");
            self.mode = Mode::Idle;
        }
    }

    pub fn handle_preview_ready(&mut self, preview: Preview) {
        if let Some(pipeline) = self.preview.as_mut() {
            pipeline.complete(preview);
        }
    }
}
