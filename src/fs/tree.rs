use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::fs::node::{Node, NodeArena, NodeId, NodeMeta};
use crate::fs::operations;
use crate::fs::watcher::{ChangeSignal, DirWatch};

/// How marked entries are transferred into a destination directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Copy,
    Move,
}

/// Directories before files, then case-insensitive name.
fn compare_nodes(a: &Node, b: &Node) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

/// Navigable filesystem tree with a cursor and a multi-mark set.
///
/// Nodes live in an arena; `current` and `marked` hold generation-checked
/// ids, so entries discarded by a refresh drop out of the mark set instead
/// of dangling.
pub struct Tree {
    arena: NodeArena,
    root: NodeId,
    current: NodeId,
    marked: Vec<NodeId>,
    /// Hidden-file visibility for newly created directory nodes.
    show_hidden: bool,
    watch: Box<dyn DirWatch>,
}

impl Tree {
    /// Open a tree at `path` and list the root.
    ///
    /// Fails if the root can't be listed or has nothing to show.
    pub fn new(path: &Path, show_hidden: bool, watch: Box<dyn DirWatch>) -> Result<Self> {
        let node = Node::new(path, None, show_hidden)?;
        if !node.is_dir() {
            return Err(AppError::NotADirectory(path.to_path_buf()));
        }

        let mut arena = NodeArena::new();
        let root = arena.insert(node);
        let mut tree = Self {
            arena,
            root,
            current: root,
            marked: Vec::new(),
            show_hidden,
            watch,
        };

        tree.expand(root)?;
        if tree.arena[root].children.is_empty() {
            return Err(AppError::EmptyRoot(path.to_path_buf()));
        }
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Node for a live id. Panics on a stale id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    pub fn current_node(&self) -> &Node {
        &self.arena[self.current]
    }

    pub fn selected_child(&self) -> Option<NodeId> {
        self.current_node().selected_child()
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected_child().map(|id| &self.arena[id])
    }

    // ── Expansion ────────────────────────────────────────────────────────────

    /// List a directory's entries and show them.
    ///
    /// Children kept from an earlier expansion are reused by name, together
    /// with their own selection and expansion; expanded descendants are
    /// re-listed and re-subscribed. No-op if already expanded.
    pub fn expand(&mut self, id: NodeId) -> Result<()> {
        let node = &self.arena[id];
        if !node.is_dir() {
            return Err(AppError::NotADirectory(node.path.clone()));
        }
        if node.expanded {
            return Ok(());
        }

        self.load_children(id)?;
        self.arena[id].expanded = true;
        self.subscribe(id);
        self.restore_expanded_descendants(id);
        Ok(())
    }

    /// Hide a directory's children and release its subscription along with
    /// those of every expanded descendant.
    ///
    /// The current directory and its ancestors can't be collapsed.
    pub fn collapse(&mut self, id: NodeId) {
        if !self.arena[id].expanded || self.is_ancestor_or_self(id, self.current) {
            return;
        }
        self.arena[id].expanded = false;

        let mut stack = vec![id];
        while let Some(dir) = stack.pop() {
            let node = &self.arena[dir];
            if dir == id || node.expanded {
                self.watch.unwatch(&node.path);
                stack.extend(node.children.iter().copied());
            }
        }
        tracing::debug!(dir = %self.arena[id].path.display(), "collapsed");
    }

    /// Re-list an expanded directory in place.
    pub fn refresh(&mut self, id: NodeId) -> Result<()> {
        if !self.arena[id].expanded {
            return Ok(());
        }
        self.load_children(id)
    }

    /// Re-list the expanded directory at `dir`, if it is in view.
    pub fn refresh_dir(&mut self, dir: &Path) -> Result<()> {
        match self.locate(dir) {
            Some(id) => self.refresh(id),
            None => Ok(()),
        }
    }

    /// Apply a change signal.
    ///
    /// The changed path is dropped from the mark set and its parent
    /// directory is re-listed if it is expanded. Signals about directories
    /// that are not in view are ignored.
    pub fn apply_change(&mut self, signal: &ChangeSignal) -> Result<()> {
        if !signal.is_structural() {
            return Ok(());
        }
        self.unmark_path(&signal.path);
        match signal.path.parent() {
            Some(parent) => self.refresh_dir(parent),
            None => Ok(()),
        }
    }

    /// Walk from the root through expanded directories whose path prefixes
    /// `dir` until reaching `dir` itself.
    fn locate(&self, dir: &Path) -> Option<NodeId> {
        let mut cur = self.root;
        loop {
            let node = &self.arena[cur];
            if node.path == dir {
                return Some(cur);
            }
            if !node.expanded {
                return None;
            }
            cur = node.children.iter().copied().find(|&child| {
                let child = &self.arena[child];
                child.is_dir() && dir.starts_with(&child.path)
            })?;
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.arena[id].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Read the directory listing and rebuild `children`, reusing same-named
    /// nodes. Leaves the tree untouched if the directory can't be read.
    fn load_children(&mut self, id: NodeId) -> Result<()> {
        let (path, show_hidden) = {
            let node = &self.arena[id];
            (node.path.clone(), node.show_hidden)
        };

        let mut listed = Vec::new();
        for entry in fs::read_dir(&path)? {
            // Entries can vanish between readdir and stat while things change.
            let Ok(entry) = entry else { continue };
            let name = entry.file_name().to_string_lossy().to_string();
            if !show_hidden && name.starts_with('.') {
                continue;
            }
            if let Ok(meta) = NodeMeta::read(&entry.path()) {
                listed.push((entry.path(), name, meta));
            }
        }

        let old = std::mem::take(&mut self.arena[id].children);
        let previously_selected = old.get(self.arena[id].selected).copied();
        let mut reusable: HashMap<String, NodeId> = old
            .iter()
            .map(|&child| (self.arena[child].name.clone(), child))
            .collect();

        let mut children = Vec::with_capacity(listed.len());
        for (child_path, name, meta) in listed {
            match reusable.remove(&name) {
                Some(existing) if self.arena[existing].meta.kind == meta.kind => {
                    self.arena[existing].meta = meta;
                    children.push(existing);
                }
                stale => {
                    if let Some(stale) = stale {
                        self.discard(stale);
                    }
                    let child = Node::with_meta(&child_path, meta, Some(id), self.show_hidden);
                    children.push(self.arena.insert(child));
                }
            }
        }
        for (_, stale) in reusable {
            self.discard(stale);
        }

        children.sort_by(|&a, &b| compare_nodes(&self.arena[a], &self.arena[b]));

        let node = &mut self.arena[id];
        node.children = children;
        if let Some(pos) = previously_selected.and_then(|s| node.children.iter().position(|&c| c == s)) {
            node.selected = pos;
        }
        node.clamp_selection();

        if !self.arena.contains(self.current) {
            self.current = id;
        }
        self.marked.retain(|&m| self.arena.contains(m));

        tracing::debug!(dir = %path.display(), entries = self.arena[id].children.len(), "listed");
        Ok(())
    }

    /// Re-list and re-subscribe descendants that were expanded before their
    /// ancestor was collapsed. Ones that can no longer be read fold up.
    fn restore_expanded_descendants(&mut self, id: NodeId) {
        let mut stack: Vec<NodeId> = self.arena[id].children.clone();
        while let Some(child) = stack.pop() {
            if !self.arena[child].expanded {
                continue;
            }
            match self.load_children(child) {
                Ok(()) => {
                    self.subscribe(child);
                    stack.extend(self.arena[child].children.iter().copied());
                }
                Err(e) => {
                    tracing::debug!(dir = %self.arena[child].path.display(), "re-expand failed: {}", e);
                    self.arena[child].expanded = false;
                }
            }
        }
    }

    /// Remove a subtree from the arena, releasing subscriptions of expanded
    /// directories inside it.
    fn discard(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(dir) = stack.pop() {
            if let Some(node) = self.arena.remove(dir) {
                if node.expanded {
                    self.watch.unwatch(&node.path);
                }
                stack.extend(node.children);
            }
        }
    }

    fn subscribe(&mut self, id: NodeId) {
        let path = &self.arena[id].path;
        if let Err(e) = self.watch.watch(path) {
            tracing::warn!(dir = %path.display(), "can't watch directory: {}", e);
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────────

    pub fn select_next(&mut self) {
        let node = &mut self.arena[self.current];
        if node.selected + 1 < node.children.len() {
            node.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        let node = &mut self.arena[self.current];
        node.selected = node.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.arena[self.current].selected = 0;
    }

    pub fn select_last(&mut self) {
        let node = &mut self.arena[self.current];
        node.selected = node.children.len().saturating_sub(1);
    }

    /// Make the selected directory the current one, expanding it if needed.
    pub fn enter_selected(&mut self) -> Result<()> {
        let Some(selected) = self.selected_child() else {
            return Ok(());
        };
        self.expand(selected)?;
        self.current = selected;
        Ok(())
    }

    /// Move the cursor to the parent directory, selecting the one we left.
    pub fn leave(&mut self) {
        let Some(parent) = self.current_node().parent else {
            return;
        };
        let left = self.current;
        let parent_node = &mut self.arena[parent];
        if let Some(pos) = parent_node.children.iter().position(|&c| c == left) {
            parent_node.selected = pos;
        }
        self.current = parent;
    }

    /// Expand or collapse the selected directory.
    pub fn toggle_selected(&mut self) -> Result<()> {
        let Some(selected) = self.selected_child() else {
            return Ok(());
        };
        if self.arena[selected].expanded {
            self.collapse(selected);
            Ok(())
        } else {
            self.expand(selected)
        }
    }

    /// Flip dot-file visibility for the current directory only and re-list it.
    pub fn toggle_hidden_current(&mut self) -> Result<()> {
        let current = self.current;
        self.arena[current].show_hidden = !self.arena[current].show_hidden;
        if let Err(e) = self.load_children(current) {
            let node = &mut self.arena[current];
            node.show_hidden = !node.show_hidden;
            return Err(e);
        }
        Ok(())
    }

    // ── Marks ────────────────────────────────────────────────────────────────

    /// Add the selected entry to the mark set. Returns false if nothing is selected.
    pub fn mark_selected(&mut self) -> bool {
        let Some(selected) = self.selected_child() else {
            return false;
        };
        if !self.marked.contains(&selected) {
            self.marked.push(selected);
        }
        true
    }

    /// Mark or unmark the selected entry. Returns false if nothing is selected.
    pub fn toggle_mark_selected(&mut self) -> bool {
        let Some(selected) = self.selected_child() else {
            return false;
        };
        if let Some(pos) = self.marked.iter().position(|&m| m == selected) {
            self.marked.remove(pos);
        } else {
            self.marked.push(selected);
        }
        true
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear();
    }

    pub fn unmark_path(&mut self, path: &Path) {
        let arena = &self.arena;
        self.marked
            .retain(|&m| arena.get(m).is_some_and(|node| node.path != path));
    }

    pub fn is_marked(&self, id: NodeId) -> bool {
        self.marked.contains(&id)
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Marked paths in marking order.
    pub fn marked_paths(&self) -> Vec<PathBuf> {
        self.marked
            .iter()
            .filter_map(|&m| self.arena.get(m))
            .map(|node| node.path.clone())
            .collect()
    }

    /// Directories holding marked entries.
    pub fn marked_parent_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .marked_paths()
            .iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }

    // ── Mutations ────────────────────────────────────────────────────────────
    //
    // Each runs over the whole mark set, stops at the first failure without
    // rolling back, and clears the marks either way. None of them re-list
    // directories; that is left to `refresh_dir` or the change signals.

    pub fn copy_marked_into(&mut self, dest: NodeId) -> Result<()> {
        self.transfer_marked(dest, Transfer::Copy)
    }

    pub fn move_marked_into(&mut self, dest: NodeId) -> Result<()> {
        self.transfer_marked(dest, Transfer::Move)
    }

    fn transfer_marked(&mut self, dest: NodeId, transfer: Transfer) -> Result<()> {
        let sources = self.marked_paths();
        self.marked.clear();

        let dest_node = &self.arena[dest];
        if !dest_node.is_dir() {
            return Err(AppError::NotADirectory(dest_node.path.clone()));
        }
        let dest_dir = dest_node.path.clone();

        for src in &sources {
            operations::ensure_not_into_itself(src, &dest_dir)?;
            let name = src
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| AppError::InvalidPath(src.display().to_string()))?;
            let target = dest_dir.join(operations::unique_name(&name, &dest_dir)?);
            match transfer {
                Transfer::Copy => operations::copy_recursive(src, &target)?,
                Transfer::Move => operations::move_no_clobber(src, &target)?,
            }
            tracing::info!(from = %src.display(), to = %target.display(), ?transfer, "transferred");
        }
        Ok(())
    }

    pub fn delete_marked(&mut self) -> Result<()> {
        let targets = self.marked_paths();
        self.marked.clear();
        for target in &targets {
            operations::delete(target)?;
            tracing::info!(path = %target.display(), "deleted");
        }
        Ok(())
    }

    /// Rename the single marked entry within its directory.
    pub fn rename_marked(&mut self, new_name: &str) -> Result<()> {
        let sources = self.marked_paths();
        self.marked.clear();

        if sources.len() != 1 {
            return Err(AppError::SingleMarkRequired(sources.len()));
        }
        operations::validate_name(new_name)?;

        let src = &sources[0];
        let parent = src
            .parent()
            .ok_or_else(|| AppError::InvalidPath(src.display().to_string()))?;
        let dest = parent.join(new_name);
        if fs::symlink_metadata(&dest).is_ok() {
            return Err(AppError::Conflict(dest));
        }
        // The destination can still appear after the check; the move itself refuses to clobber.
        operations::move_no_clobber(src, &dest)?;
        tracing::info!(from = %src.display(), to = %dest.display(), "renamed");
        Ok(())
    }

    pub fn create_file_in(&mut self, dir: NodeId, name: &str) -> Result<PathBuf> {
        operations::validate_name(name)?;
        let path = self.arena[dir].path.join(name);
        operations::create_file(&path)?;
        tracing::info!(path = %path.display(), "created file");
        Ok(path)
    }

    pub fn create_dir_in(&mut self, dir: NodeId, name: &str) -> Result<PathBuf> {
        operations::validate_name(name)?;
        let path = self.arena[dir].path.join(name);
        operations::create_dir(&path)?;
        tracing::info!(path = %path.display(), "created directory");
        Ok(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fs::watcher::{ChangeKind, NoWatch};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::fs::File;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Records the set of subscribed directories.
    #[derive(Default, Clone)]
    pub(crate) struct RecordingWatch {
        pub watched: Rc<RefCell<HashSet<PathBuf>>>,
    }

    impl DirWatch for RecordingWatch {
        fn watch(&mut self, dir: &Path) -> Result<()> {
            self.watched.borrow_mut().insert(dir.to_path_buf());
            Ok(())
        }

        fn unwatch(&mut self, dir: &Path) {
            self.watched.borrow_mut().remove(dir);
        }
    }

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("Beta")).unwrap();
        File::create(dir.path().join("file_a.txt")).unwrap();
        File::create(dir.path().join("File_b.rs")).unwrap();
        File::create(dir.path().join(".hidden")).unwrap();
        fs::create_dir(dir.path().join("alpha").join("nested")).unwrap();
        File::create(dir.path().join("alpha").join("inner.txt")).unwrap();
        File::create(dir.path().join("alpha").join("nested").join("deep.txt")).unwrap();
        dir
    }

    fn open(path: &Path) -> Tree {
        Tree::new(path, false, Box::new(NoWatch)).unwrap()
    }

    fn names(tree: &Tree, id: NodeId) -> Vec<String> {
        tree.node(id)
            .children
            .iter()
            .map(|&c| tree.node(c).name.clone())
            .collect()
    }

    fn child_named(tree: &Tree, id: NodeId, name: &str) -> NodeId {
        tree.node(id)
            .children
            .iter()
            .copied()
            .find(|&c| tree.node(c).name == name)
            .unwrap()
    }

    fn select_named(tree: &mut Tree, name: &str) {
        tree.select_first();
        while tree.selected_node().unwrap().name != name {
            tree.select_next();
        }
    }

    #[test]
    fn new_sorts_dirs_first_case_insensitive() {
        let dir = setup_test_dir();
        let tree = open(dir.path());
        assert_eq!(
            names(&tree, tree.root()),
            vec!["alpha", "Beta", "file_a.txt", "File_b.rs"]
        );
        assert_eq!(tree.current_node().selected, 0);
        assert_eq!(tree.current(), tree.root());
    }

    #[test]
    fn new_on_empty_root_fails() {
        let dir = TempDir::new().unwrap();
        let err = Tree::new(dir.path(), false, Box::new(NoWatch)).err().unwrap();
        assert!(matches!(err, AppError::EmptyRoot(_)));
    }

    #[test]
    fn new_on_only_hidden_entries_fails() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join(".only")).unwrap();
        assert!(Tree::new(dir.path(), false, Box::new(NoWatch)).is_err());
        assert!(Tree::new(dir.path(), true, Box::new(NoWatch)).is_ok());
    }

    #[test]
    fn new_on_file_fails() {
        let dir = setup_test_dir();
        let err = Tree::new(&dir.path().join("file_a.txt"), false, Box::new(NoWatch))
            .err()
            .unwrap();
        assert!(matches!(err, AppError::NotADirectory(_)));
    }

    #[test]
    fn new_on_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        let err = Tree::new(&dir.path().join("missing"), false, Box::new(NoWatch))
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn select_next_and_previous_scenario() {
        let dir = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let mut tree = open(dir.path());
        assert_eq!(names(&tree, tree.root()), vec!["a.txt", "b.txt", "c.txt"]);

        tree.select_next();
        tree.select_next();
        assert_eq!(tree.selected_node().unwrap().name, "c.txt");
        tree.select_previous();
        assert_eq!(tree.selected_node().unwrap().name, "b.txt");
    }

    #[test]
    fn selection_does_not_wrap() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        tree.select_previous();
        assert_eq!(tree.current_node().selected, 0);
        tree.select_last();
        let last = tree.current_node().selected;
        assert_eq!(last, 3);
        tree.select_next();
        assert_eq!(tree.current_node().selected, last);
    }

    #[test]
    fn enter_and_leave() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "alpha");
        tree.enter_selected().unwrap();
        assert_eq!(tree.current_node().name, "alpha");
        assert_eq!(names(&tree, tree.current()), vec!["nested", "inner.txt"]);

        tree.select_next();
        tree.leave();
        assert_eq!(tree.current(), tree.root());
        assert_eq!(tree.selected_node().unwrap().name, "alpha");

        // Entering again keeps alpha's own selection.
        tree.enter_selected().unwrap();
        assert_eq!(tree.selected_node().unwrap().name, "inner.txt");
    }

    #[test]
    fn enter_file_is_not_a_directory() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "file_a.txt");
        assert!(matches!(
            tree.enter_selected(),
            Err(AppError::NotADirectory(_))
        ));
        assert_eq!(tree.current(), tree.root());
    }

    #[test]
    fn leave_at_root_is_noop() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        tree.leave();
        assert_eq!(tree.current(), tree.root());
    }

    #[test]
    fn collapse_then_expand_preserves_children_and_substate() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        let alpha = child_named(&tree, tree.root(), "alpha");
        tree.expand(alpha).unwrap();
        let nested = child_named(&tree, alpha, "nested");
        tree.expand(nested).unwrap();
        tree.arena[alpha].selected = 1;

        let before = tree.node(alpha).children.clone();
        tree.collapse(alpha);
        assert!(!tree.node(alpha).expanded);
        tree.expand(alpha).unwrap();

        assert_eq!(tree.node(alpha).children, before);
        assert_eq!(tree.node(alpha).selected, 1);
        assert!(tree.node(nested).expanded);
        assert_eq!(names(&tree, nested), vec!["deep.txt"]);
    }

    #[test]
    fn expand_and_collapse_manage_subscriptions() {
        let dir = setup_test_dir();
        let watch = RecordingWatch::default();
        let watched = watch.watched.clone();
        let mut tree = Tree::new(dir.path(), false, Box::new(watch)).unwrap();
        assert!(watched.borrow().contains(dir.path()));

        let alpha = child_named(&tree, tree.root(), "alpha");
        tree.expand(alpha).unwrap();
        let nested = child_named(&tree, alpha, "nested");
        tree.expand(nested).unwrap();
        assert_eq!(watched.borrow().len(), 3);

        tree.collapse(alpha);
        assert!(!watched.borrow().contains(&dir.path().join("alpha")));
        assert!(!watched
            .borrow()
            .contains(&dir.path().join("alpha").join("nested")));

        tree.expand(alpha).unwrap();
        assert!(watched
            .borrow()
            .contains(&dir.path().join("alpha").join("nested")));
        assert_eq!(watched.borrow().len(), 3);
    }

    #[test]
    fn collapse_current_dir_is_refused() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "alpha");
        tree.enter_selected().unwrap();
        let alpha = tree.current();
        tree.collapse(alpha);
        tree.collapse(tree.root());
        assert!(tree.node(alpha).expanded);
        assert!(tree.node(tree.root()).expanded);
    }

    #[test]
    fn toggle_selected_expands_then_collapses() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        let alpha = tree.selected_child().unwrap();
        tree.toggle_selected().unwrap();
        assert!(tree.node(alpha).expanded);
        tree.toggle_selected().unwrap();
        assert!(!tree.node(alpha).expanded);
    }

    #[test]
    fn toggle_hidden_is_per_directory() {
        let dir = setup_test_dir();
        File::create(dir.path().join("alpha").join(".secret")).unwrap();
        let mut tree = open(dir.path());
        tree.toggle_hidden_current().unwrap();
        assert!(names(&tree, tree.root()).contains(&".hidden".to_string()));

        let alpha = child_named(&tree, tree.root(), "alpha");
        tree.expand(alpha).unwrap();
        assert!(!names(&tree, alpha).contains(&".secret".to_string()));

        tree.toggle_hidden_current().unwrap();
        assert!(!names(&tree, tree.root()).contains(&".hidden".to_string()));
    }

    #[test]
    fn mark_and_toggle_mark() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        assert!(tree.toggle_mark_selected());
        assert_eq!(tree.marked_count(), 1);
        tree.select_next();
        assert!(tree.mark_selected());
        assert!(tree.mark_selected());
        assert_eq!(tree.marked_count(), 2);
        assert!(tree.toggle_mark_selected());
        assert_eq!(tree.marked_count(), 1);
        tree.clear_marks();
        assert_eq!(tree.marked_count(), 0);
    }

    #[test]
    fn copy_marked_into_subdirectory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let mut tree = open(dir.path());
        select_named(&mut tree, "b.txt");
        tree.mark_selected();

        select_named(&mut tree, "sub");
        tree.enter_selected().unwrap();
        tree.copy_marked_into(tree.current()).unwrap();
        assert_eq!(tree.marked_count(), 0);

        tree.refresh_dir(&dir.path().join("sub")).unwrap();
        assert_eq!(names(&tree, tree.current()), vec!["b.txt"]);
        assert!(dir.path().join("b.txt").exists());
    }

    #[test]
    fn copy_into_same_directory_uses_conflict_prefix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let mut tree = open(dir.path());
        tree.mark_selected();
        tree.copy_marked_into(tree.root()).unwrap();
        tree.mark_selected();
        tree.copy_marked_into(tree.root()).unwrap();
        tree.refresh(tree.root()).unwrap();
        assert_eq!(
            names(&tree, tree.root()),
            vec!["a.txt", "copy_a.txt", "copy_copy_a.txt"]
        );
    }

    #[test]
    fn move_marked_into_subdirectory() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "file_a.txt");
        tree.mark_selected();
        select_named(&mut tree, "Beta");
        tree.enter_selected().unwrap();
        tree.move_marked_into(tree.current()).unwrap();

        assert!(!dir.path().join("file_a.txt").exists());
        assert!(dir.path().join("Beta").join("file_a.txt").exists());
        tree.refresh_dir(dir.path()).unwrap();
        assert!(!names(&tree, tree.root()).contains(&"file_a.txt".to_string()));
    }

    #[test]
    fn move_directory_into_itself_is_refused() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "alpha");
        tree.mark_selected();
        tree.enter_selected().unwrap();
        let err = tree.move_marked_into(tree.current()).unwrap_err();
        assert!(matches!(err, AppError::IntoItself(_)));
        assert_eq!(tree.marked_count(), 0);
        assert!(dir.path().join("alpha").exists());
    }

    #[test]
    fn delete_marked_removes_all() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "alpha");
        tree.mark_selected();
        select_named(&mut tree, "file_a.txt");
        tree.mark_selected();
        tree.delete_marked().unwrap();
        assert!(!dir.path().join("alpha").exists());
        assert!(!dir.path().join("file_a.txt").exists());
        assert_eq!(tree.marked_count(), 0);
    }

    #[test]
    fn delete_marked_stops_at_first_failure() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "file_a.txt");
        tree.mark_selected();
        select_named(&mut tree, "File_b.rs");
        tree.mark_selected();

        fs::remove_file(dir.path().join("file_a.txt")).unwrap();
        assert!(tree.delete_marked().is_err());
        assert!(dir.path().join("File_b.rs").exists());
        assert_eq!(tree.marked_count(), 0);
    }

    #[test]
    fn rename_single_mark() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "file_a.txt");
        tree.mark_selected();
        tree.rename_marked("renamed.txt").unwrap();
        assert!(dir.path().join("renamed.txt").exists());
        assert!(!dir.path().join("file_a.txt").exists());
        assert_eq!(tree.marked_count(), 0);
    }

    #[test]
    fn rename_onto_existing_is_conflict() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "file_a.txt");
        tree.mark_selected();
        let err = tree.rename_marked("File_b.rs").unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(dir.path().join("file_a.txt").exists());
        assert_eq!(tree.marked_count(), 0);
    }

    #[test]
    fn rename_requires_exactly_one_mark() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        assert!(matches!(
            tree.rename_marked("x"),
            Err(AppError::SingleMarkRequired(0))
        ));
        tree.mark_selected();
        tree.select_next();
        tree.mark_selected();
        assert!(matches!(
            tree.rename_marked("x"),
            Err(AppError::SingleMarkRequired(2))
        ));
        assert_eq!(tree.marked_count(), 0);
    }

    #[test]
    fn rename_empty_name_rejected_before_fs() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "file_a.txt");
        tree.mark_selected();
        assert!(matches!(tree.rename_marked(""), Err(AppError::EmptyInput)));
        assert!(dir.path().join("file_a.txt").exists());
    }

    #[test]
    fn create_file_and_dir() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        let root = tree.root();
        tree.create_file_in(root, "new.txt").unwrap();
        tree.create_dir_in(root, "newdir").unwrap();
        assert!(dir.path().join("new.txt").is_file());
        assert!(dir.path().join("newdir").is_dir());

        let err = tree.create_file_in(root, "new.txt").unwrap_err();
        assert!(matches!(err, AppError::Io(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists));
        assert!(matches!(
            tree.create_dir_in(root, "  "),
            Err(AppError::EmptyInput)
        ));
    }

    #[test]
    fn external_delete_of_marked_file_drops_mark_and_child() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "file_a.txt");
        tree.mark_selected();

        let path = dir.path().join("file_a.txt");
        fs::remove_file(&path).unwrap();
        tree.apply_change(&ChangeSignal::new(&path, ChangeKind::Removed))
            .unwrap();

        assert_eq!(tree.marked_count(), 0);
        assert!(!names(&tree, tree.root()).contains(&"file_a.txt".to_string()));
    }

    #[test]
    fn external_create_keeps_selection_on_same_entry() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "file_a.txt");

        let path = dir.path().join("aaa.txt");
        File::create(&path).unwrap();
        tree.apply_change(&ChangeSignal::new(&path, ChangeKind::Created))
            .unwrap();

        assert!(names(&tree, tree.root()).contains(&"aaa.txt".to_string()));
        assert_eq!(tree.selected_node().unwrap().name, "file_a.txt");
    }

    #[test]
    fn change_in_unviewed_subtree_is_dropped() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        let alpha = child_named(&tree, tree.root(), "alpha");
        let path = dir.path().join("alpha").join("late.txt");
        File::create(&path).unwrap();
        tree.apply_change(&ChangeSignal::new(&path, ChangeKind::Created))
            .unwrap();
        assert!(tree.node(alpha).children.is_empty());
    }

    #[test]
    fn modify_signal_leaves_tree_alone() {
        let dir = setup_test_dir();
        let mut tree = open(dir.path());
        select_named(&mut tree, "file_a.txt");
        tree.mark_selected();
        let path = dir.path().join("file_a.txt");
        tree.apply_change(&ChangeSignal::new(&path, ChangeKind::Modified))
            .unwrap();
        assert_eq!(tree.marked_count(), 1);
    }

    #[test]
    fn removing_current_dir_moves_cursor_to_parent() {
        let dir = setup_test_dir();
        let watch = RecordingWatch::default();
        let watched = watch.watched.clone();
        let mut tree = Tree::new(dir.path(), false, Box::new(watch)).unwrap();
        select_named(&mut tree, "alpha");
        tree.enter_selected().unwrap();

        let alpha = dir.path().join("alpha");
        fs::remove_dir_all(&alpha).unwrap();
        tree.apply_change(&ChangeSignal::new(&alpha, ChangeKind::Removed))
            .unwrap();

        assert_eq!(tree.current(), tree.root());
        assert!(!watched.borrow().contains(&alpha));
        assert_eq!(names(&tree, tree.root()), vec!["Beta", "file_a.txt", "File_b.rs"]);
    }
}
