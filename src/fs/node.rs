use std::fs;
use std::ops::{Index, IndexMut};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::Result;

/// Type of filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    Symlink,
    /// Sockets, fifos, devices.
    Other,
}

/// Metadata captured when the node was listed.
#[derive(Debug, Clone)]
pub struct NodeMeta {
    pub kind: NodeKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Unix mode bits (0 where unsupported).
    pub mode: u32,
}

impl NodeMeta {
    /// Read metadata without following symlinks.
    pub fn read(path: &Path) -> Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            NodeKind::Symlink
        } else if file_type.is_dir() {
            NodeKind::Directory
        } else if file_type.is_file() {
            NodeKind::File
        } else {
            NodeKind::Other
        };

        Ok(Self {
            kind,
            size: metadata.len(),
            modified: metadata.modified().ok(),
            mode: mode_bits(&metadata),
        })
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

#[cfg(unix)]
fn mode_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_bits(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// Generation-checked handle into a [`NodeArena`].
///
/// A removed node's slot gets a new generation, so stale ids held in the
/// mark set or as `current` stop resolving instead of aliasing a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A node in the filesystem tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub path: PathBuf,
    pub meta: NodeMeta,
    pub parent: Option<NodeId>,
    /// Loaded children in sort order. Kept while collapsed so that a
    /// re-expansion can reuse them.
    pub children: Vec<NodeId>,
    /// Whether children are currently shown (and watched).
    pub expanded: bool,
    /// Index into `children`; clamped after every listing.
    pub selected: usize,
    /// Whether dot-files are listed in this directory.
    pub show_hidden: bool,
}

impl Node {
    /// Create a node from a filesystem path.
    pub fn new(path: &Path, parent: Option<NodeId>, show_hidden: bool) -> Result<Self> {
        let meta = NodeMeta::read(path)?;
        Ok(Self::with_meta(path, meta, parent, show_hidden))
    }

    pub fn with_meta(
        path: &Path,
        meta: NodeMeta,
        parent: Option<NodeId>,
        show_hidden: bool,
    ) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self {
            name,
            path: path.to_path_buf(),
            meta,
            parent,
            children: Vec::new(),
            expanded: false,
            selected: 0,
            show_hidden,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.meta.is_dir()
    }

    #[cfg(test)]
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Clamp the selection index to the current children.
    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.children.len().saturating_sub(1));
    }

    /// Currently selected child, if any.
    pub fn selected_child(&self) -> Option<NodeId> {
        self.children.get(self.selected).copied()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Index-addressed node table owning every node of a tree.
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Remove a node and return it. The id (and every copy of it) is invalidated.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node)
    }

    /// Number of live nodes.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    /// Panics on a stale id, like slice indexing out of bounds.
    fn index(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node id {:?}", id),
        }
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale node id {:?}", id),
        }
    }
}
