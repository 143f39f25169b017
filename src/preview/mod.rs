pub mod image;
pub mod text;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use ratatui::text::Line;
use tokio::sync::mpsc;

use crate::event::Event;

/// Default number of bytes read for a text preview.
pub const DEFAULT_TEXT_BYTES_LIMIT: usize = 10_000;

pub const LOADING_PLACEHOLDER: &str = "Loading..";
/// Shown for fifos, sockets and devices, which are never read.
pub const SPECIAL_FILE_PLACEHOLDER: &str = "<not a regular file>";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Size of the preview area in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

/// Cache key: one rendering of one path at one size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewKey {
    pub path: PathBuf,
    pub dim: Dimensions,
}

/// Finished preview, produced by a worker and consumed on the main loop.
#[derive(Debug, Clone)]
pub struct Preview {
    pub key: PreviewKey,
    /// Launch this result belongs to.
    pub token: u64,
    pub lines: Vec<Line<'static>>,
}

/// What the preview pane should show for a request.
#[derive(Debug, PartialEq)]
pub enum PreviewView<'a> {
    Loading,
    Ready(&'a [Line<'static>]),
}

/// Cached, asynchronous preview generation.
///
/// Misses spawn one worker per key; while a key is in flight further
/// requests for it only return the loading placeholder. Workers deliver
/// results as [`Event::PreviewReady`], and the cache is written only from
/// [`PreviewPipeline::complete`] on the main loop. Each launch carries a
/// token, and only the result of the latest launch of a key is accepted.
pub struct PreviewPipeline {
    cache: HashMap<PreviewKey, Vec<Line<'static>>>,
    pending: HashMap<PreviewKey, u64>,
    next_token: u64,
    event_tx: mpsc::UnboundedSender<Event>,
    text_bytes_limit: usize,
}

impl PreviewPipeline {
    pub fn new(event_tx: mpsc::UnboundedSender<Event>, text_bytes_limit: usize) -> Self {
        Self {
            cache: HashMap::new(),
            pending: HashMap::new(),
            next_token: 0,
            event_tx,
            text_bytes_limit,
        }
    }

    /// Return the cached preview, or start generating it.
    pub fn request(&mut self, path: &Path, dim: Dimensions) -> PreviewView<'_> {
        let key = PreviewKey {
            path: path.to_path_buf(),
            dim,
        };
        if self.cache.contains_key(&key) {
            return PreviewView::Ready(&self.cache[&key]);
        }
        if !self.pending.contains_key(&key) {
            let token = self.next_token;
            self.next_token += 1;
            self.pending.insert(key.clone(), token);
            self.spawn(key, token);
        }
        PreviewView::Loading
    }

    fn spawn(&self, key: PreviewKey, token: u64) {
        tracing::debug!(path = %key.path.display(), w = key.dim.width, h = key.dim.height, "generating preview");
        let tx = self.event_tx.clone();
        let limit = self.text_bytes_limit;
        thread::spawn(move || {
            let lines = generate(&key.path, key.dim, limit);
            // The receiver is gone once the app quits.
            let _ = tx.send(Event::PreviewReady(Preview { key, token, lines }));
        });
    }

    /// Store a finished preview. Results of launches that were evicted or
    /// superseded while in flight are dropped. Returns whether the cache changed.
    pub fn complete(&mut self, preview: Preview) -> bool {
        if self.pending.get(&preview.key) != Some(&preview.token) {
            tracing::debug!(path = %preview.key.path.display(), "dropping stale preview");
            return false;
        }
        self.pending.remove(&preview.key);
        self.cache.insert(preview.key, preview.lines);
        true
    }

    /// Forget every cached or in-flight preview of `path`.
    pub fn evict(&mut self, path: &Path) {
        self.cache.retain(|key, _| key.path != path);
        self.pending.retain(|key, _| key.path != path);
    }

    #[cfg(test)]
    pub fn is_pending(&self, path: &Path, dim: Dimensions) -> bool {
        self.pending.contains_key(&PreviewKey {
            path: path.to_path_buf(),
            dim,
        })
    }

    #[cfg(test)]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// Build the preview for a path. Failures are rendered as their message.
pub fn generate(path: &Path, dim: Dimensions, text_bytes_limit: usize) -> Vec<Line<'static>> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => return vec![Line::from(e.to_string())],
    };

    if meta.is_dir() {
        return match text::directory_lines(path, dim) {
            Ok(lines) => lines.into_iter().map(Line::from).collect(),
            Err(e) => vec![Line::from(e.to_string())],
        };
    }

    if !meta.is_file() {
        return vec![Line::from(SPECIAL_FILE_PLACEHOLDER)];
    }

    if is_image(path) {
        return match image::image_lines(path, dim) {
            Ok(lines) => lines,
            Err(e) => vec![Line::from(e.to_string())],
        };
    }

    match text::read_head(path, text_bytes_limit) {
        Ok(content) => text::text_lines(&content, dim)
            .into_iter()
            .map(Line::from)
            .collect(),
        Err(e) => vec![Line::from(e.to_string())],
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|i| i.eq_ignore_ascii_case(ext)))
}
