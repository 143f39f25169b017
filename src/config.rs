//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--pad`, `--no-preview`, `--inline`, etc.)
//! 2. `--config <file>`
//! 3. `$BT_CONFIG` environment variable (path to config file)
//! 4. Project-local `.bt.toml` in the current working directory
//! 5. Global `~/.config/bt/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::preview::DEFAULT_TEXT_BYTES_LIMIT;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Show hidden files in newly listed directories.
    pub show_hidden: Option<bool>,
    /// Draw on the alternate screen (false = inline).
    pub alt_screen: Option<bool>,
    /// Command line used by `e`; the selected path is appended.
    pub editor: Option<String>,
    /// Command line used by `enter` on files.
    pub opener: Option<String>,
}

/// Tree panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Lines kept between the selection and the viewport edges.
    pub padding: Option<usize>,
}

/// Preview panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PreviewConfig {
    /// Whether the preview panel is enabled.
    pub enabled: Option<bool>,
    /// Bytes read from the start of a file for a text preview.
    pub text_bytes_limit: Option<usize>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Keep expanded directories in sync with the disk.
    pub enabled: Option<bool>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Log file path.
    pub file: Option<PathBuf>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub preview: PreviewConfig,
    pub watcher: WatcherConfig,
    pub log: LogConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default viewport edge padding.
pub const DEFAULT_PADDING: usize = 5;
/// Editor used when neither the config nor `$EDITOR` names one.
pub const DEFAULT_EDITOR: &str = "vim";

#[cfg(target_os = "macos")]
pub const DEFAULT_OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_OPENER: &str = "xdg-open";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("BT_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".bt.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("bt").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                show_hidden: other.general.show_hidden.or(self.general.show_hidden),
                alt_screen: other.general.alt_screen.or(self.general.alt_screen),
                editor: other.general.editor.clone().or(self.general.editor),
                opener: other.general.opener.clone().or(self.general.opener),
            },
            tree: TreeConfig {
                padding: other.tree.padding.or(self.tree.padding),
            },
            preview: PreviewConfig {
                enabled: other.preview.enabled.or(self.preview.enabled),
                text_bytes_limit: other
                    .preview
                    .text_bytes_limit
                    .or(self.preview.text_bytes_limit),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
            },
            log: LogConfig {
                file: other.log.file.clone().or(self.log.file),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn show_hidden(&self) -> bool {
        self.general.show_hidden.unwrap_or(false)
    }

    pub fn alt_screen(&self) -> bool {
        self.general.alt_screen.unwrap_or(true)
    }

    /// Editor command line: config, then `$EDITOR`, then vim.
    pub fn editor(&self) -> String {
        self.general
            .editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
    }

    pub fn opener(&self) -> &str {
        self.general.opener.as_deref().unwrap_or(DEFAULT_OPENER)
    }

    pub fn padding(&self) -> usize {
        self.tree.padding.unwrap_or(DEFAULT_PADDING)
    }

    pub fn preview_enabled(&self) -> bool {
        self.preview.enabled.unwrap_or(true)
    }

    pub fn text_bytes_limit(&self) -> usize {
        self.preview
            .text_bytes_limit
            .unwrap_or(DEFAULT_TEXT_BYTES_LIMIT)
    }

    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    /// Log file: config value, else `<cache dir>/bt/bt.log`.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log
            .file
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("bt").join("bt.log")))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
