mod app;
mod components;
mod config;
mod error;
mod event;
mod fs;
mod handler;
mod logging;
mod opener;
mod preview;
mod theme;
mod tui;
mod ui;
mod viewport;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::{App, Launchers};
use crate::config::{AppConfig, GeneralConfig, LogConfig, PreviewConfig, TreeConfig, WatcherConfig};
use crate::event::{Event, EventHandler};
use crate::fs::tree::Tree;
use crate::fs::watcher::{DirWatch, NoWatch, WatchBridge};
use crate::preview::PreviewPipeline;
use crate::tui::{install_panic_hook, Tui};

/// A terminal file-tree navigator that stays in sync with the filesystem.
#[derive(Parser, Debug)]
#[command(name = "bt", version, about)]
struct Cli {
    /// Directory to open (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Lines kept between the selection and the viewport edge
    #[arg(long)]
    pad: Option<usize>,

    /// Draw in the main screen instead of the alternate screen
    #[arg(short, long)]
    inline: bool,

    /// Disable the preview pane
    #[arg(long)]
    no_preview: bool,

    /// Disable live filesystem sync
    #[arg(long)]
    no_watcher: bool,

    /// Show hidden entries in every directory
    #[arg(long)]
    show_hidden: bool,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the log file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags as a partial config; unset flags leave file values alone.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                show_hidden: self.show_hidden.then_some(true),
                alt_screen: self.inline.then_some(false),
                editor: None,
                opener: None,
            },
            tree: TreeConfig { padding: self.pad },
            preview: PreviewConfig {
                enabled: self.no_preview.then_some(false),
                text_bytes_limit: None,
            },
            watcher: WatcherConfig {
                enabled: self.no_watcher.then_some(false),
            },
            log: LogConfig {
                file: self.log_file.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    if let Some(log_file) = config.log_file() {
        logging::init_global(&log_file);
    }

    let path = cli.path.canonicalize().map_err(|_| {
        error::AppError::InvalidPath(format!("{} does not exist", cli.path.display()))
    })?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    let event_tx = events.sender();

    let watch: Box<dyn DirWatch> = if config.watcher_enabled() {
        match WatchBridge::new(event_tx.clone()) {
            Ok(bridge) => Box::new(bridge),
            Err(e) => {
                tracing::warn!("live sync unavailable: {}", e);
                Box::new(NoWatch)
            }
        }
    } else {
        Box::new(NoWatch)
    };

    let tree = match Tree::new(&path, config.show_hidden(), watch) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("bt: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(root = %path.display(), "starting");

    let preview = config
        .preview_enabled()
        .then(|| PreviewPipeline::new(event_tx.clone(), config.text_bytes_limit()));
    let launchers = Launchers {
        editor: config.editor(),
        opener: config.opener().to_string(),
    };
    let mut app = App::new(tree, preview, config.padding(), launchers);

    install_panic_hook();
    let mut tui = Tui::new(config.alt_screen())?;

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Tick => {}
            Event::Resize(_, _) => {}
            Event::FsChange(signal) => app.handle_fs_change(signal),
            Event::PreviewReady(preview) => app.handle_preview_ready(preview),
        }

        if let Some(launch) = app.pending_launch.take() {
            events.pause();
            tui.suspend()?;
            let status = opener::launch(&launch);
            tui.resume()?;
            events.resume();
            match status {
                Ok(status) if status.success() => {}
                Ok(status) => app.set_error(format!(
                    "{} exited with {}",
                    launch.program().to_string_lossy(),
                    status
                )),
                Err(e) => app.set_error(format!(
                    "failed to run {}: {}",
                    launch.program().to_string_lossy(),
                    e
                )),
            }
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    tracing::info!("exiting");
    Ok(())
}
