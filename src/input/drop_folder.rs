//! Drop folder: the filesystem stand-in for drag-and-drop.
//!
//! Any file created in, or moved into, the watched folder is read and
//! submitted. Writers should move finished files into the folder rather
//! than writing them in place, otherwise the create event can fire before
//! the contents are complete.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use super::{FileSender, IngestFile};

/// Owns the filesystem watcher; dropping it stops the watch.
pub struct DropFolderWatcher {
    _watcher: RecommendedWatcher,
    folder: PathBuf,
}

impl DropFolderWatcher {
    /// Watch `folder` (created if missing) and submit arriving files to `sender`.
    pub fn start(folder: PathBuf, sender: FileSender) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&folder)?;

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if !is_arrival(&event.kind) {
                        return;
                    }
                    for path in &event.paths {
                        submit(path, &sender);
                    }
                }
                Err(e) => warn!(target: "drop_folder", "watch error: {e}"),
            }
        })?;

        watcher.watch(&folder, RecursiveMode::NonRecursive)?;
        info!(target: "drop_folder", folder = %folder.display(), "watching drop folder");

        Ok(Self {
            _watcher: watcher,
            folder,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

/// Created files and rename targets count as arrivals.
pub fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
            | EventKind::Modify(ModifyKind::Name(RenameMode::Both))
    )
}

/// Hidden files are editor or partial-download droppings.
fn is_candidate(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true);
    !hidden && path.is_file()
}

fn submit(path: &Path, sender: &FileSender) {
    if !is_candidate(path) {
        return;
    }
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return;
    };
    match std::fs::read(path) {
        Ok(bytes) => {
            if sender.send(IngestFile::new(name, bytes)).is_err() {
                warn!(target: "drop_folder", "input channel closed, ignoring {}", path.display());
            }
        }
        Err(e) => warn!(target: "drop_folder", "failed to read {}: {e}", path.display()),
    }
}
