//! File watching for the server's client configuration files.

use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use lsp_types::FileChangeType;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::debug;

use crate::errors::ClientError;
use crate::session::CLIENT_TARGET;

/// A glob over `/`-separated relative paths.
///
/// `**` spans any number of directories, `*` any run of characters within one
/// segment and `?` a single character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPattern {
    raw: String,
    segments: Vec<String>,
}

impl WatchPattern {
    /// Parses `pattern`. Empty segments are ignored.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            raw: pattern.to_owned(),
            segments: pattern
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `path`, relative to the watched root, matches.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let parts: Vec<String> = path
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        let segments: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        match_segments(&segments, &parts)
    }
}

impl Default for WatchPattern {
    fn default() -> Self {
        Self::new(birdee_config::WATCH_GLOB)
    }
}

fn match_segments(pattern: &[&str], parts: &[&str]) -> bool {
    match pattern.split_first() {
        None => parts.is_empty(),
        Some((&"**", rest)) => (0..=parts.len())
            .any(|skip| parts.get(skip..).is_some_and(|tail| match_segments(rest, tail))),
        Some((segment, rest)) => match parts.split_first() {
            Some((part, tail)) => match_segment(segment, part) && match_segments(rest, tail),
            None => false,
        },
    }
}

fn match_segment(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    match_chars(&pattern, &text)
}

fn match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len())
            .any(|skip| text.get(skip..).is_some_and(|tail| match_chars(rest, tail))),
        Some(('?', rest)) => text
            .split_first()
            .is_some_and(|(_, tail)| match_chars(rest, tail)),
        Some((expected, rest)) => text
            .split_first()
            .is_some_and(|(actual, tail)| actual == expected && match_chars(rest, tail)),
    }
}

/// Kind of change observed on a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    /// The file appeared.
    Created,
    /// The file's contents changed.
    Changed,
    /// The file was removed.
    Deleted,
}

impl From<FileChangeKind> for FileChangeType {
    fn from(kind: FileChangeKind) -> Self {
        match kind {
            FileChangeKind::Created => Self::CREATED,
            FileChangeKind::Changed => Self::CHANGED,
            FileChangeKind::Deleted => Self::DELETED,
        }
    }
}

/// A change to a watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: FileChangeKind,
}

/// Recursively watches a workspace root for files matching a [`WatchPattern`].
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<FileChange>,
}

impl FileWatcher {
    /// Starts watching `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Watcher`] when the platform watcher cannot be
    /// created or `root` cannot be watched.
    pub fn new(root: &Path, pattern: WatchPattern) -> Result<Self, ClientError> {
        let watcher_error = |source| ClientError::Watcher {
            path: root.display().to_string(),
            source,
        };
        let (tx, rx) = mpsc::channel();
        let base = root.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let Ok(event) = res else {
                    return;
                };
                let kind = match event.kind {
                    EventKind::Create(_) => FileChangeKind::Created,
                    EventKind::Modify(_) => FileChangeKind::Changed,
                    EventKind::Remove(_) => FileChangeKind::Deleted,
                    _ => return,
                };
                for path in event.paths {
                    let relative = path.strip_prefix(&base).unwrap_or(&path);
                    if !pattern.matches(relative) {
                        continue;
                    }
                    debug!(
                        target: CLIENT_TARGET,
                        path = %path.display(),
                        ?kind,
                        "watched file changed"
                    );
                    let _ = tx.send(FileChange { path, kind });
                }
            },
            Config::default(),
        )
        .map_err(watcher_error)?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(watcher_error)?;
        debug!(
            target: CLIENT_TARGET,
            root = %root.display(),
            "watching workspace for client configuration changes"
        );

        Ok(Self {
            _watcher: watcher,
            events: rx,
        })
    }

    /// Changes observed since the last call.
    pub fn drain(&self) -> Vec<FileChange> {
        self.events.try_iter().collect()
    }
}
