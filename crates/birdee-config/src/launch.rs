//! The resolved, immutable description of how to start the server.

use camino::{Utf8Path, Utf8PathBuf};

use crate::defaults::{CACHE_FLAG, INPUT_FLAG, OUTPUT_FLAG, OUTPUT_PLACEHOLDER, SILENT_FLAG};

/// Everything required to spawn the Birdee language server.
///
/// Built once per activation by [`crate::ConfigResolver`]. The executable path
/// is never empty and every path is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLaunchConfig {
    workspace_root: Utf8PathBuf,
    entry_script_path: Utf8PathBuf,
    executable_path: Utf8PathBuf,
    cache_directory_path: Utf8PathBuf,
    extra_args: Vec<String>,
}

impl ServerLaunchConfig {
    pub(crate) fn new(
        workspace_root: Utf8PathBuf,
        entry_script_path: Utf8PathBuf,
        executable_path: Utf8PathBuf,
        cache_directory_path: Utf8PathBuf,
        extra_args: Vec<String>,
    ) -> Self {
        Self {
            workspace_root,
            entry_script_path,
            executable_path,
            cache_directory_path,
            extra_args,
        }
    }

    /// Workspace root the cache directory was resolved against.
    #[must_use]
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Absolute path of the analysis entry script.
    #[must_use]
    pub fn entry_script_path(&self) -> &Utf8Path {
        &self.entry_script_path
    }

    /// Compiler executable to spawn.
    #[must_use]
    pub fn executable_path(&self) -> &Utf8Path {
        &self.executable_path
    }

    /// Absolute cache directory handed to the server.
    #[must_use]
    pub fn cache_directory_path(&self) -> &Utf8Path {
        &self.cache_directory_path
    }

    /// Additional arguments appended after the fixed ones.
    #[must_use]
    pub fn extra_args(&self) -> &[String] {
        &self.extra_args
    }

    /// Full argument vector passed to the executable.
    ///
    /// The order is fixed because the compiler's own parser depends on it:
    /// `-s -i <entry> -o 111.obj -l <cache>`, then any extra arguments.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            SILENT_FLAG.to_owned(),
            INPUT_FLAG.to_owned(),
            self.entry_script_path.to_string(),
            OUTPUT_FLAG.to_owned(),
            OUTPUT_PLACEHOLDER.to_owned(),
            CACHE_FLAG.to_owned(),
            self.cache_directory_path.to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}
