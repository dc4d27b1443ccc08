//! Resolves settings, environment and host paths into a [`ServerLaunchConfig`].

use std::path;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::defaults::{BIRDEE_HOME_VAR, ENTRY_SCRIPT_RELATIVE_PATH, server_binary_name};
use crate::environment::{Environment, SystemEnvironment};
use crate::error::ConfigError;
use crate::launch::ServerLaunchConfig;
use crate::settings::BirdeeSettings;

/// Log target for configuration resolution.
const CONFIG_TARGET: &str = "birdee_config::resolver";

/// Gathers the inputs of a launch and resolves them in one synchronous step.
///
/// # Example
///
/// ```ignore
/// use birdee_config::{BirdeeSettings, ConfigResolver};
///
/// let config = ConfigResolver::new("/ext", BirdeeSettings::default())
///     .with_workspace_root("/proj")
///     .resolve()?;
/// ```
#[derive(Debug, Clone)]
pub struct ConfigResolver<E = SystemEnvironment> {
    environment: E,
    extension_root: Utf8PathBuf,
    workspace_roots: Vec<Utf8PathBuf>,
    settings: BirdeeSettings,
    extra_args: Vec<String>,
}

impl ConfigResolver<SystemEnvironment> {
    /// Creates a resolver reading `BIRDEE_HOME` from the process environment.
    #[must_use]
    pub fn new(extension_root: impl Into<Utf8PathBuf>, settings: BirdeeSettings) -> Self {
        Self {
            environment: SystemEnvironment,
            extension_root: extension_root.into(),
            workspace_roots: Vec::new(),
            settings,
            extra_args: Vec::new(),
        }
    }
}

impl<E: Environment> ConfigResolver<E> {
    /// Replaces the environment consulted for the executable fallback.
    #[must_use]
    pub fn with_environment<F: Environment>(self, environment: F) -> ConfigResolver<F> {
        ConfigResolver {
            environment,
            extension_root: self.extension_root,
            workspace_roots: self.workspace_roots,
            settings: self.settings,
            extra_args: self.extra_args,
        }
    }

    /// Adds a workspace root. Only the first root anchors the cache directory.
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.workspace_roots.push(root.into());
        self
    }

    /// Appends arguments passed after the fixed argument layout.
    #[must_use]
    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Settings the resolver was built with.
    #[must_use]
    pub fn settings(&self) -> &BirdeeSettings {
        &self.settings
    }

    /// Produces the launch configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingExecutable`] when neither `compilerPath` nor
    ///   `BIRDEE_HOME` is set.
    /// - [`ConfigError::MissingWorkspaceRoot`] when no workspace root was given.
    /// - [`ConfigError::Absolutise`] or [`ConfigError::NonUtf8Path`] when a
    ///   relative path cannot be made absolute.
    pub fn resolve(&self) -> Result<ServerLaunchConfig, ConfigError> {
        let executable = resolve_executable(&self.settings, &self.environment)?;
        let workspace_root = self
            .workspace_roots
            .first()
            .ok_or(ConfigError::MissingWorkspaceRoot)
            .and_then(|root| absolutise(root))?;
        let cache_directory = resolve_cache_directory(&workspace_root, &self.settings.lsp_cache)?;
        let entry_script = resolve_entry_script(&self.extension_root)?;

        debug!(
            target: CONFIG_TARGET,
            executable = %executable,
            entry_script = %entry_script,
            cache_directory = %cache_directory,
            workspace_root = %workspace_root,
            extra_args = ?self.extra_args,
            "resolved language server launch configuration"
        );

        Ok(ServerLaunchConfig::new(
            workspace_root,
            entry_script,
            executable,
            cache_directory,
            self.extra_args.clone(),
        ))
    }
}

/// Resolves the compiler executable in two stages.
///
/// A non-empty `compilerPath` is returned verbatim. Otherwise the path is
/// derived as `{BIRDEE_HOME}/bin/birdeec`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingExecutable`] when `compilerPath` is empty and
/// `BIRDEE_HOME` is unset or empty.
pub fn resolve_executable<E>(
    settings: &BirdeeSettings,
    environment: &E,
) -> Result<Utf8PathBuf, ConfigError>
where
    E: Environment + ?Sized,
{
    if !settings.compiler_path.is_empty() {
        return Ok(Utf8PathBuf::from(settings.compiler_path.as_str()));
    }

    match environment
        .var(BIRDEE_HOME_VAR)
        .filter(|home| !home.is_empty())
    {
        Some(home) => {
            let mut path = Utf8PathBuf::from(home);
            path.push("bin");
            path.push(server_binary_name());
            Ok(path)
        }
        None => Err(ConfigError::MissingExecutable {
            variable: BIRDEE_HOME_VAR,
        }),
    }
}

/// Joins `lsp_cache` onto `workspace_root`.
///
/// Root and drive components of `lsp_cache` are dropped, so an absolute value
/// is re-rooted under the workspace instead of replacing it. `.` and `..` are
/// folded lexically and `..` never climbs above the workspace root. The
/// directory is not required to exist.
///
/// # Errors
///
/// Returns [`ConfigError::Absolutise`] or [`ConfigError::NonUtf8Path`] when a
/// relative workspace root cannot be made absolute.
pub fn resolve_cache_directory(
    workspace_root: &Utf8Path,
    lsp_cache: &str,
) -> Result<Utf8PathBuf, ConfigError> {
    let mut cache = absolutise(workspace_root)?;
    let mut depth = 0_usize;
    for component in Utf8Path::new(lsp_cache).components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir | Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if depth > 0 {
                    cache.pop();
                    depth -= 1;
                }
            }
            Utf8Component::Normal(part) => {
                cache.push(part);
                depth += 1;
            }
        }
    }
    Ok(cache)
}

fn resolve_entry_script(extension_root: &Utf8Path) -> Result<Utf8PathBuf, ConfigError> {
    let mut script = absolutise(extension_root)?;
    for part in ENTRY_SCRIPT_RELATIVE_PATH.split('/') {
        script.push(part);
    }
    Ok(script)
}

fn absolutise(path: &Utf8Path) -> Result<Utf8PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let absolute = path::absolute(path).map_err(|source| ConfigError::Absolutise {
        path: path.to_path_buf(),
        source,
    })?;
    Utf8PathBuf::from_path_buf(absolute).map_err(|raw| ConfigError::NonUtf8Path {
        path: raw.to_string_lossy().into_owned(),
    })
}
