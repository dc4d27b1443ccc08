//! Activation and deactivation of the language client.
//!
//! An [`Activation`] is the context that owns the [`ClientSession`] for the
//! lifetime of the host. It is created once per run and consumed by
//! [`Activation::deactivate`], which is the only path to `stop`.

use std::fs;
use std::time::Duration;

use birdee_config::{BirdeeSettings, ConfigResolver, Environment, SystemEnvironment};
use birdee_lsp_client::{ClientOptions, ClientSession, ProcessLauncher, ServerLauncher};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::HOST_TARGET;
use crate::cli::Cli;
use crate::errors::HostError;

/// Inputs of an activation.
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Open workspace folders; the first anchors the cache directory.
    pub workspace_roots: Vec<Utf8PathBuf>,
    /// Directory holding the bundled analysis entry script.
    pub extension_root: Utf8PathBuf,
    /// The `birdeeLanguageServer` settings section.
    pub settings: BirdeeSettings,
    /// Time allowed for the `shutdown` response.
    pub shutdown_timeout: Duration,
    /// Whether `.clientrc` changes are forwarded.
    pub watch_files: bool,
}

impl HostOptions {
    /// Creates options with default settings for one workspace.
    #[must_use]
    pub fn new(
        workspace_root: impl Into<Utf8PathBuf>,
        extension_root: impl Into<Utf8PathBuf>,
    ) -> Self {
        let defaults = ClientOptions::default();
        Self {
            workspace_roots: vec![workspace_root.into()],
            extension_root: extension_root.into(),
            settings: BirdeeSettings::default(),
            shutdown_timeout: defaults.shutdown_timeout,
            watch_files: defaults.watch_files,
        }
    }

    pub(crate) fn from_cli(cli: &Cli) -> Result<Self, HostError> {
        let settings = match cli.settings.as_deref() {
            Some(path) => load_settings(path)?,
            None => BirdeeSettings::default(),
        };
        Ok(Self {
            workspace_roots: cli.workspaces.clone(),
            extension_root: cli.extension_root.clone(),
            settings,
            shutdown_timeout: Duration::from_millis(cli.shutdown_timeout_ms),
            watch_files: !cli.no_watch,
        })
    }

    fn client_options(&self) -> ClientOptions {
        ClientOptions {
            settings: self.settings.clone(),
            shutdown_timeout: self.shutdown_timeout,
            watch_files: self.watch_files,
            ..ClientOptions::default()
        }
    }
}

/// Reads a settings file holding either the bare section or a settings tree
/// that nests it under `birdeeLanguageServer`.
///
/// # Errors
///
/// Returns [`HostError::SettingsFile`] when the file cannot be read and
/// [`HostError::Configuration`] when its content is not a valid section.
pub fn load_settings(path: &Utf8Path) -> Result<BirdeeSettings, HostError> {
    let text = fs::read_to_string(path).map_err(|source| HostError::SettingsFile {
        path: path.to_path_buf(),
        source,
    })?;
    BirdeeSettings::from_json_str(&text).map_err(|source| HostError::Configuration { source })
}

/// Owns the running client session.
pub struct Activation<L = ProcessLauncher> {
    session: ClientSession<L>,
}

impl Activation<ProcessLauncher> {
    /// Resolves the launch configuration from the process environment and
    /// starts the compiler in server mode.
    ///
    /// # Errors
    ///
    /// See [`Activation::activate_with`].
    pub fn activate(options: &HostOptions) -> Result<Self, HostError> {
        Self::activate_with(ProcessLauncher, SystemEnvironment, options)
    }
}

impl<L: ServerLauncher> Activation<L> {
    /// Resolves the launch configuration and starts the server through
    /// `launcher`.
    ///
    /// Returns once `initialize` is written; readiness is reported later by
    /// the session's events.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Configuration`] when the executable or cache
    /// directory cannot be resolved and [`HostError::Launch`] when the process
    /// cannot be started. Nothing is left running in either case.
    pub fn activate_with<E: Environment>(
        launcher: L,
        environment: E,
        options: &HostOptions,
    ) -> Result<Self, HostError> {
        let resolver = options.workspace_roots.iter().fold(
            ConfigResolver::new(options.extension_root.clone(), options.settings.clone())
                .with_environment(environment),
            |resolver, root| resolver.with_workspace_root(root.clone()),
        );
        let config = resolver
            .resolve()
            .map_err(|source| HostError::Configuration { source })?;

        let mut session = ClientSession::with_launcher(launcher, options.client_options());
        session
            .start(&config)
            .map_err(|source| HostError::Launch { source })?;

        info!(
            target: HOST_TARGET,
            executable = %config.executable_path(),
            cache_directory = %config.cache_directory_path(),
            pid = ?session.pid(),
            "language server activated"
        );
        Ok(Self { session })
    }

    /// The supervised session.
    #[must_use]
    pub fn session(&self) -> &ClientSession<L> {
        &self.session
    }

    /// Mutable access for forwarding documents and settings.
    pub fn session_mut(&mut self) -> &mut ClientSession<L> {
        &mut self.session
    }

    /// Stops the session and waits for the server to go away.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Session`] if teardown itself fails; handshake
    /// failures are logged by the session and do not surface here.
    pub fn deactivate(self) -> Result<(), HostError> {
        self.session
            .stop()
            .map_err(|source| HostError::Session { source })?;
        info!(target: HOST_TARGET, "language server deactivated");
        Ok(())
    }
}
