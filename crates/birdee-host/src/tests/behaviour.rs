//! Behavioural tests for activation and shutdown using `rstest-bdd`.

use std::cell::RefCell;

use birdee_config::{BIRDEE_HOME_VAR, MapEnvironment};
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use super::support::{AfterPolls, StubServer, assert_ordered, host_options};
use crate::activation::{Activation, HostOptions};
use crate::errors::HostError;
use crate::supervise::{Outcome, POLL_INTERVAL, supervise};

/// Test world for host scenarios.
struct HostWorld {
    _workspace: TempDir,
    options: HostOptions,
    environment: MapEnvironment,
    server: StubServer,
    activation: Option<Activation<StubServer>>,
    failure: Option<HostError>,
    outcome: Option<Outcome>,
}

impl HostWorld {
    fn new() -> Self {
        let workspace = tempfile::tempdir().expect("failed to create workspace directory");
        Self {
            options: host_options(&workspace),
            _workspace: workspace,
            environment: MapEnvironment::new(),
            server: StubServer::silent(),
            activation: None,
            failure: None,
            outcome: None,
        }
    }

    fn activation(&mut self) -> &mut Activation<StubServer> {
        self.activation.as_mut().expect("host was not activated")
    }

    fn supervise_until(&mut self, mut polls: AfterPolls) {
        let outcome = supervise(self.activation(), &mut polls, POLL_INTERVAL)
            .expect("supervision should succeed");
        self.outcome = Some(outcome);
    }
}

#[fixture]
fn world() -> RefCell<HostWorld> {
    RefCell::new(HostWorld::new())
}

// --- Given steps ---

#[given("a host with a configured compiler")]
fn given_configured(world: &RefCell<HostWorld>) {
    assert!(!world.borrow().options.settings.compiler_path.is_empty());
}

#[given("a host with no compiler path and no BIRDEE_HOME")]
fn given_unconfigured(world: &RefCell<HostWorld>) {
    world.borrow_mut().options.settings.compiler_path.clear();
}

#[given("a host with no compiler path and BIRDEE_HOME set to \"{home}\"")]
fn given_birdee_home(world: &RefCell<HostWorld>, home: String) {
    let mut borrow = world.borrow_mut();
    borrow.options.settings.compiler_path.clear();
    borrow.environment = MapEnvironment::new().with_var(BIRDEE_HOME_VAR, home);
}

#[given("a host whose server exits immediately")]
fn given_exiting_server(world: &RefCell<HostWorld>) {
    world.borrow_mut().server = StubServer::exiting();
}

// --- When steps ---

#[when("the host activates")]
fn when_activates(world: &RefCell<HostWorld>) {
    let mut borrow = world.borrow_mut();
    let result = Activation::activate_with(
        borrow.server.clone(),
        borrow.environment.clone(),
        &borrow.options,
    );
    match result {
        Ok(activation) => borrow.activation = Some(activation),
        Err(error) => borrow.failure = Some(error),
    }
}

#[when("a shutdown signal arrives")]
fn when_signalled(world: &RefCell<HostWorld>) {
    world.borrow_mut().supervise_until(AfterPolls(1));
}

#[when("the host supervises the session")]
fn when_supervising(world: &RefCell<HostWorld>) {
    world.borrow_mut().supervise_until(AfterPolls(usize::MAX));
}

#[when("the host deactivates")]
fn when_deactivates(world: &RefCell<HostWorld>) {
    let activation = world
        .borrow_mut()
        .activation
        .take()
        .expect("host was not activated");
    activation.deactivate().expect("deactivation should succeed");
}

// --- Then steps ---

#[then("activation fails with a configuration error")]
fn then_configuration_error(world: &RefCell<HostWorld>) {
    let borrow = world.borrow();
    assert!(
        matches!(borrow.failure, Some(HostError::Configuration { .. })),
        "unexpected failure: {:?}",
        borrow.failure
    );
}

#[then("no server was launched")]
fn then_nothing_launched(world: &RefCell<HostWorld>) {
    assert!(world.borrow().server.launches().is_empty());
}

#[then("the server was launched from \"{executable}\"")]
fn then_launched_from(world: &RefCell<HostWorld>, executable: String) {
    assert_eq!(
        world.borrow().server.launches(),
        vec![Utf8PathBuf::from(executable)]
    );
}

#[then("supervision ended because shutdown was requested")]
fn then_shutdown_requested(world: &RefCell<HostWorld>) {
    assert_eq!(world.borrow().outcome, Some(Outcome::ShutdownRequested));
}

#[then("supervision ended because the server exited")]
fn then_server_exited(world: &RefCell<HostWorld>) {
    assert_eq!(world.borrow().outcome, Some(Outcome::ServerExited));
}

#[then("the server received \"{first}\" before \"{second}\"")]
fn then_ordered(world: &RefCell<HostWorld>, first: String, second: String) {
    let methods = world.borrow().server.received_methods();
    assert_ordered(&methods, &first, &second);
}

#[scenario(path = "tests/features/host_activation.feature")]
fn host_activation_behaviour(#[from(world)] _: RefCell<HostWorld>) {}
