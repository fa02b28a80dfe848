//! Service toggle state machine.
//!
//! The transition logic is written against the [`ServiceManager`] and
//! [`ServiceHandle`] traits so it can run without a live Service Control
//! Manager. Handles are owned values: releasing one is dropping it.

use std::fmt;
use thiserror::Error;

/// Raw `dwCurrentState` value for a stopped service.
pub const STATE_STOPPED: u32 = 1;
/// Raw `dwCurrentState` value for a running service.
pub const STATE_RUNNING: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
    Unexpected(u32),
}

impl ServiceState {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            STATE_RUNNING => ServiceState::Running,
            STATE_STOPPED => ServiceState::Stopped,
            other => ServiceState::Unexpected(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            ServiceState::Running => STATE_RUNNING,
            ServiceState::Stopped => STATE_STOPPED,
            ServiceState::Unexpected(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Automatic,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOp {
    Stop,
    Start,
    SetStartMode(StartMode),
}

impl fmt::Display for ServiceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceOp::Stop => f.write_str("stop"),
            ServiceOp::Start => f.write_str("start"),
            ServiceOp::SetStartMode(StartMode::Automatic) => f.write_str("enable"),
            ServiceOp::SetStartMode(StartMode::Disabled) => f.write_str("disable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("Failed to open Service Control Manager: {0}")]
    OpenManager(String),
    #[error("Failed to open service: {name} ({reason})")]
    OpenService { name: String, reason: String },
    #[error("Failed to query service status: {0}")]
    QueryStatus(String),
    #[error("failed to {op} service: {reason}")]
    Operation { op: ServiceOp, reason: String },
}

/// A connection to a service manager that can hand out service handles.
pub trait ServiceManager {
    type Service: ServiceHandle;

    fn open_service(&self, name: &str) -> Result<Self::Service, ToggleError>;
}

/// An open handle to a single service.
pub trait ServiceHandle {
    fn query_state(&self) -> Result<ServiceState, ToggleError>;
    fn stop(&self) -> Result<(), ToggleError>;
    fn set_start_mode(&self, mode: StartMode) -> Result<(), ToggleError>;
    fn start(&self) -> Result<(), ToggleError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    StoppedAndDisabled,
    EnabledAndStarted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Toggled(Transition),
    NoOp(ServiceState),
    Failed(ToggleError),
}

impl ToggleOutcome {
    /// Text shown to the user after a toggle attempt.
    pub fn message(&self, service_name: &str) -> String {
        match self {
            ToggleOutcome::Toggled(Transition::StoppedAndDisabled) => {
                format!("{service_name} service has been stopped and disabled.")
            }
            ToggleOutcome::Toggled(Transition::EnabledAndStarted) => {
                format!("{service_name} service has been enabled and started.")
            }
            ToggleOutcome::NoOp(state) => format!(
                "{service_name} service is in an unexpected state: {}",
                state.raw()
            ),
            ToggleOutcome::Failed(err @ ToggleError::Operation { .. }) => {
                format!("An error occurred: {err}")
            }
            ToggleOutcome::Failed(err) => err.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ToggleOutcome::Failed(_))
    }
}

/// Run one toggle against the service called `service_name`.
///
/// `connect` opens the service manager. If it fails no service handle is
/// requested. Both handles are dropped before returning, the service handle
/// first.
pub fn toggle<M, F>(connect: F, service_name: &str) -> ToggleOutcome
where
    M: ServiceManager,
    F: FnOnce() -> Result<M, ToggleError>,
{
    let manager = match connect() {
        Ok(manager) => manager,
        Err(err) => return ToggleOutcome::Failed(err),
    };
    let service = match manager.open_service(service_name) {
        Ok(service) => service,
        Err(err) => return ToggleOutcome::Failed(err),
    };
    let outcome = match apply(&service) {
        Ok(outcome) => outcome,
        Err(err) => ToggleOutcome::Failed(err),
    };
    drop(service);
    drop(manager);
    outcome
}

fn apply<S: ServiceHandle>(service: &S) -> Result<ToggleOutcome, ToggleError> {
    let state = service.query_state()?;
    tracing::debug!(?state, "observed service state");
    match state {
        ServiceState::Running => {
            // Stop goes out before the start type changes. Both calls are
            // always issued; the first error wins.
            let stopped = service.stop();
            let disabled = service.set_start_mode(StartMode::Disabled);
            stopped.and(disabled)?;
            Ok(ToggleOutcome::Toggled(Transition::StoppedAndDisabled))
        }
        ServiceState::Stopped => {
            let enabled = service.set_start_mode(StartMode::Automatic);
            let started = service.start();
            enabled.and(started)?;
            Ok(ToggleOutcome::Toggled(Transition::EnabledAndStarted))
        }
        ServiceState::Unexpected(_) => Ok(ToggleOutcome::NoOp(state)),
    }
}
