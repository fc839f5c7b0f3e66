//! # Simulated User Behavior
//!
//! One virtual user: its session state, its two tasks and the assertions it makes about
//! the responses it gets.
//!
//! The behavior never talks HTTP itself. Every request goes through a [`Harness`], the narrow
//! contract the load generator (or the smoke runner, or a test) plugs in:
//!
//! - [`Harness::send`] issues a request and hands back status and body
//! - [`Harness::mark_success`] / [`Harness::mark_failure`] override the harness's own verdict
//!   for the request sent last
//!
//! Requests the behavior does not classify keep whatever verdict the harness applies by
//! default (for goose: transport errors and non-2xx statuses fail).
//!
//! ## Task Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Harness
//!     participant User as VirtualUser
//!     participant API as User API
//!
//!     Harness->>User: create_and_get_user()
//!     User->>API: POST /users {name, email}
//!     API-->>User: status + body
//!     alt 200 with JSON id
//!         User->>Harness: mark_success
//!         User->>API: GET /users/{id}
//!     else anything else
//!         User->>Harness: mark_failure(message)
//!     end
//!
//!     Harness->>User: health_check()
//!     User->>API: GET /healthCheck
//! ```

use std::future::Future;

use rand::Rng;
use tracing::{debug, warn};

use crate::api::{self, ApiRequest, ApiResponse};
use crate::classify::{self, CreateUserFailure, UserId};
use crate::config::LoadTestConfig;
use crate::payload::UserPayload;
use crate::task::TaskKind;

/// HTTP capability a virtual user runs on.
pub trait Harness {
    /// Error that aborts the current task invocation (transport failure, or the harness's
    /// own representation of a recorded failure).
    type Error;

    /// Send one request and return its status and body.
    fn send(
        &mut self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, Self::Error>> + Send;

    /// Record the last request as successful.
    fn mark_success(&mut self) -> Result<(), Self::Error>;

    /// Record the last request as failed with a diagnostic message.
    fn mark_failure(&mut self, message: &str) -> Result<(), Self::Error>;
}

/// Verdict a harness recorded for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Success,
    Failure(String),
}

/// What a single task invocation did.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The user was created; `fetched` tells whether the follow-up GET was issued
    Created { id: UserId, fetched: bool },
    /// The create call was classified as failed and the task stopped there
    Rejected(CreateUserFailure),
    /// The health check was sent; its status is left to the harness
    HealthChecked { status: u16 },
}

/// State of one simulated client session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualUser {
    user_id: Option<UserId>,
}

impl VirtualUser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the last user this session created, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Session start hook: forget any previously created user.
    pub fn on_session_start(&mut self) {
        self.user_id = None;
    }

    /// Run one task, drawing a fresh payload from `rng` when the task needs one.
    pub async fn run<H, R>(
        &mut self,
        kind: TaskKind,
        harness: &mut H,
        config: &LoadTestConfig,
        rng: &mut R,
    ) -> Result<TaskOutcome, H::Error>
    where
        H: Harness,
        R: Rng + ?Sized,
    {
        match kind {
            TaskKind::CreateAndGetUser => {
                let payload = UserPayload::generate(rng);
                self.create_and_get_user(harness, config, payload).await
            }
            TaskKind::HealthCheck => self.health_check(harness, config).await,
        }
    }

    /// POST a new user; on success GET it back by the returned id.
    pub async fn create_and_get_user<H: Harness>(
        &mut self,
        harness: &mut H,
        config: &LoadTestConfig,
        payload: UserPayload,
    ) -> Result<TaskOutcome, H::Error> {
        let request = api::create_user(config, &payload);
        debug!(path = %request.path, name = %payload.name, "creating user");
        let response = harness.send(request).await?;

        let id = match classify::create_user_response(response.status, &response.body) {
            Ok(id) => {
                harness.mark_success()?;
                self.user_id = Some(id.clone());
                id
            }
            Err(failure) => {
                warn!(status = response.status, error = %failure, "create user failed");
                harness.mark_failure(&failure.to_string())?;
                return Ok(TaskOutcome::Rejected(failure));
            }
        };

        if !id.is_truthy() {
            debug!(id = %id, "created user has an unusable id, skipping lookup");
            return Ok(TaskOutcome::Created { id, fetched: false });
        }

        let request = api::get_user(config, &id);
        debug!(path = %request.path, "fetching created user");
        harness.send(request).await?;
        Ok(TaskOutcome::Created { id, fetched: true })
    }

    /// GET the health check endpoint.
    pub async fn health_check<H: Harness>(
        &mut self,
        harness: &mut H,
        config: &LoadTestConfig,
    ) -> Result<TaskOutcome, H::Error> {
        let request = api::health_check(config);
        debug!(path = %request.path, "health check");
        let ApiResponse { status, .. } = harness.send(request).await?;
        Ok(TaskOutcome::HealthChecked { status })
    }
}
