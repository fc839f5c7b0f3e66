//! # user-api-loadtest
//!
//! Load test for a user-management REST API, built on [goose](https://docs.rs/goose).
//!
//! ## Overview
//!
//! Each simulated user repeatedly picks one of two tasks by weight and then waits a random
//! 1-5 seconds:
//!
//! - **create and get user**: `POST /users` with a random name and email, and if the API
//!   answers 200 with an `id`, `GET /users/{id}`
//! - **health check**: `GET /healthCheck`
//!
//! Goose does the heavy lifting: spawning users, scheduling, HTTP, statistics and reports.
//! This crate only declares what a user does and how its responses are judged.
//!
//! ## Architecture
//!
//! - **[`behavior`]** - The virtual user and the [`behavior::Harness`] contract it runs on
//! - **[`classify`]** - Success/failure rules for create-user responses
//! - **[`api`]** - Endpoint and header definitions
//! - **[`payload`]** - Random create-user bodies
//! - **[`task`]** - Task kinds, weights and wait policy
//! - **[`config`]** - Environment-variable configuration
//! - **[`goose_user`]** - Goose harness and scenario registration
//! - **[`smoke`]** - One-shot runner over `reqwest` for checking a target
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Goose as GooseAttack
//!     participant Scenario as goose_user::scenario
//!     participant User as VirtualUser
//!     participant Harness as GooseHarness
//!     participant API as User API
//!
//!     Goose->>Scenario: on_session_start (once per user)
//!     loop until run time elapses
//!         Goose->>Scenario: weighted transaction
//!         Scenario->>User: create_and_get_user / health_check
//!         User->>Harness: send(ApiRequest)
//!         Harness->>API: HTTP request
//!         API-->>Harness: status + body
//!         Harness-->>User: ApiResponse
//!         User->>Harness: mark_success / mark_failure
//!         Goose->>Goose: wait 1-5s
//!     end
//! ```
//!
//! ## Running
//!
//! ```bash
//! # Full attack: 50 users, 10 spawned per second, 5 minutes
//! cargo run --release --bin user-api-loadtest -- \
//!   --host https://api.example.com \
//!   -u50 -r10 -t5m \
//!   --report-file load-test-report.html
//!
//! # Check the target first: every task once
//! cargo run --bin user-api-smoke -- --host https://api.example.com
//! ```
//!
//! ## Configuration
//!
//! The API key, base path, wait bounds and task weights come from `LOADTEST_*` environment
//! variables, see [`config`]. Log output is configured through `LOADTEST_LOG_*`, see
//! [`logging`].

pub mod api;
pub mod behavior;
pub mod classify;
pub mod config;
pub mod goose_user;
pub mod logging;
pub mod payload;
pub mod smoke;
pub mod task;

pub use behavior::{Harness, Signal, TaskOutcome, VirtualUser};
pub use config::LoadTestConfig;
pub use task::{TaskKind, TaskWeights, WaitPolicy};
