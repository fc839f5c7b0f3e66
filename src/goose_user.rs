//! Goose integration: the [`Harness`] over a `GooseUser` and the scenario that schedules
//! virtual users.
//!
//! Goose owns everything around the behavior: spawning users at the hatch rate, picking
//! transactions by weight, sleeping between them, collecting request metrics and printing
//! the report. This module only translates.
//!
//! ## Session State
//!
//! Goose hands each transaction a `&mut GooseUser` and nothing else, so the
//! [`VirtualUser`] lives in goose session data. The on-start transaction installs a fresh
//! one; every task takes it out, runs, and puts it back.
//!
//! ## Verdicts
//!
//! Goose records every request when it completes, failing transport errors and non-2xx
//! statuses with its own message (`500 Internal Server Error: POST ...`). Marking a request
//! afterwards only flips its success flag: a request goose already failed keeps goose's
//! message in the report, so `Failed to create user: 500` shows up in the log only. A 2xx
//! response marked failed (a 201, or a 200 without a usable id) is moved from success to
//! failure and carries the body.
//!
//! `GooseUser::set_failure` always returns `TransactionError::RequestFailed`, so a rejected
//! create ends its transaction with that error and goose counts the transaction as failed.

use std::sync::Arc;

use goose::metrics::GooseRequestMetric;
use goose::prelude::*;
use http::Method;
use tracing::debug;

use crate::api::{ApiRequest, ApiResponse};
use crate::behavior::{Harness, TaskOutcome, VirtualUser};
use crate::config::LoadTestConfig;
use crate::payload::UserPayload;
use crate::task::TaskKind;

/// Name the scenario's statistics are reported under.
pub const SCENARIO_NAME: &str = "UserApiUser";

/// [`Harness`] backed by a goose user.
///
/// Every request goes through `GooseUser::request`, so goose records it with its default
/// verdict (transport errors and non-2xx fail). [`Harness::mark_success`] and
/// [`Harness::mark_failure`] set the success flag of the request sent last; see the module
/// docs for what that changes in the report.
pub struct GooseHarness<'a> {
    user: &'a mut GooseUser,
    last_request: Option<GooseRequestMetric>,
    last_body: String,
}

impl<'a> GooseHarness<'a> {
    pub fn new(user: &'a mut GooseUser) -> Self {
        Self {
            user,
            last_request: None,
            last_body: String::new(),
        }
    }
}

fn goose_method(method: &Method) -> GooseMethod {
    if *method == Method::POST {
        GooseMethod::Post
    } else if *method == Method::PUT {
        GooseMethod::Put
    } else if *method == Method::PATCH {
        GooseMethod::Patch
    } else if *method == Method::DELETE {
        GooseMethod::Delete
    } else if *method == Method::HEAD {
        GooseMethod::Head
    } else {
        GooseMethod::Get
    }
}

fn transport_error(e: reqwest::Error) -> Box<TransactionError> {
    Box::new(TransactionError::Reqwest(e))
}

impl Harness for GooseHarness<'_> {
    type Error = Box<TransactionError>;

    async fn send(&mut self, mut request: ApiRequest) -> Result<ApiResponse, Self::Error> {
        let mut request_builder = self
            .user
            .get_request_builder(&goose_method(&request.method), &request.path)?;
        for (name, value) in &request.headers {
            request_builder = request_builder.header(*name, value.as_str());
        }
        if let Some(body) = request.body.take() {
            request_builder = request_builder.body(body);
        }
        let goose_request = GooseRequest::builder()
            .name(request.name.as_str())
            .set_request_builder(request_builder)
            .build();

        let goose = self.user.request(goose_request).await?;
        self.last_request = Some(goose.request);
        self.last_body.clear();

        let response = goose.response.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        self.last_body.push_str(&body);
        Ok(ApiResponse { status, body })
    }

    fn mark_success(&mut self) -> Result<(), Self::Error> {
        match self.last_request.as_mut() {
            Some(request) => self.user.set_success(request),
            None => Ok(()),
        }
    }

    fn mark_failure(&mut self, message: &str) -> Result<(), Self::Error> {
        match self.last_request.as_mut() {
            Some(request) => self
                .user
                .set_failure(message, request, None, Some(&self.last_body)),
            None => Ok(()),
        }
    }
}

/// Build the scenario: on-start hook, one transaction per enabled task, wait policy.
pub fn scenario(config: Arc<LoadTestConfig>) -> Result<Scenario, GooseError> {
    let mut scenario = scenario!(SCENARIO_NAME)
        .set_wait_time(config.wait.min(), config.wait.max())?
        .register_transaction(
            transaction!(start_session)
                .set_name("on_session_start")
                .set_on_start(),
        );

    for (kind, weight) in config.weights.enabled() {
        let transaction = Transaction::new(task_function(kind, Arc::clone(&config)))
            .set_name(kind.name())
            .set_weight(weight)?;
        scenario = scenario.register_transaction(transaction);
    }

    Ok(scenario)
}

fn task_function(kind: TaskKind, config: Arc<LoadTestConfig>) -> TransactionFunction {
    match kind {
        TaskKind::CreateAndGetUser => Arc::new(move |user| {
            let config = Arc::clone(&config);
            let payload = UserPayload::generate(&mut rand::thread_rng());
            Box::pin(create_and_get_user(user, config, payload))
        }),
        TaskKind::HealthCheck => Arc::new(move |user| {
            let config = Arc::clone(&config);
            Box::pin(health_check(user, config))
        }),
    }
}

async fn start_session(user: &mut GooseUser) -> TransactionResult {
    let mut virtual_user = VirtualUser::new();
    virtual_user.on_session_start();
    user.set_session_data(virtual_user);
    Ok(())
}

fn take_session(user: &GooseUser) -> VirtualUser {
    user.get_session_data::<VirtualUser>()
        .cloned()
        .unwrap_or_default()
}

async fn create_and_get_user(
    user: &mut GooseUser,
    config: Arc<LoadTestConfig>,
    payload: UserPayload,
) -> TransactionResult {
    let mut virtual_user = take_session(user);
    let result = virtual_user
        .create_and_get_user(&mut GooseHarness::new(user), &config, payload)
        .await;
    user.set_session_data(virtual_user);
    result.map(finished)
}

async fn health_check(user: &mut GooseUser, config: Arc<LoadTestConfig>) -> TransactionResult {
    let mut virtual_user = take_session(user);
    let result = virtual_user
        .health_check(&mut GooseHarness::new(user), &config)
        .await;
    user.set_session_data(virtual_user);
    result.map(finished)
}

fn finished(outcome: TaskOutcome) {
    debug!(?outcome, "task finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_method_mapping() {
        assert!(matches!(goose_method(&Method::GET), GooseMethod::Get));
        assert!(matches!(goose_method(&Method::POST), GooseMethod::Post));
        assert!(matches!(goose_method(&Method::DELETE), GooseMethod::Delete));
        assert!(matches!(goose_method(&Method::OPTIONS), GooseMethod::Get));
    }

    #[test]
    fn test_scenario_builds_with_defaults() {
        let scenario = scenario(Arc::new(LoadTestConfig::default())).unwrap();
        assert_eq!(scenario.name, SCENARIO_NAME);
        // on-start hook plus both tasks
        assert_eq!(scenario.transactions.len(), 3);
        assert!(scenario.transactions[0].on_start);
        assert_eq!(
            scenario.transaction_wait,
            Some((Duration::from_secs(1), Duration::from_secs(5)))
        );
        assert_eq!(scenario.transactions[1].name, TaskKind::CreateAndGetUser.name());
        assert_eq!(scenario.transactions[2].name, TaskKind::HealthCheck.name());
    }

    #[test]
    fn test_scenario_skips_disabled_tasks() {
        let mut config = LoadTestConfig::default();
        config.weights.create_and_get_user = 0;
        config.weights.health_check = 3;
        let scenario = scenario(Arc::new(config)).unwrap();
        assert_eq!(scenario.transactions.len(), 2);
        assert_eq!(scenario.transactions[1].name, TaskKind::HealthCheck.name());
        assert_eq!(scenario.transactions[1].weight, 3);
    }

    #[test]
    fn test_scenario_uses_configured_wait() {
        let config = LoadTestConfig::from_lookup(|name| match name {
            "LOADTEST_WAIT_MIN_SECS" => Some("2".to_string()),
            "LOADTEST_WAIT_MAX_SECS" => Some("9".to_string()),
            _ => None,
        });
        let scenario = scenario(Arc::new(config)).unwrap();
        assert_eq!(
            scenario.transaction_wait,
            Some((Duration::from_secs(2), Duration::from_secs(9)))
        );
    }

    #[test]
    fn test_scenario_rejects_inverted_wait() {
        let mut config = LoadTestConfig::default();
        config.wait = crate::task::WaitPolicy::new(Duration::from_secs(5), Duration::from_secs(1));
        assert!(scenario(Arc::new(config)).is_err());
    }
}
