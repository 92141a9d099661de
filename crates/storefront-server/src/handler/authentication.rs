//! Login handler.

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use storefront_core::types::{CUSTOMER_PARTITION, LoginRecord};

use super::request::Credentials;
use super::response::MessageResponse;
use crate::extract::Json;
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for authentication operations.
const TRACING_TARGET: &str = "storefront_server::handler::authentication";

/// Verifies an email and password.
///
/// Unknown emails and wrong passwords both yield
/// `401 Invalid email or password.`; an unknown email still pays for one
/// password verification. A successful login is written to the login share,
/// and failures to write it are logged without affecting the response.
#[tracing::instrument(skip_all)]
async fn login(
    State(service_state): State<ServiceState>,
    request: Option<Json<Credentials>>,
) -> Result<Json<MessageResponse>> {
    let Some(Json(credentials)) = request else {
        tracing::debug!(target: TRACING_TARGET, "Rejected malformed login request");
        return Err(ErrorKind::InvalidAccountDetails.into_error());
    };

    let config = &service_state.config;
    let hasher = &service_state.password_hasher;
    let profile = service_state
        .profile_store
        .get(&config.profile_table, CUSTOMER_PARTITION, &credentials.email)
        .await?;

    let Some(profile) = profile else {
        hasher.verify_dummy_password(&credentials.password);
        tracing::info!(
            target: TRACING_TARGET,
            email = %credentials.email,
            "Login failed: unknown account"
        );
        return Err(ErrorKind::InvalidCredentials.into_error());
    };

    hasher
        .verify_password(&credentials.password, &profile.password_hash)
        .inspect_err(|_| {
            tracing::info!(
                target: TRACING_TARGET,
                email = %credentials.email,
                "Login failed: wrong password"
            );
        })?;

    record_login(&service_state, LoginRecord::now(&profile.email)).await;

    tracing::info!(
        target: TRACING_TARGET,
        email = %profile.email,
        "Customer logged in"
    );

    Ok(Json(MessageResponse::logged_in()))
}

/// Appends the login to the shared report and writes its note file.
async fn record_login(service_state: &ServiceState, record: LoginRecord) {
    let config = &service_state.config;
    let log = &service_state.login_log;

    if let Err(err) = log
        .append(&config.login_share, &config.login_report_file, &record.report_line())
        .await
    {
        tracing::error!(
            target: TRACING_TARGET,
            share = %config.login_share,
            file = %config.login_report_file,
            error = %err,
            "Failed to append to login report"
        );
    }

    let note = record.note_file_name();
    if let Err(err) = log
        .write(&config.login_share, &note, &record.note_body())
        .await
    {
        tracing::error!(
            target: TRACING_TARGET,
            share = %config.login_share,
            file = %note,
            error = %err,
            "Failed to write login note"
        );
    }
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/login", post(login))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use storefront_core::memory::{
        MemoryBlobStore, MemoryLoginLog, MemoryProfileStore, MemoryQueue,
    };
    use storefront_core::store::LoginLog;

    use super::*;
    use crate::handler::test::create_test_server_with_state;
    use crate::service::ServiceConfig;

    fn state(log: &MemoryLoginLog) -> anyhow::Result<ServiceState> {
        Ok(ServiceState::new(
            ServiceConfig::default(),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryProfileStore::new()),
            Arc::new(log.clone()),
            Arc::new(MemoryQueue::new("cartqueue")),
        )?)
    }

    async fn register(server: &axum_test::TestServer) {
        server
            .post("/register")
            .json(&json!({"Email": "ann@example.com", "Password": "s3cret"}))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn login_succeeds_and_is_reported() -> anyhow::Result<()> {
        let log = MemoryLoginLog::new();
        let server = create_test_server_with_state(state(&log)?)?;
        register(&server).await;

        let response = server
            .post("/login")
            .json(&json!({"Email": "ann@example.com", "Password": "s3cret"}))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({"message": "Logged in successfully"}));

        let report = log
            .read("logreport", "login-report.txt")
            .await?
            .ok_or_else(|| anyhow::anyhow!("login report missing"))?;
        assert!(report.ends_with(": ann@example.com logged in\n"));
        assert_eq!(report.lines().count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_alike() -> anyhow::Result<()> {
        let log = MemoryLoginLog::new();
        let server = create_test_server_with_state(state(&log)?)?;
        register(&server).await;

        let wrong = server
            .post("/login")
            .json(&json!({"Email": "ann@example.com", "Password": "nope"}))
            .await;
        let unknown = server
            .post("/login")
            .json(&json!({"Email": "bob@example.com", "Password": "s3cret"}))
            .await;

        wrong.assert_status_unauthorized();
        unknown.assert_status_unauthorized();

        let wrong: serde_json::Value = wrong.json();
        let unknown: serde_json::Value = unknown.json();
        assert_eq!(wrong["message"], "Invalid email or password.");
        assert_eq!(wrong, unknown);

        assert_eq!(log.read("logreport", "login-report.txt").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn full_login_report_does_not_fail_login() -> anyhow::Result<()> {
        let log = MemoryLoginLog::with_max_file_bytes(8);
        let server = create_test_server_with_state(state(&log)?)?;
        register(&server).await;

        server
            .post("/login")
            .json(&json!({"Email": "ann@example.com", "Password": "s3cret"}))
            .await
            .assert_status_ok();
        Ok(())
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() -> anyhow::Result<()> {
        let server = create_test_server_with_state(state(&MemoryLoginLog::new())?)?;

        let response = server.post("/login").text("not json").await;
        response.assert_status_bad_request();
        Ok(())
    }
}
