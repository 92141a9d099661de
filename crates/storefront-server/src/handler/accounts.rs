//! Account registration handler.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use storefront_core::types::CustomerProfile;

use super::request::Credentials;
use super::response::MessageResponse;
use crate::extract::Json;
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for account operations.
const TRACING_TARGET: &str = "storefront_server::handler::accounts";

/// Creates or replaces the customer profile for an email address.
///
/// A missing, malformed or invalid body is answered with the same
/// `400 Invalid email or password.` response.
#[tracing::instrument(skip_all)]
async fn register(
    State(service_state): State<ServiceState>,
    request: Option<Json<Credentials>>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let Some(Json(credentials)) = request.filter(|Json(c)| c.is_valid()) else {
        tracing::debug!(target: TRACING_TARGET, "Rejected registration details");
        return Err(ErrorKind::InvalidAccountDetails.into_error());
    };

    let password_hash = service_state
        .password_hasher
        .hash_password(&credentials.password)?;
    let profile = CustomerProfile::new(&credentials.email, password_hash);

    let table = &service_state.config.profile_table;
    let profiles = &service_state.profile_store;
    profiles.ensure_table(table).await?;
    profiles.upsert(table, &profile).await?;

    tracing::info!(
        target: TRACING_TARGET,
        email = %credentials.email,
        table = %table,
        "Customer registered"
    );

    Ok((StatusCode::CREATED, Json(MessageResponse::registered())))
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/register", post(register))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use storefront_core::memory::{
        MemoryBlobStore, MemoryLoginLog, MemoryProfileStore, MemoryQueue,
    };
    use storefront_core::store::ProfileStore;
    use storefront_core::types::CUSTOMER_PARTITION;

    use super::*;
    use crate::handler::test::create_test_server_with_state;
    use crate::service::ServiceConfig;

    fn state(profiles: &MemoryProfileStore) -> anyhow::Result<ServiceState> {
        Ok(ServiceState::new(
            ServiceConfig::default(),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(profiles.clone()),
            Arc::new(MemoryLoginLog::new()),
            Arc::new(MemoryQueue::new("cartqueue")),
        )?)
    }

    #[tokio::test]
    async fn register_stores_hashed_profile() -> anyhow::Result<()> {
        let profiles = MemoryProfileStore::new();
        let server = create_test_server_with_state(state(&profiles)?)?;

        let response = server
            .post("/register")
            .json(&json!({"Email": "ann@example.com", "Password": "s3cret"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.assert_json(&json!({"message": "User registered successfully."}));

        let profile = profiles
            .get("CustomerProfiles", CUSTOMER_PARTITION, "ann@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("profile not stored"))?;
        assert_eq!(profile.email, "ann@example.com");
        assert!(profile.password_hash.starts_with("$argon2id$"));
        assert!(!profile.password_hash.contains("s3cret"));
        assert!(profile.timestamp.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_invalid_details() -> anyhow::Result<()> {
        let profiles = MemoryProfileStore::new();
        let server = create_test_server_with_state(state(&profiles)?)?;

        for body in [
            json!({"Email": "not-an-email", "Password": "s3cret"}),
            json!({"Email": "ann@example.com", "Password": "  "}),
            json!({"Email": "ann@example.com"}),
            json!(null),
        ] {
            let response = server.post("/register").json(&body).await;
            response.assert_status_bad_request();

            let error: serde_json::Value = response.json();
            assert_eq!(error["message"], "Invalid email or password.");
        }

        let response = server.post("/register").text("{").await;
        response.assert_status_bad_request();

        assert_eq!(profiles.len("CustomerProfiles").await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn register_twice_replaces_profile() -> anyhow::Result<()> {
        let profiles = MemoryProfileStore::new();
        let server = create_test_server_with_state(state(&profiles)?)?;

        for password in ["first", "second"] {
            server
                .post("/register")
                .json(&json!({"email": "ann@example.com", "password": password}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        assert_eq!(profiles.len("CustomerProfiles").await, 1);
        Ok(())
    }
}
