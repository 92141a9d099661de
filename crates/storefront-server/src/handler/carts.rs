//! Cart handlers.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use storefront_core::types::{ArtifactKey, Product};

use super::response::CartItemQueued;
use crate::extract::Json;
use crate::handler::{ErrorKind, Result};
use crate::pipeline::{IngestError, intake, persistence};
use crate::service::ServiceState;

/// Tracing target for cart operations.
const TRACING_TARGET: &str = "storefront_server::handler::carts";

/// Lists the products stored in the cart container.
///
/// Objects that are not cart artifacts, or whose content no longer decodes,
/// are skipped.
#[tracing::instrument(skip_all)]
async fn list_cart(State(service_state): State<ServiceState>) -> Result<Json<Vec<Product>>> {
    let store = &service_state.blob_store;
    let container = &service_state.config.cart_container;

    let keys = store.list(container).await?;
    let mut products = Vec::with_capacity(keys.len());

    for key in keys.iter().filter(|key| ArtifactKey::matches(key)) {
        let Some(bytes) = store.get(container, key).await? else {
            continue;
        };

        let decoded = std::str::from_utf8(&bytes)
            .map_err(|e| e.to_string())
            .and_then(|text| Product::from_json_case_insensitive(text).map_err(|e| e.to_string()));

        match decoded {
            Ok(product) => products.push(product),
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    container = %container,
                    key = %key,
                    error = %err,
                    "Skipping unreadable cart artifact"
                );
            }
        }
    }

    tracing::debug!(
        target: TRACING_TARGET,
        count = products.len(),
        "Listed cart products"
    );

    Ok(Json(products))
}

/// Checks a product body and places it on the cart queue.
///
/// The body is validated the same way the ingestion pipeline does it, so a
/// request that is accepted here is not discarded by the worker.
#[tracing::instrument(skip_all)]
async fn add_to_cart(
    State(service_state): State<ServiceState>,
    body: String,
) -> Result<(StatusCode, Json<CartItemQueued>)> {
    let product = intake::validate_message(Some(&body))
        .and_then(persistence::decode_product)
        .map_err(|err| {
            tracing::debug!(
                target: TRACING_TARGET,
                kind = %err.kind(),
                error = %err,
                "Rejected cart item"
            );
            invalid_product(&err)
        })?;

    let payload = serde_json::to_string(&product).map_err(|err| {
        ErrorKind::BadRequest
            .with_message("Product cannot be encoded")
            .with_context(err.to_string())
    })?;

    let queue = &service_state.cart_queue;
    queue.send(&payload).await?;

    tracing::info!(
        target: TRACING_TARGET,
        queue = %queue.name(),
        product_id = product.id,
        "Cart item queued"
    );

    Ok((StatusCode::ACCEPTED, Json(CartItemQueued::new(queue.name()))))
}

fn invalid_product(err: &IngestError) -> crate::handler::Error<'static> {
    let message = match err {
        IngestError::Validation => "Request body is empty",
        IngestError::Format(_) => "Invalid JSON syntax in request body",
        IngestError::Decode(_) | IngestError::Encode(_) | IngestError::Store(_) => {
            "Request body is not a product"
        }
    };

    ErrorKind::BadRequest
        .with_message(message)
        .with_resource("cart")
        .with_context(err.to_string())
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/cart", get(list_cart).post(add_to_cart))
}
