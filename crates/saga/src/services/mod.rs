//! Ports the coordinator drives, with HTTP and in-process implementations.

pub mod inventory;
pub mod payment;

pub use self::inventory::{HttpInventoryClient, InventoryClient};
pub use self::payment::{HttpPaymentClient, PaymentClient};

use crate::error::SagaError;

/// Turns a non-success response into [`SagaError::Downstream`].
///
/// The body is expected to be the services' `{"error": ...}` shape; any other
/// body is passed through as text.
pub(crate) async fn check_response(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, SagaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or(body);
    Err(SagaError::Downstream {
        service,
        status: status.as_u16(),
        message,
    })
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<common::ErrorResponse>(body)
        .ok()
        .map(|e| e.error)
}
