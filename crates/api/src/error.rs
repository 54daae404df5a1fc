//! Error responses.
//!
//! Handlers return `Result<_, ApiError>`; every domain error converts into
//! [`ApiError`] through [`AppError`], which fixes the status code and the
//! `error` field of the body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use depot_core::adjustment::AdjustmentError;
use depot_core::fulfillment::FulfillmentError;
use depot_core::ledger::LedgerError;
use depot_core::permission::AccessError;
use depot_core::purchasing::PurchasingError;
use depot_shared::AppError;

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Builds a 400 response for malformed input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

impl From<PurchasingError> for ApiError {
    fn from(err: PurchasingError) -> Self {
        Self(err.into())
    }
}

impl From<AdjustmentError> for ApiError {
    fn from(err: AdjustmentError) -> Self {
        Self(err.into())
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        Self(err.into())
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match &err {
            AppError::InsufficientStock {
                available,
                requested,
            } => json!({
                "error": err.error_code(),
                "message": err.to_string(),
                "available": available,
                "requested": requested,
            }),
            _ if err.is_internal() => {
                error!(error = %err, "Request failed");
                json!({
                    "error": err.error_code(),
                    "message": "An error occurred",
                })
            }
            _ => json!({
                "error": err.error_code(),
                "message": err.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_insufficient_stock_body() {
        let err: ApiError = LedgerError::InsufficientStock {
            available: dec!(3),
            requested: dec!(5),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "INSUFFICIENT_STOCK");
        assert_eq!(body["available"], "3");
        assert_eq!(body["requested"], "5");
    }

    #[tokio::test]
    async fn test_database_details_are_hidden() {
        let response = ApiError(AppError::Database("relation stocks missing".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["message"], "An error occurred");
    }

    #[tokio::test]
    async fn test_invalid_state_is_conflict() {
        let err: ApiError = PurchasingError::AlreadyReceived(depot_shared::types::PurchaseOrderId::new()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "INVALID_STATE");
    }
}
