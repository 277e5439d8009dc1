//! HTTP mapping for `UsageError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use usagewatch_core::error::{ClientCode, UsageError};

/// `UsageError` carried out of a handler.
#[derive(Debug)]
pub struct ApiError(pub UsageError);

impl From<UsageError> for ApiError {
    fn from(e: UsageError) -> Self {
        ApiError(e)
    }
}

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
        ClientCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ClientCode::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
        ClientCode::Upstream => StatusCode::BAD_GATEWAY,
        ClientCode::StateUnavailable | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let body = Json(json!({
            "error": code.as_str(),
            "message": self.0.to_string(),
        }));
        (status_for(code), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn state_unavailable_is_500_with_code_and_message() {
        let resp = ApiError(UsageError::unavailable("batch_queue")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body(), 1 << 16).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["error"], "STATE_UNAVAILABLE");
        assert_eq!(v["message"], "state unavailable: batch_queue");
    }

    #[test]
    fn client_codes_map_to_statuses() {
        assert_eq!(status_for(ClientCode::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_for(ClientCode::QueueFull), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ClientCode::BadRequest), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ClientCode::Upstream), StatusCode::BAD_GATEWAY);
    }
}
