//! JSON response envelope shared by every endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// `{success, message, data?, error?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize = Value> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse {
    pub fn failure(message: impl Into<String>, error: Option<Value>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error,
        }
    }
}

/// Pairs an envelope with the status it is sent under
pub struct Envelope<T: Serialize = Value>(pub StatusCode, pub ApiResponse<T>);

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_omits_error() {
        let body = serde_json::to_value(ApiResponse::success("ok", json!({"a": 1}))).unwrap();
        assert_eq!(body, json!({"success": true, "message": "ok", "data": {"a": 1}}));
    }

    #[test]
    fn test_failure_omits_data() {
        let body =
            serde_json::to_value(ApiResponse::failure("nope", Some(json!("why")))).unwrap();
        assert_eq!(body, json!({"success": false, "message": "nope", "error": "why"}));

        let body = serde_json::to_value(ApiResponse::failure("bare", None)).unwrap();
        assert_eq!(body, json!({"success": false, "message": "bare"}));
    }

    #[test]
    fn test_envelope_status() {
        let response = Envelope(StatusCode::CREATED, ApiResponse::success("made", 1)).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
