/**
 * Error Conversion
 *
 * Turns unsuccessful HTTP responses from the REST and storage APIs into
 * `BackendError`s.
 *
 * # Response Format
 *
 * PostgREST answers errors with
 * ```json
 * { "code": "42P01", "message": "relation does not exist", "details": null, "hint": null }
 * ```
 * and the storage API with `{ "statusCode": "404", "error": "...", "message": "..." }`.
 * The `message` field is used when present; otherwise the raw body is kept.
 */

use reqwest::Response;
use crate::backend::error::types::BackendError;

/// Convert a non-success response into a `BackendError::HttpError`
pub async fn error_from_response(response: Response) -> BackendError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());

    BackendError::http(status.as_u16(), error_message(&body, status.as_str()))
}

fn error_message(body: &str, fallback: &str) -> String {
    if body.trim().is_empty() {
        return fallback.to_string();
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => match json.get("message").and_then(|m| m.as_str()) {
            Some(message) => message.to_string(),
            None => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
