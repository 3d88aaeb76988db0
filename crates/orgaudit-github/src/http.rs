//! Shared HTTP response helpers.
//!
//! Centralizes status-code checks so the gateway methods stay focused on
//! request construction and response mapping:
//! - **404** → [`GatewayError::NotFound`] (the absence signal)
//! - **429**, or **403** with an exhausted quota or a `Retry-After` header
//!   (secondary limits) → [`GatewayError::RateLimited`]
//! - any other non-success → [`GatewayError::Api`]

use orgaudit_core::GatewayError;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Check an HTTP response for error conditions; `what` names the resource.
pub async fn check_response(
    resp: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, GatewayError> {
    let status = resp.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound(what.to_string()));
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || is_quota_exhausted(&resp) {
        return Err(GatewayError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !status.is_success() {
        return Err(GatewayError::Api {
            status: status.as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// GitHub answers 403 once the primary limit is used up, and 403 with
/// `Retry-After` when a secondary limit trips.
fn is_quota_exhausted(resp: &reqwest::Response) -> bool {
    if resp.status() != reqwest::StatusCode::FORBIDDEN {
        return false;
    }
    let headers = resp.headers();
    headers.contains_key(reqwest::header::RETRY_AFTER)
        || headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            == Some("0")
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Turn the 422 GitHub answers for a duplicate ref into `AlreadyExists`.
pub fn existing_ref(err: GatewayError, what: &str) -> GatewayError {
    match err {
        GatewayError::Api { status: 422, message } if message.contains("already exists") => {
            GatewayError::AlreadyExists(what.to_string())
        }
        other => other,
    }
}

/// Percent-encode every segment of a slash-separated path.
pub fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
