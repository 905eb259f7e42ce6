use reqwest::StatusCode;
use sparql_index_common::error::EndpointError;
use std::time::Duration;

/// Maps an unsuccessful HTTP status to an [EndpointError].
pub(crate) fn classify_status(status: StatusCode, body: String) -> EndpointError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => EndpointError::Timeout(None),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EndpointError::Access {
            status: status.as_u16(),
        },
        _ => EndpointError::HttpStatus {
            status: status.as_u16(),
            body,
        },
    }
}

/// Maps a transport-level failure to an [EndpointError].
pub(crate) fn classify_transport(error: reqwest::Error, timeout: Option<Duration>) -> EndpointError {
    if error.is_timeout() {
        return EndpointError::Timeout(timeout);
    }
    if let Some(status) = error.status() {
        return classify_status(status, error.to_string());
    }
    EndpointError::Transport(Box::new(error))
}

/// Extracts the media type of a `Content-Type` header value, without parameters.
pub(crate) fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}
