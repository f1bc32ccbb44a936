//! Error types for model invocations.
//!
//! Every variant is fatal to the invocation that raised it; nothing is
//! retried or recovered internally. Consumers that want the last good
//! partial text must capture it from the emitted stream before the error
//! surfaces.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// Errors surfaced by model invocations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A logit-bias entry did not tokenize to exactly one token id.
    #[error(
        "cannot set a bias of {bias} for {token:?}: biases can only be set for strings that encode to a single token"
    )]
    InvalidTokenBias { token: String, bias: f32 },

    /// A rendered prompt node is not a recognized chat message role.
    #[error("invalid prompt structure: <{0}> is not a system, user, or assistant message")]
    InvalidPromptStructure(String),

    /// The upstream API answered with a non-2xx status.
    ///
    /// `message` is the single human-readable line; the remaining fields are
    /// attached for programmatic inspection. `error_response` is `None` when
    /// the body was not valid JSON.
    #[error("{message}")]
    Api {
        message: String,
        status: StatusCode,
        headers: HeaderMap,
        body: String,
        error_response: Option<serde_json::Value>,
    },

    /// An SSE data frame carried a payload that could not be decoded.
    #[error("malformed event stream: {0}")]
    MalformedStream(String),

    /// Transport-level failure (connect, TLS, mid-stream I/O).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A request parameter was rejected before any network activity.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ClientError {
    /// Build an [`ClientError::Api`] from a drained upstream response.
    ///
    /// When the body parses as JSON carrying a string at `error.message`,
    /// that message is appended to the one-line summary; a parse failure is
    /// swallowed and the error is raised without a structured payload.
    pub(crate) fn api_error(
        operation: &str,
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    ) -> Self {
        let error_response = serde_json::from_str::<serde_json::Value>(&body).ok();
        let mut message = format!(
            "{operation} request failed with status code {}",
            status.as_u16()
        );
        if let Some(detail) = error_response
            .as_ref()
            .and_then(|v| v.pointer("/error/message"))
            .and_then(|v| v.as_str())
        {
            message.push_str(": ");
            message.push_str(detail);
        }
        Self::Api {
            message,
            status,
            headers,
            body,
            error_response,
        }
    }

    /// HTTP status attached to this error, when one exists.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_appends_upstream_message() {
        let body = r#"{"error":{"message":"bad request"}}"#.to_string();
        let err = ClientError::api_error(
            "createCompletion",
            StatusCode::NOT_FOUND,
            HeaderMap::new(),
            body.clone(),
        );
        assert_eq!(
            err.to_string(),
            "createCompletion request failed with status code 404: bad request"
        );
        match err {
            ClientError::Api {
                error_response,
                body: raw,
                ..
            } => {
                assert_eq!(raw, body);
                let detail = error_response.unwrap();
                assert_eq!(
                    detail.pointer("/error/message").and_then(|v| v.as_str()),
                    Some("bad request")
                );
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn api_error_without_json_body_keeps_plain_message() {
        let err = ClientError::api_error(
            "createChatCompletion",
            StatusCode::NOT_FOUND,
            HeaderMap::new(),
            "<html>not json</html>".to_string(),
        );
        assert_eq!(
            err.to_string(),
            "createChatCompletion request failed with status code 404"
        );
        match err {
            ClientError::Api { error_response, .. } => assert!(error_response.is_none()),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn api_error_ignores_non_string_error_message() {
        let err = ClientError::api_error(
            "createCompletion",
            StatusCode::INTERNAL_SERVER_ERROR,
            HeaderMap::new(),
            r#"{"error":{"message":42}}"#.to_string(),
        );
        assert_eq!(
            err.to_string(),
            "createCompletion request failed with status code 500"
        );
    }

    #[test]
    fn status_code_accessor() {
        let err = ClientError::api_error(
            "createCompletion",
            StatusCode::TOO_MANY_REQUESTS,
            HeaderMap::new(),
            String::new(),
        );
        assert_eq!(err.status_code(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(
            ClientError::Http("connect refused".to_string()).status_code(),
            None
        );
    }
}
