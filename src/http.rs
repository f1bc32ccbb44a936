//! Request issue and upstream error classification.

use reqwest::Response;
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::context::ClientConfig;
use crate::error::ClientError;

/// POST a JSON body to `path` under the configured base URL.
///
/// Non-2xx statuses are NOT turned into errors here; the caller inspects
/// the status via [`ensure_success`] so the body can be drained and
/// classified.
pub(crate) async fn post_json<T>(
    config: &ClientConfig,
    path: &str,
    body: &T,
) -> Result<Response, ClientError>
where
    T: Serialize + ?Sized,
{
    let url = format!("{}{}", config.base_url, path);
    let mut request = config
        .http
        .post(&url)
        .bearer_auth(config.api_key.expose_secret())
        .json(body);
    if let Some(organization) = &config.organization {
        request = request.header("OpenAI-Organization", organization);
    }
    tracing::debug!(%url, "issuing streaming request");
    request
        .send()
        .await
        .map_err(|e| ClientError::Http(format!("failed to send request: {e}")))
}

/// Classify an upstream response by status code.
///
/// Success ([200, 300)) passes the response through untouched. Anything
/// else drains the body to text (consuming the response; classification and
/// event decoding are mutually exclusive on one body), best-effort parses
/// it as a JSON error envelope, and raises [`ClientError::Api`].
pub(crate) async fn ensure_success(
    response: Response,
    operation: &str,
) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        tracing::debug!(
            operation,
            status = status.as_u16(),
            headers = ?response.headers(),
            "request accepted"
        );
        return Ok(response);
    }

    let headers = response.headers().clone();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Http(format!("failed to read error body: {e}")))?;
    Err(ClientError::api_error(operation, status, headers, body))
}
