use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Races `call` against a timer. The losing call is dropped.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(deadline)),
    }
}

/// Rejects non-2xx responses and parses the body as JSON.
pub async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::UpstreamStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }

    // Read as text first so an unparseable body shows up as malformed, not as a transport error
    let body = response.text().await?;

    Ok(serde_json::from_str(&body)?)
}
