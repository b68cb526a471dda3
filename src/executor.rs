use std::time::Duration;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, ProtocolError, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// How long to wait for an error body before giving up on it
pub const ERROR_BODY_TIMEOUT: Duration = Duration::from_secs(3);

/// Send one request through `transport`, aborting the wait if `cancel` fires
pub async fn send(
    transport: &dyn Transport,
    request: HttpRequest,
    cancel: Option<&CancellationToken>,
) -> Result<HttpResponse> {
    debug!("{} {} via {}", request.method, request.url, transport.identifier());

    match cancel {
        Some(token) => tokio::select! {
            biased;

            _ = token.cancelled() => Err(Error::Cancelled),
            response = transport.send(request) => response,
        },
        None => transport.send(request).await,
    }
}

/// Send one request and turn any non-2xx status into a [`ProtocolError`]
///
/// Successful responses are returned with their body unread.
pub async fn execute(
    transport: &dyn Transport,
    request: HttpRequest,
    cancel: Option<&CancellationToken>,
) -> Result<HttpResponse> {
    let response = send(transport, request, cancel).await?;
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response, None).await.into())
    }
}

/// Build an error from a failed response, consuming its body
///
/// The body is read for at most [`ERROR_BODY_TIMEOUT`]. A body that cannot be
/// read leaves the error without server text but keeps its status.
pub async fn error_from_response(response: HttpResponse, message: Option<&str>) -> ProtocolError {
    let status = response.status();
    let mut err = ProtocolError::from_status(status);
    if let Some(message) = message {
        err = err.with_message(message);
    }

    match tokio::time::timeout(ERROR_BODY_TIMEOUT, response.text()).await {
        Ok(Ok(body)) => err.with_body(body),
        Ok(Err(e)) => {
            warn!("failed to read error body for {status}: {e}");
            err
        }
        Err(_) => {
            warn!("gave up reading error body for {status} after {ERROR_BODY_TIMEOUT:?}");
            err
        }
    }
}
