//! Two-phase write protocol used by CREATE and APPEND
//!
//! The NameNode never accepts file bytes itself. Phase one asks it where the data
//! should go and gets back a redirect to a DataNode; phase two sends the payload
//! there. Neither phase is retried here: a retry has to start again at phase one
//! because the DataNode chosen may differ between attempts.

use log::debug;
use reqwest::header::LOCATION;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::{ProtocolError, Result};
use crate::executor::{error_from_response, send};
use crate::transport::{HttpRequest, RequestBody, Transport};
use crate::url::Op;

/// Body of a redirect answered with `noredirect=true`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LocationResponse {
    location: String,
}

/// Phase one: obtain the DataNode location for a write
///
/// Redirects are not followed. Any status of 400 or above is returned as an
/// error straight away.
pub async fn negotiate(
    transport: &dyn Transport,
    method: Method,
    url: Url,
    cancel: Option<&CancellationToken>,
) -> Result<Url> {
    let request = HttpRequest::new(method, url.clone()).without_redirects();
    let response = send(transport, request, cancel).await?;

    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(error_from_response(response, None).await.into());
    }

    let location = match response.header(LOCATION).map(str::to_owned) {
        Some(location) => location,
        None => {
            let body = response.bytes().await?;
            serde_json::from_slice::<LocationResponse>(&body)
                .map_err(|e| {
                    ProtocolError::parse("redirect location missing", e)
                        .with_status(status)
                        .with_body(String::from_utf8_lossy(&body))
                })?
                .location
        }
    };

    let target = url.join(&location).map_err(|e| {
        ProtocolError::parse(format!("invalid redirect location {location:?}"), e).with_status(status)
    })?;
    debug!("{status} redirect to {target}");
    Ok(target)
}

/// Phase two: send the payload to the negotiated location
///
/// Succeeds only on `expected`; any other status becomes an error carrying the
/// DataNode's response body and `failure` as context.
pub async fn transfer(
    transport: &dyn Transport,
    method: Method,
    location: Url,
    body: RequestBody,
    expected: StatusCode,
    failure: &str,
    cancel: Option<&CancellationToken>,
) -> Result<()> {
    let request = HttpRequest::new(method, location).with_body(body);
    let response = send(transport, request, cancel).await?;

    if response.status() == expected {
        return Ok(());
    }
    Err(error_from_response(response, Some(failure)).await.into())
}

/// Run both phases for a CREATE or APPEND against `url`
pub async fn write(
    transport: &dyn Transport,
    op: Op,
    url: Url,
    body: RequestBody,
    cancel: Option<&CancellationToken>,
) -> Result<()> {
    let (expected, failure) = match op {
        Op::Append => (StatusCode::OK, "file not appended, see details"),
        _ => (StatusCode::CREATED, "file not created, see details"),
    };

    let method = op.method();
    let location = negotiate(transport, method.clone(), url, cancel).await?;
    transfer(transport, method, location, body, expected, failure, cancel).await
}
