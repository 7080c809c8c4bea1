//! Outbound request forwarding.
//!
//! # Responsibilities
//! - Select an instance for the target service
//! - Rebuild the request for the upstream (method, body, path, headers)
//! - Execute it within the request timeout, body included
//! - Relay the upstream response untouched, or classify the failure
//!
//! # Request States
//! ```text
//! received → instance-selected → outbound-sent → upstream-responded → relayed
//!                                              ↘ transport-failed   → 503
//! ```
//!
//! # Design Decisions
//! - Upstream 4xx/5xx are relayed verbatim; they are not gateway errors
//! - No retry with reselection within one inbound request
//! - Dropping the inbound request future drops the outbound call

use std::error::Error as _;
use std::net::IpAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, Uri},
    response::Response,
    BoxError,
};
use futures_util::{stream, StreamExt};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::TimeoutConfig;
use crate::error::GatewayError;
use crate::load_balancer::Selector;
use crate::security::headers::{carries_body, outbound_headers, strip_hop_by_hop};

pub struct Forwarder {
    selector: Selector,
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(selector: Selector, timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect()));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            selector,
            client,
            timeout: timeouts.request(),
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Forward `request` to an instance of `service` at `path_and_query`.
    ///
    /// `Ok` carries whatever the upstream answered, including error statuses.
    /// `Err` means no instance was available or the call never produced a response.
    pub async fn forward(
        &self,
        request: Request<Body>,
        service: &str,
        path_and_query: &str,
        client_ip: IpAddr,
    ) -> Result<Response, GatewayError> {
        let instance = self.selector.next(service)?;
        let target = instance.url_for(path_and_query);
        let uri: Uri = target
            .parse::<Uri>()
            .map_err(|e| GatewayError::InvalidUpstream(format!("{}: {}", target, e)))?;

        let (parts, body) = request.into_parts();
        let headers = outbound_headers(&parts.headers, &parts.method, client_ip);
        let body = if carries_body(&parts.method) {
            body
        } else {
            Body::empty()
        };

        let mut outbound = Request::builder()
            .method(parts.method.clone())
            .uri(uri)
            .body(body)
            .map_err(|e| GatewayError::InvalidUpstream(e.to_string()))?;
        *outbound.headers_mut() = headers;

        tracing::debug!(
            service = %service,
            instance = %instance.id,
            method = %parts.method,
            target = %target,
            "Forwarding request"
        );

        // One deadline covers the response head and the whole body.
        let deadline = time::Instant::now() + self.timeout;
        let pending = time::timeout_at(deadline, self.client.request(outbound));
        let response: hyper::Response<Incoming> = match pending.await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let detail = match e.source() {
                    Some(source) => format!("{}: {}", e, source),
                    None => e.to_string(),
                };
                tracing::error!(
                    service = %service,
                    instance = %instance.id,
                    target = %target,
                    error = %detail,
                    "Upstream transport failure"
                );
                return Err(GatewayError::Transport(detail));
            }
            Err(_) => {
                tracing::error!(
                    service = %service,
                    instance = %instance.id,
                    target = %target,
                    timeout = ?self.timeout,
                    "Upstream request timed out"
                );
                return Err(GatewayError::UpstreamTimeout(self.timeout));
            }
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        parts.headers.remove(header::TRANSFER_ENCODING);

        tracing::debug!(
            service = %service,
            instance = %instance.id,
            status = %parts.status,
            "Upstream responded"
        );

        let body = bounded_body(body, deadline, self.timeout, service.to_string());
        Ok(Response::from_parts(parts, body))
    }
}

/// Relay `body` until `deadline`; past it the stream fails and the client
/// connection is aborted instead of held open by a stalled upstream.
fn bounded_body(body: Incoming, deadline: time::Instant, timeout: Duration, service: String) -> Body {
    let frames = Body::new(body).into_data_stream();
    let bounded = stream::unfold(Some(frames), move |state| {
        let service = service.clone();
        async move {
            let mut frames = state?;
            match time::timeout_at(deadline, frames.next()).await {
                Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(frames))),
                Ok(Some(Err(e))) => Some((Err(BoxError::from(e)), None)),
                Ok(None) => None,
                Err(_) => {
                    tracing::error!(service = %service, timeout = ?timeout, "Upstream body exceeded request timeout");
                    Some((Err(BoxError::from(GatewayError::UpstreamTimeout(timeout))), None))
                }
            }
        }
    });
    Body::from_stream(bounded)
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("selector", &self.selector)
            .field("timeout", &self.timeout)
            .finish()
    }
}
