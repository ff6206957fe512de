//! `tower::Layer`/`Service` adapter wiring [`elp_core::Engine`] into an
//! axum request pipeline.
//!
//! Mirrors the shape of a conventional auth middleware (extract ->
//! decide -> gate) but never returns an error status: PRIME forwards to
//! the inner service, MIRROR/SHADOW short-circuit with a locally
//! rendered 200 OK body after the timing-equalizer delay, and no
//! response ever carries a reality label.

use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use log::debug;
use tower::{Layer, Service};

use elp_core::atoms::constants::{HEADER_MASK, HEADER_NONCE, HEADER_SEAL, HEADER_TIMESTAMP};
use elp_core::{Engine, Outcome, Reality, RequestEnvelope};

/// Layer constructing one [`EwService`] per connection, sharing one
/// [`Engine`] (and therefore one replay table / failure ledger) across
/// the whole process.
#[derive(Clone)]
pub struct EwLayer {
    engine: Arc<Engine>,
}

impl EwLayer {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn from_arc(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl<S> Layer<S> for EwLayer {
    type Service = EwService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EwService {
            inner,
            engine: Arc::clone(&self.engine),
        }
    }
}

#[derive(Clone)]
pub struct EwService<S> {
    inner: S,
    engine: Arc<Engine>,
}

impl<S> Service<Request<Body>> for EwService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let engine = Arc::clone(&self.engine);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let envelope = envelope_from_request(&req);
            let now_ms = elp_core::freshness::now_ms().unwrap_or(envelope.timestamp_ms);
            let decision = engine.decide(&envelope, now_ms);

            debug!(
                target: "elp_axum",
                "{} {} -> {:?}", envelope.context, envelope.path, decision.reality
            );

            match decision.reality {
                // Only a PRIME decision ever reaches the real handler.
                Reality::Prime => inner.call(req).await,
                non_prime => {
                    let body = engine.render_body(non_prime, &envelope, None, now_ms);
                    elp_core::timing::equalize_async(
                        engine.config().equalize_low_ms,
                        engine.config().equalize_high_ms,
                    )
                    .await;
                    Ok(Response::builder()
                        .status(200)
                        .header("content-type", "application/json")
                        .body(Body::from(body))
                        .expect("static response parts are always valid"))
                }
            }
        })
    }
}

fn envelope_from_request(req: &Request<Body>) -> RequestEnvelope {
    let headers = req.headers();

    let mask = header_str(headers, HEADER_MASK).and_then(|v| v.parse::<i64>().ok());
    let seal = header_str(headers, HEADER_SEAL).map(str::to_string);
    let timestamp_ms = header_str(headers, HEADER_TIMESTAMP).and_then(|v| v.parse::<i64>().ok());
    let nonce = header_str(headers, HEADER_NONCE).map(str::to_string);

    RequestEnvelope::new(
        mask,
        seal,
        timestamp_ms,
        nonce,
        req.method().as_str(),
        req.uri().path(),
        fingerprint_of(req),
    )
}

fn header_str<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Opaque per-client identifier for the failure ledger: the peer's
/// socket address if available, falling back to the first hop of
/// `X-Forwarded-For`, falling back to a constant (all such requests
/// share one failure count, which is conservative but never panics).
fn fingerprint_of(req: &Request<Body>) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    if let Some(forwarded) = header_str(req.headers(), "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let candidate = first.trim();
            if candidate.parse::<IpAddr>().is_ok() {
                return candidate.to_string();
            }
        }
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    #[test]
    fn fingerprint_falls_back_to_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(fingerprint_of(&req), "203.0.113.9");
    }

    #[test]
    fn fingerprint_falls_back_to_unknown_without_any_source() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(fingerprint_of(&req), "unknown");
    }

    #[test]
    fn envelope_extraction_reads_all_four_headers() {
        let req = Request::builder()
            .method("GET")
            .uri("/api/v1/resource")
            .header(HEADER_MASK, "5")
            .header(HEADER_SEAL, "deadbeef==")
            .header(HEADER_TIMESTAMP, "123456")
            .header(HEADER_NONCE, "abc")
            .body(Body::empty())
            .unwrap();
        let envelope = envelope_from_request(&req);
        assert_eq!(envelope.mask, 5);
        assert_eq!(envelope.seal, "deadbeef==");
        assert_eq!(envelope.timestamp_ms, 123456);
        assert_eq!(envelope.nonce, "abc");
        assert_eq!(envelope.context, "GET");
        assert_eq!(envelope.path, "/api/v1/resource");
    }

    #[test]
    fn missing_headers_fall_back_to_protocol_defaults() {
        let req = Request::builder()
            .uri("/api/v1/resource")
            .body(Body::empty())
            .unwrap();
        let envelope = envelope_from_request(&req);
        assert_eq!(envelope.mask, -1);
        assert_eq!(envelope.seal, "");
        assert_eq!(envelope.timestamp_ms, 0);
        assert_eq!(envelope.nonce, "");
    }
}
