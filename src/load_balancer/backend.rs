//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server by its parsed address
//! - Track liveness, in-flight connections, latency and consecutive failures
//! - Forward a request to the upstream while accounting for the connection
//!
//! # Design Decisions
//! - Every mutable field is an independent atomic; liveness is eventually
//!   consistent between the health monitor and the request path
//! - The connection count is held by a RAII guard that lives until the
//!   response body is finished (or dropped), so no exit path can skip the
//!   decrement

use std::fmt;
use std::ops::Deref;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response, Uri, Version};
use http_body::{Body as HttpBody, Frame, SizeHint};
use hyper::body::{Bytes, Incoming};
use url::{Position, Url};

use crate::health::passive;
use crate::http::client::HttpClient;
use crate::load_balancer::error::{ForwardError, LoadBalancerError, LoadBalancerResult};
use crate::observability::metrics;

/// A single upstream server.
pub struct Backend {
    url: Url,
    /// `host[:port]` as written in the configured address.
    authority: String,
    host_header: HeaderValue,
    /// Configured path prefix without trailing slash (empty for `/`).
    base_path: String,
    weight: u32,

    alive: AtomicBool,
    connections: AtomicUsize,
    response_time_us: AtomicU64,
    fail_count: AtomicU32,
    /// Unix millis of the last probe, 0 when never probed.
    last_check_ms: AtomicU64,
}

impl Backend {
    /// Parse `address` and create a backend with the given weight.
    ///
    /// Addresses without a scheme are treated as `http://`.
    pub fn new(address: &str, weight: u32) -> LoadBalancerResult<Self> {
        let url = Self::parse_address(address)?;
        let authority = url[Position::BeforeHost..Position::AfterPort].to_string();
        let host_header =
            HeaderValue::from_str(&authority).map_err(|e| LoadBalancerError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        let base_path = url.path().trim_end_matches('/').to_string();

        Ok(Self {
            url,
            authority,
            host_header,
            base_path,
            weight,
            alive: AtomicBool::new(true),
            connections: AtomicUsize::new(0),
            response_time_us: AtomicU64::new(0),
            fail_count: AtomicU32::new(0),
            last_check_ms: AtomicU64::new(0),
        })
    }

    /// Normalise a configured address into the URL used as backend identity.
    pub fn parse_address(address: &str) -> LoadBalancerResult<Url> {
        let raw = address.trim();
        let invalid = |reason: String| LoadBalancerError::InvalidAddress {
            address: raw.to_string(),
            reason,
        };

        let candidate = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };
        let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;

        if url.scheme() != "http" {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }
        Ok(url)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Normalised address string (identity for lookups and labels).
    pub fn address(&self) -> &str {
        self.url.as_str()
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Whether this backend was registered under `url`.
    pub fn matches(&self, url: &Url) -> bool {
        &self.url == url
    }

    // --- Liveness ---

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Set liveness, returning the previous value.
    pub fn set_alive(&self, alive: bool) -> bool {
        self.alive.swap(alive, Ordering::AcqRel)
    }

    // --- Connections ---

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn inc_connections(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement the connection count; a no-op at zero.
    pub fn dec_connections(&self) {
        let _ = self
            .connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Increment the connection count and return a guard that undoes it on drop.
    pub fn connection_guard(self: &Arc<Self>) -> BackendConnectionGuard {
        self.inc_connections();
        BackendConnectionGuard {
            backend: self.clone(),
        }
    }

    // --- Latency, failures, probes ---

    pub fn response_time(&self) -> Duration {
        Duration::from_micros(self.response_time_us.load(Ordering::Relaxed))
    }

    pub fn update_response_time(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.response_time_us.store(micros, Ordering::Relaxed);
    }

    pub fn fail_count(&self) -> u32 {
        self.fail_count.load(Ordering::Relaxed)
    }

    /// Count one more consecutive failure, returning the new count.
    pub fn record_failure(&self) -> u32 {
        self.fail_count.fetch_add(1, Ordering::Relaxed).saturating_add(1)
    }

    pub fn reset_failure_count(&self) {
        self.fail_count.store(0, Ordering::Relaxed);
    }

    pub fn mark_checked(&self, at: SystemTime) {
        let millis = at
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        self.last_check_ms.store(millis, Ordering::Relaxed);
    }

    pub fn last_check(&self) -> Option<SystemTime> {
        match self.last_check_ms.load(Ordering::Relaxed) {
            0 => None,
            millis => Some(UNIX_EPOCH + Duration::from_millis(millis)),
        }
    }

    // --- Forwarding ---

    /// Absolute URI on this backend for the given path and query.
    pub fn target_uri(&self, path_and_query: &str) -> Result<Uri, axum::http::Error> {
        let path = if path_and_query.starts_with('/') {
            format!("{}{}", self.base_path, path_and_query)
        } else {
            format!("{}/{}", self.base_path, path_and_query)
        };
        Uri::builder()
            .scheme(self.url.scheme())
            .authority(self.authority.as_str())
            .path_and_query(path)
            .build()
    }

    /// Forward `request` to this backend.
    ///
    /// The connection count is held until the returned body completes. A
    /// transport failure, or no response headers within `timeout`, marks the
    /// backend down immediately. The response time is updated on every outcome.
    pub async fn forward(
        self: &Arc<Self>,
        client: &HttpClient,
        request: Request<Body>,
        timeout: Duration,
    ) -> Result<Response<Body>, ForwardError> {
        let guard = self.connection_guard();
        let outbound = self.rewrite(request)?;
        let start = Instant::now();

        match tokio::time::timeout(timeout, client.request(outbound)).await {
            Ok(Ok(response)) => {
                let elapsed = start.elapsed();
                let status = response.status();
                self.update_response_time(elapsed);
                passive::observe_response(self, status);
                metrics::record_forward(self.address(), status.as_u16(), elapsed);

                let (parts, body) = response.into_parts();
                let body = TrackedBody {
                    inner: Box::pin(body),
                    _guard: guard,
                };
                Ok(Response::from_parts(parts, Body::new(body)))
            }
            Ok(Err(e)) => {
                let elapsed = start.elapsed();
                self.update_response_time(elapsed);
                passive::observe_transport_failure(self, &e);
                metrics::record_forward(self.address(), 502, elapsed);
                Err(ForwardError::Transport(e))
            }
            Err(elapsed_err) => {
                let elapsed = start.elapsed();
                self.update_response_time(elapsed);
                passive::observe_transport_failure(self, &elapsed_err);
                metrics::record_forward(self.address(), 502, elapsed);
                Err(ForwardError::Timeout(timeout))
            }
        }
    }

    fn rewrite(&self, request: Request<Body>) -> Result<Request<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        parts.uri = self.target_uri(path_and_query)?;
        parts.version = Version::HTTP_11;

        if let Some(original_host) = parts.headers.get(header::HOST).cloned() {
            parts.headers.insert("x-forwarded-host", original_host);
        }
        parts
            .headers
            .insert("x-origin-host", self.host_header.clone());
        parts
            .headers
            .insert("x-forwarded-proto", HeaderValue::from_static("http"));
        parts.headers.insert(header::HOST, self.host_header.clone());

        Ok(Request::from_parts(parts, body))
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("url", &self.url.as_str())
            .field("weight", &self.weight)
            .field("alive", &self.is_alive())
            .field("connections", &self.connections())
            .field("fail_count", &self.fail_count())
            .finish()
    }
}

/// A RAII guard that manages the active connection count.
#[derive(Debug)]
pub struct BackendConnectionGuard {
    backend: Arc<Backend>,
}

impl Deref for BackendConnectionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendConnectionGuard {
    fn drop(&mut self) {
        self.backend.dec_connections();
    }
}

/// Upstream response body that keeps the connection guard alive.
struct TrackedBody {
    inner: Pin<Box<Incoming>>,
    _guard: BackendConnectionGuard,
}

impl HttpBody for TrackedBody {
    type Data = Bytes;
    type Error = hyper::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.inner.as_mut().poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(addr: &str) -> Arc<Backend> {
        Arc::new(Backend::new(addr, 1).unwrap())
    }

    #[test]
    fn test_parse_adds_scheme_and_keeps_port() {
        let b = backend("127.0.0.1:8081");
        assert_eq!(b.address(), "http://127.0.0.1:8081/");
        assert_eq!(b.authority, "127.0.0.1:8081");
        assert!(b.is_alive());
    }

    #[test]
    fn test_parse_rejects_bad_addresses() {
        assert!(Backend::new("://invalid", 1).is_err());
        assert!(Backend::new("https://example.com", 1).is_err());
        assert!(Backend::new("http://", 1).is_err());
    }

    #[test]
    fn test_decrement_saturates_at_zero() {
        let b = backend("http://localhost:9000");
        b.dec_connections();
        assert_eq!(b.connections(), 0);

        b.inc_connections();
        b.inc_connections();
        b.dec_connections();
        b.dec_connections();
        b.dec_connections();
        assert_eq!(b.connections(), 0);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let b = backend("http://localhost:9000");
        {
            let _g1 = b.connection_guard();
            let _g2 = b.connection_guard();
            assert_eq!(b.connections(), 2);
        }
        assert_eq!(b.connections(), 0);
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let b = backend("http://localhost:9000");
        let cloned = b.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = cloned.connection_guard();
            panic!("handler blew up");
        }));
        assert!(result.is_err());
        assert_eq!(b.connections(), 0);
    }

    #[test]
    fn test_concurrent_accounting_never_negative() {
        let b = backend("http://localhost:9000");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let b = b.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        let _g = b.connection_guard();
                        b.dec_connections();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(b.connections(), 0);
    }

    #[test]
    fn test_failure_bookkeeping() {
        let b = backend("http://localhost:9000");
        assert_eq!(b.record_failure(), 1);
        assert_eq!(b.record_failure(), 2);
        b.reset_failure_count();
        assert_eq!(b.fail_count(), 0);
    }

    #[test]
    fn test_last_check_roundtrip() {
        let b = backend("http://localhost:9000");
        assert!(b.last_check().is_none());
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        b.mark_checked(at);
        assert_eq!(b.last_check(), Some(at));
    }

    #[test]
    fn test_target_uri_joins_base_path() {
        let b = backend("http://localhost:9000/api/");
        let uri = b.target_uri("/users?id=7").unwrap();
        assert_eq!(uri.to_string(), "http://localhost:9000/api/users?id=7");

        let root = backend("localhost:9000");
        assert_eq!(
            root.target_uri("/health").unwrap().to_string(),
            "http://localhost:9000/health"
        );
    }

    #[test]
    fn test_rewrite_sets_forwarding_headers() {
        let b = backend("http://127.0.0.1:9000");
        let request = Request::get("/x")
            .header(header::HOST, "lb.example.com")
            .body(Body::empty())
            .unwrap();
        let out = b.rewrite(request).unwrap();
        assert_eq!(out.uri().to_string(), "http://127.0.0.1:9000/x");
        assert_eq!(out.headers()[header::HOST], "127.0.0.1:9000");
        assert_eq!(out.headers()["x-forwarded-host"], "lb.example.com");
        assert_eq!(out.headers()["x-origin-host"], "127.0.0.1:9000");
        assert_eq!(out.headers()["x-forwarded-proto"], "http");
    }
}
