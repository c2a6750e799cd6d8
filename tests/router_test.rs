//! Routing engine tests against live mock backends.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};

use std::sync::Arc;

use edge_balancer::http::build_client;
use edge_balancer::load_balancer::{BackendPool, SelectionContext, StrategyKind};
use edge_balancer::Router;

mod common;

async fn send(router: &Router, path: &str, ctx: &SelectionContext) -> (StatusCode, String) {
    let request = Request::get(path).body(Body::empty()).unwrap();
    let response = router.handle(request, ctx).await;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn test_metrics_after_backend_goes_down() {
    let backend = common::start_mock_backend("ok").await;
    let config = common::test_config(&[backend]);
    let router = Router::from_config(&config).unwrap();
    let ctx = SelectionContext::new();

    for _ in 0..10 {
        let (status, body) = send(&router, "/", &ctx).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    router
        .mark_backend(&format!("http://{}", backend), false)
        .unwrap();

    for _ in 0..2 {
        let (status, body) = send(&router, "/", &ctx).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "Service unavailable");
    }

    let snapshot = router.snapshot();
    assert_eq!(snapshot.total_requests, 12);
    assert_eq!(snapshot.failed_requests, 2);
    assert_eq!(snapshot.success_rate_label(), "83.33%");
    assert_eq!(snapshot.alive_backends, 0);
    assert_eq!(snapshot.backends[0].connections, 0);
}

#[tokio::test]
async fn test_transport_failure_marks_backend_down() {
    let dead = common::unused_addr().await;
    let config = common::test_config(&[dead]);
    let router = Router::from_config(&config).unwrap();
    let stale = Duration::from_secs(10);
    router.pool().backends()[0].update_response_time(stale);

    let (status, body) = send(&router, "/anything", &SelectionContext::new()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, "Bad Gateway");

    let snapshot = router.snapshot();
    assert_eq!(snapshot.failed_requests, 1);
    assert!(!snapshot.backends[0].alive);
    assert_eq!(snapshot.backends[0].fail_count, 1);
    assert_eq!(snapshot.backends[0].connections, 0);
    assert!(router.pool().backends()[0].response_time() < stale);

    // Nothing left alive: the next request is rejected without forwarding.
    let (status, _) = send(&router, "/", &SelectionContext::new()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_upstream_5xx_is_relayed_not_failed() {
    let backend = common::start_programmable_backend(|_| async { (500, "boom".to_string()) }).await;
    let router = Router::from_config(&common::test_config(&[backend])).unwrap();

    let (status, body) = send(&router, "/", &SelectionContext::new()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "boom");

    let snapshot = router.snapshot();
    assert_eq!(snapshot.failed_requests, 0);
    assert!(snapshot.backends[0].alive);
}

#[tokio::test]
async fn test_round_robin_across_backends() {
    let a = common::start_mock_backend("a").await;
    let b = common::start_mock_backend("b").await;
    let c = common::start_mock_backend("c").await;
    let router = Router::from_config(&common::test_config(&[a, b, c])).unwrap();
    let ctx = SelectionContext::new();

    let mut bodies = Vec::new();
    for _ in 0..6 {
        bodies.push(send(&router, "/", &ctx).await.1);
    }
    assert_eq!(bodies, vec!["a", "b", "c", "a", "b", "c"]);
}

#[tokio::test]
async fn test_ip_hash_is_sticky() {
    let a = common::start_mock_backend("a").await;
    let b = common::start_mock_backend("b").await;
    let c = common::start_mock_backend("c").await;
    let mut config = common::test_config(&[a, b, c]);
    config.strategy = StrategyKind::IpHash;
    let router = Router::from_config(&config).unwrap();

    let mut seen: HashMap<&str, String> = HashMap::new();
    for client in ["10.0.0.1", "10.0.0.2", "192.168.1.50"] {
        let ctx = SelectionContext::with_affinity_key(client);
        let first = send(&router, "/", &ctx).await.1;
        for _ in 0..4 {
            assert_eq!(send(&router, "/", &ctx).await.1, first);
        }
        seen.insert(client, first);
    }
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
async fn test_path_and_query_forwarded() {
    let backend = common::start_programmable_backend(|path| async move { (200, path) }).await;
    let router = Router::from_config(&common::test_config(&[backend])).unwrap();

    let (_, body) = send(&router, "/api/users?page=2", &SelectionContext::new()).await;
    assert_eq!(body, "/api/users?page=2");
}

#[tokio::test]
async fn test_least_connections_avoids_busy_backend() {
    let slow = common::start_slow_backend(Duration::from_millis(300)).await;
    let fast = common::start_mock_backend("fast").await;
    let mut config = common::test_config(&[slow, fast]);
    config.strategy = StrategyKind::LeastConnections;
    let router = std::sync::Arc::new(Router::from_config(&config).unwrap());

    // First request ties at zero and goes to the first backend (slow).
    let busy = router.clone();
    let in_flight = tokio::spawn(async move { send(&busy, "/", &SelectionContext::new()).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    for _ in 0..3 {
        assert_eq!(send(&router, "/", &SelectionContext::new()).await.1, "fast");
    }
    assert_eq!(in_flight.await.unwrap().1, "slow");
}

#[tokio::test]
async fn test_forward_timeout_is_gateway_failure() {
    let hung = common::start_slow_backend(Duration::from_secs(3)).await;
    let fast = common::start_mock_backend("fast").await;
    let config = common::test_config(&[hung, fast]);
    let pool = Arc::new(BackendPool::from_config(&config.backends).unwrap());
    let router = Router::new(
        pool,
        StrategyKind::RoundRobin.build(),
        build_client(Duration::from_millis(200)),
    )
    .with_forward_timeout(Duration::from_millis(200));

    let (status, body) = send(&router, "/", &SelectionContext::new()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, "Bad Gateway");

    let snapshot = router.snapshot();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.failed_requests, 1);
    assert!(!snapshot.backends[0].alive);
    assert_eq!(snapshot.backends[0].fail_count, 1);
    assert_eq!(snapshot.backends[0].connections, 0);
    assert!(snapshot.backends[0].response_time_ms >= 200.0);

    // The hung backend is out of rotation.
    for _ in 0..3 {
        assert_eq!(send(&router, "/", &SelectionContext::new()).await.1, "fast");
    }
}
