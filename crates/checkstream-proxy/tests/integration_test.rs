//! Integration tests for CheckStream proxy

use tokio;

#[tokio::test]
async fn test_health_endpoint() {
    // This is a placeholder for integration tests
    // In a full implementation, we would:
    // 1. Start the proxy server
    // 2. Send requests to it
    // 3. Verify responses

    assert!(true, "Integration test placeholder");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    // Test that metrics endpoint returns valid Prometheus format
    assert!(true, "Metrics test placeholder");
}

#[tokio::test]
async fn test_ingress_blocking() {
    // Test that Phase 1 ingress properly blocks unsafe prompts
    assert!(true, "Ingress blocking test placeholder");
}

#[tokio::test]
async fn test_midstream_redaction() {
    // Test that Phase 2 midstream redacts unsafe chunks
    assert!(true, "Midstream redaction test placeholder");
}

#[tokio::test]
async fn test_egress_compliance() {
    // Test that Phase 3 egress runs compliance checks
    assert!(true, "Egress compliance test placeholder");
}
