use claims::*;
use engine::bulk_operations::{BulkConfig, BulkOperationProcessor, OperationRegistry};
use engine::common::{HttpError, RateLimitConfig};
use engine::enhancements::{
    ApiConfig, EnhancementBatch, EnhancementClient, location_enhancement_operation,
};
use serde_json::{Map, Value, json};
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/api/location-enhancements";

mod helpers {
    use super::*;

    pub fn client_for(server: &MockServer) -> EnhancementClient {
        let config = ApiConfig::new(server.uri()).with_timeout_secs(5);
        EnhancementClient::new(&config).expect("client should build")
    }

    pub fn batch() -> EnhancementBatch {
        let mut enhancement_config = Map::new();
        enhancement_config.insert("showReviews".to_string(), Value::Bool(true));
        EnhancementBatch {
            directory_name: "coffee-shops".to_string(),
            user_id: 17,
            enhancement_config,
        }
    }

    pub fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }
}

use helpers::*;

mod client {
    use super::*;

    #[tokio::test]
    async fn test_posts_camel_case_body_and_returns_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_json(json!({
                "ghlLocationId": "loc-001",
                "directoryName": "coffee-shops",
                "userId": 17,
                "enhancementConfig": { "showReviews": true },
                "isActive": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 99 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = assert_ok!(
            client
                .create_enhancement(&batch().request_for("loc-001".to_string()))
                .await
        );

        assert_eq!(response, json!({ "id": 99 }));
    }

    #[tokio::test]
    async fn test_error_body_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "error": "Location already enhanced" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let error = assert_err!(
            client
                .create_enhancement(&batch().request_for("loc-002".to_string()))
                .await
        );

        assert_eq!(
            error,
            HttpError::Status {
                status: 409,
                message: "Location already enhanced".to_string()
            }
        );
        assert_eq!(error.to_string(), "Location already enhanced");
    }

    #[tokio::test]
    async fn test_status_fallback_when_body_has_no_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let error = assert_err!(
            client
                .create_enhancement(&batch().request_for("loc-003".to_string()))
                .await
        );

        assert_eq!(error.to_string(), "HTTP 500");
        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let error = assert_err!(
            client
                .create_enhancement(&batch().request_for("loc-004".to_string()))
                .await
        );

        assert_matches!(error, HttpError::InvalidResponse { .. });
    }

    #[tokio::test]
    async fn test_rate_limited_client_still_completes_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(3)
            .mount(&server)
            .await;

        let config = ApiConfig::new(server.uri()).with_rate_limit(RateLimitConfig::per_second(50));
        let client = assert_ok!(EnhancementClient::new(&config));

        for id in ["a", "b", "c"] {
            assert_ok!(
                client
                    .create_enhancement(&batch().request_for(id.to_string()))
                    .await
            );
        }
    }
}

mod bulk {
    use super::*;

    fn processor() -> BulkOperationProcessor {
        BulkOperationProcessor::new(OperationRegistry::new(), BulkConfig::default())
    }

    #[tokio::test]
    async fn test_enhances_every_location() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(7)
            .mount(&server)
            .await;

        let operation = location_enhancement_operation(
            client_for(&server),
            ids(&["l1", "l2", "l3", "l4", "l5", "l6", "l7"]),
            batch(),
        );

        let result = assert_ok!(processor().process(operation).await);

        assert_eq!(result.succeeded.len(), 7);
        assert!(result.is_complete_success());
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({ "ghlLocationId": "flaky" })))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let operation =
            location_enhancement_operation(client_for(&server), ids(&["steady", "flaky"]), batch())
                .with_retry_delay(Duration::from_millis(10));

        let result = assert_ok!(processor().process(operation).await);

        assert_eq!(result.succeeded.len(), 2);
        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 4);
    }

    #[tokio::test]
    async fn test_exhausted_location_reports_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({ "ghlLocationId": "missing" })))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "error": "Location not found" })),
            )
            .with_priority(1)
            .expect(4)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let operation = location_enhancement_operation(
            client_for(&server),
            ids(&["found", "missing", "also-found"]),
            batch(),
        )
        .with_retry_delay(Duration::from_millis(5));

        let result = assert_ok!(processor().process(operation).await);

        assert_eq!(result.succeeded.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].item, "missing");
        assert_eq!(result.failed[0].index, 1);
        assert_eq!(result.failed[0].error.to_string(), "Location not found");
        assert!((result.success_rate - 200.0 / 3.0).abs() < 1e-9);
    }
}
