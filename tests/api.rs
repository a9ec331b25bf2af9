use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use canopy::api::create_router;
use canopy::imagery::{ImageQuery, ImageryPlatform, IndexStatistics, PlatformError, PlatformResult};
use canopy::models::Polygon;
use canopy::services::AnalysisService;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

#[derive(Clone)]
struct StubPlatform {
    size: PlatformResult<u64>,
    stats: PlatformResult<IndexStatistics>,
}

impl StubPlatform {
    fn healthy(size: u64) -> Self {
        Self {
            size: Ok(size),
            stats: Ok(IndexStatistics {
                mean: Some(0.6123),
                min: Some(0.0517),
                max: Some(0.9031),
            }),
        }
    }
}

impl ImageryPlatform for StubPlatform {
    async fn collection_size(&self, _query: &ImageQuery) -> PlatformResult<u64> {
        self.size.clone()
    }

    async fn index_statistics(&self, _query: &ImageQuery) -> PlatformResult<IndexStatistics> {
        self.stats.clone()
    }

    async fn area_square_meters(&self, _geometry: &Polygon) -> PlatformResult<f64> {
        Ok(25_000.0)
    }
}

fn router(platform: Option<StubPlatform>) -> Router {
    create_router(AnalysisService::new(platform, 20.0))
}

fn analyze_body() -> Value {
    json!({
        "polygon": {
            "type": "Polygon",
            "coordinates": [[[36.80, -1.30], [36.81, -1.30], [36.81, -1.29], [36.80, -1.30]]]
        },
        "startDate": "2023-06-01",
        "endDate": "2023-08-31"
    })
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_analyze(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_check_is_ok() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(router(None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "service": "NDVI Engine"}));
}

#[tokio::test]
async fn uninitialized_platform_returns_mock_for_any_input() {
    let expected = json!({
        "success": true,
        "data": {
            "areaHectares": 12.5,
            "meanNDVI": 0.45,
            "minNDVI": 0.1,
            "maxNDVI": 0.8,
            "collectionSize": 0,
            "status": "Mock Results (GEE Not Auth)"
        }
    });

    let (status, body) = send(router(None), post_analyze(&analyze_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);

    let odd = json!({
        "polygon": {"type": "Polygon", "coordinates": [[[0, 0]]]},
        "startDate": "1999-01-01",
        "endDate": "1998-01-01"
    });
    let (status, body) = send(router(None), post_analyze(&odd)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn analysis_returns_rounded_statistics() {
    let (status, body) = send(
        router(Some(StubPlatform::healthy(4))),
        post_analyze(&analyze_body()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "data": {
                "areaHectares": 2.5,
                "meanNDVI": 0.612,
                "minNDVI": 0.052,
                "maxNDVI": 0.903,
                "collectionSize": 4,
                "status": "Success"
            }
        })
    );
}

#[tokio::test]
async fn dates_are_optional() {
    let body = json!({
        "polygon": {"coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
    });
    let (status, body) = send(router(Some(StubPlatform::healthy(1))), post_analyze(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["collectionSize"], 1);
}

#[tokio::test]
async fn empty_collection_reports_no_images() {
    let (status, body) = send(
        router(Some(StubPlatform::healthy(0))),
        post_analyze(&analyze_body()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "data": {"error": "No images found", "collectionSize": 0}})
    );
}

#[tokio::test]
async fn authentication_failure_is_labeled() {
    let platform = StubPlatform {
        size: Err(PlatformError::Authentication("Request had invalid authentication credentials".into())),
        stats: Ok(IndexStatistics::default()),
    };
    let (status, body) = send(router(Some(platform)), post_analyze(&analyze_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "GEE Authentication Failed"}));
}

#[tokio::test]
async fn computation_failure_keeps_message() {
    let platform = StubPlatform {
        size: Ok(2),
        stats: Err(PlatformError::Computation("User memory limit exceeded.".into())),
    };
    let (status, body) = send(router(Some(platform)), post_analyze(&analyze_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "User memory limit exceeded."}));
}

#[tokio::test]
async fn slow_platform_times_out() {
    let platform = StubPlatform {
        size: Err(PlatformError::Timeout(Duration::from_secs(60))),
        stats: Ok(IndexStatistics::default()),
    };
    let (status, body) = send(router(Some(platform)), post_analyze(&analyze_body())).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["detail"].as_str().unwrap().contains("did not answer"));
}

#[tokio::test]
async fn invalid_dates_are_rejected() {
    let mut body = analyze_body();
    body["startDate"] = json!("2023/06/01");
    let (status, body) = send(router(Some(StubPlatform::healthy(3))), post_analyze(&body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("startDate"));
}

#[tokio::test]
async fn missing_polygon_is_rejected_with_detail() {
    let (status, body) = send(
        router(Some(StubPlatform::healthy(3))),
        post_analyze(&json!({"startDate": "2023-01-01"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("polygon"));
}

#[tokio::test]
async fn malformed_body_is_rejected_with_detail() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"polygon\": "))
        .unwrap();
    let (status, body) = send(router(None), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/analyze")
        .header(header::ORIGIN, "https://dashboard.example.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = router(None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
