use std::sync::Arc;

use crate::application::http::classify::router::classify_routes;
use crate::application::http::health::health_routes;
use crate::application::http::server::app_state::AppState;
use crate::application::http::server::openapi::ApiDoc;
use crate::args::Args;

use axum::Router;
use axum::http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use foodlens_core::{application::create_service, domain::common::FoodLensConfig};
use tower_http::cors::CorsLayer;
use tracing::{debug, info_span, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub async fn state(args: Arc<Args>) -> Result<AppState, anyhow::Error> {
    let config: FoodLensConfig = FoodLensConfig::from(args.as_ref().clone());
    let service = create_service(config).await?;

    Ok(AppState::new(args, service))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed_origins = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    debug!("Allowed origins: {:?}", allowed_origins);

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(allowed_origins)
        .allow_headers([CONTENT_TYPE, CONTENT_LENGTH, ACCEPT])
}

///  Returns the [`Router`] of this application.
pub fn router(state: AppState) -> Result<Router, anyhow::Error> {
    router_with_metrics(state, true)
}

/// Builds the router, optionally with the Prometheus layer.
///
/// The metrics recorder is process-global and can only be installed once, so
/// tests build routers without it.
pub fn router_with_metrics(state: AppState, metrics: bool) -> Result<Router, anyhow::Error> {
    let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
        |request: &axum::extract::Request| {
            let uri: String = request.uri().to_string();
            info_span!("http_request", method = ?request.method(), uri)
        },
    );

    let cors = cors_layer(&state.args.server.allowed_origins);

    let mut openapi = ApiDoc::openapi();
    let mut paths = openapi.paths.clone();
    paths.paths = openapi
        .paths
        .paths
        .into_iter()
        .map(|(path, item)| (format!("{}{path}", state.args.server.root_path), item))
        .collect();
    openapi.paths = paths;

    let root_path = state.args.server.root_path.clone();
    let api_docs_url = format!("{}/api-docs/openapi.json", root_path);

    let mut router = axum::Router::new()
        .merge(SwaggerUi::new(format!("{}/swagger-ui", root_path)).url(api_docs_url, openapi))
        .merge(classify_routes(state.clone()))
        .merge(health_routes(&root_path));

    if metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route(
                &format!("{}/metrics", root_path),
                get(|| async move { metric_handle.render() }),
            )
            .layer(prometheus_layer);
    }

    Ok(router.layer(trace_layer).layer(cors).with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::{
        TestServer,
        multipart::{MultipartForm, Part},
    };
    use clap::Parser;
    use serde_json::{Value, json};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const JPEG_BYTES: [u8; 4] = [0xff, 0xd8, 0xff, 0xe0];

    async fn server_with(extra: &[&str]) -> TestServer {
        let labels = std::env::temp_dir().join("foodlens-test-missing-labels.json");
        let mut argv = vec![
            "foodlens".to_string(),
            "--openai-api-key".to_string(),
            "sk-test".to_string(),
            "--labels-path".to_string(),
            labels.display().to_string(),
        ];
        argv.extend(extra.iter().map(|a| a.to_string()));

        let args = Arc::new(Args::parse_from(argv));
        let state = state(args).await.unwrap();
        TestServer::new(router_with_metrics(state, false).unwrap()).unwrap()
    }

    fn image_form() -> MultipartForm {
        MultipartForm::new().add_part(
            "image",
            Part::bytes(JPEG_BYTES.to_vec())
                .file_name("meal.jpg")
                .mime_type("image/jpeg"),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let server = server_with(&[]).await;
        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_homepage_serves_form() {
        let server = server_with(&["--root-path", "/api"]).await;
        let response = server.get("/api").await;
        response.assert_status_ok();
        assert!(response.text().contains("action=\"/api/classify\""));
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let server = server_with(&[]).await;
        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let doc: Value = response.json();
        assert!(doc["paths"].get("/classify").is_some());
    }

    #[tokio::test]
    async fn test_classify_structured() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output_text": "{\"label\": \"pizza\", \"confidence\": 0.9, \"calories_kcal\": 285, \"serving\": \"1 slice\", \"notes\": \"\"}"
            })))
            .mount(&upstream)
            .await;

        let uri = upstream.uri();
        let server = server_with(&["--openai-base-url", &uri]).await;
        let response = server.post("/classify").multipart(image_form()).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["label"], "pizza");
        assert_eq!(
            body["text"],
            "Food : pizza (confidence: 0.90)\nCalories (avg) : 285 kcal\nServing : 1 slice\nNotes : "
        );
    }

    #[tokio::test]
    async fn test_classify_raw_text() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"output_text": "a pizza, I think"})),
            )
            .mount(&upstream)
            .await;

        let uri = upstream.uri();
        let server = server_with(&["--openai-base-url", &uri]).await;
        let response = server.post("/classify").multipart(image_form()).await;

        response.assert_status_ok();
        response.assert_json(&json!({"raw": "a pizza, I think"}));
    }

    #[tokio::test]
    async fn test_chat_failure_is_500() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&upstream)
            .await;

        let uri = upstream.uri();
        let server = server_with(&["--openai-base-url", &uri]).await;
        let response = server.post("/classify").multipart(image_form()).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["error"], "chat classify failed");
        assert!(body["detail"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_local_mode_without_model_is_500() {
        let server = server_with(&[]).await;
        let form = image_form().add_text("mode", "local");
        let response = server.post("/classify").multipart(form).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["error"], "local model not available");
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_missing_image_is_400() {
        let server = server_with(&[]).await;
        let form = MultipartForm::new().add_text("mode", "chat");
        let response = server.post("/classify").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "invalid request");
    }

    #[tokio::test]
    async fn test_unknown_mode_is_400() {
        let server = server_with(&[]).await;
        let form = image_form().add_text("mode", "telepathy");
        let response = server.post("/classify").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
