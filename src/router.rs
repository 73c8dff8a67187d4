use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{handlers::rest, service::CapsuleService};

pub fn build(service: Arc<CapsuleService>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route(
            "/files",
            get(rest::get_all_files)
                .post(rest::create_files)
                .fallback(rest::method_not_allowed),
        )
        .route(
            "/notes",
            get(rest::get_note)
                .post(rest::save_note)
                .fallback(rest::method_not_allowed),
        )
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", rest::ApiDoc::openapi()),
        )
        .with_state(service)
        .layer(cors(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// The UI is served from its own origin and calls the API directly.
fn cors(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

async fn root() -> Response {
    (StatusCode::OK, "Hello from the time capsule!").into_response()
}
