use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::docs;
use crate::errors::AppError;
use crate::handlers::{self, AppState, PAYLOAD_TOO_LARGE_ERROR};

/// Builds the full application: both proxies, health, docs, and the middleware stack.
///
/// Each proxy route dispatches on an explicit method set; anything else gets
/// the JSON "method not supported" envelope.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    let proxy_routes = Router::new()
        .route(
            "/api/consulta-cpf",
            get(handlers::consulta_cpf_get)
                .post(handlers::consulta_cpf_post)
                .options(handlers::preflight)
                .fallback(handlers::lookup_method_not_supported),
        )
        .route(
            "/api/pagamento",
            post(handlers::create_pix_charge)
                .options(handlers::preflight)
                .fallback(handlers::payment_method_not_supported),
        )
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(max_body_bytes)))
        .layer(middleware::map_response(envelope_oversized_body));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/docs", get(docs::serve_swagger_ui))
        .route("/api-docs/openapi.json", get(docs::serve_openapi_spec))
        .merge(proxy_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// The body limit answers a declared oversized body with plain text before any
/// handler runs; rewrap that answer in the JSON envelope.
async fn envelope_oversized_body(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return AppError::PayloadTooLarge(PAYLOAD_TOO_LARGE_ERROR.to_string()).into_response();
    }
    response
}
