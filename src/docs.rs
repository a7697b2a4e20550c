//! OpenAPI document and the Swagger UI page that renders it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use utoipa::OpenApi;

use crate::models::{ErrorResponse, IdentityResult, LookupParams, PaymentRequest, PaymentResult};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rust PIX Proxy",
        description = "CPF lookup and fixed-amount PIX charge proxy. Every JSON body carries a `success` flag."
    ),
    paths(
        crate::handlers::health,
        crate::handlers::consulta_cpf_get,
        crate::handlers::consulta_cpf_post,
        crate::handlers::create_pix_charge,
    ),
    components(schemas(LookupParams, IdentityResult, PaymentRequest, PaymentResult, ErrorResponse)),
    tags(
        (name = "cpf", description = "CPF identity lookup"),
        (name = "pix", description = "PIX charge creation"),
        (name = "health", description = "Liveness probe")
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn serve_openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page, configured to load `/api-docs/openapi.json`.
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Rust PIX Proxy - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}
