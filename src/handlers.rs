use crate::config::Config;
use crate::errors::AppError;
use crate::models::{ErrorResponse, IdentityResult, LookupParams, PaymentRequest, PaymentResult};
use crate::services::{CpfLookupService, PixPaymentService};
use crate::validation::{normalize_payment_request, NormalizedCpf};
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

pub const LOOKUP_METHOD_ERROR: &str = "Método não suportado. Use GET ou POST.";
pub const PAYMENT_METHOD_ERROR: &str = "Método não suportado. Use POST.";
pub const INVALID_BODY_ERROR: &str = "Corpo da requisição inválido.";
pub const INVALID_QUERY_ERROR: &str = "Parâmetros da consulta inválidos.";
pub const PAYLOAD_TOO_LARGE_ERROR: &str = "Corpo da requisição excede o tamanho máximo.";

/// Shared application state injected into handlers.
///
/// Read-only after startup; both services hold a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the CPF lookup API.
    pub cpf_lookup: CpfLookupService,
    /// Client for the PIX transactions API.
    pub pix_payments: PixPaymentService,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        Ok(Self {
            cpf_lookup: CpfLookupService::new(&config)?,
            pix_payments: PixPaymentService::new(&config)?,
            config,
        })
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// GET /api/consulta-cpf?cpf=...
#[utoipa::path(
    get,
    path = "/api/consulta-cpf",
    tag = "cpf",
    params(LookupParams),
    responses(
        (status = 200, description = "Identity found", body = IdentityResult),
        (status = 400, description = "CPF does not have 11 digits", body = ErrorResponse),
        (status = 404, description = "Lookup service has no record", body = ErrorResponse),
        (status = 502, description = "Lookup service unreachable or unreadable", body = ErrorResponse)
    )
)]
pub async fn consulta_cpf_get(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<IdentityResult>, AppError> {
    let params = query_params(query)?;
    lookup_cpf(&state, params.cpf.unwrap_or_default()).await
}

/// POST /api/consulta-cpf
///
/// The query string wins over the body, as with the GET variant.
#[utoipa::path(
    post,
    path = "/api/consulta-cpf",
    tag = "cpf",
    params(LookupParams),
    request_body(content = LookupParams, description = "JSON or form-encoded body"),
    responses(
        (status = 200, description = "Identity found", body = IdentityResult),
        (status = 400, description = "CPF does not have 11 digits", body = ErrorResponse),
        (status = 404, description = "Lookup service has no record", body = ErrorResponse),
        (status = 413, description = "Body over the size limit", body = ErrorResponse),
        (status = 502, description = "Lookup service unreachable or unreadable", body = ErrorResponse)
    )
)]
pub async fn consulta_cpf_post(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LookupParams>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<IdentityResult>, AppError> {
    let params = query_params(query)?;
    let body = read_body(body)?;
    let raw = match params.cpf {
        Some(cpf) => cpf,
        None => decode_body::<LookupParams>(&headers, &body)?
            .cpf
            .unwrap_or_default(),
    };
    lookup_cpf(&state, raw).await
}

async fn lookup_cpf(state: &AppState, raw: String) -> Result<Json<IdentityResult>, AppError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("consulta_cpf", %request_id);

    async move {
        let cpf = NormalizedCpf::parse(&raw)?;
        tracing::info!("CPF lookup requested for document {}", cpf.fingerprint());

        let result = state.cpf_lookup.lookup(&cpf).await?;
        tracing::info!("CPF lookup succeeded for document {}", cpf.fingerprint());
        Ok(Json(result))
    }
    .instrument(span)
    .await
}

/// POST /api/pagamento
///
/// Creates one PIX charge for the configured fixed amount and relays the QR code.
#[utoipa::path(
    post,
    path = "/api/pagamento",
    tag = "pix",
    request_body(content = PaymentRequest, description = "JSON or form-encoded body"),
    responses(
        (status = 200, description = "QR code generated", body = PaymentResult),
        (status = 400, description = "Invalid input, refused payment or missing QR code", body = ErrorResponse),
        (status = 413, description = "Body over the size limit", body = ErrorResponse),
        (status = 500, description = "Payment service unreachable", body = ErrorResponse)
    )
)]
pub async fn create_pix_charge(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PaymentResult>, AppError> {
    let body = read_body(body)?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("pagamento", %request_id);

    async move {
        let payload: PaymentRequest = decode_body(&headers, &body)?;
        tracing::info!(
            "Payment requested: nome_present={}, email_present={}, telefone_digits={}",
            payload.nome.as_deref().is_some_and(|n| !n.is_empty()),
            payload.email.as_deref().is_some_and(|e| !e.is_empty()),
            payload
                .telefone
                .as_deref()
                .map(crate::validation::digits_only)
                .unwrap_or_default()
                .len(),
        );

        let request = normalize_payment_request(&payload, state.pix_payments.charge())?;
        let result = state.pix_payments.create_charge(&request).await?;

        let transaction_id = result.transaction_id.clone().unwrap_or_default();
        tracing::info!(
            "PIX charge created: transaction_id={}, status={}",
            transaction_id,
            result.status
        );
        Ok(Json(result))
    }
    .instrument(span)
    .await
}

/// Answers CORS preflight requests that reach the router with an empty 200.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn lookup_method_not_supported() -> AppError {
    AppError::UnsupportedMethod(LOOKUP_METHOD_ERROR.to_string())
}

pub async fn payment_method_not_supported() -> AppError {
    AppError::UnsupportedMethod(PAYMENT_METHOD_ERROR.to_string())
}

fn query_params(
    query: Result<Query<LookupParams>, QueryRejection>,
) -> Result<LookupParams, AppError> {
    query.map(|Query(params)| params).map_err(|e| {
        tracing::debug!("Rejected query string: {}", e.body_text());
        AppError::Validation(INVALID_QUERY_ERROR.to_string())
    })
}

fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, AppError> {
    body.map_err(|e| {
        tracing::debug!("Rejected request body: {}", e.body_text());
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(PAYLOAD_TOO_LARGE_ERROR.to_string())
        } else {
            AppError::Validation(INVALID_BODY_ERROR.to_string())
        }
    })
}

/// Decodes a JSON or form-encoded body. An empty body yields the defaults.
fn decode_body<T>(headers: &HeaderMap, body: &Bytes) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    let decoded = if is_form {
        let fields: Map<String, Value> = url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        serde_json::from_value(Value::Object(fields))
    } else {
        serde_json::from_slice(body)
    };

    decoded.map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        AppError::Validation(INVALID_BODY_ERROR.to_string())
    })
}
