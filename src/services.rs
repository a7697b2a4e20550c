use crate::config::{ChargeConfig, Config};
use crate::errors::{passthrough_status, AppError, Diagnostics};
use crate::models::{IdentityResult, NormalizedPaymentRequest, PaymentResult, PixTransactionRequest};
use crate::validation::NormalizedCpf;
use axum::http::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const LOOKUP_DECODE_ERROR: &str = "Erro ao decodificar resposta da API";
pub const LOOKUP_NOT_FOUND: &str = "CPF não encontrado.";
pub const PIX_DECODE_ERROR: &str = "Erro de comunicação com a API de PIX.";
pub const PIX_REFUSED_DEFAULT: &str = "Pagamento recusado pela operadora.";
pub const PIX_MISSING_QRCODE: &str = "QR Code PIX não foi gerado pela API.";
pub const PIX_INTERNAL_ERROR: &str = "Erro interno ao processar a requisição PIX.";

/// Characters of a non-JSON payment body echoed back to the caller.
const DETAILS_EXCERPT_CHARS: usize = 100;
/// Characters of the payment body written to the log.
const LOG_EXCERPT_CHARS: usize = 200;

fn build_client(timeout_secs: u64) -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Internal {
            message: "Failed to create HTTP client".to_string(),
            details: e.to_string(),
        })
}

/// Client for the third-party CPF lookup API.
#[derive(Clone)]
pub struct CpfLookupService {
    client: Client,
    base_url: String,
}

impl CpfLookupService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(config.upstream_timeout_secs)?,
            base_url: config.cpf_lookup_url.clone(),
        })
    }

    /// Issues one GET with `cpf=<digits>`; no retry.
    pub async fn lookup(&self, cpf: &NormalizedCpf) -> Result<IdentityResult, AppError> {
        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(&self.base_url, &[("cpf", cpf.as_str())])
            .map_err(|e| AppError::Internal {
                message: "Failed to build lookup URL".to_string(),
                details: e.to_string(),
            })?;

        tracing::info!("Querying CPF lookup API for document {}", cpf.fingerprint());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!("CPF lookup API answered {} ({} bytes)", status, body.len());

        interpret_lookup_response(&body, cpf)
    }
}

/// Reshapes a lookup API body.
///
/// Only `dados.status == 200` counts as a hit; the HTTP status of the answer
/// is not consulted. Unparseable and empty answers (`null`, `false`, `0`, `""`,
/// `[]`, `{}`) are decode failures.
pub fn interpret_lookup_response(
    raw: &str,
    cpf: &NormalizedCpf,
) -> Result<IdentityResult, AppError> {
    let parsed = match serde_json::from_str::<Value>(raw) {
        Ok(value) if !is_empty_answer(&value) => value,
        _ => {
            let mut diagnostics = Diagnostics::new();
            diagnostics.insert("raw_response".to_string(), json!(raw));
            return Err(AppError::Decode {
                status: StatusCode::BAD_GATEWAY,
                message: LOOKUP_DECODE_ERROR.to_string(),
                diagnostics,
            });
        }
    };

    let found = parsed
        .get("dados")
        .and_then(|d| d.get("status"))
        .and_then(Value::as_i64)
        == Some(200);

    if !found {
        let mut diagnostics = Diagnostics::new();
        diagnostics.insert("response".to_string(), parsed);
        return Err(AppError::IncompleteResult {
            status: StatusCode::NOT_FOUND,
            message: LOOKUP_NOT_FOUND.to_string(),
            diagnostics,
        });
    }

    let dados = &parsed["dados"];
    Ok(IdentityResult {
        success: true,
        status: 200,
        nome: text_field(dados, "nome").unwrap_or_default(),
        mae: text_field(dados, "mae").unwrap_or_default(),
        nascimento: text_field(dados, "nascimento").unwrap_or_default(),
        sexo: text_field(dados, "sexo").unwrap_or_default(),
        cpf: text_field(dados, "cpf").unwrap_or_else(|| cpf.as_str().to_string()),
    })
}

fn is_empty_answer(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Reads a scalar field as text. Missing and null fields yield `None`.
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Client for the third-party PIX transactions API.
#[derive(Clone)]
pub struct PixPaymentService {
    client: Client,
    api_url: String,
    api_key: String,
    charge: ChargeConfig,
}

impl PixPaymentService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(config.upstream_timeout_secs)?,
            api_url: config.pix_api_url.clone(),
            api_key: config.pix_api_key.clone(),
            charge: config.charge.clone(),
        })
    }

    pub fn charge(&self) -> &ChargeConfig {
        &self.charge
    }

    /// Posts one transaction for the configured charge. Every call creates a
    /// new upstream transaction.
    pub async fn create_charge(
        &self,
        request: &NormalizedPaymentRequest,
    ) -> Result<PaymentResult, AppError> {
        let body = PixTransactionRequest::new(request, &self.charge);

        tracing::info!(
            "Calling PIX API for document {} ({} centavos)",
            request.cpf.fingerprint(),
            body.amount
        );

        let response = self
            .client
            .post(&self.api_url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Basic {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(internal_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(internal_error)?;

        tracing::info!("PIX API HTTP status: {}", status);
        tracing::debug!("PIX API response: {}", excerpt(&text, LOG_EXCERPT_CHARS));

        interpret_pix_response(status, &text, &self.charge)
    }
}

fn internal_error(err: reqwest::Error) -> AppError {
    AppError::Internal {
        message: PIX_INTERNAL_ERROR.to_string(),
        details: err.to_string(),
    }
}

/// Reshapes a PIX API answer. Checks run in a fixed order: decoding, HTTP
/// status, refusal, then presence of the QR code.
pub fn interpret_pix_response(
    status: u16,
    raw: &str,
    charge: &ChargeConfig,
) -> Result<PaymentResult, AppError> {
    let data: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("PIX API returned a non-JSON body: {}", e);
            let mut diagnostics = Diagnostics::new();
            diagnostics.insert(
                "details".to_string(),
                json!(format!(
                    "A API retornou: {}",
                    excerpt(raw, DETAILS_EXCERPT_CHARS)
                )),
            );
            diagnostics.insert("http_status".to_string(), json!(status));
            return Err(AppError::Decode {
                status: passthrough_status(status),
                message: PIX_DECODE_ERROR.to_string(),
                diagnostics,
            });
        }
    };

    if data.is_null() {
        tracing::error!("PIX API returned a null body (HTTP {})", status);
        return Err(AppError::Internal {
            message: PIX_INTERNAL_ERROR.to_string(),
            details: format!("A API retornou: {}", excerpt(raw, DETAILS_EXCERPT_CHARS)),
        });
    }

    if !(200..300).contains(&status) {
        let message = message_field(&data, "message")
            .or_else(|| message_field(&data, "error"))
            .unwrap_or_else(|| format!("Erro HTTP {}", status));
        let mut diagnostics = Diagnostics::new();
        diagnostics.insert("full_response".to_string(), data);
        return Err(AppError::UpstreamRejection {
            status: passthrough_status(status),
            message,
            diagnostics,
        });
    }

    if data.get("status").and_then(Value::as_str) == Some("refused") {
        let reason = data.get("refusedReason").filter(|r| !r.is_null()).cloned();
        let message = reason
            .as_ref()
            .and_then(|r| message_field(r, "description"))
            .unwrap_or_else(|| PIX_REFUSED_DEFAULT.to_string());

        let mut diagnostics = Diagnostics::new();
        diagnostics.insert("refused".to_string(), json!(true));
        if let Some(reason) = reason {
            diagnostics.insert("details".to_string(), reason);
        }
        diagnostics.insert("full_response".to_string(), data);
        return Err(AppError::UpstreamRejection {
            status: StatusCode::BAD_REQUEST,
            message,
            diagnostics,
        });
    }

    let pix = data.get("pix");
    let qrcode = pix
        .and_then(|p| p.get("qrcode"))
        .and_then(Value::as_str)
        .filter(|q| !q.is_empty());

    let Some(qrcode) = qrcode else {
        let mut diagnostics = Diagnostics::new();
        diagnostics.insert("status".to_string(), status_or_unknown(&data));
        diagnostics.insert("full_response".to_string(), data.clone());
        return Err(AppError::IncompleteResult {
            status: StatusCode::BAD_REQUEST,
            message: PIX_MISSING_QRCODE.to_string(),
            diagnostics,
        });
    };

    Ok(PaymentResult {
        success: true,
        transaction_id: present(data.get("id")),
        qrcode: qrcode.to_string(),
        expiration_date: present(pix.and_then(|p| p.get("expirationDate"))),
        amount: present(data.get("amount")).unwrap_or_else(|| json!(charge.amount_cents)),
        status: status_or_unknown(&data),
    })
}

fn present(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

fn status_or_unknown(data: &Value) -> Value {
    data.get("status")
        .filter(|s| !s.is_null() && s.as_str() != Some(""))
        .cloned()
        .unwrap_or_else(|| json!("unknown"))
}

/// Non-empty text of a field; structured values are rendered as JSON.
fn message_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// First `max_chars` characters, never splitting a code point.
fn excerpt(raw: &str, max_chars: usize) -> String {
    raw.chars().take(max_chars).collect()
}
