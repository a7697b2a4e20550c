use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::config::ChargeConfig;
use crate::validation::NormalizedCpf;

pub const PIX_PAYMENT_METHOD: &str = "PIX";

// ============ CPF lookup ============

/// CPF as sent by the caller, in the query string or the body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupParams {
    /// CPF, with or without formatting (`123.456.789-00`).
    #[serde(default, deserialize_with = "string_or_number")]
    pub cpf: Option<String>,
}

/// Identity fields relayed from the lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IdentityResult {
    pub success: bool,
    pub status: u16,
    pub nome: String,
    pub mae: String,
    pub nascimento: String,
    pub sexo: String,
    pub cpf: String,
}

// ============ PIX charge ============

/// Customer fields sent by the caller.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PaymentRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cpf: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub telefone: Option<String>,
}

/// Customer fields after digit-stripping and placeholder substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPaymentRequest {
    pub name: String,
    pub cpf: NormalizedCpf,
    pub email: String,
    pub phone: String,
}

/// Body of the outbound transaction request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixTransactionRequest {
    pub customer: PixCustomer,
    pub payment_method: String,
    pub items: Vec<PixItem>,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PixCustomer {
    pub document: PixDocument,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PixDocument {
    pub number: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixItem {
    pub title: String,
    pub unit_price: u32,
    pub quantity: u32,
    pub tangible: bool,
}

impl PixTransactionRequest {
    /// Single intangible item, total equal to the configured amount.
    pub fn new(request: &NormalizedPaymentRequest, charge: &ChargeConfig) -> Self {
        Self {
            customer: PixCustomer {
                document: PixDocument {
                    number: request.cpf.as_str().to_string(),
                },
                name: request.name.clone(),
                email: request.email.clone(),
                phone: request.phone.clone(),
            },
            payment_method: PIX_PAYMENT_METHOD.to_string(),
            items: vec![PixItem {
                title: charge.item_title.clone(),
                unit_price: charge.amount_cents,
                quantity: 1,
                tangible: false,
            }],
            amount: charge.amount_cents,
        }
    }
}

/// QR code payload relayed from the payment service.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub transaction_id: Option<Value>,
    pub qrcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub expiration_date: Option<Value>,
    #[schema(value_type = Object)]
    pub amount: Value,
    #[schema(value_type = Object)]
    pub status: Value,
}

/// Failure envelope shared by every endpoint. Diagnostic fields vary per error.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Form posts and loosely typed JSON clients send numbers where strings are
/// expected (`"cpf": 12345678900`); both are accepted as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
