//! Input normalization shared by both handlers.
//!
//! Normalization only strips formatting; the sole validation is the digit count.
use crate::config::ChargeConfig;
use crate::errors::AppError;
use crate::models::{NormalizedPaymentRequest, PaymentRequest};
use sha2::{Digest, Sha256};
use std::fmt;

pub const CPF_LENGTH: usize = 11;
pub const MIN_PHONE_LENGTH: usize = 10;

pub const INVALID_CPF_MESSAGE: &str = "CPF inválido. Deve conter 11 dígitos.";
pub const INVALID_PHONE_MESSAGE: &str = "Telefone inválido. Mínimo 10 dígitos.";

/// Keeps only ASCII digits, in their original order.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Short, stable SHA-256 fingerprint used in place of a document in logs.
pub fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(&digest[..6])
}

/// A CPF reduced to exactly 11 digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCpf(String);

impl NormalizedCpf {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let digits = digits_only(raw);
        if digits.len() != CPF_LENGTH {
            return Err(AppError::Validation(INVALID_CPF_MESSAGE.to_string()));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

impl fmt::Display for NormalizedCpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digit-strips a phone number, requiring at least 10 digits (DDD + number).
pub fn normalize_phone(raw: &str) -> Result<String, AppError> {
    let digits = digits_only(raw);
    if digits.len() < MIN_PHONE_LENGTH {
        return Err(AppError::Validation(INVALID_PHONE_MESSAGE.to_string()));
    }
    Ok(digits)
}

/// Validates cpf then phone, in that order, and fills the placeholders.
pub fn normalize_payment_request(
    request: &PaymentRequest,
    charge: &ChargeConfig,
) -> Result<NormalizedPaymentRequest, AppError> {
    let cpf = NormalizedCpf::parse(request.cpf.as_deref().unwrap_or_default())?;
    let phone = normalize_phone(request.telefone.as_deref().unwrap_or_default())?;

    let name = present(request.nome.as_deref()).unwrap_or(charge.default_name.as_str());
    let email = present(request.email.as_deref()).unwrap_or(charge.default_email.as_str());

    Ok(NormalizedPaymentRequest {
        name: name.to_string(),
        cpf,
        email: email.to_string(),
        phone,
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
