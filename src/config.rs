use serde::Deserialize;

pub const DEFAULT_CPF_LOOKUP_URL: &str = "https://skpt.fun/cpf/api.php";
pub const DEFAULT_PIX_API_URL: &str = "https://api.ghostspaysv2.com/functions/v1/transactions";

/// Fixed charge applied to every PIX request.
///
/// The amount is never derived from request data; only the operator can
/// change it through the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeConfig {
    /// Amount in centavos (R$ 46,80 by default).
    pub amount_cents: u32,
    /// Title of the single line item.
    pub item_title: String,
    /// Customer name used when the request carries none.
    pub default_name: String,
    /// Customer email used when the request carries none.
    pub default_email: String,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            amount_cents: 4680,
            item_title: "Taxa EMEX + Liberacao".to_string(),
            default_name: "Cliente Sem Nome".to_string(),
            default_email: "cliente@email.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub cpf_lookup_url: String,
    pub pix_api_url: String,
    /// Pre-encoded Basic credential. Never logged.
    pub pix_api_key: String,
    pub upstream_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub charge: ChargeConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests can feed a map
    /// instead of touching the process environment.
    pub fn from_source<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ChargeConfig::default();

        let config = Self {
            port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            cpf_lookup_url: http_url(
                "CPF_LOOKUP_URL",
                var("CPF_LOOKUP_URL").unwrap_or_else(|| DEFAULT_CPF_LOOKUP_URL.to_string()),
            )?,
            pix_api_url: http_url(
                "PIX_API_URL",
                var("PIX_API_URL").unwrap_or_else(|| DEFAULT_PIX_API_URL.to_string()),
            )?,
            pix_api_key: var("PIX_API_KEY")
                .ok_or_else(|| anyhow::anyhow!("PIX_API_KEY environment variable required"))
                .and_then(|key| {
                    let key: String = key.chars().filter(|c| !c.is_whitespace()).collect();
                    if key.is_empty() {
                        anyhow::bail!("PIX_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            upstream_timeout_secs: var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("UPSTREAM_TIMEOUT_SECS must be a whole number"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be greater than zero");
                    }
                    Ok(secs)
                })?,
            max_body_bytes: var("MAX_BODY_BYTES")
                .unwrap_or_else(|| "65536".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a whole number"))?,
            charge: ChargeConfig {
                amount_cents: match var("PIX_CHARGE_AMOUNT") {
                    Some(raw) => raw
                        .trim()
                        .parse()
                        .map_err(|_| {
                            anyhow::anyhow!("PIX_CHARGE_AMOUNT must be an amount in centavos")
                        })
                        .and_then(|amount: u32| {
                            if amount == 0 {
                                anyhow::bail!("PIX_CHARGE_AMOUNT must be greater than zero");
                            }
                            Ok(amount)
                        })?,
                    None => defaults.amount_cents,
                },
                item_title: non_blank(var("PIX_CHARGE_TITLE")).unwrap_or(defaults.item_title),
                default_name: non_blank(var("PIX_DEFAULT_NAME")).unwrap_or(defaults.default_name),
                default_email: non_blank(var("PIX_DEFAULT_EMAIL"))
                    .unwrap_or(defaults.default_email),
            },
        };

        // Credential deliberately left out of the log lines.
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("CPF lookup URL: {}", config.cpf_lookup_url);
        tracing::debug!("PIX API URL: {}", config.pix_api_url);
        tracing::debug!(
            "Charge: {} centavos ({})",
            config.charge.amount_cents,
            config.charge.item_title
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn http_url(name: &str, url: String) -> anyhow::Result<String> {
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
