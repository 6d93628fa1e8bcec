use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub payment: PaymentConfig,
    pub default_currency: String,
    pub owner_notify_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub api_base: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub timeout: Duration,
    pub webhook_tolerance_secs: i64,
}

/// The slice of configuration the checkout and webhook handlers read per request.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub default_currency: String,
    pub webhook_secret: String,
    pub gateway_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;

        let payment = PaymentConfig {
            api_base: env::var("PAYMENT_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            secret_key: env::var("PAYMENT_SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("PAYMENT_SECRET_KEY is not set"))?,
            webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET")
                .map_err(|_| anyhow::anyhow!("PAYMENT_WEBHOOK_SECRET is not set"))?,
            timeout: Duration::from_secs(
                env::var("PAYMENT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(10),
            ),
            webhook_tolerance_secs: env::var("PAYMENT_WEBHOOK_TOLERANCE_SECS")
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(300),
        };

        let default_currency = env::var("DEFAULT_CURRENCY")
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or_else(|_| "eur".to_string());
        let owner_notify_url = env::var("OWNER_NOTIFY_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            payment,
            default_currency,
            owner_notify_url,
        })
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            default_currency: self.default_currency.clone(),
            webhook_secret: self.payment.webhook_secret.clone(),
            gateway_timeout: self.payment.timeout,
        }
    }
}
