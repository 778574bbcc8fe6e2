use serde::Deserialize;
use tracing::warn;

const DEV_JWT_SECRET: &str = "pkmatchz-dev-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub api_base: String,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseConfig {
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub from: String,
    pub notify_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub stripe: StripeConfig,
    pub coinbase: CoinbaseConfig,
    pub email: EmailConfig,
    pub coin_packages_path: Option<String>,
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let production = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let secret = match optional("JWT_SECRET") {
            Some(secret) => secret,
            None if production => anyhow::bail!("JWT_SECRET must be set when APP_ENV=production"),
            None => {
                warn!("JWT_SECRET is not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "pkmatchz".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "pkmatchz-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };

        let stripe = StripeConfig {
            secret_key: optional("STRIPE_SECRET_KEY"),
            api_base: std::env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com/v1".into()),
            webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
        };
        if stripe.secret_key.is_none() {
            warn!("STRIPE_SECRET_KEY is not set; card payments will fail");
        }
        if stripe.webhook_secret.is_none() {
            warn!("STRIPE_WEBHOOK_SECRET is not set; stripe webhooks will be rejected");
        }

        let coinbase = CoinbaseConfig {
            webhook_secret: optional("COINBASE_WEBHOOK_SECRET"),
        };
        if coinbase.webhook_secret.is_none() {
            warn!("COINBASE_WEBHOOK_SECRET is not set; coinbase webhooks will be rejected");
        }

        let email = EmailConfig {
            api_key: optional("EMAIL_API_KEY"),
            api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".into()),
            from: std::env::var("EMAIL_FROM").unwrap_or_else(|_| "noreply@pkmatchz.com".into()),
            notify_to: optional("CONTACT_NOTIFY_TO"),
        };

        Ok(Self {
            database_url,
            jwt,
            stripe,
            coinbase,
            email,
            coin_packages_path: optional("COIN_PACKAGES_PATH"),
        })
    }
}
