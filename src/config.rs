use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub notifications: NotificationsConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Key for HMAC-signing admin session tokens.
    pub session_secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub api_base: String,
    pub secret_key: SecretString,
    /// Shared secret for verifying inbound webhook signatures.
    pub webhook_secret: SecretString,
    pub success_url: String,
    pub cancel_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct NotificationsConfig {
    pub email_api_base: String,
    pub email_api_key: SecretString,
    pub email_from: String,
    pub sms_api_base: Option<String>,
    pub sms_api_key: Option<SecretString>,
    pub sms_from: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Server configuration
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        // Database configuration
        let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MAX_CONNECTIONS")?),
            Err(_) => Some(10),
        };
        let db_min_connections = match env::var("DATABASE_MIN_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MIN_CONNECTIONS")?),
            Err(_) => Some(1),
        };

        let session_secret: SecretString = env::var("SESSION_SECRET")
            .context("SESSION_SECRET must be set")?
            .into();

        // Payment processor configuration
        let payments = PaymentsConfig {
            api_base: env::var("PAYMENTS_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            secret_key: env::var("PAYMENTS_SECRET_KEY")
                .context("PAYMENTS_SECRET_KEY must be set")?
                .into(),
            webhook_secret: env::var("PAYMENTS_WEBHOOK_SECRET")
                .context("PAYMENTS_WEBHOOK_SECRET must be set")?
                .into(),
            success_url: env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "https://movi-lab.fr/merci".to_string()),
            cancel_url: env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "https://movi-lab.fr/reservation".to_string()),
            request_timeout_secs: match env::var("PAYMENTS_TIMEOUT_SECS") {
                Ok(val) => val.parse().context("Failed to parse PAYMENTS_TIMEOUT_SECS")?,
                Err(_) => 15,
            },
        };

        // Notification sender configuration (SMS is optional)
        let notifications = NotificationsConfig {
            email_api_base: env::var("EMAIL_API_BASE")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            email_api_key: env::var("EMAIL_API_KEY")
                .context("EMAIL_API_KEY must be set")?
                .into(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "movi-lab <contact@movi-lab.fr>".to_string()),
            sms_api_base: env::var("SMS_API_BASE").ok(),
            sms_api_key: env::var("SMS_API_KEY").ok().map(Into::into),
            sms_from: env::var("SMS_FROM").ok(),
            request_timeout_secs: match env::var("NOTIFICATIONS_TIMEOUT_SECS") {
                Ok(val) => val.parse().context("Failed to parse NOTIFICATIONS_TIMEOUT_SECS")?,
                Err(_) => 10,
            },
        };

        // App configuration
        let environment_str =
            env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let environment =
            Environment::from_str(&environment_str).unwrap_or(Environment::Development);

        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "movilab-backend".to_string());

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            auth: AuthConfig { session_secret },
            payments,
            notifications,
            app: AppConfig {
                name: app_name,
                environment,
            },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    #[allow(unused)]
    pub fn is_production(&self) -> bool {
        self.app.environment == Environment::Production
    }

    #[allow(unused)]
    pub fn is_development(&self) -> bool {
        self.app.environment == Environment::Development
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

// Use once_cell for a global config instance that's initialized once
use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}

pub fn get() -> &'static Config {
    CONFIG.get().expect("Config is not initialized")
}
