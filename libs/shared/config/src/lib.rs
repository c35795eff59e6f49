use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub sms_gateway_url: String,
    pub sms_gateway_token: String,
    pub sms_from_number: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_URL not set, using ./clinic.db");
                    "clinic.db".to_string()
                }),
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            sms_gateway_url: env::var("SMS_GATEWAY_URL")
                .unwrap_or_else(|_| {
                    warn!("SMS_GATEWAY_URL not set, booking confirmations disabled");
                    String::new()
                }),
            sms_gateway_token: env::var("SMS_GATEWAY_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("SMS_GATEWAY_TOKEN not set, booking confirmations disabled");
                    String::new()
                }),
            sms_from_number: env::var("SMS_FROM_NUMBER")
                .unwrap_or_else(|_| {
                    warn!("SMS_FROM_NUMBER not set, booking confirmations disabled");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.database_url.is_empty()
    }

    pub fn is_notifications_configured(&self) -> bool {
        !self.sms_gateway_url.is_empty()
            && !self.sms_gateway_token.is_empty()
            && !self.sms_from_number.is_empty()
    }
}
