use chrono::{NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use shared_config::AppConfig;

/// Booking confirmation SMS client. Invoked after a booking has committed;
/// a failure here is logged and never surfaced to the booking caller.
pub struct ConfirmationNotifier {
    client: Client,
    gateway_url: String,
    api_token: String,
    from_number: String,
}

#[derive(Debug, Serialize)]
struct SmsPayload<'a> {
    to: &'a str,
    from: &'a str,
    body: &'a str,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("SMS gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SMS gateway rejected message: HTTP {status}: {body}")]
    Gateway { status: u16, body: String },
}

impl ConfirmationNotifier {
    pub fn new(gateway_url: String, api_token: String, from_number: String) -> Self {
        Self {
            client: Client::new(),
            gateway_url,
            api_token,
            from_number,
        }
    }

    /// Build a notifier from the environment config. Returns None when the
    /// gateway is not configured; bookings then proceed silently.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.is_notifications_configured() {
            debug!("SMS gateway not configured, booking confirmations disabled");
            return None;
        }
        Some(Self::new(
            config.sms_gateway_url.clone(),
            config.sms_gateway_token.clone(),
            config.sms_from_number.clone(),
        ))
    }

    pub async fn send_confirmation(
        &self,
        to: &str,
        reservation_code: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<(), NotifyError> {
        let body = format!(
            "Your appointment on {} from {} to {} is confirmed. Reservation code: {}",
            date, start, end, reservation_code
        );

        debug!("Sending booking confirmation to {}", to);

        let response = self
            .client
            .post(&self.gateway_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&SmsPayload {
                to,
                from: &self.from_number,
                body: &body,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("SMS gateway rejected message: {} - {}", status, body);
            return Err(NotifyError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        info!("Booking confirmation sent to {}", to);
        Ok(())
    }
}
