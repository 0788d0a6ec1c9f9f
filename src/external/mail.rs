use crate::config::MailConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Client for the transactional mail HTTP API.
#[derive(Clone)]
pub struct MailService {
    client: Client,
    config: MailConfig,
}

impl MailService {
    pub fn new(config: MailConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.api_url.is_empty()
    }

    pub async fn send_email(&self, message: &EmailMessage) -> AppResult<()> {
        if !self.is_enabled() {
            log::info!("Mail API not configured, skipping email to {}", message.to);
            return Ok(());
        }

        let payload = SendEmailRequest {
            from: format!("{} <{}>", self.config.from_name, self.config.from_address),
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Email sent successfully: {}", message.to);
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Email failed to send: {}, Status: {}, Error: {}", message.to, status, error_text);
            Err(AppError::ExternalApiError(format!(
                "Email sending failed ({status}): {error_text}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "ayesha@example.com".to_string(),
            subject: "Order placed".to_string(),
            html: "<p>hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_disabled_service_skips() {
        let mail = MailService::new(MailConfig::default());
        assert!(!mail.is_enabled());
        assert!(mail.send_email(&message()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_api_errors() {
        let mail = MailService::new(MailConfig {
            api_url: "http://127.0.0.1:9/send".to_string(),
            api_key: "k".to_string(),
            from_address: "orders@example.com".to_string(),
            from_name: "HOMEZaika".to_string(),
        });
        assert!(mail.send_email(&message()).await.is_err());
    }
}
