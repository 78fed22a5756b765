//! HTTPS email API client.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::{DeliveryReceipt, EmailMessage, MailDelivery};
use crate::config::GlobalConfig;
use crate::{AppError, Result};

/// Longest provider error body echoed back into an error message.
const MAX_ERROR_BODY: usize = 512;

/// JSON body accepted by the delivery endpoint.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// [`MailDelivery`] over a bearer-authenticated JSON `POST` endpoint.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from_address: String,
}

impl HttpMailer {
    /// Build a mailer for `endpoint` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from_address: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from_address: from_address.into(),
        })
    }

    /// Build a mailer from the `[delivery]` config section.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        Self::new(
            config.delivery.endpoint.clone(),
            config.delivery.api_key.clone(),
            config.delivery.from_address.clone(),
            config.request_timeout(),
        )
    }

    async fn post(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        let body = SendRequest {
            from: &self.from_address,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut detail = response.text().await.unwrap_or_default();
            if detail.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !detail.is_char_boundary(cut) {
                    cut -= 1;
                }
                detail.truncate(cut);
            }
            return Err(AppError::Delivery(format!(
                "endpoint returned {status}: {detail}"
            )));
        }

        let receipt: DeliveryReceipt = response
            .json()
            .await
            .map_err(|err| AppError::Delivery(format!("invalid response body: {err}")))?;
        debug!(delivery_id = %receipt.id, to = %message.to, "email accepted");
        Ok(receipt)
    }
}

impl MailDelivery for HttpMailer {
    fn send<'a>(
        &'a self,
        message: &'a EmailMessage,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReceipt>> + Send + 'a>> {
        Box::pin(self.post(message))
    }
}
