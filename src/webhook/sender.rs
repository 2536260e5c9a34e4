// file: src/webhook/sender.rs
// version: 1.0.0
// guid: d5e6f7a8-b9c0-4d1e-8f2a-3b4c5d6e7f80

//! Webhook delivery with bounded retry on timeouts

use super::{prepare_webhook, RenderedWebhook, WebhookEvent};
use crate::config::Webhook;
use crate::error::InstallerError;
use crate::settings::WebhookSettings;
use crate::Result;
use reqwest::{Client, Method};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Sends rendered webhooks
pub struct WebhookSender {
    client: Client,
    /// Client used for webhooks with `insecure` set
    insecure_client: Client,
    attempts: u32,
    retry_delay: Duration,
}

impl WebhookSender {
    /// Create a sender with a per-request `timeout`, making up to `attempts`
    /// attempts separated by `retry_delay`
    pub fn new(timeout: Duration, attempts: u32, retry_delay: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let insecure_client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            client,
            insecure_client,
            attempts: attempts.max(1),
            retry_delay,
        })
    }

    pub fn from_settings(settings: &WebhookSettings) -> Result<Self> {
        Self::new(settings.timeout(), settings.retries, settings.retry_delay())
    }

    /// Deliver one webhook. Only timeouts are retried; any other failure,
    /// including a non-2xx response, is returned immediately.
    pub async fn send(&self, hook: &RenderedWebhook) -> Result<()> {
        let url = Url::parse(&hook.url)
            .map_err(|e| InstallerError::webhook(format!("invalid URL {:?}: {}", hook.url, e)))?;
        let method = Method::from_bytes(hook.source.method.to_uppercase().as_bytes())
            .map_err(|_| InstallerError::UnknownMethod(hook.source.method.clone()))?;
        let client = if hook.source.insecure {
            &self.insecure_client
        } else {
            &self.client
        };

        for attempt in 1..=self.attempts {
            let mut request = client.request(method.clone(), url.clone());
            for (name, values) in &hook.source.headers {
                for value in values {
                    request = request.header(name.as_str(), value.as_str());
                }
            }
            if let Some(auth) = &hook.source.basic_auth {
                request = request.basic_auth(&auth.user, Some(&auth.password));
            }
            if !hook.payload.is_empty() {
                request = request.body(hook.payload.clone());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!("Webhook {} {} returned {}", method, url, status);
                        return Ok(());
                    }
                    return Err(InstallerError::webhook(format!(
                        "{} {} returned HTTP {}",
                        method, url, status
                    )));
                }
                Err(e) if e.is_timeout() && attempt < self.attempts => {
                    warn!(
                        "Webhook attempt {}/{} timed out, retrying in {:?}",
                        attempt, self.attempts, self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(InstallerError::webhook(format!(
            "{} {} failed after {} attempts",
            method, url, self.attempts
        )))
    }

    /// Send every webhook registered for `event`. Failures are logged, not
    /// returned. Returns the number of webhooks delivered.
    pub async fn send_event(
        &self,
        webhooks: &[Webhook],
        event: WebhookEvent,
        context: &BTreeMap<String, String>,
    ) -> usize {
        let mut delivered = 0;
        for source in webhooks.iter().filter(|w| w.event == event.as_str()) {
            let result = match prepare_webhook(source, context) {
                Ok(hook) => self.send(&hook).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => delivered += 1,
                Err(e) => error!("Failed to send {} webhook: {}", event, e),
            }
        }
        info!("Delivered {} webhook(s) for {}", delivered, event);
        delivered
    }
}
