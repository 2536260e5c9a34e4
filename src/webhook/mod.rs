// file: src/webhook/mod.rs
// version: 1.0.0
// guid: c4d5e6f7-a8b9-4c0d-9e1f-2a3b4c5d6e7f

//! Install event webhooks: template rendering and delivery

pub mod sender;

use crate::config::Webhook;
use crate::error::InstallerError;
use crate::stages::templates::registry;
use crate::utils::HostInterface;
use crate::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use sender::WebhookSender;

/// HTTP methods a webhook may use
pub const HTTP_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "CONNECT", "OPTIONS", "TRACE",
];

/// Install lifecycle events that trigger webhooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEvent {
    Started,
    Succeeded,
    Failed,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }
}

impl FromStr for WebhookEvent {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "STARTED" => Ok(Self::Started),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            other => Err(InstallerError::UnknownEvent(other.to_string())),
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A webhook with its URL and payload expanded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedWebhook {
    pub source: Webhook,
    pub event: WebhookEvent,
    pub url: String,
    pub payload: String,
}

/// Validate `source` and expand its URL and payload templates against `context`.
/// Placeholders missing from `context` render as empty strings.
pub fn prepare_webhook(source: &Webhook, context: &BTreeMap<String, String>) -> Result<RenderedWebhook> {
    let event = source.event.parse::<WebhookEvent>()?;

    let method = source.method.to_uppercase();
    if !HTTP_METHODS.contains(&method.as_str()) {
        return Err(InstallerError::UnknownMethod(source.method.clone()));
    }

    let hb = registry();
    let url = hb.render_template(&source.url, context)?;
    let payload = hb.render_template(&source.payload, context)?;

    Ok(RenderedWebhook {
        source: source.clone(),
        event,
        url,
        payload,
    })
}

/// Template context describing this node
pub fn webhook_context(hostname: &str, interface: Option<&HostInterface>) -> BTreeMap<String, String> {
    let mut context = BTreeMap::new();
    context.insert("hostname".to_string(), hostname.to_string());
    if let Some(iface) = interface {
        context.insert("macAddr".to_string(), iface.hw_addr.clone());
        if let Some(ip) = iface.ipv4 {
            context.insert("ipAddr".to_string(), ip.to_string());
        }
    }
    context
}
