//! Operator notification.
//!
//! Notifications are best effort: delivery problems are logged and never
//! surface to the caller.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, warn};

use fjord_types::NotifySettings;

/// Sink for operator-facing alerts.
pub trait Notifier: Send + Sync {
    fn notify(&self, subject: &str, message: &str);
}

/// Logs notifications at error level.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, subject: &str, message: &str) {
        error!(subject, message, "Operator notification");
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    message: &'a str,
}

/// Posts notifications as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, subject: &str, message: &str) {
        // Keep the alert in the logs even if the webhook is unreachable
        error!(subject, message, "Operator notification");

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "No runtime to deliver webhook notification");
                return;
            }
        };

        let request = self.client.post(&self.url).json(&WebhookPayload { subject, message });
        let url = self.url.clone();
        handle.spawn(async move {
            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(_) => {}
                Err(e) => warn!(url, error = %e, "Webhook notification failed"),
            }
        });
    }
}

/// Pick the notifier configured in settings.
pub fn notifier_from_settings(settings: &NotifySettings) -> Arc<dyn Notifier> {
    match &settings.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(TracingNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifier_from_settings() {
        // Neither notifier may panic, even without a runtime
        notifier_from_settings(&NotifySettings::default()).notify("subject", "message");
        notifier_from_settings(&NotifySettings {
            webhook_url: Some("http://127.0.0.1:9/hook".to_string()),
        })
        .notify("subject", "message");
    }

    #[tokio::test]
    async fn test_webhook_failure_is_swallowed() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook");
        notifier.notify("queue transport error", "connection refused");
        tokio::task::yield_now().await;
    }
}
