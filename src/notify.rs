//! Webhook notification channel for alert and incident events
//!
//! Delivery is best-effort: failures are logged and never propagated into
//! the pipeline. Retries and channel fan-out belong to whatever is on the
//! receiving end of the webhook.

use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::{Alert, Incident, Service};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct WebhookConfig {
    pub url: String,
}

/// Sends alert/incident creation events to a configured webhook
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    webhook: Option<WebhookConfig>,
}

impl Notifier {
    pub fn new(webhook: Option<WebhookConfig>) -> Self {
        Self {
            client: Client::new(),
            webhook,
        }
    }

    /// A notifier that drops every event.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    #[instrument(skip(self, service, alert), fields(service = %service.name))]
    pub async fn alert_triggered(&self, service: &Service, alert: &Alert) {
        let payload = json!({
            "event": "alert",
            "service": service.name,
            "type": alert.kind.to_string(),
            "severity": alert.severity.to_string(),
            "message": alert.message,
            "threshold": alert.threshold,
            "timestamp": Utc::now().to_rfc3339(),
        });

        self.post(payload).await;
    }

    #[instrument(skip(self, service, incident), fields(service = %service.name))]
    pub async fn incident_opened(&self, service: &Service, incident: &Incident) {
        let payload = json!({
            "event": "incident",
            "service": service.name,
            "title": incident.title,
            "description": incident.description,
            "severity": incident.severity.to_string(),
            "sla_target": incident.sla_target.to_rfc3339(),
            "timestamp": Utc::now().to_rfc3339(),
        });

        self.post(payload).await;
    }

    async fn post(&self, payload: serde_json::Value) {
        let Some(webhook) = &self.webhook else {
            return;
        };

        match self.client.post(&webhook.url).json(&payload).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Successfully sent webhook notification");
                } else {
                    error!(
                        "Webhook notification failed with status: {}",
                        response.status()
                    );
                }
            }
            Err(e) => {
                error!("Failed to send webhook notification: {}", e);
            }
        }
    }
}
