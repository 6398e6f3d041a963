//! Quota exhaustion alerts.
//!
//! Delivers a signed JSON POST to an operator-configured webhook whenever a
//! user is denied for an exhausted quota, so billing/upgrade flows can react.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::config::AlertConfig;
use crate::error::{AppError, AppResult};
use crate::models::{QuotaAction, QuotaStatus};

type HmacSha256 = Hmac<Sha256>;

/// Payload delivered to the configured webhook
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaAlert {
    pub user_id: Uuid,
    pub action: QuotaAction,
    pub remaining: i64,
    pub usage_percent: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Fire-and-forget webhook notifier. A no-op when no URL is configured.
#[derive(Clone)]
pub struct QuotaAlertService {
    inner: Option<Arc<AlertInner>>,
}

struct AlertInner {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
}

impl QuotaAlertService {
    pub fn from_config(config: &AlertConfig) -> AppResult<Self> {
        let Some(url) = config.webhook_url.clone() else {
            return Ok(Self { inner: None });
        };

        let parsed = url::Url::parse(&url)
            .map_err(|_| AppError::Validation("Invalid QUOTA_WEBHOOK_URL format".to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::Validation(
                "QUOTA_WEBHOOK_URL must use HTTP or HTTPS".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            inner: Some(Arc::new(AlertInner {
                client,
                url,
                secret: config.webhook_secret.clone(),
            })),
        })
    }

    /// Spawns the delivery. Alerting never blocks or fails the request that
    /// triggered it; failures are logged and dropped.
    pub fn notify_exhausted(&self, user_id: Uuid, action: QuotaAction, status: &QuotaStatus) {
        let Some(inner) = self.inner.clone() else {
            return;
        };

        let alert = QuotaAlert {
            user_id,
            action,
            remaining: status.remaining,
            usage_percent: status.usage_percent,
            occurred_at: Utc::now(),
        };

        tokio::spawn(async move {
            if let Err(e) = deliver(&inner, &alert).await {
                log::error!(
                    "Failed to deliver quota alert for user {}: {}",
                    alert.user_id,
                    e
                );
            }
        });
    }
}

async fn deliver(inner: &AlertInner, alert: &QuotaAlert) -> Result<(), String> {
    let body = serde_json::to_vec(alert).map_err(|e| e.to_string())?;
    let timestamp = Utc::now().timestamp().to_string();

    let mut request = inner
        .client
        .post(&inner.url)
        .header("Content-Type", "application/json")
        .header("X-Quotrak-Timestamp", &timestamp);

    if let Some(ref secret) = inner.secret {
        let signature = generate_signature(secret, &timestamp, &body);
        request = request.header("X-Quotrak-Signature", format!("sha256={}", signature));
    }

    let response = request.body(body).send().await.map_err(|e| {
        if e.is_timeout() {
            "Request timed out".to_string()
        } else if e.is_connect() {
            "Connection failed".to_string()
        } else {
            format!("Request failed: {}", e)
        }
    })?;

    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status().as_u16()));
    }

    Ok(())
}

/// HMAC-SHA256 over `timestamp.body`, hex encoded
fn generate_signature(secret: &str, timestamp: &str, payload: &[u8]) -> String {
    let signature_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(signature_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
