use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::models::Lead;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("webhook url is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("webhook error: {0}")]
    Webhook(String),
}

/// One spreadsheet row. Column order mirrors the sheet headers set up
/// by the receiving Apps Script.
#[derive(Debug, Serialize)]
struct LeadRow<'a> {
    timestamp: String,
    date: String,
    id: uuid::Uuid,
    service_type: &'a str,
    pickup: &'a str,
    dropoff: &'a str,
    package_size: &'a str,
    vehicle: &'a str,
    package_type: &'a str,
    source: &'a str,
}

#[derive(Debug, Deserialize)]
struct WebhookResp {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the spreadsheet-logging webhook. A failure here is only
/// diagnostic; callers log it and carry on with the user flow.
pub struct Sheets {
    client: reqwest::Client,
    url: String,
}

impl Sheets {
    pub fn new(url: String, timeout_secs: u64) -> Self {
        let timeout = if timeout_secs > 0 {
            timeout_secs
        } else {
            DEFAULT_TIMEOUT_SECS
        };
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout))
                .build()
                .unwrap_or_default(),
            url,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }

    /// Append one lead as a spreadsheet row.
    pub async fn append(&self, lead: &Lead) -> Result<(), SheetsError> {
        if !self.is_configured() {
            return Err(SheetsError::NotConfigured);
        }

        let now = Local::now();
        let row = match lead {
            Lead::Kurye {
                pickup,
                dropoff,
                package_size,
                vehicle,
                package_type,
                source,
            } => LeadRow {
                timestamp: now.format("%d.%m.%Y %H:%M:%S").to_string(),
                date: now.format("%Y-%m-%d").to_string(),
                id: uuid::Uuid::new_v4(),
                service_type: lead.service_label(),
                pickup,
                dropoff,
                package_size,
                vehicle,
                package_type,
                source,
            },
            Lead::Pharmacy { source, .. } | Lead::Valet { source, .. } => LeadRow {
                timestamp: now.format("%d.%m.%Y %H:%M:%S").to_string(),
                date: now.format("%Y-%m-%d").to_string(),
                id: uuid::Uuid::new_v4(),
                service_type: lead.service_label(),
                pickup: "",
                dropoff: "",
                package_size: "",
                vehicle: "",
                package_type: "",
                source,
            },
        };

        let resp = self.client.post(&self.url).json(&row).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SheetsError::Status(status));
        }

        // The Apps Script always answers 200 with a JSON body; a logical
        // failure is reported in that body.
        let body: WebhookResp = resp.json().await?;
        if !body.success {
            return Err(SheetsError::Webhook(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(())
    }
}
