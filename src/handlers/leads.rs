use std::sync::Arc;

use axum::{extract::State, Json};

use super::Ctx;
use crate::models::{FieldError, Lead};

/// Response body for the lead endpoint. Always serialized, success or
/// not; this route never answers with a bare transport-level error.
#[derive(Debug, serde::Serialize)]
pub struct LeadResp {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_url: Option<String>,
}

/// Build the wa.me deep link carrying the lead summary.
pub fn whatsapp_link(number: &str, lead: &Lead) -> String {
    format!(
        "https://wa.me/{}?text={}",
        number,
        urlencoding::encode(&lead.whatsapp_message())
    )
}

/// Record a lead in the spreadsheet. Failures are logged and swallowed;
/// the user journey continues to the deep link regardless.
pub async fn log_lead(ctx: &Ctx, lead: &Lead) {
    if !ctx.sheets.is_configured() {
        log::warn!("sheets webhook not configured, lead not logged");
        return;
    }
    if let Err(e) = ctx.sheets.append(lead).await {
        log::error!("error logging lead to sheet: {}", e);
    }
}

/// POST /api/leads - Validate a lead, append it to the spreadsheet and
/// hand back the WhatsApp deep link.
pub async fn create_lead(State(ctx): State<Arc<Ctx>>, Json(lead): Json<Lead>) -> Json<LeadResp> {
    if !ctx.consts.enable_leads {
        return Json(LeadResp {
            success: false,
            message: None,
            error: Some("lead submissions are disabled".to_string()),
            errors: None,
            whatsapp_url: None,
        });
    }

    let errors = lead.validate();
    if !errors.is_empty() {
        return Json(LeadResp {
            success: false,
            message: None,
            error: Some("required fields are missing".to_string()),
            errors: Some(errors),
            whatsapp_url: None,
        });
    }

    // Logging failure must not block the deep link.
    log_lead(&ctx, &lead).await;

    Json(LeadResp {
        success: true,
        message: Some("lead recorded".to_string()),
        error: None,
        errors: None,
        whatsapp_url: Some(whatsapp_link(&ctx.consts.whatsapp_number, &lead)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_link_encodes_message() {
        let lead = Lead::Kurye {
            pickup: "Moda Mh. - Kadıköy".to_string(),
            dropoff: "Acıbadem Mh. - Üsküdar".to_string(),
            package_size: "Orta".to_string(),
            vehicle: "Motor".to_string(),
            package_type: "Standart".to_string(),
            source: "Courier Form".to_string(),
        };

        let url = whatsapp_link("905551112233", &lead);
        assert!(url.starts_with("https://wa.me/905551112233?text="));
        // Spaces and newlines must be percent-encoded.
        assert!(!url.contains(' '));
        assert!(!url.contains('\n'));
        assert!(url.contains("Merhaba"));
    }
}
