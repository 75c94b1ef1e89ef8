use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::Form;

use super::leads::{log_lead, whatsapp_link};
use super::Ctx;
use crate::autocomplete::canonicalize;
use crate::models::Lead;

#[derive(serde::Deserialize)]
pub struct MessageParams {
    title: Option<String>,
    message: Option<String>,
}

/// Form body for the no-JS courier form fallback.
#[derive(Debug, serde::Deserialize)]
pub struct KuryeForm {
    #[serde(default)]
    pub pickup: String,
    #[serde(default)]
    pub dropoff: String,
    #[serde(default)]
    pub package_size: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub package_type: String,
    /// Which form the visitor came through. Empty means the regular
    /// courier page.
    #[serde(default)]
    pub source: String,
}

impl KuryeForm {
    fn into_lead(self) -> Lead {
        let source = if self.source.is_empty() {
            "Courier Form".to_string()
        } else {
            self.source
        };

        Lead::Kurye {
            pickup: self.pickup,
            dropoff: self.dropoff,
            package_size: self.package_size,
            vehicle: self.vehicle,
            package_type: self.package_type,
            source,
        }
    }
}

/// Build common template context.
fn base_context(ctx: &Ctx) -> tera::Context {
    let mut context = tera::Context::new();
    context.insert("asset_ver", &ctx.asset_ver);
    context.insert("consts", &ctx.consts);
    context.insert("i18n", &ctx.i18n);
    context.insert("version", &ctx.version);
    context
}

/// Render a site page with the loaded theme.
fn render(
    ctx: &Ctx,
    template: &str,
    context: &tera::Context,
) -> std::result::Result<Html<String>, impl IntoResponse> {
    ctx.site_tpl.render(template, context).map(Html).map_err(|e| {
        // Log full error chain for debugging.
        let mut msg = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            msg.push_str(&format!(": {}", cause));
            source = std::error::Error::source(cause);
        }
        log::error!("template error: {}", msg);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("template error: {}", msg),
        )
    })
}

/// Site index: hero section plus the quick quote form.
pub async fn index(State(ctx): State<Arc<Ctx>>) -> impl IntoResponse {
    let mut context = base_context(&ctx);
    context.insert("page_type", "/");
    render(&ctx, "index.html", &context)
}

/// Services overview page.
pub async fn services(State(ctx): State<Arc<Ctx>>) -> impl IntoResponse {
    let mut context = base_context(&ctx);
    context.insert("page_type", "services");
    render(&ctx, "services.html", &context)
}

/// Pricing tables.
pub async fn pricing(State(ctx): State<Arc<Ctx>>) -> impl IntoResponse {
    let mut context = base_context(&ctx);
    context.insert("page_type", "pricing");
    render(&ctx, "pricing.html", &context)
}

/// Query params for prefilling the courier form, used by the hero
/// quick quote on the index page.
#[derive(Debug, Default, serde::Deserialize)]
pub struct KuryePrefill {
    #[serde(default)]
    pub pickup: String,
    #[serde(default)]
    pub dropoff: String,
    #[serde(default)]
    pub src: String,
}

/// Courier lead form page.
pub async fn kurye(
    State(ctx): State<Arc<Ctx>>,
    Query(prefill): Query<KuryePrefill>,
) -> impl IntoResponse {
    let form = KuryeContext {
        pickup: canonicalize(&ctx.neighborhoods, &prefill.pickup),
        dropoff: canonicalize(&ctx.neighborhoods, &prefill.dropoff),
        source: lead_source(&prefill.src).to_string(),
        ..Default::default()
    };

    let mut context = base_context(&ctx);
    context.insert("page_type", "kurye");
    context.insert("errors", &HashMap::<String, String>::new());
    context.insert("form", &form);
    render(&ctx, "kurye.html", &context)
}

fn lead_source(src: &str) -> &'static str {
    match src {
        "hero" => "Hero Form",
        _ => "Courier Form",
    }
}

/// Previously entered values echoed back into the form on error.
#[derive(Debug, Default, serde::Serialize)]
struct KuryeContext {
    pickup: String,
    dropoff: String,
    package_size: String,
    vehicle: String,
    package_type: String,
    source: String,
}

/// Handle the courier form fallback POST: validate, log the lead, then
/// redirect straight into the WhatsApp deep link. A logging failure
/// never blocks the redirect.
pub async fn submit_kurye(
    State(ctx): State<Arc<Ctx>>,
    Form(mut form): Form<KuryeForm>,
) -> impl IntoResponse {
    if !ctx.consts.enable_leads {
        return render_message(&ctx, "Hata", "Talep alımı şu anda kapalı.").into_response();
    }

    let values = KuryeContext {
        pickup: form.pickup.clone(),
        dropoff: form.dropoff.clone(),
        package_size: form.package_size.clone(),
        vehicle: form.vehicle.clone(),
        package_type: form.package_type.clone(),
        source: form.source.clone(),
    };

    // Free-typed addresses get resolved to their canonical labels when
    // they narrow down to a single neighborhood.
    form.pickup = canonicalize(&ctx.neighborhoods, &form.pickup);
    form.dropoff = canonicalize(&ctx.neighborhoods, &form.dropoff);

    let lead = form.into_lead();
    let errors = lead.validate();
    if !errors.is_empty() {
        let errors: HashMap<&str, &str> =
            errors.iter().map(|e| (e.field, e.message.as_str())).collect();

        let mut context = base_context(&ctx);
        context.insert("page_type", "kurye");
        context.insert("errors", &errors);
        context.insert("form", &values);
        return match render(&ctx, "kurye.html", &context) {
            Ok(html) => html.into_response(),
            Err(e) => e.into_response(),
        };
    }

    log_lead(&ctx, &lead).await;

    Redirect::to(&whatsapp_link(&ctx.consts.whatsapp_number, &lead)).into_response()
}

/// Custom content pages rendered from pages/*.html in the theme.
pub async fn render_custom_page(
    State(ctx): State<Arc<Ctx>>,
    Path(page): Path<String>,
) -> impl IntoResponse {
    let template = format!("pages/{}.html", page);
    if ctx.site_tpl.get_template(&template).is_err() {
        return (StatusCode::NOT_FOUND, "page not found").into_response();
    }

    let mut context = base_context(&ctx);
    context.insert("page_type", "page");
    context.insert("page_id", &page);

    match render(&ctx, &template, &context) {
        Ok(html) => html.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Generic message page.
pub async fn message(
    State(ctx): State<Arc<Ctx>>,
    Query(params): Query<MessageParams>,
) -> impl IntoResponse {
    let title = params.title.unwrap_or_default();
    let description = params.message.unwrap_or_default();
    render_message(&ctx, &title, &description)
}

/// Helper to render the message template.
fn render_message(ctx: &Ctx, title: &str, description: &str) -> impl IntoResponse {
    let mut context = base_context(ctx);
    context.insert("page_type", "message");
    context.insert("title", title);
    context.insert("description", description);

    match render(ctx, "message.html", &context) {
        Ok(html) => html.into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_without_source_tags_the_courier_page() {
        let form = KuryeForm {
            pickup: "Acıbadem Mh. - Üsküdar".into(),
            dropoff: "Moda Mh. - Kadıköy".into(),
            package_size: "Orta".into(),
            vehicle: "Motor".into(),
            package_type: "Evrak".into(),
            source: String::new(),
        };
        assert_eq!(form.into_lead().source(), "Courier Form");
    }

    #[test]
    fn hero_quick_quote_keeps_its_own_source_tag() {
        assert_eq!(lead_source("hero"), "Hero Form");
        assert_eq!(lead_source(""), "Courier Form");
        assert_eq!(lead_source("unknown"), "Courier Form");

        let form = KuryeForm {
            pickup: "Acıbadem Mh. - Üsküdar".into(),
            dropoff: "Moda Mh. - Kadıköy".into(),
            package_size: "Orta".into(),
            vehicle: "Motor".into(),
            package_type: "Evrak".into(),
            source: "Hero Form".into(),
        };
        assert_eq!(form.into_lead().source(), "Hero Form");
    }
}
