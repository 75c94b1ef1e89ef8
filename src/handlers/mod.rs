pub mod leads;
pub mod neighborhoods;
pub mod site;

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tera::Tera;

use crate::{autocomplete::NeighborhoodSet, sheets::Sheets};

/// Application context passed to all handlers.
pub struct Ctx {
    /// Full record set for the autocomplete, immutable after load.
    pub neighborhoods: Arc<NeighborhoodSet>,
    pub sheets: Arc<Sheets>,

    /// Site templates: embedded default theme, or loaded from --site.
    pub site_tpl: Arc<Tera>,
    /// Set when the theme is loaded from disk via --site.
    pub site_path: Option<std::path::PathBuf>,
    pub i18n: HashMap<String, String>,
    /// Preloaded static files (JS & CSS) for bundling.
    pub static_files: HashMap<String, Bytes>,

    pub consts: Consts,
    pub asset_ver: String,
    pub version: String,
}

/// Application constants.
#[derive(Clone, serde::Serialize)]
pub struct Consts {
    pub root_url: String,
    pub whatsapp_number: String,
    pub enable_leads: bool,

    /// How many suggestions the dropdown shows. The filter itself never
    /// truncates; this is a display cap for the presentation layer.
    pub num_suggestions: usize,
}

impl Default for Consts {
    fn default() -> Self {
        Self {
            root_url: String::new(),
            whatsapp_number: String::new(),
            enable_leads: true,
            num_suggestions: 10,
        }
    }
}

/// API response wrapper.
#[derive(Serialize)]
pub struct ApiResp<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T: Serialize> IntoResponse for ApiResp<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub fn json<T: Serialize>(data: T) -> ApiResp<T> {
    ApiResp {
        data: Some(data),
        message: None,
    }
}

/// API error type.
#[derive(Debug)]
pub struct ApiErr {
    pub message: String,
    pub status: StatusCode,
}

impl ApiErr {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }
}

impl<E: std::fmt::Display> From<E> for ApiErr {
    fn from(err: E) -> Self {
        Self::new(err.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let json = Json(ApiResp::<()> {
            data: None,
            message: Some(self.message),
        });
        (self.status, json).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiErr>;
