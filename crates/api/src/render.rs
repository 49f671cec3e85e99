//! Admin page descriptors
//!
//! Pages are returned as JSON: the template to render, layout settings, the
//! flash messages to display and the page content.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::flash::FlashMessage;

#[derive(Debug, Clone, Serialize)]
pub struct ToolbarButton {
    pub href: String,
    pub desc: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub template: &'static str,
    pub layout_title: String,
    pub enable_sidebar: bool,
    pub layout_header_toolbar_btn: Vec<ToolbarButton>,
    pub flashes: Vec<FlashMessage>,
    pub content: Value,
}

impl Page {
    pub fn new(template: &'static str, layout_title: impl Into<String>) -> Self {
        Self {
            template,
            layout_title: layout_title.into(),
            enable_sidebar: false,
            layout_header_toolbar_btn: Vec::new(),
            flashes: Vec::new(),
            content: Value::Null,
        }
    }

    pub fn with_sidebar(mut self) -> Self {
        self.enable_sidebar = true;
        self
    }

    pub fn with_flashes(mut self, flashes: Vec<FlashMessage>) -> Self {
        self.flashes = flashes;
        self
    }

    /// Content that fails to serialize renders as null
    pub fn with_content(mut self, content: impl Serialize) -> Self {
        self.content = serde_json::to_value(content).unwrap_or_else(|e| {
            tracing::error!(error = %e, template = self.template, "Page content not serializable");
            Value::Null
        });
        self
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
