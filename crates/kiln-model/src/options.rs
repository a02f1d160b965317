//! Engine configuration shared by validation, binding and saving.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which visibility flag applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Web,
    Pdf,
}

/// Mode a form is opened in by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormMode {
    View,
    #[default]
    Edit,
    Preview,
    Generate,
    PortalNew,
    PortalEdit,
    PortalView,
}

impl FormMode {
    pub const ALL: [FormMode; 7] = [
        FormMode::View,
        FormMode::Edit,
        FormMode::Preview,
        FormMode::Generate,
        FormMode::PortalNew,
        FormMode::PortalEdit,
        FormMode::PortalView,
    ];

    /// Modes in which every field is rendered read-only.
    pub fn is_read_only(self) -> bool {
        matches!(self, FormMode::View | FormMode::PortalView | FormMode::Preview)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormMode::View => "view",
            FormMode::Edit => "edit",
            FormMode::Preview => "preview",
            FormMode::Generate => "generate",
            FormMode::PortalNew => "portalNew",
            FormMode::PortalEdit => "portalEdit",
            FormMode::PortalView => "portalView",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == raw)
    }
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_FIELD_LABEL: &str = "This field";

/// Options for a validation or save pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub render_mode: RenderMode,
    /// Label used in messages when a field has neither `labelText` nor `name`.
    pub default_label: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Web,
            default_label: DEFAULT_FIELD_LABEL.to_string(),
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    #[must_use]
    pub fn with_default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = label.into();
        self
    }
}
