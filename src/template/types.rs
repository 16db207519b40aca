//! Template types and error definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fields::{merge_template_fields, CurrentFields, LegacyFields};

/// Template store error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid template ID: {0}")]
    InvalidId(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

/// Result type for template store operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Failure while turning stored preview data into a payload object
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Preview data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Preview data parsed to {0}, expected an object")]
    NotAnObject(&'static str),
}

impl NormalizeError {
    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            NormalizeError::Parse(_) => "parse",
            NormalizeError::NotAnObject(_) => "not_object",
        }
    }
}

/// Failure while rendering a template.
///
/// Never leaves the renderer as an `Err`; it is turned into an error block
/// inside the rendered output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Payload must be an object, got {0}")]
    InvalidPayload(&'static str),

    #[error("Remote renderer request failed: {0}")]
    Remote(String),

    #[error("Remote renderer timed out after {0}ms")]
    Timeout(u64),

    #[error("Remote renderer returned HTTP {0}")]
    RemoteStatus(u16),

    #[error("Remote renderer response could not be decoded: {0}")]
    Decode(String),
}

impl RenderError {
    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            RenderError::InvalidPayload(_) => "invalid_payload",
            RenderError::Remote(_) => "remote",
            RenderError::Timeout(_) => "timeout",
            RenderError::RemoteStatus(_) => "remote_status",
            RenderError::Decode(_) => "decode",
        }
    }
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Delivery medium of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    #[default]
    Email,
    Sms,
    Whatsapp,
    Telegram,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "EMAIL",
            Channel::Sms => "SMS",
            Channel::Whatsapp => "WHATSAPP",
            Channel::Telegram => "TELEGRAM",
        }
    }

    pub fn is_email(&self) -> bool {
        matches!(self, Channel::Email)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored notification template as managed by operators.
///
/// Carries both the legacy and the current body field names; use
/// [`TemplateItem::fields`] to get the canonical shape the renderer accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateItem {
    /// Unique template identifier (alphanumeric, dash, underscore)
    pub id: String,

    /// Human-readable template name
    pub name: String,

    /// Delivery channel, EMAIL when unset
    #[serde(default)]
    pub channel: Option<Channel>,

    #[serde(flatten)]
    pub legacy: LegacyFields,

    #[serde(flatten)]
    pub current: CurrentFields,

    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Serialized sample payload, possibly mangled by storage round-trips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_data: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl TemplateItem {
    /// Canonical render input for this template
    pub fn fields(&self) -> TemplateFields {
        let bodies = merge_template_fields(&self.legacy, &self.current);

        TemplateFields {
            name: self.name.clone(),
            channel: self.channel.unwrap_or_default(),
            subject: bodies.subject,
            html_body: bodies.html_body,
            text_body: bodies.text_body,
        }
    }

    /// Validate the template
    pub fn validate(&self) -> TemplateResult<()> {
        if self.id.is_empty() || self.id.len() > 64 {
            return Err(TemplateError::InvalidId(
                "ID must be 1-64 characters".to_string(),
            ));
        }

        if !self
            .id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TemplateError::InvalidId(
                "ID must contain only alphanumeric, dash, or underscore".to_string(),
            ));
        }

        if self.name.trim().is_empty() || self.name.len() > 256 {
            return Err(TemplateError::InvalidTemplate(
                "Name must be 1-256 characters".to_string(),
            ));
        }

        Ok(())
    }
}

/// Canonical template shape consumed by renderers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channel: Channel,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html_body: String,
    #[serde(default)]
    pub text_body: String,
}

/// Output of a single render
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedOutput {
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
}

/// Request to update an existing template
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub channel: Option<Channel>,
    pub subject: Option<String>,
    pub email_subject: Option<String>,
    pub content_html: Option<String>,
    pub email_content_html: Option<String>,
    pub content_text: Option<String>,
    pub sms_content: Option<String>,
    pub is_active: Option<bool>,

    /// Use null to clear
    #[serde(default, deserialize_with = "double_option")]
    pub preview_data: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Response for listing templates
#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateItem>,
    pub total: usize,
}
