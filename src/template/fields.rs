//! Legacy/current body field merge.
//!
//! Older template records store their bodies under `subject`, `contentHtml`
//! and `contentText`. Records written by the current console use
//! `emailSubject`, `emailContentHtml` and `smsContent`. Both can be present on
//! the same record; the merge runs once before rendering so renderers only
//! see [`TemplateFields`](super::TemplateFields).

use serde::{Deserialize, Serialize};

/// Body fields under their legacy names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
}

/// Body fields under their current names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_content_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_content: Option<String>,
}

/// Merged subject and bodies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalBodies {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Merge legacy and current fields. A non-blank current field wins over the
/// legacy one; a field missing from both becomes an empty string.
pub fn merge_template_fields(legacy: &LegacyFields, current: &CurrentFields) -> CanonicalBodies {
    CanonicalBodies {
        subject: pick(&current.email_subject, &legacy.subject),
        html_body: pick(&current.email_content_html, &legacy.content_html),
        text_body: pick(&current.sms_content, &legacy.content_text),
    }
}

fn pick(current: &Option<String>, legacy: &Option<String>) -> String {
    [current, legacy]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .cloned()
        .unwrap_or_default()
}
