//! Channel-aware rendering of template fields.

use serde_json::Value;

use super::normalizer::json_type_name;
use super::substitution::substitute_placeholders;
use super::types::{Channel, RenderError, RenderResult, RenderedOutput, TemplateFields};

/// Render a template against a payload, never failing.
///
/// Any [`RenderError`] is turned into an error block (see [`error_output`]).
pub fn render_template(template: &TemplateFields, payload: &Value) -> RenderedOutput {
    match try_render_template(template, payload) {
        Ok(output) => output,
        Err(e) => error_output(template, &e),
    }
}

/// Render a template against a payload.
pub fn try_render_template(
    template: &TemplateFields,
    payload: &Value,
) -> RenderResult<RenderedOutput> {
    if !payload.is_object() {
        return Err(RenderError::InvalidPayload(json_type_name(payload)));
    }

    let subject = substitute_placeholders(&template.subject, payload);

    if template.channel.is_email() {
        let html_body = substitute_placeholders(&template.html_body, payload);
        let text_content = substitute_placeholders(&template.text_body, payload);

        Ok(RenderedOutput {
            html_content: email_envelope(&subject, &html_body),
            subject,
            text_content,
        })
    } else {
        Ok(RenderedOutput {
            text_content: substitute_placeholders(&message_text(template), payload),
            subject,
            html_content: String::new(),
        })
    }
}

/// Text body for non-email channels. A blank text body falls back to the
/// subject and HTML body separated by a blank line.
fn message_text(template: &TemplateFields) -> String {
    if !template.text_body.trim().is_empty() {
        return template.text_body.clone();
    }

    [template.subject.as_str(), template.html_body.as_str()]
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn email_envelope(subject: &str, html_body: &str) -> String {
    format!(
        concat!(
            r#"<div style="border: 1px solid #e5e7eb; border-radius: 8px; overflow: hidden; font-family: Arial, sans-serif;">"#,
            r#"<div style="background: #f9fafb; padding: 12px 16px; border-bottom: 1px solid #e5e7eb;">"#,
            r#"<strong>Subject:</strong> {}"#,
            r#"</div>"#,
            r#"<div style="padding: 16px;">{}</div>"#,
            r#"</div>"#
        ),
        subject, html_body
    )
}

fn message_envelope(channel: Channel, text: &str) -> String {
    format!(
        concat!(
            r#"<div style="border: 1px solid #e5e7eb; border-radius: 8px; padding: 12px 16px; background: #f9fafb;">"#,
            r#"<div style="font-size: 12px; color: #6b7280; margin-bottom: 8px;">{} message</div>"#,
            r#"<pre style="font-family: monospace; white-space: pre-wrap; margin: 0;">{}</pre>"#,
            r#"</div>"#
        ),
        channel, text
    )
}

/// Output carrying a visible error block in place of the rendered content.
///
/// The subject is the template subject as written, unrendered.
pub fn error_output(template: &TemplateFields, error: &RenderError) -> RenderedOutput {
    tracing::warn!(
        template = %template.name,
        channel = %template.channel,
        error = %error,
        "Template render failed"
    );

    RenderedOutput {
        subject: template.subject.clone(),
        html_content: format!(
            r#"<div style="color: #b91c1c; background: #fef2f2; border: 1px solid #fecaca; border-radius: 8px; padding: 12px 16px;"><strong>Error rendering template:</strong> {}</div>"#,
            error
        ),
        text_content: format!("Error rendering template: {}", error),
    }
}

impl RenderedOutput {
    /// Markup shown in a preview pane for this output.
    ///
    /// Email output is already wrapped; other channels wrap the text content
    /// in a monospace envelope.
    pub fn preview_markup(&self, channel: Channel) -> String {
        if channel.is_email() {
            self.html_content.clone()
        } else {
            message_envelope(channel, &self.text_content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn email_template() -> TemplateFields {
        TemplateFields {
            name: "Lead received".to_string(),
            channel: Channel::Email,
            subject: "Hi {{customer.name}}".to_string(),
            html_body: "<p>Re: {{property.address}}</p>".to_string(),
            text_body: "Re: {{property.address}}".to_string(),
        }
    }

    #[test]
    fn test_email_render() {
        let payload = json!({
            "customer": { "name": "John Smith" },
            "property": { "address": "123 Main St" }
        });

        let output = render_template(&email_template(), &payload);
        assert_eq!(output.subject, "Hi John Smith");
        assert!(output.html_content.contains("Hi John Smith"));
        assert!(output.html_content.contains("<p>Re: 123 Main St</p>"));
        assert_eq!(output.text_content, "Re: 123 Main St");
    }

    #[test]
    fn test_sms_render_leaves_html_empty() {
        let template = TemplateFields {
            channel: Channel::Sms,
            text_body: "New lead {{submission.id}} from {{customer.name}}".to_string(),
            ..email_template()
        };
        let payload = json!({
            "customer": { "name": "Ann" },
            "submission": { "id": "SUB-7" }
        });

        let output = render_template(&template, &payload);
        assert!(output.html_content.is_empty());
        assert_eq!(output.text_content, "New lead SUB-7 from Ann");
        assert_eq!(output.subject, "Hi Ann");
    }

    #[test]
    fn test_blank_text_body_falls_back_to_subject_and_body() {
        let template = TemplateFields {
            channel: Channel::Telegram,
            text_body: "  ".to_string(),
            ..email_template()
        };
        let payload = json!({
            "customer": { "name": "Ann" },
            "property": { "address": "9 Elm St" }
        });

        let output = render_template(&template, &payload);
        assert_eq!(output.text_content, "Hi Ann\n\n<p>Re: 9 Elm St</p>");
    }

    #[test]
    fn test_blank_text_body_with_no_subject() {
        let template = TemplateFields {
            channel: Channel::Whatsapp,
            html_body: "Body only".to_string(),
            ..Default::default()
        };

        let output = render_template(&template, &json!({}));
        assert_eq!(output.text_content, "Body only");
    }

    #[test]
    fn test_null_payload_yields_error_block() {
        let output = render_template(&email_template(), &Value::Null);

        assert_eq!(output.subject, "Hi {{customer.name}}");
        assert!(output.html_content.contains("Error rendering template"));
        assert!(output.html_content.contains("null"));
        assert!(output.text_content.starts_with("Error rendering template"));
        assert!(matches!(
            try_render_template(&email_template(), &json!([1])),
            Err(RenderError::InvalidPayload("array"))
        ));
    }

    #[test]
    fn test_empty_template_renders_empty_parts() {
        let output = render_template(&TemplateFields::default(), &json!({}));
        assert_eq!(output.subject, "");
        assert_eq!(output.text_content, "");
        assert!(output
            .html_content
            .contains("<strong>Subject:</strong> </div>"));
    }

    #[test]
    fn test_preview_markup_per_channel() {
        let payload = json!({ "customer": { "name": "Ann" } });

        let email = render_template(&email_template(), &payload);
        assert_eq!(email.preview_markup(Channel::Email), email.html_content);

        let sms_template = TemplateFields {
            channel: Channel::Sms,
            text_body: "Hello {{customer.name}}".to_string(),
            ..email_template()
        };
        let sms = render_template(&sms_template, &payload);
        let markup = sms.preview_markup(Channel::Sms);
        assert!(markup.contains("<pre"));
        assert!(markup.contains("Hello Ann"));
        assert!(markup.contains("SMS message"));
    }
}
