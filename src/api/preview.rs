//! Preview and render endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::template::{
    merge_template_fields, normalize_payload, placeholder_paths, Channel, CurrentFields,
    LegacyFields, LocalRenderer, PreviewOutcome, RenderedOutput, TemplateFields, TemplateRenderer,
};

/// Body of a stored-template preview
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePreviewRequest {
    /// Payload to render with; the template's preview data when absent
    #[serde(default)]
    pub payload: Option<Value>,
}

/// An unsaved template as edited in the console
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(flatten)]
    pub legacy: LegacyFields,
    #[serde(flatten)]
    pub current: CurrentFields,
    #[serde(default)]
    pub preview_data: Option<String>,
}

impl TemplateDraft {
    fn fields(&self) -> TemplateFields {
        let bodies = merge_template_fields(&self.legacy, &self.current);

        TemplateFields {
            name: self.name.clone(),
            channel: self.channel.unwrap_or_default(),
            subject: bodies.subject,
            html_body: bodies.html_body,
            text_body: bodies.text_body,
        }
    }
}

/// Body of a live-editor preview
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePreviewRequest {
    pub template: TemplateDraft,
    #[serde(default)]
    pub payload: Option<Value>,
    /// Editor session; renders within a session are last-write-wins
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Body of a remote render call
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub template: TemplateFields,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Position of this render within its editor session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    /// A newer render was requested before this one finished
    pub superseded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered: Option<RenderedOutput>,
    /// Markup for the preview pane
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_html: Option<String>,
    /// Placeholder paths referenced by the template
    pub placeholders: Vec<String>,
}

impl PreviewResponse {
    fn rendered(fields: &TemplateFields, output: RenderedOutput, sequence: Option<u64>) -> Self {
        Self {
            sequence,
            superseded: false,
            preview_html: Some(output.preview_markup(fields.channel)),
            rendered: Some(output),
            placeholders: template_placeholders(fields),
        }
    }
}

fn template_placeholders(fields: &TemplateFields) -> Vec<String> {
    let mut paths = Vec::new();
    for part in [&fields.subject, &fields.html_body, &fields.text_body] {
        for path in placeholder_paths(part) {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

/// POST /api/v1/templates/{id}/preview - Preview a stored template
///
/// The body is optional; without one the template's preview data is used.
#[tracing::instrument(name = "http.preview_template", skip(state, request))]
pub async fn preview_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Option<Json<TemplatePreviewRequest>>,
) -> Result<Json<PreviewResponse>> {
    let template = state.template_store.get(&id)?;
    let fields = template.fields();

    let payload = request
        .and_then(|Json(request)| request.payload)
        .unwrap_or_else(|| normalize_payload(template.preview_data.as_deref()));

    let output = state.renderer.render(&fields, &payload).await;
    Ok(Json(PreviewResponse::rendered(&fields, output, None)))
}

/// POST /api/v1/preview - Preview an unsaved template from the editor
#[tracing::instrument(
    name = "http.live_preview",
    skip(state, request),
    fields(session_id = ?request.session_id)
)]
pub async fn live_preview(
    State(state): State<AppState>,
    Json(request): Json<LivePreviewRequest>,
) -> Result<Json<PreviewResponse>> {
    let fields = request.template.fields();
    let payload = request
        .payload
        .unwrap_or_else(|| normalize_payload(request.template.preview_data.as_deref()));

    let Some(session_id) = request.session_id else {
        let output = state.renderer.render(&fields, &payload).await;
        return Ok(Json(PreviewResponse::rendered(&fields, output, None)));
    };

    if session_id.trim().is_empty() {
        return Err(AppError::Validation("sessionId must not be blank".to_string()));
    }

    let session = state.preview_session(&session_id);
    let response = match session.render(&fields, &payload).await {
        PreviewOutcome::Current { sequence, output } => {
            PreviewResponse::rendered(&fields, output, Some(sequence))
        }
        PreviewOutcome::Superseded { sequence, .. } => PreviewResponse {
            sequence: Some(sequence),
            superseded: true,
            rendered: None,
            preview_html: None,
            placeholders: template_placeholders(&fields),
        },
    };

    Ok(Json(response))
}

/// DELETE /api/v1/preview/sessions/{id} - Release an editor session
#[tracing::instrument(name = "http.close_preview_session", skip(state))]
pub async fn close_preview_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.preview_sessions.remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// POST /api/v1/render - Render canonical fields in-process.
///
/// This is the endpoint remote renderers delegate to, so it always renders
/// locally regardless of the configured renderer.
#[tracing::instrument(
    name = "http.render",
    skip(request),
    fields(template = %request.template.name, channel = %request.template.channel)
)]
pub async fn render(Json(request): Json<RenderRequest>) -> Json<RenderedOutput> {
    Json(
        LocalRenderer::new()
            .render(&request.template, &request.payload)
            .await,
    )
}
