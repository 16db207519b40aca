//! Renderer abstraction.
//!
//! Rendering can happen in-process or be delegated to a remote processor
//! running the same pipeline as the delivery side. Both implementations share
//! one contract: same inputs, same output shape, failures folded into an
//! error block.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::render::{error_output, try_render_template};
use super::types::{RenderError, RenderResult, RenderedOutput, TemplateFields};
use crate::config::RendererConfig;
use crate::metrics::PreviewMetrics;

/// Path of the render endpoint on a remote processor
pub const REMOTE_RENDER_PATH: &str = "/api/v1/render";

/// A template rendering capability.
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    /// Backend identifier ("local", "remote")
    fn kind(&self) -> &'static str;

    /// Render, surfacing failures.
    async fn try_render(
        &self,
        template: &TemplateFields,
        payload: &Value,
    ) -> RenderResult<RenderedOutput>;

    /// Render, folding any failure into an error block.
    async fn render(&self, template: &TemplateFields, payload: &Value) -> RenderedOutput {
        let started = Instant::now();
        let result = self.try_render(template, payload).await;
        PreviewMetrics::record_render(template.channel, self.kind(), started.elapsed());

        match result {
            Ok(output) => output,
            Err(e) => {
                PreviewMetrics::record_render_failure(e.reason());
                error_output(template, &e)
            }
        }
    }
}

/// In-process renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRenderer;

impl LocalRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TemplateRenderer for LocalRenderer {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn try_render(
        &self,
        template: &TemplateFields,
        payload: &Value,
    ) -> RenderResult<RenderedOutput> {
        try_render_template(template, payload)
    }
}

#[derive(Serialize)]
struct RemoteRenderRequest<'a> {
    template: &'a TemplateFields,
    payload: &'a Value,
}

/// Renderer delegating to a remote processor over HTTP
pub struct RemoteRenderer {
    client: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

impl RemoteRenderer {
    /// Create a remote renderer for the processor at `base_url`.
    pub fn new(base_url: &str, timeout_ms: u64) -> RenderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| RenderError::Remote(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), REMOTE_RENDER_PATH),
            timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TemplateRenderer for RemoteRenderer {
    fn kind(&self) -> &'static str {
        "remote"
    }

    async fn try_render(
        &self,
        template: &TemplateFields,
        payload: &Value,
    ) -> RenderResult<RenderedOutput> {
        tracing::debug!(
            endpoint = %self.endpoint,
            template = %template.name,
            "Delegating render to remote processor"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&RemoteRenderRequest { template, payload })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RenderError::Timeout(self.timeout_ms)
                } else {
                    RenderError::Remote(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::RemoteStatus(status.as_u16()));
        }

        response.json::<RenderedOutput>().await.map_err(|e| {
            if e.is_timeout() {
                RenderError::Timeout(self.timeout_ms)
            } else {
                RenderError::Decode(e.to_string())
            }
        })
    }
}

/// Create a renderer based on configuration.
///
/// - `"remote"`: a `RemoteRenderer` when `remote_url` is set and the client builds
/// - anything else: a `LocalRenderer`
pub fn create_renderer(config: &RendererConfig) -> Arc<dyn TemplateRenderer> {
    match config.mode.as_str() {
        "remote" => match config.remote_url.as_deref() {
            Some(url) => match RemoteRenderer::new(url, config.timeout_ms) {
                Ok(renderer) => {
                    tracing::info!(
                        renderer = "remote",
                        endpoint = %renderer.endpoint(),
                        timeout_ms = config.timeout_ms,
                        "Creating remote template renderer"
                    );
                    Arc::new(renderer)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Remote renderer unavailable, falling back to local");
                    Arc::new(LocalRenderer::new())
                }
            },
            None => {
                tracing::warn!(
                    "Remote renderer requested but no remote_url configured, falling back to local"
                );
                Arc::new(LocalRenderer::new())
            }
        },
        _ => {
            tracing::info!(renderer = "local", "Creating local template renderer");
            Arc::new(LocalRenderer::new())
        }
    }
}
