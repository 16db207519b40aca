//! API layer - HTTP endpoint handlers organized by domain.

mod health;
mod metrics;
mod preview;
mod routes;
mod template;

pub use health::{health, HealthResponse};
pub use metrics::prometheus_metrics;
pub use preview::{
    close_preview_session, live_preview, preview_template, render, LivePreviewRequest,
    PreviewResponse, RenderRequest, TemplateDraft, TemplatePreviewRequest,
};
pub use routes::api_routes;
pub use template::{create_template, delete_template, get_template, list_templates, update_template};
