use std::sync::Arc;

use crate::config::Settings;
use crate::template::{
    create_renderer, create_template_store, PreviewSession, PreviewSessionRegistry,
    TemplateRenderer, TemplateStore,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub template_store: Arc<TemplateStore>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub preview_sessions: Arc<PreviewSessionRegistry>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let renderer = create_renderer(&settings.renderer);
        Self::with_renderer(settings, renderer)
    }

    /// Build state around an existing renderer
    pub fn with_renderer(settings: Settings, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            settings: Arc::new(settings),
            template_store: create_template_store(),
            preview_sessions: Arc::new(PreviewSessionRegistry::new(renderer.clone())),
            renderer,
        }
    }

    /// Get or create the live preview session for an editor
    pub fn preview_session(&self, session_id: &str) -> Arc<PreviewSession> {
        self.preview_sessions.get_or_create(session_id)
    }
}
