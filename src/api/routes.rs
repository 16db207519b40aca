use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::server::AppState;

use super::health::health;
use super::metrics::prometheus_metrics;
use super::preview::{close_preview_session, live_preview, preview_template, render};
use super::template::{
    create_template, delete_template, get_template, list_templates, update_template,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                // Template CRUD
                .route("/templates", get(list_templates).post(create_template))
                .route(
                    "/templates/{id}",
                    get(get_template)
                        .put(update_template)
                        .delete(delete_template),
                )
                // Preview
                .route("/templates/{id}/preview", post(preview_template))
                .route("/preview", post(live_preview))
                .route("/preview/sessions/{id}", delete(close_preview_session))
                // Remote render processor
                .route("/render", post(render)),
        )
}
