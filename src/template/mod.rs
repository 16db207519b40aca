//! Notification template rendering.
//!
//! This module provides:
//! - Template definitions with `{{dotted.path}}` placeholders
//! - Preview data normalization (repairing mangled stored JSON)
//! - The placeholder substitution engine over nested payloads
//! - Channel-aware rendering with fail-soft error blocks
//! - Local and remote renderers behind one trait
//! - Last-write-wins live preview sessions with idle eviction
//! - In-memory template storage with CRUD operations
//!
//! # Example
//!
//! ```ignore
//! let template = store.get("lead-received")?;
//! let payload = normalize_payload(template.preview_data.as_deref());
//!
//! let rendered = renderer.render(&template.fields(), &payload).await;
//! println!("{}", rendered.subject);
//! ```

mod fields;
mod normalizer;
mod render;
mod renderer;
mod session;
mod store;
mod substitution;
mod types;

pub use fields::{merge_template_fields, CanonicalBodies, CurrentFields, LegacyFields};
pub use normalizer::{clean_preview_data, normalize_payload, parse_preview_data, sample_payload};
pub use render::{error_output, render_template, try_render_template};
pub use renderer::{
    create_renderer, LocalRenderer, RemoteRenderer, TemplateRenderer, REMOTE_RENDER_PATH,
};
pub use session::{PreviewOutcome, PreviewSession, PreviewSessionRegistry};
pub use store::{create_template_store, TemplateStore};
pub use substitution::{placeholder_paths, resolve_path, substitute_placeholders};
pub use types::{
    Channel, NormalizeError, RenderError, RenderResult, RenderedOutput, TemplateError,
    TemplateFields, TemplateItem, TemplateListResponse, TemplateResult, UpdateTemplateRequest,
};
