//! Live preview sessions.
//!
//! An editor fires a render on every keystroke. Renders may complete out of
//! order when delegated remotely, so each request takes a ticket from a
//! monotonically increasing counter and its result is only accepted while
//! that ticket is still the latest one issued.
//!
//! Sessions live in a [`PreviewSessionRegistry`] keyed by the editor's
//! session id. Editors rarely say goodbye, so idle sessions are evicted by a
//! periodic sweep.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::RwLock;

use super::renderer::TemplateRenderer;
use super::types::{RenderedOutput, TemplateFields};
use crate::metrics::PreviewMetrics;

/// Outcome of a session render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// Result of the latest request, now the session's current preview
    Current {
        sequence: u64,
        output: RenderedOutput,
    },
    /// A later request was issued before this one completed; result dropped
    Superseded { sequence: u64, latest: u64 },
}

impl PreviewOutcome {
    pub fn sequence(&self) -> u64 {
        match self {
            PreviewOutcome::Current { sequence, .. } => *sequence,
            PreviewOutcome::Superseded { sequence, .. } => *sequence,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, PreviewOutcome::Superseded { .. })
    }
}

/// Last-write-wins render session for a single editor
pub struct PreviewSession {
    renderer: Arc<dyn TemplateRenderer>,
    latest_issued: AtomicU64,
    current: RwLock<Option<(u64, RenderedOutput)>>,
    /// Unix timestamp in milliseconds
    last_used: AtomicI64,
}

impl PreviewSession {
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            renderer,
            latest_issued: AtomicU64::new(0),
            current: RwLock::new(None),
            last_used: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    /// Mark the session as used now
    pub fn touch(&self) {
        self.last_used
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_used(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_used.load(Ordering::Relaxed))
            .unwrap_or_else(Utc::now)
    }

    /// Take the next request ticket
    pub fn next_ticket(&self) -> u64 {
        self.latest_issued.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Latest ticket issued so far
    pub fn latest_ticket(&self) -> u64 {
        self.latest_issued.load(Ordering::Acquire)
    }

    /// Render under a fresh ticket and commit the result if still current.
    pub async fn render(&self, template: &TemplateFields, payload: &Value) -> PreviewOutcome {
        self.touch();
        let ticket = self.next_ticket();
        let output = self.renderer.render(template, payload).await;
        self.commit(ticket, output).await
    }

    /// Commit a result produced for `ticket`.
    pub async fn commit(&self, ticket: u64, output: RenderedOutput) -> PreviewOutcome {
        let mut current = self.current.write().await;

        let latest = self.latest_ticket();
        let newer_committed = current.as_ref().is_some_and(|(seq, _)| *seq > ticket);
        if ticket != latest || newer_committed {
            PreviewMetrics::record_superseded();
            tracing::debug!(sequence = ticket, latest, "Dropping superseded preview");
            return PreviewOutcome::Superseded {
                sequence: ticket,
                latest,
            };
        }

        *current = Some((ticket, output.clone()));
        PreviewOutcome::Current {
            sequence: ticket,
            output,
        }
    }

    /// Most recent committed preview
    pub async fn current(&self) -> Option<(u64, RenderedOutput)> {
        self.current.read().await.clone()
    }
}

/// Live preview sessions keyed by editor session id
pub struct PreviewSessionRegistry {
    renderer: Arc<dyn TemplateRenderer>,
    sessions: DashMap<String, Arc<PreviewSession>>,
}

impl PreviewSessionRegistry {
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            renderer,
            sessions: DashMap::new(),
        }
    }

    /// Get or create the session for an editor, marking it used
    pub fn get_or_create(&self, session_id: &str) -> Arc<PreviewSession> {
        let session = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(PreviewSession::new(self.renderer.clone())))
            .clone();
        session.touch();
        session
    }

    /// Drop a session; returns whether it existed
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Evict sessions unused for longer than `idle_timeout`
    pub fn evict_idle(&self, idle_timeout: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(idle_timeout)
            .ok()
            .and_then(|timeout| Utc::now().checked_sub_signed(timeout));

        match cutoff {
            Some(cutoff) => self.evict_idle_before(cutoff),
            // Timeout reaches past the epoch; nothing can be that idle
            None => 0,
        }
    }

    /// Evict sessions last used before `cutoff`
    pub fn evict_idle_before(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|session_id, session| {
            let keep = session.last_used() >= cutoff;
            if !keep {
                tracing::debug!(session_id = %session_id, "Evicting idle preview session");
            }
            keep
        });

        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            PreviewMetrics::record_sessions_evicted(evicted);
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{LocalRenderer, RenderResult};
    use async_trait::async_trait;
    use serde_json::json;

    /// Renderer whose latency is read from the payload
    struct SlowRenderer;

    #[async_trait]
    impl TemplateRenderer for SlowRenderer {
        fn kind(&self) -> &'static str {
            "slow"
        }

        async fn try_render(
            &self,
            template: &TemplateFields,
            payload: &Value,
        ) -> RenderResult<RenderedOutput> {
            let delay = payload["delayMs"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            LocalRenderer::new().try_render(template, payload).await
        }
    }

    fn template() -> TemplateFields {
        TemplateFields {
            name: "Live".to_string(),
            subject: "v{{version}}".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sequential_renders_are_current() {
        let session = PreviewSession::new(Arc::new(LocalRenderer::new()));

        let first = session.render(&template(), &json!({ "version": 1 })).await;
        let second = session.render(&template(), &json!({ "version": 2 })).await;

        assert_eq!(first.sequence(), 1);
        assert!(!first.is_superseded());
        assert_eq!(second.sequence(), 2);

        let (seq, output) = session.current().await.unwrap();
        assert_eq!(seq, 2);
        assert_eq!(output.subject, "v2");
    }

    #[tokio::test]
    async fn test_slow_earlier_render_does_not_overwrite_later() {
        let session = Arc::new(PreviewSession::new(Arc::new(SlowRenderer)));

        let slow = {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .render(&template(), &json!({ "version": 1, "delayMs": 200 }))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = session
            .render(&template(), &json!({ "version": 2, "delayMs": 0 }))
            .await;
        let slow = slow.await.unwrap();

        assert!(matches!(fast, PreviewOutcome::Current { sequence: 2, .. }));
        assert_eq!(
            slow,
            PreviewOutcome::Superseded {
                sequence: 1,
                latest: 2
            }
        );
        assert_eq!(session.current().await.unwrap().1.subject, "v2");
    }

    #[tokio::test]
    async fn test_commit_rejects_older_ticket_after_newer_commit() {
        let session = PreviewSession::new(Arc::new(LocalRenderer::new()));
        let first = session.next_ticket();
        let second = session.next_ticket();

        let committed = session.commit(second, RenderedOutput::default()).await;
        assert!(!committed.is_superseded());

        let stale = session.commit(first, RenderedOutput::default()).await;
        assert!(stale.is_superseded());
        assert_eq!(session.current().await.unwrap().0, second);
    }

    #[test]
    fn test_registry_reuses_session_per_id() {
        let registry = PreviewSessionRegistry::new(Arc::new(LocalRenderer::new()));

        let first = registry.get_or_create("editor-1");
        let again = registry.get_or_create("editor-1");
        registry.get_or_create("editor-2");

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(registry.len(), 2);
        assert!(registry.remove("editor-2"));
        assert!(!registry.remove("editor-2"));
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let registry = PreviewSessionRegistry::new(Arc::new(LocalRenderer::new()));
        registry.get_or_create("abandoned");
        let cutoff = Utc::now() + chrono::Duration::seconds(1);

        assert_eq!(registry.evict_idle_before(cutoff), 1);
        assert!(!registry.contains("abandoned"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_recently_used_sessions_survive_eviction() {
        let registry = PreviewSessionRegistry::new(Arc::new(LocalRenderer::new()));
        let session = registry.get_or_create("active");
        session.render(&template(), &json!({ "version": 1 })).await;

        assert_eq!(registry.evict_idle(Duration::from_secs(60)), 0);
        assert!(registry.contains("active"));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(registry.evict_idle(Duration::from_millis(5)), 1);
        assert!(!registry.contains("active"));
    }
}
