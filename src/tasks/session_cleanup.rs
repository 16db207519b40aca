use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::PreviewConfig;
use crate::metrics::PreviewMetrics;
use crate::template::PreviewSessionRegistry;

/// Background task evicting idle live preview sessions
pub struct SessionCleanupTask {
    config: PreviewConfig,
    sessions: Arc<PreviewSessionRegistry>,
    shutdown: broadcast::Receiver<()>,
}

impl SessionCleanupTask {
    pub fn new(
        config: PreviewConfig,
        sessions: Arc<PreviewSessionRegistry>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            config,
            sessions,
            shutdown,
        }
    }

    /// Run the sweep until shutdown
    pub async fn run(mut self) {
        let cleanup_interval = Duration::from_secs(self.config.session_cleanup_interval_secs.max(1));
        let mut cleanup_timer = tokio::time::interval(cleanup_interval);

        // Skip immediate first tick
        cleanup_timer.tick().await;

        tracing::info!(
            cleanup_interval_secs = cleanup_interval.as_secs(),
            idle_timeout_secs = self.config.session_idle_timeout_secs,
            "Session cleanup task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Session cleanup task received shutdown signal");
                    break;
                }
                _ = cleanup_timer.tick() => {
                    self.cleanup_idle_sessions();
                }
            }
        }

        tracing::info!("Session cleanup task stopped");
    }

    /// Evict idle sessions once and return how many were removed
    pub fn cleanup_idle_sessions(&self) -> usize {
        let idle_timeout = Duration::from_secs(self.config.session_idle_timeout_secs);
        let removed = self.sessions.evict_idle(idle_timeout);
        PreviewMetrics::set_sessions(self.sessions.len());

        if removed > 0 {
            tracing::info!(
                removed = removed,
                idle_timeout_secs = self.config.session_idle_timeout_secs,
                "Cleaned up idle preview sessions"
            );
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::LocalRenderer;

    fn registry() -> Arc<PreviewSessionRegistry> {
        Arc::new(PreviewSessionRegistry::new(Arc::new(LocalRenderer::new())))
    }

    #[tokio::test]
    async fn test_cleanup_evicts_idle_sessions() {
        let sessions = registry();
        sessions.get_or_create("closed-tab");

        let (_tx, rx) = broadcast::channel(1);
        let task = SessionCleanupTask::new(
            PreviewConfig {
                session_idle_timeout_secs: 0,
                session_cleanup_interval_secs: 60,
            },
            sessions.clone(),
            rx,
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(task.cleanup_idle_sessions(), 1);
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_active_sessions() {
        let sessions = registry();
        sessions.get_or_create("open-tab");

        let (_tx, rx) = broadcast::channel(1);
        let task = SessionCleanupTask::new(PreviewConfig::default(), sessions.clone(), rx);

        assert_eq!(task.cleanup_idle_sessions(), 0);
        assert!(sessions.contains("open-tab"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (tx, rx) = broadcast::channel(1);
        let task = SessionCleanupTask::new(PreviewConfig::default(), registry(), rx);

        let handle = tokio::spawn(task.run());
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
