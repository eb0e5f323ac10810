use async_trait::async_trait;
use std::time::Duration;

/// Browser service-worker capabilities the controller drives.
///
/// Implemented over the real platform in the page, and by recording stubs
/// in tests.
#[async_trait]
pub trait ServiceWorkerPlatform: Send + Sync {
    fn supports_service_worker(&self) -> bool;

    async fn register(&self, script_url: &str, scope: &str) -> anyhow::Result<()>;

    /// Whether a worker already controls the page (an install is an update)
    fn has_active_controller(&self) -> bool;

    /// Fire-and-forget `SKIP_WAITING` message to the waiting worker
    fn post_skip_waiting(&self);

    fn schedule_reload(&self, delay: Duration);

    /// `(display-mode: standalone)` media query
    fn display_mode_standalone(&self) -> bool;
}

/// A captured `beforeinstallprompt` event
pub trait InstallPrompt: Send {
    fn prevent_default(&mut self);

    /// Show the prompt; consumes the event
    fn prompt(self: Box<Self>);
}
