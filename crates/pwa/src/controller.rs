//! Service worker lifecycle.
//!
//! ```text
//! Unregistered → Registering → Registered → UpdateFound → UpdateReady → Activated
//!       ↑             │
//!       └── failure ──┘        (no support: Unsupported, terminal)
//! ```

use pigeon_site_core::{PwaConfig, UpdatePolicy};
use tracing::{debug, info, warn};

use crate::cookie::{CookieJar, Cookies};
use crate::platform::{InstallPrompt, ServiceWorkerPlatform};
use crate::redirect::{LaunchContext, start_url_redirect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unsupported,
    Unregistered,
    Registering,
    Registered,
    UpdateFound,
    UpdateReady,
    Activated,
}

/// `statechange` states of an installing worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

pub struct PwaController<P: ServiceWorkerPlatform> {
    platform: P,
    config: PwaConfig,
    state: LifecycleState,
    update_requested: bool,
    deferred_prompt: Option<Box<dyn InstallPrompt>>,
}

impl<P: ServiceWorkerPlatform> PwaController<P> {
    pub fn new(platform: P, config: PwaConfig) -> Self {
        Self {
            platform,
            config,
            state: LifecycleState::Unregistered,
            update_requested: false,
            deferred_prompt: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Register the worker on page load
    pub async fn on_load(&mut self) -> LifecycleState {
        if self.state != LifecycleState::Unregistered {
            debug!(state = ?self.state, "Service worker already handled");
            return self.state;
        }

        if !self.platform.supports_service_worker() {
            debug!("Service Worker not supported");
            self.state = LifecycleState::Unsupported;
            return self.state;
        }

        self.state = LifecycleState::Registering;
        match self
            .platform
            .register(&self.config.service_worker, &self.config.scope)
            .await
        {
            Ok(()) => {
                info!(script = %self.config.service_worker, scope = %self.config.scope, "Service Worker registered");
                self.state = LifecycleState::Registered;
            }
            Err(e) => {
                warn!(error = %e, "Service Worker registration failed");
                self.state = LifecycleState::Unregistered;
            }
        }
        self.state
    }

    /// `updatefound` on the registration
    pub fn on_update_found(&mut self) {
        match self.state {
            LifecycleState::Registered | LifecycleState::Activated => {
                info!("New service worker version found");
                self.state = LifecycleState::UpdateFound;
                self.update_requested = false;
            }
            state => debug!(?state, "Ignoring updatefound"),
        }
    }

    /// `statechange` of the installing worker
    pub fn on_worker_state(&mut self, worker: WorkerState) {
        match (self.state, worker) {
            (LifecycleState::UpdateFound, WorkerState::Installed) => {
                if !self.platform.has_active_controller() {
                    debug!("First install, nothing to update");
                    return;
                }
                info!("New service worker ready");
                self.state = LifecycleState::UpdateReady;
                if self.config.update_policy == UpdatePolicy::Eager {
                    self.apply_update();
                }
            }
            (LifecycleState::UpdateFound | LifecycleState::UpdateReady, WorkerState::Activated) => {
                self.state = LifecycleState::Activated;
                self.update_requested = false;
            }
            (LifecycleState::UpdateFound | LifecycleState::UpdateReady, WorkerState::Redundant) => {
                warn!("New service worker became redundant");
                self.state = LifecycleState::Registered;
                self.update_requested = false;
            }
            (state, worker) => debug!(?state, ?worker, "Ignoring worker state change"),
        }
    }

    /// Activate a waiting update: skip waiting, then reload.
    ///
    /// Returns `false` when there is nothing to apply or the update was
    /// already requested.
    pub fn apply_update(&mut self) -> bool {
        if self.state != LifecycleState::UpdateReady || self.update_requested {
            return false;
        }
        self.update_requested = true;
        self.platform.post_skip_waiting();
        self.platform.schedule_reload(self.config.reload_delay);
        info!(delay_ms = self.config.reload_delay.as_millis() as u64, "Reloading for update");
        true
    }

    /// Suppress the browser's own install banner and keep the event
    pub fn on_before_install_prompt(&mut self, mut prompt: Box<dyn InstallPrompt>) {
        debug!("Install prompt available");
        prompt.prevent_default();
        self.deferred_prompt = Some(prompt);
    }

    pub fn can_install(&self) -> bool {
        self.deferred_prompt.is_some()
    }

    /// Show the stored install prompt once; `false` if none is stored
    pub fn trigger_install(&mut self) -> bool {
        match self.deferred_prompt.take() {
            Some(prompt) => {
                prompt.prompt();
                true
            }
            None => false,
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.platform.display_mode_standalone()
    }

    /// Where to send a freshly launched standalone app, if anywhere.
    ///
    /// Signed-in means the token cookie is set.
    pub fn start_url_redirect(
        &self,
        path: &str,
        already_redirected: bool,
        cookies: &Cookies<'_>,
        jar: &impl CookieJar,
    ) -> Option<&'static str> {
        start_url_redirect(&LaunchContext {
            path,
            standalone: self.is_standalone(),
            already_redirected,
            has_token: cookies.has_token(jar),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::{Environment, TOKEN};
    use async_trait::async_trait;
    use pigeon_site_core::CookieConfig;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Register(String, String),
        SkipWaiting,
        Reload(Duration),
        PreventDefault,
        Prompt,
    }

    #[derive(Clone)]
    struct StubPlatform {
        supported: bool,
        fail_registration: bool,
        controlled: bool,
        standalone: bool,
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl StubPlatform {
        fn new() -> Self {
            Self {
                supported: true,
                fail_registration: false,
                controlled: true,
                standalone: false,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ServiceWorkerPlatform for StubPlatform {
        fn supports_service_worker(&self) -> bool {
            self.supported
        }

        async fn register(&self, script_url: &str, scope: &str) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Register(script_url.to_string(), scope.to_string()));
            if self.fail_registration {
                anyhow::bail!("SecurityError");
            }
            Ok(())
        }

        fn has_active_controller(&self) -> bool {
            self.controlled
        }

        fn post_skip_waiting(&self) {
            self.calls.lock().unwrap().push(Call::SkipWaiting);
        }

        fn schedule_reload(&self, delay: Duration) {
            self.calls.lock().unwrap().push(Call::Reload(delay));
        }

        fn display_mode_standalone(&self) -> bool {
            self.standalone
        }
    }

    struct StubPrompt {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl InstallPrompt for StubPrompt {
        fn prevent_default(&mut self) {
            self.calls.lock().unwrap().push(Call::PreventDefault);
        }

        fn prompt(self: Box<Self>) {
            self.calls.lock().unwrap().push(Call::Prompt);
        }
    }

    #[derive(Default)]
    struct MapJar(HashMap<String, String>);

    impl CookieJar for MapJar {
        fn get(&self, name: &str) -> Option<String> {
            self.0.get(name).cloned()
        }

        fn set(&mut self, name: &str, value: &str, _domain: &str) {
            self.0.insert(name.to_string(), value.to_string());
        }

        fn remove(&mut self, name: &str) {
            self.0.remove(name);
        }
    }

    fn config(policy: UpdatePolicy) -> PwaConfig {
        PwaConfig {
            service_worker: "/dashboard-sw.js".to_string(),
            scope: "/".to_string(),
            update_policy: policy,
            reload_delay: Duration::from_millis(1000),
            cache_version: "0.2.6".to_string(),
        }
    }

    #[tokio::test]
    async fn test_registers_on_load() {
        let mut controller = PwaController::new(StubPlatform::new(), config(UpdatePolicy::Eager));
        assert_eq!(controller.on_load().await, LifecycleState::Registered);
        assert_eq!(
            controller.platform().calls(),
            vec![Call::Register("/dashboard-sw.js".to_string(), "/".to_string())]
        );

        // A second load event does not register again
        controller.on_load().await;
        assert_eq!(controller.platform().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_is_terminal() {
        let platform = StubPlatform {
            supported: false,
            ..StubPlatform::new()
        };
        let mut controller = PwaController::new(platform, config(UpdatePolicy::Eager));
        assert_eq!(controller.on_load().await, LifecycleState::Unsupported);

        controller.on_update_found();
        assert_eq!(controller.state(), LifecycleState::Unsupported);
        assert!(controller.platform().calls().is_empty());
    }

    #[tokio::test]
    async fn test_registration_failure_returns_to_unregistered() {
        let platform = StubPlatform {
            fail_registration: true,
            ..StubPlatform::new()
        };
        let mut controller = PwaController::new(platform, config(UpdatePolicy::Eager));
        assert_eq!(controller.on_load().await, LifecycleState::Unregistered);
    }

    #[tokio::test]
    async fn test_eager_update_skips_waiting_then_reloads() {
        let mut controller = PwaController::new(StubPlatform::new(), config(UpdatePolicy::Eager));
        controller.on_load().await;

        controller.on_update_found();
        assert_eq!(controller.state(), LifecycleState::UpdateFound);

        controller.on_worker_state(WorkerState::Installed);
        assert_eq!(controller.state(), LifecycleState::UpdateReady);

        let calls = controller.platform().calls();
        let skip = calls.iter().position(|c| *c == Call::SkipWaiting).unwrap();
        let reload = calls
            .iter()
            .position(|c| matches!(c, Call::Reload(_)))
            .unwrap();
        assert!(skip < reload);
        assert!(matches!(calls[reload], Call::Reload(d) if d <= Duration::from_secs(2)));

        // Already requested
        assert!(!controller.apply_update());

        controller.on_worker_state(WorkerState::Activated);
        assert_eq!(controller.state(), LifecycleState::Activated);
    }

    #[tokio::test]
    async fn test_notify_policy_waits_for_apply() {
        let mut controller = PwaController::new(StubPlatform::new(), config(UpdatePolicy::Notify));
        controller.on_load().await;
        controller.on_update_found();
        controller.on_worker_state(WorkerState::Installed);

        assert_eq!(controller.state(), LifecycleState::UpdateReady);
        assert_eq!(controller.platform().calls().len(), 1);

        assert!(controller.apply_update());
        assert_eq!(
            controller.platform().calls()[1..],
            [Call::SkipWaiting, Call::Reload(Duration::from_millis(1000))]
        );
    }

    #[tokio::test]
    async fn test_first_install_is_not_an_update() {
        let platform = StubPlatform {
            controlled: false,
            ..StubPlatform::new()
        };
        let mut controller = PwaController::new(platform, config(UpdatePolicy::Eager));
        controller.on_load().await;
        controller.on_update_found();
        controller.on_worker_state(WorkerState::Installed);

        assert_eq!(controller.state(), LifecycleState::UpdateFound);
        assert!(!controller.apply_update());
    }

    #[test]
    fn test_update_found_requires_registration() {
        let mut controller = PwaController::new(StubPlatform::new(), config(UpdatePolicy::Eager));
        controller.on_update_found();
        assert_eq!(controller.state(), LifecycleState::Unregistered);
    }

    #[test]
    fn test_install_prompt_is_consumed_once() {
        let platform = StubPlatform::new();
        let calls = platform.calls.clone();
        let mut controller = PwaController::new(platform, config(UpdatePolicy::Eager));

        assert!(!controller.trigger_install());

        controller.on_before_install_prompt(Box::new(StubPrompt {
            calls: calls.clone(),
        }));
        assert!(controller.can_install());
        assert!(controller.trigger_install());
        assert!(!controller.trigger_install());
        assert!(!controller.can_install());

        assert_eq!(*calls.lock().unwrap(), vec![Call::PreventDefault, Call::Prompt]);
    }

    #[test]
    fn test_standalone_redirect() {
        let platform = StubPlatform {
            standalone: true,
            ..StubPlatform::new()
        };
        let controller = PwaController::new(platform, config(UpdatePolicy::Eager));
        assert!(controller.is_standalone());

        let cookie_config = CookieConfig {
            prefix: "pigeonmap_digging_".to_string(),
            production_domain: ".digging.pl".to_string(),
            development_domain: "localhost".to_string(),
        };
        let cookies = Cookies::new(&cookie_config, Environment::Production);
        let mut jar = MapJar::default();

        assert_eq!(controller.start_url_redirect("/", false, &cookies, &jar), Some("/login"));
        assert_eq!(controller.start_url_redirect("/", true, &cookies, &jar), None);

        cookies.set(&mut jar, TOKEN, "abc");
        assert_eq!(
            controller.start_url_redirect("/pl", false, &cookies, &jar),
            Some("/dashboard/map")
        );

        cookies.remove(&mut jar, TOKEN);
        assert_eq!(controller.start_url_redirect("/pl", false, &cookies, &jar), Some("/login"));

        let browser = PwaController::new(StubPlatform::new(), config(UpdatePolicy::Eager));
        assert_eq!(browser.start_url_redirect("/", false, &cookies, &jar), None);
    }
}
