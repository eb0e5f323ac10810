// Client-side PWA: service worker lifecycle, install prompt, caching rules, cookies

pub mod caching;
pub mod controller;
pub mod cookie;
pub mod platform;
pub mod redirect;
pub mod script;

pub use caching::{CacheRule, CacheStrategy, default_rules, match_rule, rules_json};
pub use controller::{LifecycleState, PwaController, WorkerState};
pub use cookie::{CookieJar, Cookies, Environment};
pub use platform::{InstallPrompt, ServiceWorkerPlatform};
pub use redirect::{LaunchContext, start_url_redirect};
pub use script::registration_script;
