//! Service worker runtime caching rules.
//!
//! Served as `/sw-cache.json` for the worker to read. Cache names carry the
//! cache version so a version bump starts from empty caches.

use serde::Serialize;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CacheStrategy {
    NetworkFirst,
    CacheFirst,
    StaleWhileRevalidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum UrlPattern {
    /// Absolute URL prefix
    Prefix(String),
    /// Path extension, without the dot
    Extensions(Vec<String>),
}

impl UrlPattern {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::Prefix(prefix) => url.starts_with(prefix.as_str()),
            UrlPattern::Extensions(extensions) => {
                let path = url.split(['?', '#']).next().unwrap_or_default();
                path.rsplit_once('.')
                    .filter(|(_, ext)| !ext.contains('/'))
                    .is_some_and(|(_, ext)| extensions.iter().any(|e| e == ext))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRule {
    pub pattern: UrlPattern,
    pub strategy: CacheStrategy,
    pub cache_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_timeout_seconds: Option<u64>,
    pub max_entries: u32,
    pub max_age_seconds: u64,
}

fn extensions(list: &[&str]) -> UrlPattern {
    UrlPattern::Extensions(list.iter().map(|e| e.to_string()).collect())
}

/// Dashboard pages, images, then scripts and styles
pub fn default_rules(base_url: &str, version: &str) -> Vec<CacheRule> {
    vec![
        CacheRule {
            pattern: UrlPattern::Prefix(format!("{}/dashboard", base_url)),
            strategy: CacheStrategy::NetworkFirst,
            cache_name: format!("dashboard-pages-v{}", version),
            network_timeout_seconds: Some(5),
            max_entries: 20,
            max_age_seconds: DAY,
        },
        CacheRule {
            pattern: extensions(&["png", "jpg", "jpeg", "svg", "gif", "webp", "ico"]),
            strategy: CacheStrategy::CacheFirst,
            cache_name: format!("static-images-v{}", version),
            network_timeout_seconds: None,
            max_entries: 100,
            max_age_seconds: 30 * DAY,
        },
        CacheRule {
            pattern: extensions(&["js", "css"]),
            strategy: CacheStrategy::StaleWhileRevalidate,
            cache_name: format!("static-resources-v{}", version),
            network_timeout_seconds: None,
            max_entries: 100,
            max_age_seconds: DAY,
        },
    ]
}

/// First rule matching `url`
pub fn match_rule<'a>(rules: &'a [CacheRule], url: &str) -> Option<&'a CacheRule> {
    rules.iter().find(|rule| rule.pattern.matches(url))
}

pub fn rules_json(rules: &[CacheRule]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rules)
}
