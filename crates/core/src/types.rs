use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Two-letter lowercase locale code (`en`, `pl`, ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn parse(code: &str) -> Result<Self> {
        if is_locale_code(code) {
            Ok(Locale(code.to_string()))
        } else {
            Err(Error::InvalidData(format!(
                "Invalid locale code '{}', expected two lowercase letters",
                code
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// True for exactly two lowercase ASCII letters
pub fn is_locale_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase())
}

impl TryFrom<String> for Locale {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Locale::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Locale {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Front matter of a post.
///
/// The four recognised keys are typed; anything else lands in `extra`
/// untouched so new front matter keys survive a round through the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Expected as `YYYY-MM-DD`; ordering is plain string comparison
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A single blog post as read from disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub slug: String,
    pub locale: Option<Locale>,
    pub metadata: PostMetadata,
    /// Raw markdown body
    pub content: String,
}

impl Post {
    /// Date string used for ordering; empty when the post has none
    pub fn date(&self) -> &str {
        self.metadata.date.as_deref().unwrap_or("")
    }

    /// Category, if present and non-empty
    pub fn category(&self) -> Option<&str> {
        self.metadata
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }

    pub fn title(&self) -> &str {
        self.metadata.title.as_deref().unwrap_or(&self.slug)
    }
}

/// Universal post key → locale → literal slug
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniversalSlugMap {
    entries: BTreeMap<String, BTreeMap<Locale, String>>,
}

impl UniversalSlugMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, locale: Locale, slug: &str) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .insert(locale, slug.to_string());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Slug for `key` in `locale`, if the table has one
    pub fn get(&self, key: &str, locale: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|per_locale| per_locale.get(locale))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<Locale, String>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How often a sitemap URL is expected to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: DateTime<Utc>,
    pub change_frequency: ChangeFrequency,
    /// Always within `0.0..=1.0`
    pub priority: f32,
}

/// Complete site configuration
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site: SiteInfo,
    pub i18n: I18nConfig,
    pub blog: BlogConfig,
    pub universal_slugs: UniversalSlugMap,
    pub manifest: ManifestConfig,
    pub robots: RobotsConfig,
    pub pwa: PwaConfig,
    pub cookies: CookieConfig,
}

impl SiteConfig {
    pub fn locales(&self) -> &[Locale] {
        &self.i18n.locales
    }

    pub fn default_locale(&self) -> &Locale {
        &self.i18n.default_locale
    }

    /// Look a code up in the supported set
    pub fn locale(&self, code: &str) -> Option<&Locale> {
        self.i18n.locales.iter().find(|l| l.as_str() == code)
    }

    pub fn is_default_locale(&self, locale: &Locale) -> bool {
        locale == &self.i18n.default_locale
    }

    /// Category path segment for a locale (`category`, `kategoria`, ...)
    pub fn category_segment(&self, locale: &Locale) -> &str {
        self.blog
            .category_segments
            .get(locale)
            .map(String::as_str)
            .unwrap_or(&self.blog.category_segment)
    }
}

/// General site information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    /// Absolute origin without trailing slash
    pub base_url: String,
    pub content_dir: PathBuf,
    pub pages_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nConfig {
    pub locales: Vec<Locale>,
    pub default_locale: Locale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    pub category_segment: String,
    pub category_segments: BTreeMap<Locale, String>,
}

/// Web app manifest descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: String,
    pub background_color: String,
    pub theme_color: String,
    pub icons: Vec<ManifestIcon>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotsConfig {
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
}

/// What the client does when a new service worker is waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Tell the waiting worker to skip waiting, then reload the page
    Eager,
    /// Hold the update until the page asks for it
    Notify,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PwaConfig {
    pub service_worker: String,
    pub scope: String,
    pub update_policy: UpdatePolicy,
    pub reload_delay: Duration,
    pub cache_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    pub prefix: String,
    pub production_domain: String,
    pub development_domain: String,
}
