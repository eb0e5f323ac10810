use crate::error::{Error, Result};
use crate::types::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest reload delay the eager update policy may use
pub const MAX_RELOAD_DELAY_MS: u64 = 2000;

/// Raw TOML configuration structure
/// This matches the site.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSiteInfo,
    i18n: RawI18n,
    #[serde(default)]
    blog: RawBlog,
    #[serde(default)]
    universal_slugs: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    manifest: RawManifest,
    #[serde(default)]
    robots: RawRobots,
    #[serde(default)]
    pwa: RawPwa,
    #[serde(default)]
    cookies: RawCookies,
}

#[derive(Debug, Deserialize)]
struct RawSiteInfo {
    name: String,
    base_url: String,
    content_dir: Option<String>, // Convert to PathBuf
    pages_dir: Option<String>,   // Convert to PathBuf
}

#[derive(Debug, Deserialize)]
struct RawI18n {
    locales: Vec<String>,
    default_locale: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawBlog {
    category_segment: Option<String>,
    #[serde(default)]
    category_segments: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    name: Option<String>,
    short_name: Option<String>,
    description: Option<String>,
    start_url: Option<String>,
    background_color: Option<String>,
    theme_color: Option<String>,
    icons: Option<Vec<ManifestIcon>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRobots {
    allow: Option<Vec<String>>,
    disallow: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPwa {
    service_worker: Option<String>,
    scope: Option<String>,
    update_policy: Option<UpdatePolicy>,
    reload_delay_ms: Option<u64>,
    cache_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCookies {
    prefix: Option<String>,
    production_domain: Option<String>,
    development_domain: Option<String>,
}

/// Parse site.toml from a file path
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let content = fs::read_to_string(path)?;
    parse_site_toml_str(&content)
}

/// Parse site.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str) -> Result<SiteConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let base_url = raw.site.base_url.trim().trim_end_matches('/').to_string();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        return Err(Error::ConfigParse(format!(
            "site.base_url must be an absolute http(s) URL: '{}'",
            raw.site.base_url
        )));
    }

    let content_dir = validate_path(
        raw.site.content_dir.as_deref().unwrap_or("content/blog"),
        "site.content_dir",
    )?;
    let pages_dir = validate_path(
        raw.site.pages_dir.as_deref().unwrap_or("content/pages"),
        "site.pages_dir",
    )?;

    // Locales
    if raw.i18n.locales.is_empty() {
        return Err(Error::ConfigParse(
            "i18n.locales must list at least one locale".to_string(),
        ));
    }
    let mut locales = Vec::with_capacity(raw.i18n.locales.len());
    for code in &raw.i18n.locales {
        let locale = parse_locale(code, "i18n.locales")?;
        if locales.contains(&locale) {
            return Err(Error::ConfigParse(format!(
                "Duplicate locale '{}' in i18n.locales",
                code
            )));
        }
        locales.push(locale);
    }
    let default_locale = parse_locale(&raw.i18n.default_locale, "i18n.default_locale")?;
    if !locales.contains(&default_locale) {
        return Err(Error::ConfigParse(format!(
            "i18n.default_locale '{}' is not listed in i18n.locales",
            default_locale
        )));
    }

    // Blog
    let category_segments = raw
        .blog
        .category_segments
        .into_iter()
        .map(|(code, segment)| {
            let locale = configured_locale(&code, &locales, "blog.category_segments")?;
            Ok((locale, validate_segment(&segment, "blog.category_segments")?))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;
    let blog = BlogConfig {
        category_segment: validate_segment(
            raw.blog.category_segment.as_deref().unwrap_or("category"),
            "blog.category_segment",
        )?,
        category_segments,
    };

    // Universal slugs
    let mut universal_slugs = UniversalSlugMap::new();
    for (key, per_locale) in &raw.universal_slugs {
        for (code, slug) in per_locale {
            let locale = configured_locale(code, &locales, &format!("universal_slugs.{}", key))?;
            if slug.trim().is_empty() {
                return Err(Error::ConfigParse(format!(
                    "Empty slug in 'universal_slugs.{}.{}'",
                    key, code
                )));
            }
            universal_slugs.insert(key, locale, slug);
        }
    }

    let manifest = ManifestConfig {
        name: raw
            .manifest
            .name
            .unwrap_or_else(|| "Pigeon Map - Mapa Gołębi".to_string()),
        short_name: raw
            .manifest
            .short_name
            .unwrap_or_else(|| "Pigeon Map".to_string()),
        description: raw.manifest.description.unwrap_or_else(|| {
            "Nowoczesna platforma dla hodowców gołębi. Śledź, zarządzaj i udostępniaj loty oraz rodowody online."
                .to_string()
        }),
        start_url: raw.manifest.start_url.unwrap_or_else(|| "/".to_string()),
        display: "standalone".to_string(),
        background_color: raw
            .manifest
            .background_color
            .unwrap_or_else(|| "#ffffff".to_string()),
        theme_color: raw
            .manifest
            .theme_color
            .unwrap_or_else(|| "#009fbe".to_string()),
        icons: raw.manifest.icons.unwrap_or_else(default_icons),
    };

    let robots = RobotsConfig {
        allow: raw.robots.allow.unwrap_or_else(|| vec!["/".to_string()]),
        disallow: raw.robots.disallow.unwrap_or_else(|| {
            ["/dashboard", "/dashboard/*", "/api/", "/admin/"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        }),
    };

    let reload_delay_ms = raw.pwa.reload_delay_ms.unwrap_or(1000);
    if reload_delay_ms > MAX_RELOAD_DELAY_MS {
        return Err(Error::ConfigParse(format!(
            "pwa.reload_delay_ms must be <= {}, got {}",
            MAX_RELOAD_DELAY_MS, reload_delay_ms
        )));
    }
    let pwa = PwaConfig {
        service_worker: raw
            .pwa
            .service_worker
            .unwrap_or_else(|| "/dashboard-sw.js".to_string()),
        scope: raw.pwa.scope.unwrap_or_else(|| "/".to_string()),
        update_policy: raw.pwa.update_policy.unwrap_or(UpdatePolicy::Eager),
        reload_delay: Duration::from_millis(reload_delay_ms),
        cache_version: raw
            .pwa
            .cache_version
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
    };
    if !pwa.service_worker.starts_with('/') || pwa.service_worker[1..].contains('/') {
        return Err(Error::ConfigParse(format!(
            "pwa.service_worker must be a top-level path like '/sw.js': '{}'",
            pwa.service_worker
        )));
    }

    let cookies = CookieConfig {
        prefix: raw
            .cookies
            .prefix
            .unwrap_or_else(|| "pigeonmap_digging_".to_string()),
        production_domain: raw
            .cookies
            .production_domain
            .unwrap_or_else(|| ".digging.pl".to_string()),
        development_domain: raw
            .cookies
            .development_domain
            .unwrap_or_else(|| "localhost".to_string()),
    };

    Ok(SiteConfig {
        site: SiteInfo {
            name: raw.site.name,
            base_url,
            content_dir,
            pages_dir,
        },
        i18n: I18nConfig {
            locales,
            default_locale,
        },
        blog,
        universal_slugs,
        manifest,
        robots,
        pwa,
        cookies,
    })
}

fn default_icons() -> Vec<ManifestIcon> {
    vec![
        ManifestIcon {
            src: "/assets/logo192.png".to_string(),
            sizes: "192x192".to_string(),
            mime_type: "image/png".to_string(),
        },
        ManifestIcon {
            src: "/assets/logo512.png".to_string(),
            sizes: "512x512".to_string(),
            mime_type: "image/png".to_string(),
        },
    ]
}

fn parse_locale(code: &str, field_name: &str) -> Result<Locale> {
    Locale::parse(code).map_err(|_| {
        Error::ConfigParse(format!(
            "Invalid locale '{}' in '{}', expected two lowercase letters",
            code, field_name
        ))
    })
}

/// Parse a locale and require it to be one of the configured ones
fn configured_locale(code: &str, locales: &[Locale], field_name: &str) -> Result<Locale> {
    let locale = parse_locale(code, field_name)?;
    if !locales.contains(&locale) {
        return Err(Error::ConfigParse(format!(
            "Locale '{}' in '{}' is not listed in i18n.locales",
            code, field_name
        )));
    }
    Ok(locale)
}

/// A single URL path segment: non-empty, no slashes
fn validate_segment(segment: &str, field_name: &str) -> Result<String> {
    let segment = segment.trim();
    if segment.is_empty() || segment.contains('/') {
        return Err(Error::ConfigParse(format!(
            "'{}' must be a single non-empty path segment, got '{}'",
            field_name, segment
        )));
    }
    Ok(segment.to_string())
}

/// Validate and convert a path string to PathBuf.
///
/// Rejects absolute paths and parent directory references (`..`), so a
/// site.toml can only point at directories inside the site root.
///
/// ```text
/// validate_path("content/blog", "site.content_dir")  → Ok(PathBuf)
/// validate_path("/etc", "site.content_dir")          → Err("Absolute paths not allowed...")
/// validate_path("../posts", "site.content_dir")      → Err("Parent directory references...")
/// ```
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}
