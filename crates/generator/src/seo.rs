//! `<head>` metadata and JSON-LD structured data.

use pigeon_site_core::{Locale, Post, SiteConfig};
use serde_json::{Value, json};

use crate::pages::html_escape;

/// Metadata for one rendered page
#[derive(Debug, Clone)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub site_name: String,
    pub locale: String,
    /// Open Graph type: `website` or `article`
    pub og_type: &'static str,
    /// `(hreflang, url)`
    pub alternates: Vec<(String, String)>,
}

impl PageMeta {
    pub fn new(config: &SiteConfig, locale: &Locale, title: String, canonical: String) -> Self {
        Self {
            title,
            description: config.manifest.description.clone(),
            canonical,
            site_name: config.site.name.clone(),
            locale: locale.to_string(),
            og_type: "website",
            alternates: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: Option<&str>) -> Self {
        if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
            self.description = description.to_string();
        }
        self
    }

    pub fn with_alternates(mut self, alternates: Vec<(String, String)>) -> Self {
        self.alternates = alternates;
        self
    }

    pub fn article(mut self) -> Self {
        self.og_type = "article";
        self
    }

    /// Render as `<head>` tags
    pub fn render_head(&self) -> String {
        let title = html_escape(&self.title);
        let description = html_escape(&self.description);
        let canonical = html_escape(&self.canonical);

        let mut head = format!(
            r#"<title>{title}</title>
    <meta name="description" content="{description}">
    <link rel="canonical" href="{canonical}">
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    <meta property="og:url" content="{canonical}">
    <meta property="og:site_name" content="{site}">
    <meta property="og:locale" content="{locale}">
    <meta property="og:type" content="{og_type}">
    <meta name="twitter:card" content="summary">
    <meta name="twitter:title" content="{title}">
    <meta name="twitter:description" content="{description}">"#,
            site = html_escape(&self.site_name),
            locale = html_escape(&self.locale),
            og_type = self.og_type,
        );

        for (hreflang, href) in &self.alternates {
            head.push_str(&format!(
                "\n    <link rel=\"alternate\" hreflang=\"{}\" href=\"{}\">",
                html_escape(hreflang),
                html_escape(href)
            ));
        }
        head
    }
}

/// One breadcrumb; the last item usually has no link
#[derive(Debug, Clone)]
pub struct Crumb {
    pub label: String,
    pub url: Option<String>,
}

impl Crumb {
    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: Some(url.into()),
        }
    }

    pub fn current(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: None,
        }
    }
}

pub fn breadcrumb_list(crumbs: &[Crumb]) -> Value {
    let items: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(i, crumb)| {
            let mut item = json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": crumb.label,
            });
            if let Some(url) = &crumb.url {
                item["item"] = json!(url);
            }
            item
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    })
}

pub fn blog_posting(config: &SiteConfig, post: &Post, url: &str) -> Value {
    let mut value = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title(),
        "url": url,
        "mainEntityOfPage": url,
        "publisher": {
            "@type": "Organization",
            "name": config.site.name,
            "url": config.site.base_url,
        },
    });
    if let Some(date) = &post.metadata.date {
        value["datePublished"] = json!(date);
    }
    if let Some(description) = &post.metadata.description {
        value["description"] = json!(description);
    }
    if let Some(category) = post.category() {
        value["articleSection"] = json!(category);
    }
    if let Some(locale) = &post.locale {
        value["inLanguage"] = json!(locale.as_str());
    }
    value
}

/// Wrap structured data in a script tag, safe against `</script>` in strings
pub fn json_ld_script(value: &Value) -> String {
    let json = value.to_string().replace("</", "<\\/");
    format!(r#"<script type="application/ld+json">{}</script>"#, json)
}
