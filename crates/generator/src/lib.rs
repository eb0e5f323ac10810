// Site generation: localized URLs, page rendering, SEO metadata, sitemap

pub mod manifest;
pub mod pages;
pub mod robots;
pub mod routes;
pub mod seo;
pub mod sitemap;
pub mod urls;
pub mod xml;

pub use manifest::WebManifest;
pub use pages::{PageContext, PageStatus, RenderedPage, render_route};
pub use robots::Robots;
pub use routes::{Route, STATIC_PAGE_NAMES, resolve_route};
pub use sitemap::{SitemapBuilder, render_sitemap_xml};
pub use urls::UrlBuilder;

use chrono::{DateTime, Utc};
use pigeon_site_content::{ContentStore, index};
use pigeon_site_core::{Locale, SiteConfig};
use tracing::{debug, error, info};

pub struct GeneratedSite {
    pub pages: Vec<(String, String)>,   // (path, html)
    pub assets: Vec<(String, Vec<u8>)>, // (path, data)
}

/// Render every page of every locale plus the sitemap, robots.txt and
/// web manifest.
///
/// Paths are relative output file paths (`pl/blog/index.html`). A post
/// file that fails to load only loses its own page; when a locale's post
/// directory cannot be listed, that locale loses its post and category
/// pages but keeps its listings and static pages.
pub fn generate_site(config: &SiteConfig, store: &ContentStore, now: DateTime<Utc>) -> GeneratedSite {
    let ctx = PageContext {
        config,
        live_reload: false,
    };
    let urls = UrlBuilder::new(config);
    let mut pages = Vec::new();

    for locale in config.locales() {
        let mut fixed = vec![
            ("/".to_string(), Route::Home(locale.clone())),
            (
                urls.blog_path().to_string(),
                Route::BlogIndex(locale.clone()),
            ),
        ];
        for name in STATIC_PAGE_NAMES {
            fixed.push((format!("/{}", name), Route::Page(locale.clone(), name.to_string())));
        }

        for (path, route) in fixed {
            let rendered = render_route(&ctx, store, &route);
            match rendered.status {
                PageStatus::Ok => pages.push((output_path(&urls.path(locale, &path)), rendered.html)),
                PageStatus::NotFound => debug!(path = %path, locale = %locale, "Skipping missing page"),
                PageStatus::Error => error!(path = %path, locale = %locale, "Skipping page that failed to render"),
            }
        }

        generate_blog(&ctx, store, locale, &mut pages);
    }

    pages.push((
        "404.html".to_string(),
        pages::not_found_page(&ctx, None),
    ));

    let mut assets = Vec::new();

    let entries = SitemapBuilder::new(config, store, now).build();
    assets.push((
        "sitemap.xml".to_string(),
        render_sitemap_xml(&entries).into_bytes(),
    ));
    assets.push((
        "robots.txt".to_string(),
        Robots::from_config(config).render().into_bytes(),
    ));
    match WebManifest::from_config(config).to_json() {
        Ok(json) => assets.push(("manifest.webmanifest".to_string(), json.into_bytes())),
        Err(e) => error!(error = %e, "Failed to serialize web manifest"),
    }

    info!(
        pages = pages.len(),
        assets = assets.len(),
        sitemap_entries = entries.len(),
        "Generated site"
    );

    GeneratedSite { pages, assets }
}

/// Post and category pages of one locale
fn generate_blog(
    ctx: &PageContext<'_>,
    store: &ContentStore,
    locale: &Locale,
    pages: &mut Vec<(String, String)>,
) {
    let urls = UrlBuilder::new(ctx.config);
    let posts = match store.readable_posts(locale) {
        Ok(posts) => posts,
        Err(e) => {
            error!(locale = %locale, error = %e, "Error loading posts, skipping blog pages");
            return;
        }
    };

    for post in &posts {
        let path = urls.path(locale, &urls.post_path(&post.slug));
        pages.push((output_path(&path), pages::post_page(ctx, locale, post)));
    }

    for category in index::categories(&posts) {
        let in_category: Vec<_> = index::in_category(&posts, &category)
            .into_iter()
            .cloned()
            .collect();
        let path = urls.path(locale, &urls.category_path(locale, &category));
        pages.push((
            output_path(&path),
            pages::category_page(ctx, locale, &category, &in_category),
        ));
    }
}

/// `/pl/blog/Jak-si%C4%99` → `pl/blog/Jak-się/index.html`
pub fn output_path(url_path: &str) -> String {
    let decoded = urlencoding::decode(url_path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| url_path.to_string());
    let trimmed = decoded.trim_matches('/');
    if trimmed.is_empty() {
        "index.html".to_string()
    } else {
        format!("{}/index.html", trimmed)
    }
}
