use pigeon_site_content::{ContentStore, index, render_markdown};
use pigeon_site_core::{Locale, Post, Result, SiteConfig};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::routes::Route;
use crate::seo::{Crumb, PageMeta, blog_posting, breadcrumb_list, json_ld_script};
use crate::urls::UrlBuilder;

/// How many posts the home page lists
const HOME_LATEST_POSTS: usize = 3;

/// HTML-escape a string to prevent XSS attacks
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub config: &'a SiteConfig,
    /// Adds the SSE reload script used by `serve --watch`
    pub live_reload: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Ok,
    NotFound,
    Error,
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub status: PageStatus,
    pub html: String,
}

/// Render a route, degrading to the not-found or error page.
///
/// Never fails: a missing post becomes the not-found page and any loader
/// error becomes the generic error page.
pub fn render_route(ctx: &PageContext<'_>, store: &ContentStore, route: &Route) -> RenderedPage {
    match try_render(ctx, store, route) {
        Ok(Some(html)) => RenderedPage {
            status: PageStatus::Ok,
            html,
        },
        Ok(None) => {
            debug!(?route, "Page not found");
            RenderedPage {
                status: PageStatus::NotFound,
                html: not_found_page(ctx, route.locale()),
            }
        }
        Err(e) => {
            error!(?route, error = %e, "Failed to render page");
            RenderedPage {
                status: PageStatus::Error,
                html: error_page(ctx, route.locale()),
            }
        }
    }
}

fn try_render(ctx: &PageContext<'_>, store: &ContentStore, route: &Route) -> Result<Option<String>> {
    match route {
        Route::Home(locale) => {
            let intro = store.page("home", locale)?;
            let posts = listed_posts(store, locale);
            let latest = index::latest(&posts, HOME_LATEST_POSTS);
            Ok(Some(home_page(ctx, locale, intro.as_ref(), latest)))
        }
        Route::Page(locale, name) => Ok(store
            .page(name, locale)?
            .map(|page| static_page(ctx, locale, name, &page))),
        Route::BlogIndex(locale) => {
            let posts = listed_posts(store, locale);
            let categories = index::categories(&posts);
            Ok(Some(blog_index_page(ctx, locale, &posts, &categories)))
        }
        Route::Post(locale, slug) => Ok(store
            .post_with_fallback(slug, locale)?
            .map(|post| post_page(ctx, locale, &post))),
        Route::Category(locale, category) => {
            let posts = store.posts_in_category(category, locale)?;
            if posts.is_empty() {
                warn!(category = %category, locale = %locale, "No posts found for category");
                return Ok(None);
            }
            Ok(Some(category_page(ctx, locale, category, &posts)))
        }
        Route::NotFound => Ok(None),
    }
}

/// Posts for listing pages; a listing shows no posts rather than failing
fn listed_posts(store: &ContentStore, locale: &Locale) -> Vec<Post> {
    match store.readable_posts(locale) {
        Ok(posts) => posts,
        Err(e) => {
            warn!(locale = %locale, error = %e, "Error loading posts, listing none");
            Vec::new()
        }
    }
}

pub fn home_page(
    ctx: &PageContext<'_>,
    locale: &Locale,
    intro: Option<&Post>,
    latest: &[Post],
) -> String {
    let urls = UrlBuilder::new(ctx.config);
    let title = intro
        .and_then(|p| p.metadata.title.clone())
        .unwrap_or_else(|| ctx.config.site.name.clone());
    let meta = PageMeta::new(ctx.config, locale, title.clone(), urls.absolute(locale, "/"))
        .with_description(intro.and_then(|p| p.metadata.description.as_deref()))
        .with_alternates(urls.alternates(|_| "/".to_string()));

    let intro_html = intro
        .map(|p| render_markdown(&p.content))
        .unwrap_or_default();
    let body = format!(
        r#"<h1>{}</h1>
        <div class="prose">{}</div>
        <section class="latest-posts">
            <h2>Blog</h2>
            {}
            <a href="{}">All posts →</a>
        </section>"#,
        html_escape(&title),
        intro_html,
        post_list(&urls, locale, latest),
        html_escape(&urls.path(locale, urls.blog_path())),
    );

    layout(ctx, locale, &meta, &[], &body)
}

pub fn static_page(ctx: &PageContext<'_>, locale: &Locale, name: &str, page: &Post) -> String {
    let urls = UrlBuilder::new(ctx.config);
    let path = format!("/{}", name);
    let meta = PageMeta::new(
        ctx.config,
        locale,
        format!("{} | {}", page.title(), ctx.config.site.name),
        urls.absolute(locale, &path),
    )
    .with_description(page.metadata.description.as_deref())
    .with_alternates(urls.alternates(|_| path.clone()));

    let crumbs = [
        Crumb::link("Home", urls.absolute(locale, "/")),
        Crumb::current(page.title()),
    ];
    let body = format!(
        r#"{}
        <h1>{}</h1>
        <article class="prose">{}</article>"#,
        breadcrumbs_html(&crumbs),
        html_escape(page.title()),
        render_markdown(&page.content),
    );

    layout(ctx, locale, &meta, &[breadcrumb_list(&crumbs)], &body)
}

pub fn blog_index_page(
    ctx: &PageContext<'_>,
    locale: &Locale,
    posts: &[Post],
    categories: &[String],
) -> String {
    let urls = UrlBuilder::new(ctx.config);
    let meta = PageMeta::new(
        ctx.config,
        locale,
        format!("Blog | {}", ctx.config.site.name),
        urls.absolute(locale, urls.blog_path()),
    )
    .with_alternates(urls.alternates(|_| urls.blog_path().to_string()));

    let crumbs = [
        Crumb::link("Home", urls.absolute(locale, "/")),
        Crumb::current("Blog"),
    ];
    let category_links: String = categories
        .iter()
        .map(|category| {
            format!(
                r#"<a class="category" href="{}">{}</a>"#,
                html_escape(&urls.path(locale, &urls.category_path(locale, category))),
                html_escape(category)
            )
        })
        .collect();

    let body = format!(
        r#"{}
        <h1>Blog</h1>
        <nav class="categories">{}</nav>
        {}"#,
        breadcrumbs_html(&crumbs),
        category_links,
        post_list(&urls, locale, posts),
    );

    layout(ctx, locale, &meta, &[breadcrumb_list(&crumbs)], &body)
}

/// Canonical URL only; slugs differ between locales
pub fn post_page(ctx: &PageContext<'_>, locale: &Locale, post: &Post) -> String {
    let urls = UrlBuilder::new(ctx.config);
    let post_path = urls.post_path(&post.slug);
    let canonical = urls.absolute(locale, &post_path);
    let meta = PageMeta::new(
        ctx.config,
        locale,
        format!("{} | Blog", post.title()),
        canonical.clone(),
    )
    .with_description(post.metadata.description.as_deref())
    .article();

    let crumbs = [
        Crumb::link("Home", urls.absolute(locale, "/")),
        Crumb::link("Blog", urls.absolute(locale, urls.blog_path())),
        Crumb::current(post.title()),
    ];

    let category_badge = post
        .category()
        .map(|category| {
            format!(
                r#"<a class="category" href="{}">{}</a>"#,
                html_escape(&urls.path(locale, &urls.category_path(locale, category))),
                html_escape(category)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"{}
        <h1>{}</h1>
        <div class="post-meta">
            <span class="date">{}</span>
            {}
        </div>
        <article class="prose">{}</article>
        <a href="{}">← Back to all blog posts</a>"#,
        breadcrumbs_html(&crumbs),
        html_escape(post.title()),
        html_escape(post.date()),
        category_badge,
        render_markdown(&post.content),
        html_escape(&urls.path(locale, urls.blog_path())),
    );

    layout(
        ctx,
        locale,
        &meta,
        &[
            breadcrumb_list(&crumbs),
            blog_posting(ctx.config, post, &canonical),
        ],
        &body,
    )
}

/// Canonical URL only; category names differ between locales
pub fn category_page(
    ctx: &PageContext<'_>,
    locale: &Locale,
    category: &str,
    posts: &[Post],
) -> String {
    let urls = UrlBuilder::new(ctx.config);
    let meta = PageMeta::new(
        ctx.config,
        locale,
        format!("{} | Blog", category),
        urls.absolute(locale, &urls.category_path(locale, category)),
    );

    let crumbs = [
        Crumb::link("Home", urls.absolute(locale, "/")),
        Crumb::link("Blog", urls.absolute(locale, urls.blog_path())),
        Crumb::current(category),
    ];
    let body = format!(
        r#"{}
        <h1>{}</h1>
        <p class="count">{} {}</p>
        {}"#,
        breadcrumbs_html(&crumbs),
        html_escape(category),
        posts.len(),
        if posts.len() == 1 { "post" } else { "posts" },
        post_list(&urls, locale, posts),
    );

    layout(ctx, locale, &meta, &[breadcrumb_list(&crumbs)], &body)
}

pub fn not_found_page(ctx: &PageContext<'_>, locale: Option<&Locale>) -> String {
    let locale = locale.unwrap_or(ctx.config.default_locale());
    let urls = UrlBuilder::new(ctx.config);
    let meta = PageMeta::new(
        ctx.config,
        locale,
        format!("404 | {}", ctx.config.site.name),
        urls.absolute(locale, "/"),
    );
    let body = format!(
        r#"<h1>404</h1>
        <p>This page could not be found.</p>
        <a href="{}">← Back to all blog posts</a>"#,
        html_escape(&urls.path(locale, urls.blog_path()))
    );
    layout(ctx, locale, &meta, &[], &body)
}

pub fn error_page(ctx: &PageContext<'_>, locale: Option<&Locale>) -> String {
    let locale = locale.unwrap_or(ctx.config.default_locale());
    let urls = UrlBuilder::new(ctx.config);
    let meta = PageMeta::new(
        ctx.config,
        locale,
        format!("Error | {}", ctx.config.site.name),
        urls.absolute(locale, "/"),
    );
    let body = format!(
        r#"<h1 class="error">Error Loading Page</h1>
        <p>There was an error loading this page. Please try again later.</p>
        <a href="{}">← Back to all blog posts</a>"#,
        html_escape(&urls.path(locale, urls.blog_path()))
    );
    layout(ctx, locale, &meta, &[], &body)
}

fn post_list(urls: &UrlBuilder<'_>, locale: &Locale, posts: &[Post]) -> String {
    if posts.is_empty() {
        return r#"<p class="empty">No posts yet.</p>"#.to_string();
    }

    let items: String = posts
        .iter()
        .map(|post| {
            let category = post
                .category()
                .map(|c| format!(r#"<span class="category">{}</span>"#, html_escape(c)))
                .unwrap_or_default();
            format!(
                r#"<li>
                <a href="{}">
                    <span class="title">{}</span>
                    <span class="date">{}</span>
                    {}
                </a>
            </li>"#,
                html_escape(&urls.path(locale, &urls.post_path(&post.slug))),
                html_escape(post.title()),
                html_escape(post.date()),
                category
            )
        })
        .collect();

    format!(r#"<ul class="posts">{}</ul>"#, items)
}

fn breadcrumbs_html(crumbs: &[Crumb]) -> String {
    let items: Vec<String> = crumbs
        .iter()
        .map(|crumb| match &crumb.url {
            Some(url) => format!(
                r#"<a href="{}">{}</a>"#,
                html_escape(url),
                html_escape(&crumb.label)
            ),
            None => format!("<span>{}</span>", html_escape(&crumb.label)),
        })
        .collect();
    format!(
        r#"<nav class="breadcrumbs">{}</nav>"#,
        items.join(" / ")
    )
}

/// Shared page shell
fn layout(
    ctx: &PageContext<'_>,
    locale: &Locale,
    meta: &PageMeta,
    structured_data: &[Value],
    body: &str,
) -> String {
    let structured: String = structured_data
        .iter()
        .map(|value| format!("\n    {}", json_ld_script(value)))
        .collect();

    // Hot reload script only in live reload mode
    let reload_script = if ctx.live_reload {
        r#"<script>
        // Hot reload via Server-Sent Events
        const eventSource = new EventSource('/_reload');
        eventSource.onmessage = () => location.reload();
        eventSource.onerror = () => eventSource.close();
    </script>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    {head}
    <meta name="theme-color" content="{theme}">
    <link rel="manifest" href="/manifest.webmanifest">
    <script src="/dashboard-pwa.js" defer></script>{structured}
</head>
<body>
    <main class="container">
        {body}
    </main>
    <footer>© {site}</footer>
    {reload_script}
</body>
</html>"#,
        lang = html_escape(locale.as_str()),
        head = meta.render_head(),
        theme = html_escape(&ctx.config.manifest.theme_color),
        site = html_escape(&ctx.config.site.name),
    )
}
