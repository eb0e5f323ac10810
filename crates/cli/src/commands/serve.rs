use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode, Uri, header},
    middleware::{self, Next},
    response::{
        Html, IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use chrono::Utc;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use pigeon_site_generator::{
    PageContext, PageStatus, Robots, SitemapBuilder, WebManifest, render_route,
    render_sitemap_xml, resolve_route,
};
use pigeon_site_pwa::registration_script;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use super::site::{PUBLIC_DIR, Site, cache_rules};

const DASHBOARD_ROBOTS: &str = "noindex, nofollow, noarchive, nosnippet";

#[derive(Clone)]
struct AppState {
    site: Arc<Site>,
    reload_tx: Option<broadcast::Sender<()>>,
}

/// Serve the site locally.
///
/// Content is read from disk on every request, so post edits show up on
/// the next page load. With `watch`, open pages also reload themselves
/// when anything under the site directory changes.
pub async fn run(path: PathBuf, port: u16, watch: bool) -> Result<()> {
    println!("🐦 Starting server...");
    println!("   Site: {}", path.display());

    let site = Site::load(&path)?;
    println!("   ✓ Loaded: {}", site.config.site.name);
    println!("   ✓ Locales: {}", site.config.locales().len());

    let reload_tx = if watch {
        let (reload_tx, _) = broadcast::channel::<()>(100);
        let watcher_path = path.clone();
        let watcher_tx = reload_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_files(watcher_path, watcher_tx).await {
                error!(error = %e, "File watcher error");
            }
        });
        Some(reload_tx)
    } else {
        None
    };

    let assets_dir = path.join(PUBLIC_DIR).join("assets");
    let state = AppState {
        site: Arc::new(site),
        reload_tx,
    };

    let app = router(state).nest_service("/assets", ServeDir::new(assets_dir));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Site ready at: http://localhost:{}", port);
    if watch {
        println!("   Live reload active");
    }
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/sitemap.xml", get(sitemap_handler))
        .route("/robots.txt", get(robots_handler))
        .route("/manifest.webmanifest", get(manifest_handler))
        .route("/dashboard-pwa.js", get(pwa_script_handler))
        .route("/sw-cache.json", get(cache_rules_handler))
        .route("/home", get(|| async { Redirect::permanent("/") }))
        .route("/index", get(|| async { Redirect::permanent("/") }))
        .route("/dashboard", get(|| async { Redirect::temporary("/dashboard/map") }));

    if state.reload_tx.is_some() {
        app = app.route("/_reload", get(sse_handler));
    }

    app.fallback(page_handler)
        .layer(middleware::from_fn(dashboard_robots))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("permissions-policy"),
                    HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
                )),
        )
        .with_state(state)
}

/// Keep the dashboard out of search indexes
async fn dashboard_robots(request: Request, next: Next) -> Response {
    let is_dashboard = request.uri().path().starts_with("/dashboard");
    let mut response = next.run(request).await;
    if is_dashboard {
        response.headers_mut().insert(
            HeaderName::from_static("x-robots-tag"),
            HeaderValue::from_static(DASHBOARD_ROBOTS),
        );
    }
    response
}

/// Every localized page
async fn page_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let route = resolve_route(&state.site.config, uri.path());
    let ctx = PageContext {
        config: &state.site.config,
        live_reload: state.reload_tx.is_some(),
    };
    let rendered = render_route(&ctx, &state.site.store, &route);
    let status = match rendered.status {
        PageStatus::Ok => StatusCode::OK,
        PageStatus::NotFound => StatusCode::NOT_FOUND,
        PageStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Html(rendered.html)).into_response()
}

async fn sitemap_handler(State(state): State<AppState>) -> Response {
    let entries = SitemapBuilder::new(&state.site.config, &state.site.store, Utc::now()).build();
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        render_sitemap_xml(&entries),
    )
        .into_response()
}

async fn robots_handler(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Robots::from_config(&state.site.config).render(),
    )
        .into_response()
}

async fn manifest_handler(State(state): State<AppState>) -> Response {
    match WebManifest::from_config(&state.site.config).to_json() {
        Ok(json) => ([(header::CONTENT_TYPE, "application/manifest+json")], json).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serialize web manifest");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn pwa_script_handler(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        registration_script(&state.site.config),
    )
        .into_response()
}

async fn cache_rules_handler(State(state): State<AppState>) -> Response {
    match cache_rules(&state.site.config) {
        Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build cache rules");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Watch for file changes and trigger reload
async fn watch_files(path: PathBuf, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&path, RecursiveMode::Recursive)?;
    info!(path = %path.display(), "Watching for changes");

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                // Skip editor temp files and dotfiles
                if event.paths.iter().any(|p| {
                    let filename = p.file_name().unwrap_or_default().to_string_lossy();
                    !filename.starts_with('.') && !filename.ends_with('~')
                }) {
                    info!(paths = ?event.paths, "File changed, reloading");
                    if reload_tx.send(()).is_err() {
                        warn!("No pages listening for reload");
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// SSE endpoint for live reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.as_ref().map(broadcast::Sender::subscribe);

    let stream = async_stream::stream! {
        if let Some(rx) = rx.as_mut() {
            loop {
                match rx.recv().await {
                    Ok(()) => yield Ok(Event::default().data("reload")),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn site() -> (TempDir, Site) {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("site.toml"),
            "[site]\nname = \"Pigeon Map\"\nbase_url = \"https://pigeon-map.digging.pl\"\n[i18n]\nlocales = [\"en\", \"pl\"]\ndefault_locale = \"en\"\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("content/blog")).unwrap();
        fs::write(
            dir.path().join("content/blog/loty.pl.md"),
            "---\ntitle: Loty\ndate: 2024-05-10\n---\nTreść\n",
        )
        .unwrap();
        let site = Site::load(dir.path()).unwrap();
        (dir, site)
    }

    fn app(site: Site) -> Router {
        router(AppState {
            site: Arc::new(site),
            reload_tx: None,
        })
    }

    async fn send(app: Router, uri: &str) -> Response {
        app.oneshot(
            axum::http::Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_page_statuses() {
        let (_dir, site) = site();
        let app = app(site);

        let response = send(app.clone(), "/pl/blog/loty").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().get("x-robots-tag").is_none());

        let response = send(app.clone(), "/pl/blog/nie-ma").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(app, "/nowhere/at/all").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_redirects_and_dashboard_headers() {
        let (_dir, site) = site();
        let app = app(site);

        let response = send(app.clone(), "/home").await;
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()["location"], "/");

        let response = send(app, "/dashboard").await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()["location"], "/dashboard/map");
        assert_eq!(response.headers()["x-robots-tag"], DASHBOARD_ROBOTS);
    }

    #[tokio::test]
    async fn test_fixed_endpoints() {
        let (_dir, site) = site();
        let app = app(site);

        for (uri, content_type) in [
            ("/sitemap.xml", "application/xml; charset=utf-8"),
            ("/robots.txt", "text/plain; charset=utf-8"),
            ("/manifest.webmanifest", "application/manifest+json"),
            ("/dashboard-pwa.js", "application/javascript; charset=utf-8"),
            ("/sw-cache.json", "application/json"),
        ] {
            let response = send(app.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            assert_eq!(response.headers()["content-type"], content_type, "{}", uri);
        }

        let response = send(app, "/_reload").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
