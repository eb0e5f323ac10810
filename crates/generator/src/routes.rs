//! Request path → page.
//!
//! ```text
//! /                          Home(default)
//! /pl                        Home(pl)
//! /about                     Page(default, about)
//! /pl/blog                   BlogIndex(pl)
//! /pl/blog/loty              Post(pl, loty)
//! /pl/blog/kategoria/Porady  Category(pl, Porady)
//! ```

use pigeon_site_core::{Locale, SiteConfig};

/// Static pages served from the pages directory
pub const STATIC_PAGE_NAMES: &[&str] = &["contact", "about", "privacy-policy"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home(Locale),
    Page(Locale, String),
    BlogIndex(Locale),
    Post(Locale, String),
    Category(Locale, String),
    NotFound,
}

impl Route {
    pub fn locale(&self) -> Option<&Locale> {
        match self {
            Route::Home(l)
            | Route::Page(l, _)
            | Route::BlogIndex(l)
            | Route::Post(l, _)
            | Route::Category(l, _) => Some(l),
            Route::NotFound => None,
        }
    }
}

pub fn resolve_route(config: &SiteConfig, path: &str) -> Route {
    let mut segments = Vec::new();
    for raw in path.split('/').filter(|s| !s.is_empty()) {
        match urlencoding::decode(raw) {
            Ok(segment) => segments.push(segment.into_owned()),
            Err(_) => return Route::NotFound,
        }
    }

    let prefixed = segments
        .split_first()
        .and_then(|(first, rest)| config.locale(first).map(|locale| (locale, rest)));
    let (locale, rest) = match prefixed {
        Some((locale, rest)) => (locale.clone(), rest),
        None => (config.default_locale().clone(), &segments[..]),
    };

    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    match rest.as_slice() {
        [] => Route::Home(locale),
        ["blog"] => Route::BlogIndex(locale),
        ["blog", segment, category]
            if *segment == "category" || *segment == config.category_segment(&locale) =>
        {
            Route::Category(locale, category.to_string())
        }
        ["blog", slug] => Route::Post(locale, slug.to_string()),
        [name] if STATIC_PAGE_NAMES.contains(name) => Route::Page(locale, name.to_string()),
        _ => Route::NotFound,
    }
}
