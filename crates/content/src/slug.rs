//! Slug resolution.
//!
//! Public URLs carry a slug; the file on disk is `<slug>.<locale>.md`.
//! Most posts use the same slug everywhere, but "universal" posts are
//! published under a different slug per locale. Those are looked up in
//! the [`UniversalSlugMap`] by their canonical key.

use pigeon_site_core::{Locale, UniversalSlugMap, is_locale_code};
use tracing::warn;

/// Strip a trailing `.<ll>.md` suffix, if present.
///
/// Only two-letter lowercase locale codes count; `notes.md` and
/// `post.eng.md` are returned unchanged.
pub fn strip_locale_suffix(name: &str) -> &str {
    if let Some(stem) = name.strip_suffix(".md")
        && let Some((base, code)) = stem.rsplit_once('.')
        && is_locale_code(code)
    {
        return base;
    }
    name
}

/// Maps requested slugs to on-disk base names
#[derive(Debug, Clone, Copy)]
pub struct SlugResolver<'a> {
    map: &'a UniversalSlugMap,
    /// Used when the caller asks without a locale
    fallback_locale: &'a Locale,
}

impl<'a> SlugResolver<'a> {
    pub fn new(map: &'a UniversalSlugMap, fallback_locale: &'a Locale) -> Self {
        Self {
            map,
            fallback_locale,
        }
    }

    /// Resolve `slug` to the base file name to load.
    ///
    /// Never fails: a key missing from the table, or missing for this
    /// locale, resolves to the requested slug itself.
    pub fn real_slug(&self, slug: &str, locale: Option<&Locale>) -> String {
        if !self.map.contains_key(slug) {
            return strip_locale_suffix(slug).to_string();
        }

        let locale = locale.unwrap_or(self.fallback_locale);
        match self.map.get(slug, locale.as_str()) {
            Some(real) => strip_locale_suffix(real).to_string(),
            None => {
                warn!(slug, locale = %locale, "No universal name found for slug");
                strip_locale_suffix(slug).to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn sample_map() -> UniversalSlugMap {
        let mut map = UniversalSlugMap::new();
        map.insert(
            "HowToLoginRegister",
            locale("pl"),
            "Instrukcja-logowania-rejestracji",
        );
        map.insert("HowToLoginRegister", locale("en"), "How-to-login-register.en.md");
        map.insert(
            "HowToLoginRegister",
            locale("cs"),
            "Jak-se-přihlásit-zaregistrovat",
        );
        map
    }

    #[test]
    fn test_strip_locale_suffix() {
        assert_eq!(strip_locale_suffix("how-to.pl.md"), "how-to");
        assert_eq!(strip_locale_suffix("how-to"), "how-to");
        assert_eq!(strip_locale_suffix("how-to.md"), "how-to.md");
        assert_eq!(strip_locale_suffix("how-to.eng.md"), "how-to.eng.md");
        assert_eq!(strip_locale_suffix("how-to.PL.md"), "how-to.PL.md");
        assert_eq!(strip_locale_suffix("v1.2.en.md"), "v1.2");
    }

    #[test]
    fn test_universal_key_resolves_per_locale() {
        let map = sample_map();
        let en = locale("en");
        let resolver = SlugResolver::new(&map, &en);

        assert_eq!(
            resolver.real_slug("HowToLoginRegister", Some(&locale("pl"))),
            "Instrukcja-logowania-rejestracji"
        );
        assert_eq!(
            resolver.real_slug("HowToLoginRegister", Some(&locale("cs"))),
            "Jak-se-přihlásit-zaregistrovat"
        );
    }

    #[test]
    fn test_universal_value_is_suffix_stripped() {
        let map = sample_map();
        let en = locale("en");
        let resolver = SlugResolver::new(&map, &en);

        assert_eq!(
            resolver.real_slug("HowToLoginRegister", Some(&en)),
            "How-to-login-register"
        );
    }

    #[test]
    fn test_missing_locale_falls_back_to_requested_slug() {
        let map = sample_map();
        let en = locale("en");
        let resolver = SlugResolver::new(&map, &en);

        assert_eq!(
            resolver.real_slug("HowToLoginRegister", Some(&locale("nl"))),
            "HowToLoginRegister"
        );
    }

    #[test]
    fn test_no_locale_uses_fallback_locale() {
        let map = sample_map();
        let en = locale("en");
        let resolver = SlugResolver::new(&map, &en);

        assert_eq!(
            resolver.real_slug("HowToLoginRegister", None),
            "How-to-login-register"
        );
    }

    #[test]
    fn test_unknown_key_returns_input() {
        let map = sample_map();
        let en = locale("en");
        let resolver = SlugResolver::new(&map, &en);

        assert_eq!(resolver.real_slug("how-to", Some(&en)), "how-to");
        assert_eq!(resolver.real_slug("how-to.pl.md", Some(&en)), "how-to");
    }
}
