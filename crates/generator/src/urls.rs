//! Localized URL construction.
//!
//! The default locale lives at the root (`/blog`); every other locale is
//! prefixed (`/pl/blog`). Dynamic segments are percent-encoded.

use pigeon_site_core::{Locale, SiteConfig};

#[derive(Debug, Clone, Copy)]
pub struct UrlBuilder<'a> {
    config: &'a SiteConfig,
}

impl<'a> UrlBuilder<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }

    /// Site-relative path for `path` (which starts with `/`) in `locale`
    pub fn path(&self, locale: &Locale, path: &str) -> String {
        if self.config.is_default_locale(locale) {
            path.to_string()
        } else if path == "/" {
            format!("/{}", locale)
        } else {
            format!("/{}{}", locale, path)
        }
    }

    /// Absolute URL; the default-locale home page is the bare origin
    pub fn absolute(&self, locale: &Locale, path: &str) -> String {
        let localized = self.path(locale, path);
        if localized == "/" {
            self.config.site.base_url.clone()
        } else {
            format!("{}{}", self.config.site.base_url, localized)
        }
    }

    pub fn blog_path(&self) -> &'static str {
        "/blog"
    }

    pub fn post_path(&self, slug: &str) -> String {
        format!("/blog/{}", urlencoding::encode(slug))
    }

    pub fn category_path(&self, locale: &Locale, category: &str) -> String {
        format!(
            "/blog/{}/{}",
            self.config.category_segment(locale),
            urlencoding::encode(category)
        )
    }

    /// `(hreflang, absolute url)` for every configured locale plus `x-default`
    pub fn alternates(&self, path_for: impl Fn(&Locale) -> String) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .config
            .locales()
            .iter()
            .map(|locale| (locale.to_string(), self.absolute(locale, &path_for(locale))))
            .collect();
        let default = self.config.default_locale();
        out.push((
            "x-default".to_string(),
            self.absolute(default, &path_for(default)),
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pigeon_site_core::parse_site_toml_str;

    fn config() -> SiteConfig {
        parse_site_toml_str(
            r##"
[site]
name = "Pigeon Map"
base_url = "https://pigeon-map.digging.pl"

[i18n]
locales = ["en", "pl"]
default_locale = "en"

[blog.category_segments]
pl = "kategoria"
"##,
        )
        .unwrap()
    }

    #[test]
    fn test_default_locale_is_unprefixed() {
        let config = config();
        let urls = UrlBuilder::new(&config);
        let en = config.locale("en").unwrap();
        let pl = config.locale("pl").unwrap();

        assert_eq!(urls.path(en, "/blog"), "/blog");
        assert_eq!(urls.path(pl, "/blog"), "/pl/blog");
        assert_eq!(urls.path(pl, "/"), "/pl");
        assert_eq!(urls.absolute(en, "/"), "https://pigeon-map.digging.pl");
        assert_eq!(urls.absolute(pl, "/"), "https://pigeon-map.digging.pl/pl");
        assert_eq!(
            urls.absolute(en, "/contact"),
            "https://pigeon-map.digging.pl/contact"
        );
    }

    #[test]
    fn test_segments_are_encoded() {
        let config = config();
        let urls = UrlBuilder::new(&config);
        let pl = config.locale("pl").unwrap();

        assert_eq!(urls.post_path("Jak-się"), "/blog/Jak-si%C4%99");
        assert_eq!(
            urls.category_path(pl, "Porady i triki"),
            "/blog/kategoria/Porady%20i%20triki"
        );
    }

    #[test]
    fn test_alternates_cover_all_locales() {
        let config = config();
        let urls = UrlBuilder::new(&config);
        let alternates = urls.alternates(|_| "/blog".to_string());

        assert_eq!(alternates.len(), 3);
        assert_eq!(alternates[0], ("en".to_string(), "https://pigeon-map.digging.pl/blog".to_string()));
        assert_eq!(alternates[1].1, "https://pigeon-map.digging.pl/pl/blog");
        assert_eq!(alternates[2].0, "x-default");
    }
}
