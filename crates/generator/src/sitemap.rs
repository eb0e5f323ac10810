//! Sitemap generation.
//!
//! Entries cover static pages, every post and every category, for every
//! configured locale. A locale whose posts cannot be loaded is logged and
//! skipped; its static pages are always present.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://pigeon-map.digging.pl</loc>
//!     <lastmod>2025-01-01T00:00:00+00:00</lastmod>
//!     <changefreq>daily</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use pigeon_site_content::PostSource;
use pigeon_site_core::{ChangeFrequency, SiteConfig, SitemapEntry};
use tracing::error;

use crate::urls::UrlBuilder;
use crate::xml::escape_xml;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Pages present in every locale
pub const STATIC_PAGES: &[&str] = &["/", "/contact", "/about", "/privacy-policy", "/blog"];

pub struct SitemapBuilder<'a, S: PostSource> {
    config: &'a SiteConfig,
    source: &'a S,
    now: DateTime<Utc>,
}

impl<'a, S: PostSource> SitemapBuilder<'a, S> {
    /// `now` stamps entries that have no date of their own
    pub fn new(config: &'a SiteConfig, source: &'a S, now: DateTime<Utc>) -> Self {
        Self {
            config,
            source,
            now,
        }
    }

    pub fn build(&self) -> Vec<SitemapEntry> {
        let urls = UrlBuilder::new(self.config);
        let locales = self.config.locales();
        let mut entries = Vec::new();

        for page in STATIC_PAGES {
            let (change_frequency, priority) = if *page == "/" {
                (ChangeFrequency::Daily, 1.0)
            } else {
                (ChangeFrequency::Weekly, 0.8)
            };
            for locale in locales {
                entries.push(SitemapEntry {
                    url: urls.absolute(locale, page),
                    last_modified: self.now,
                    change_frequency,
                    priority,
                });
            }
        }

        for locale in locales {
            match self.source.all_posts(locale) {
                Ok(posts) => {
                    for post in posts {
                        entries.push(SitemapEntry {
                            url: urls.absolute(locale, &urls.post_path(&post.slug)),
                            last_modified: parse_post_date(post.metadata.date.as_deref())
                                .unwrap_or(self.now),
                            change_frequency: ChangeFrequency::Monthly,
                            priority: 0.6,
                        });
                    }
                }
                Err(e) => error!(locale = %locale, error = %e, "Error loading posts for sitemap"),
            }
        }

        for locale in locales {
            match self.source.all_categories(locale) {
                Ok(categories) => {
                    for category in categories {
                        entries.push(SitemapEntry {
                            url: urls.absolute(locale, &urls.category_path(locale, &category)),
                            last_modified: self.now,
                            change_frequency: ChangeFrequency::Weekly,
                            priority: 0.7,
                        });
                    }
                }
                Err(e) => {
                    error!(locale = %locale, error = %e, "Error loading categories for sitemap")
                }
            }
        }

        entries
    }
}

/// `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp
pub fn parse_post_date(date: Option<&str>) -> Option<DateTime<Utc>> {
    let date = date?.trim();
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render entries as sitemap protocol XML
pub fn render_sitemap_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(128 + entries.len() * 160);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.url)));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            entry.last_modified.to_rfc3339()
        ));
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.change_frequency.as_str()
        ));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pigeon_site_core::{Error, Locale, Post, PostMetadata, Result, parse_site_toml_str};

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

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn post(slug: &str, date: Option<&str>, category: Option<&str>) -> Post {
        Post {
            slug: slug.to_string(),
            locale: None,
            metadata: PostMetadata {
                date: date.map(str::to_string),
                category: category.map(str::to_string),
                ..Default::default()
            },
            content: String::new(),
        }
    }

    /// Polish posts load; English enumeration fails
    struct StubSource;

    impl PostSource for StubSource {
        fn all_posts(&self, locale: &Locale) -> Result<Vec<Post>> {
            match locale.as_str() {
                "pl" => Ok(vec![
                    post("loty", Some("2024-05-10"), Some("Nowości")),
                    post("bez-daty", Some("wkrótce"), None),
                ]),
                _ => Err(Error::InvalidData("broken locale".to_string())),
            }
        }
    }

    #[test]
    fn test_static_pages_for_every_locale() {
        let config = config();
        let entries = SitemapBuilder::new(&config, &StubSource, now()).build();

        let home: Vec<_> = entries.iter().take(2).collect();
        assert_eq!(home[0].url, "https://pigeon-map.digging.pl");
        assert_eq!(home[0].change_frequency, ChangeFrequency::Daily);
        assert_eq!(home[0].priority, 1.0);
        assert_eq!(home[1].url, "https://pigeon-map.digging.pl/pl");

        for page in ["/contact", "/about", "/privacy-policy", "/blog"] {
            assert!(entries.iter().any(|e| e.url == format!("https://pigeon-map.digging.pl{}", page)));
            assert!(entries.iter().any(|e| e.url == format!("https://pigeon-map.digging.pl/pl{}", page)));
        }
    }

    #[test]
    fn test_failing_locale_keeps_static_pages() {
        let config = config();
        let entries = SitemapBuilder::new(&config, &StubSource, now()).build();

        // 5 static × 2 locales, 2 Polish posts, 1 Polish category
        assert_eq!(entries.len(), 13);
        assert!(entries.iter().any(|e| e.url == "https://pigeon-map.digging.pl/about"));
    }

    #[test]
    fn test_post_and_category_entries() {
        let config = config();
        let entries = SitemapBuilder::new(&config, &StubSource, now()).build();

        let post = entries
            .iter()
            .find(|e| e.url == "https://pigeon-map.digging.pl/pl/blog/loty")
            .unwrap();
        assert_eq!(post.change_frequency, ChangeFrequency::Monthly);
        assert_eq!(post.priority, 0.6);
        assert_eq!(
            post.last_modified,
            Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap()
        );

        let undated = entries
            .iter()
            .find(|e| e.url.ends_with("/pl/blog/bez-daty"))
            .unwrap();
        assert_eq!(undated.last_modified, now());

        let category = entries.last().unwrap();
        assert_eq!(
            category.url,
            "https://pigeon-map.digging.pl/pl/blog/kategoria/Nowo%C5%9Bci"
        );
        assert_eq!(category.priority, 0.7);
    }

    #[test]
    fn test_parse_post_date() {
        assert_eq!(
            parse_post_date(Some("2024-01-01")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_post_date(Some("2024-01-01T10:00:00+02:00")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(parse_post_date(Some("yesterday")), None);
        assert_eq!(parse_post_date(None), None);
    }

    #[test]
    fn test_render_xml() {
        let entries = vec![SitemapEntry {
            url: "https://example.com/search?q=a&b=c".to_string(),
            last_modified: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            change_frequency: ChangeFrequency::Weekly,
            priority: 0.8,
        }];
        let xml = render_sitemap_xml(&entries);

        let lines: Vec<&str> = xml.lines().collect();
        assert_eq!(lines[0], r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        assert!(lines[1].starts_with("<urlset"));
        assert!(xml.contains("<loc>https://example.com/search?q=a&amp;b=c</loc>"));
        assert!(xml.contains("<lastmod>2025-01-01T00:00:00+00:00</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>0.8</priority>"));
        assert_eq!(lines.last().unwrap().trim(), "</urlset>");
    }

    #[test]
    fn test_render_empty() {
        let xml = render_sitemap_xml(&[]);
        assert!(!xml.contains("<url>"));
        assert!(xml.contains("</urlset>"));
    }
}
