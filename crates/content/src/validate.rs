// Content validation: file naming, front matter, dates, universal slug coverage

use chrono::NaiveDate;
use pigeon_site_core::{Result, SiteConfig, is_locale_code};
use std::fs;
use std::path::Path;

use crate::front_matter::parse_document;
use crate::slug::strip_locale_suffix;
use crate::store::post_file_name;

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Strict `YYYY-MM-DD`, the only format that orders correctly as a string
pub fn is_sortable_date(date: &str) -> bool {
    date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// Check every file in the content directory against the site config.
///
/// Only an unreadable content directory is an `Err`; problems with
/// individual files are collected in the report.
pub fn validate_content(config: &SiteConfig, site_root: &Path) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    let posts_dir = site_root.join(&config.site.content_dir);

    let mut names: Vec<String> = fs::read_dir(&posts_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.ends_with(".md"))
        .collect();
    names.sort();

    let mut per_locale = vec![0usize; config.locales().len()];
    for name in &names {
        if !is_localized_file_name(name) {
            report
                .info
                .push(format!("{}: locale-agnostic post (used as fallback)", name));
        } else {
            let base = strip_locale_suffix(name);
            let code = &name[base.len() + 1..name.len() - 3];
            match config.locales().iter().position(|l| l.as_str() == code) {
                Some(i) => per_locale[i] += 1,
                None => {
                    report.errors.push(format!(
                        "{}: locale '{}' is not listed in i18n.locales",
                        name, code
                    ));
                    continue;
                }
            }
        }

        let path = posts_dir.join(name);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                report.errors.push(format!("{}: {}", name, e));
                continue;
            }
        };
        let metadata = match parse_document(&source, &path) {
            Ok((metadata, _)) => metadata,
            Err(e) => {
                report.errors.push(e.to_string());
                continue;
            }
        };

        if metadata.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            report.warnings.push(format!("{}: missing title", name));
        }
        match metadata.date.as_deref() {
            None => report
                .warnings
                .push(format!("{}: missing date, post will sort last", name)),
            Some(date) if !is_sortable_date(date) => report.warnings.push(format!(
                "{}: date '{}' is not YYYY-MM-DD, ordering is undefined",
                name, date
            )),
            Some(_) => {}
        }
    }

    for (locale, count) in config.locales().iter().zip(&per_locale) {
        report
            .info
            .push(format!("{}: {} post(s)", locale, count));
    }

    for (key, slugs) in config.universal_slugs.iter() {
        for locale in config.locales() {
            match slugs.get(locale) {
                None => report.warnings.push(format!(
                    "universal_slugs.{}: no slug for locale '{}'",
                    key, locale
                )),
                Some(slug) => {
                    let file = post_file_name(strip_locale_suffix(slug), Some(locale));
                    if !posts_dir.join(&file).is_file() {
                        report.warnings.push(format!(
                            "universal_slugs.{}.{}: file {} does not exist",
                            key, locale, file
                        ));
                    }
                }
            }
        }
    }

    Ok(report)
}

/// True when `name` looks like `<slug>.<ll>.md`
pub fn is_localized_file_name(name: &str) -> bool {
    name.strip_suffix(".md")
        .and_then(|stem| stem.rsplit_once('.'))
        .is_some_and(|(base, code)| !base.is_empty() && is_locale_code(code))
}
