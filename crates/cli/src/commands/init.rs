use anyhow::{Context, Result};
use chrono::Local;
use pigeon_site_core::parse_site_toml_str;
use std::fs;
use std::path::{Path, PathBuf};

use super::site::{PUBLIC_DIR, SITE_TOML};

/// Escape a string for a TOML basic string
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Initialize a new site directory.
///
/// Creates `site.toml`, a welcome post in English and Polish, the static
/// page bodies and an empty `public/assets/`.
pub async fn run(path: PathBuf, name: Option<String>, base_url: Option<String>) -> Result<()> {
    println!("Initializing site directory: {}", path.display());

    let site_toml_path = path.join(SITE_TOML);
    if site_toml_path.exists() {
        anyhow::bail!(
            "site.toml already exists at {}\nHint: Delete it first or use a different directory",
            site_toml_path.display()
        );
    }

    fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    create_directory_structure(&path)?;

    generate_site_toml(&path, name.as_deref(), base_url.as_deref())?;
    println!("✓ Created site.toml");

    generate_sample_posts(&path)?;
    println!("✓ Created sample posts");

    generate_pages(&path)?;
    println!("✓ Created page bodies");

    println!("\nNext steps:");
    println!("  1. Edit site.toml");
    println!("  2. Write posts in content/blog/<slug>.<locale>.md");
    println!("  3. Put icons and images in public/assets/");
    println!("  4. pigeon-site serve {} --watch", path.display());

    Ok(())
}

fn create_directory_structure(base: &Path) -> Result<()> {
    for dir in ["content/blog", "content/pages"] {
        fs::create_dir_all(base.join(dir)).with_context(|| format!("Failed to create {}", dir))?;
    }
    fs::create_dir_all(base.join(PUBLIC_DIR).join("assets"))
        .context("Failed to create public/assets")?;
    Ok(())
}

fn generate_site_toml(base: &Path, name: Option<&str>, base_url: Option<&str>) -> Result<()> {
    let site_name = toml_escape_string(name.unwrap_or("Pigeon Map"));
    let site_url = toml_escape_string(base_url.unwrap_or("https://pigeon-map.digging.pl"));
    let name_comment = if name.is_some() {
        ""
    } else {
        "  # TODO: Set site name"
    };
    let url_comment = if base_url.is_some() {
        ""
    } else {
        "  # TODO: Set public origin"
    };

    let toml = format!(
        r##"# Generated by pigeon-site init

[site]
name = "{site_name}"{name_comment}
base_url = "{site_url}"{url_comment}
content_dir = "content/blog"
pages_dir = "content/pages"

[i18n]
locales = ["en", "pl"]
default_locale = "en"

[blog]
category_segment = "category"

# [blog.category_segments]
# pl = "kategoria"

# One key, one file per locale
# [universal_slugs.HowToLoginRegister]
# en = "How-to-login"
# pl = "Instrukcja-logowania"

[manifest]
short_name = "{site_name}"
start_url = "/"
theme_color = "#009fbe"
background_color = "#ffffff"

[robots]
allow = ["/"]
disallow = ["/dashboard", "/dashboard/*", "/api/", "/admin/"]

[pwa]
service_worker = "/dashboard-sw.js"
scope = "/"
update_policy = "eager"  # or "notify"
reload_delay_ms = 1000

[cookies]
prefix = "pigeonmap_digging_"
production_domain = ".digging.pl"
development_domain = "localhost"
"##
    );

    parse_site_toml_str(&toml)
        .context("Generated site.toml is invalid - this is a bug in the template generator")?;

    fs::write(base.join(SITE_TOML), toml).context("Failed to write site.toml")?;
    Ok(())
}

fn generate_sample_posts(base: &Path) -> Result<()> {
    let today = Local::now().format("%Y-%m-%d").to_string();
    let blog = base.join("content/blog");

    fs::write(
        blog.join("welcome.en.md"),
        format!(
            r##"---
title: Welcome to the blog
date: {today}
category: News
description: First post
---

Write posts in **markdown**. Front matter needs a `title` and a `date` (`YYYY-MM-DD`).
"##
        ),
    )?;
    fs::write(
        blog.join("welcome.pl.md"),
        format!(
            r##"---
title: Witamy na blogu
date: {today}
category: Nowości
description: Pierwszy wpis
---

Wpisy piszemy w **markdown**.
"##
        ),
    )?;

    Ok(())
}

fn generate_pages(base: &Path) -> Result<()> {
    let pages = base.join("content/pages");
    let bodies = [
        ("home.md", "Home", "Manage your loft, flights and seasons in one place."),
        ("about.md", "About", "Tell visitors who you are."),
        ("contact.md", "Contact", "How to reach you."),
        ("privacy-policy.md", "Privacy Policy", "What you collect and why."),
    ];
    for (file, title, body) in bodies {
        fs::write(
            pages.join(file),
            format!("---\ntitle: {}\n---\n\n{}\n", title, body),
        )
        .with_context(|| format!("Failed to write {}", file))?;
    }
    Ok(())
}
