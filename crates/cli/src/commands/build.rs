use anyhow::{Context, Result};
use chrono::Utc;
use pigeon_site_generator::generate_site;
use pigeon_site_pwa::registration_script;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::site::{PUBLIC_DIR, Site, cache_rules};

/// Export the site as static files
pub async fn run(path: PathBuf, output: PathBuf) -> Result<()> {
    println!("🔨 Building static site...");
    println!("   Source: {}", path.display());
    println!("   Output: {}", output.display());
    println!();

    let site = Site::load(&path)?;
    println!("✓ Loaded: {}", site.config.site.name);
    println!("  Locales: {}", site.config.locales().len());
    println!();

    fs::create_dir_all(&output).context("Failed to create output directory")?;

    println!("📄 Rendering pages...");
    let generated = generate_site(&site.config, &site.store, Utc::now());
    for (page, html) in &generated.pages {
        write_file(&output, page, html.as_bytes())?;
    }
    println!("   ✓ Rendered {} pages", generated.pages.len());

    println!("🗺  Writing sitemap, robots.txt and manifest...");
    for (asset, data) in &generated.assets {
        write_file(&output, asset, data)?;
    }
    println!("   ✓ Wrote {} files", generated.assets.len());

    println!("📱 Writing PWA registration script and cache rules...");
    write_file(&output, "dashboard-pwa.js", registration_script(&site.config).as_bytes())?;
    write_file(&output, "sw-cache.json", cache_rules(&site.config)?.as_bytes())?;
    println!("   ✓ Generated dashboard-pwa.js and sw-cache.json");

    println!("📁 Copying public files...");
    let copied = copy_public(&site.root.join(PUBLIC_DIR), &output)?;
    println!("   ✓ Copied {} files", copied);

    println!();
    println!("✅ Build complete!");
    println!("   Output: {}", output.display());
    println!();
    println!("To test locally:");
    println!("   cd {} && python3 -m http.server 8000", output.display());
    println!();

    Ok(())
}

fn write_file(output: &Path, relative: &str, data: &[u8]) -> Result<()> {
    let dest = output.join(relative);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&dest, data).with_context(|| format!("Failed to write {}", dest.display()))
}

/// Copy everything under `public/`, keeping the directory layout
fn copy_public(public: &Path, output: &Path) -> Result<usize> {
    if !public.exists() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(public) {
        let entry = entry.context("Failed to read public directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(public)
            .context("Public file outside public directory")?;
        let dest = output.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)
            .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        copied += 1;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_public_keeps_layout() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("assets")).unwrap();
        fs::write(src.path().join("assets/logo192.png"), b"png").unwrap();
        fs::write(src.path().join("dashboard-sw.js"), b"sw").unwrap();

        assert_eq!(copy_public(src.path(), out.path()).unwrap(), 2);
        assert!(out.path().join("assets/logo192.png").exists());
        assert!(out.path().join("dashboard-sw.js").exists());
    }

    #[test]
    fn test_copy_public_missing_is_empty() {
        let out = TempDir::new().unwrap();
        assert_eq!(copy_public(&out.path().join("public"), out.path()).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_build_writes_site() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
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

        run(dir.path().to_path_buf(), out.path().to_path_buf())
            .await
            .unwrap();

        for file in [
            "index.html",
            "pl/index.html",
            "pl/blog/loty/index.html",
            "404.html",
            "sitemap.xml",
            "robots.txt",
            "manifest.webmanifest",
            "dashboard-pwa.js",
            "sw-cache.json",
        ] {
            assert!(out.path().join(file).exists(), "missing {}", file);
        }

        let script = fs::read_to_string(out.path().join("dashboard-pwa.js")).unwrap();
        assert!(script.contains("/dashboard-sw.js"));
        let robots = fs::read_to_string(out.path().join("robots.txt")).unwrap();
        assert!(robots.starts_with("User-agent: *\n"));
    }
}
