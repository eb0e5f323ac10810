use anyhow::Context;
use pigeon_site_content::validate_content;
use std::path::PathBuf;

use super::site::Site;

pub async fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating site at: {}", path.display());

    let site = Site::load(&path)?;
    println!("✓ site.toml valid");
    println!("  Site: {} ({})", site.config.site.name, site.config.site.base_url);
    let locales: Vec<&str> = site.config.locales().iter().map(|l| l.as_str()).collect();
    println!(
        "  Locales: {} (default: {})",
        locales.join(", "),
        site.config.default_locale()
    );

    let report = validate_content(&site.config, &site.root).context("Failed to read content")?;

    for line in &report.info {
        println!("  {}", line);
    }
    for warning in &report.warnings {
        println!("⚠ {}", warning);
    }
    for error in &report.errors {
        println!("✗ {}", error);
    }

    if !report.is_ok() {
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }

    println!(
        "\n✓ Content valid ({} warning(s))",
        report.warnings.len()
    );
    Ok(())
}
