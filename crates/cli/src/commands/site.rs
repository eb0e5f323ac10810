use anyhow::{Context, Result};
use pigeon_site_content::ContentStore;
use pigeon_site_core::{SiteConfig, parse_site_toml};
use pigeon_site_pwa::{default_rules, rules_json};
use std::path::{Path, PathBuf};

pub const SITE_TOML: &str = "site.toml";

/// Static files copied as-is into the output
pub const PUBLIC_DIR: &str = "public";

/// A site directory with its parsed configuration
pub struct Site {
    pub root: PathBuf,
    pub config: SiteConfig,
    pub store: ContentStore,
}

impl Site {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Site directory does not exist: {}\nRun 'pigeon-site init {}' first",
                path.display(),
                path.display()
            );
        }

        let toml_path = path.join(SITE_TOML);
        if !toml_path.exists() {
            anyhow::bail!(
                "{} not found in {}\nRun 'pigeon-site init {}' first",
                SITE_TOML,
                path.display(),
                path.display()
            );
        }

        let config = parse_site_toml(&toml_path).context("Failed to parse site.toml")?;
        let store = ContentStore::from_config(&config, path);

        Ok(Self {
            root: path.to_path_buf(),
            config,
            store,
        })
    }
}

/// `/sw-cache.json` body
pub fn cache_rules(config: &SiteConfig) -> Result<String> {
    let rules = default_rules(&config.site.base_url, &config.pwa.cache_version);
    rules_json(&rules).context("Failed to serialize cache rules")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_requires_site_toml() {
        let dir = TempDir::new().unwrap();
        let err = Site::load(dir.path()).err().unwrap();
        assert!(err.to_string().contains("site.toml not found"));

        let missing = dir.path().join("nope");
        let err = Site::load(&missing).err().unwrap();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_site() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SITE_TOML),
            "[site]\nname = \"Pigeon Map\"\nbase_url = \"https://pigeon-map.digging.pl\"\n[i18n]\nlocales = [\"en\", \"pl\"]\ndefault_locale = \"en\"\n",
        )
        .unwrap();

        let site = Site::load(dir.path()).unwrap();
        assert_eq!(site.config.site.name, "Pigeon Map");
        assert_eq!(site.store.posts_dir(), dir.path().join("content/blog"));

        let rules = cache_rules(&site.config).unwrap();
        assert!(rules.contains("dashboard-pages-v"));
    }
}
