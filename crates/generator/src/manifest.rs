use pigeon_site_core::{ManifestConfig, ManifestIcon, SiteConfig};
use serde::Serialize;

/// `manifest.webmanifest` body
#[derive(Debug, Serialize)]
pub struct WebManifest<'a> {
    pub name: &'a str,
    pub short_name: &'a str,
    pub description: &'a str,
    pub start_url: &'a str,
    pub scope: &'a str,
    pub display: &'a str,
    pub background_color: &'a str,
    pub theme_color: &'a str,
    pub icons: &'a [ManifestIcon],
}

impl<'a> WebManifest<'a> {
    pub fn from_config(config: &'a SiteConfig) -> Self {
        let m: &ManifestConfig = &config.manifest;
        Self {
            name: &m.name,
            short_name: &m.short_name,
            description: &m.description,
            start_url: &m.start_url,
            scope: &config.pwa.scope,
            display: &m.display,
            background_color: &m.background_color,
            theme_color: &m.theme_color,
            icons: &m.icons,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pigeon_site_core::parse_site_toml_str;

    #[test]
    fn test_default_manifest() {
        let config = parse_site_toml_str(
            "[site]\nname = \"P\"\nbase_url = \"https://pigeon-map.digging.pl\"\n[i18n]\nlocales = [\"en\"]\ndefault_locale = \"en\"\n",
        )
        .unwrap();
        let json = WebManifest::from_config(&config).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["short_name"], "Pigeon Map");
        assert_eq!(value["display"], "standalone");
        assert_eq!(value["start_url"], "/");
        assert_eq!(value["theme_color"], "#009fbe");
        assert_eq!(value["icons"].as_array().unwrap().len(), 2);
        assert_eq!(value["icons"][0]["sizes"], "192x192");
        assert_eq!(value["icons"][1]["type"], "image/png");
    }
}
