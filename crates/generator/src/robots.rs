// robots.txt

use pigeon_site_core::SiteConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsRule {
    pub user_agent: String,
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Robots {
    pub rules: Vec<RobotsRule>,
    pub sitemap: String,
}

impl Robots {
    /// One rule for every crawler, advertising `<base_url>/sitemap.xml`
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            rules: vec![RobotsRule {
                user_agent: "*".to_string(),
                allow: config.robots.allow.clone(),
                disallow: config.robots.disallow.clone(),
            }],
            sitemap: format!("{}/sitemap.xml", config.site.base_url),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            out.push_str(&format!("User-agent: {}\n", rule.user_agent));
            for path in &rule.allow {
                out.push_str(&format!("Allow: {}\n", path));
            }
            for path in &rule.disallow {
                out.push_str(&format!("Disallow: {}\n", path));
            }
            out.push('\n');
        }
        out.push_str(&format!("Sitemap: {}\n", self.sitemap));
        out
    }
}
