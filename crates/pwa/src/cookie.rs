// Namespaced, domain-scoped cookies shared with the dashboard app

use pigeon_site_core::CookieConfig;

/// Bearer token from the auth service
pub const TOKEN: &str = "token";
pub const SEASON: &str = "season";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

/// Where cookies are actually stored (`document.cookie`, a test map, ...)
pub trait CookieJar {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: &str, domain: &str);
    fn remove(&mut self, name: &str);
}

#[derive(Debug, Clone, Copy)]
pub struct Cookies<'a> {
    config: &'a CookieConfig,
    environment: Environment,
}

impl<'a> Cookies<'a> {
    pub fn new(config: &'a CookieConfig, environment: Environment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// `pigeonmap_digging_<key>`
    pub fn name(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    pub fn domain(&self) -> &'a str {
        match self.environment {
            Environment::Production => self.config.production_domain.as_str(),
            Environment::Development => self.config.development_domain.as_str(),
        }
    }

    /// Stored value, empty when unset
    pub fn get(&self, jar: &impl CookieJar, key: &str) -> String {
        jar.get(&self.name(key)).unwrap_or_default()
    }

    pub fn set(&self, jar: &mut impl CookieJar, key: &str, value: &str) {
        jar.set(&self.name(key), value, self.domain());
    }

    pub fn remove(&self, jar: &mut impl CookieJar, key: &str) {
        jar.remove(&self.name(key));
    }

    pub fn has_token(&self, jar: &impl CookieJar) -> bool {
        !self.get(jar, TOKEN).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapJar(HashMap<String, (String, String)>);

    impl CookieJar for MapJar {
        fn get(&self, name: &str) -> Option<String> {
            self.0.get(name).map(|(value, _)| value.clone())
        }

        fn set(&mut self, name: &str, value: &str, domain: &str) {
            self.0
                .insert(name.to_string(), (value.to_string(), domain.to_string()));
        }

        fn remove(&mut self, name: &str) {
            self.0.remove(name);
        }
    }

    fn config() -> CookieConfig {
        CookieConfig {
            prefix: "pigeonmap_digging_".to_string(),
            production_domain: ".digging.pl".to_string(),
            development_domain: "localhost".to_string(),
        }
    }

    #[test]
    fn test_names_are_prefixed() {
        let config = config();
        let cookies = Cookies::new(&config, Environment::Development);
        assert_eq!(cookies.name(TOKEN), "pigeonmap_digging_token");
        assert_eq!(cookies.name(SEASON), "pigeonmap_digging_season");
    }

    #[test]
    fn test_domain_follows_environment() {
        let config = config();
        assert_eq!(Cookies::new(&config, Environment::Production).domain(), ".digging.pl");
        assert_eq!(Cookies::new(&config, Environment::Development).domain(), "localhost");
    }

    #[test]
    fn test_set_get_remove() {
        let config = config();
        let cookies = Cookies::new(&config, Environment::Production);
        let mut jar = MapJar::default();

        assert_eq!(cookies.get(&jar, TOKEN), "");
        assert!(!cookies.has_token(&jar));

        cookies.set(&mut jar, TOKEN, "abc");
        assert_eq!(
            jar.0.get("pigeonmap_digging_token"),
            Some(&("abc".to_string(), ".digging.pl".to_string()))
        );
        assert!(cookies.has_token(&jar));

        cookies.remove(&mut jar, TOKEN);
        assert_eq!(cookies.get(&jar, TOKEN), "");
        assert!(!cookies.has_token(&jar));
    }
}
