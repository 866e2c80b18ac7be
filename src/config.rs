use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Management API settings
    pub listen_addr: String,
    pub db_path: String,
    pub api_key: Option<String>,
    pub debug: bool,

    // Upstream introspection API settings
    pub traefik_api_url: String,
    pub traefik_api_timeout_secs: u64,
    pub traefik_basic_auth_username: Option<String>,
    pub traefik_basic_auth_password: Option<String>,
    pub traefik_api_key_header: Option<String>,
    pub traefik_api_key_secret: Option<String>,

    // Servers transport fragments
    pub fragment_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            db_path: "./traefikr.db".to_string(),
            api_key: None,
            debug: false,
            traefik_api_url: "http://traefik:8080".to_string(),
            traefik_api_timeout_secs: 10,
            traefik_basic_auth_username: None,
            traefik_basic_auth_password: None,
            traefik_api_key_header: None,
            traefik_api_key_secret: None,
            fragment_dir: None,
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build the configuration from any variable lookup.
///
/// Empty values count as unset. Unparsable numbers fall back to the
/// default.
pub fn load_config_from<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let defaults = Config::default();

    let listen_addr = var("TRAEFIKR_LISTEN_ADDR").unwrap_or(defaults.listen_addr);
    let db_path = var("TRAEFIKR_DB_PATH").unwrap_or(defaults.db_path);
    let api_key = var("TRAEFIKR_API_KEY");
    let debug = lookup("DEBUG").is_some();

    let traefik_api_url = var("TRAEFIK_API_URL").unwrap_or(defaults.traefik_api_url);

    let traefik_api_timeout_secs = var("TRAEFIK_API_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(defaults.traefik_api_timeout_secs);

    let traefik_basic_auth_username = var("TRAEFIK_BASIC_AUTH_USERNAME");
    let traefik_basic_auth_password = var("TRAEFIK_BASIC_AUTH_PASSWORD");
    let traefik_api_key_header = var("TRAEFIK_API_KEY_HEADER");
    let traefik_api_key_secret = var("TRAEFIK_API_KEY_SECRET");

    let fragment_dir = var("TRAEFIK_CONFIG_PATH");

    Ok(Config {
        listen_addr,
        db_path,
        api_key,
        debug,
        traefik_api_url,
        traefik_api_timeout_secs,
        traefik_basic_auth_username,
        traefik_basic_auth_password,
        traefik_api_key_header,
        traefik_api_key_secret,
        fragment_dir,
    })
}

/// Lookup over a fixed set of variables.
pub fn map_lookup(vars: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |key| vars.get(key).cloned()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Config {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_config_from(map_lookup(vars)).unwrap()
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.db_path, "./traefikr.db");
        assert_eq!(cfg.traefik_api_url, "http://traefik:8080");
        assert_eq!(cfg.traefik_api_timeout_secs, 10);
        assert!(cfg.fragment_dir.is_none());
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_load_config_defaults() {
        let cfg = load(&[]);
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.db_path, "./traefikr.db");
        assert!(!cfg.debug);
        assert!(cfg.traefik_basic_auth_username.is_none());
    }

    #[test]
    fn test_load_config_overrides() {
        let cfg = load(&[
            ("TRAEFIKR_LISTEN_ADDR", "127.0.0.1:9000"),
            ("TRAEFIKR_DB_PATH", "/data/traefikr.db"),
            ("TRAEFIKR_API_KEY", "sk_abc"),
            ("TRAEFIK_API_URL", "http://proxy:8080"),
            ("TRAEFIK_API_TIMEOUT_SECS", "3"),
            ("TRAEFIK_BASIC_AUTH_USERNAME", "admin"),
            ("TRAEFIK_BASIC_AUTH_PASSWORD", "pw"),
            ("TRAEFIK_CONFIG_PATH", "/etc/traefik/dynamic"),
            ("DEBUG", "1"),
        ]);
        assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
        assert_eq!(cfg.db_path, "/data/traefikr.db");
        assert_eq!(cfg.api_key.as_deref(), Some("sk_abc"));
        assert_eq!(cfg.traefik_api_url, "http://proxy:8080");
        assert_eq!(cfg.traefik_api_timeout_secs, 3);
        assert_eq!(cfg.traefik_basic_auth_username.as_deref(), Some("admin"));
        assert_eq!(cfg.traefik_basic_auth_password.as_deref(), Some("pw"));
        assert_eq!(cfg.fragment_dir.as_deref(), Some("/etc/traefik/dynamic"));
        assert!(cfg.debug);
    }

    #[test]
    fn test_empty_values_are_unset() {
        let cfg = load(&[("TRAEFIK_CONFIG_PATH", ""), ("TRAEFIKR_DB_PATH", "")]);
        assert!(cfg.fragment_dir.is_none());
        assert_eq!(cfg.db_path, "./traefikr.db");
    }

    #[test]
    fn test_debug_set_even_when_empty() {
        assert!(load(&[("DEBUG", "")]).debug);
    }

    #[test]
    fn test_bad_timeout_falls_back() {
        assert_eq!(load(&[("TRAEFIK_API_TIMEOUT_SECS", "soon")]).traefik_api_timeout_secs, 10);
        assert_eq!(load(&[("TRAEFIK_API_TIMEOUT_SECS", "0")]).traefik_api_timeout_secs, 10);
    }

    #[test]
    fn test_api_key_header_pair() {
        let cfg = load(&[
            ("TRAEFIK_API_KEY_HEADER", "X-Api-Key"),
            ("TRAEFIK_API_KEY_SECRET", "s3cret"),
        ]);
        assert_eq!(cfg.traefik_api_key_header.as_deref(), Some("X-Api-Key"));
        assert_eq!(cfg.traefik_api_key_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_config_clone() {
        let cfg = Config::default();
        let cloned = cfg.clone();
        assert_eq!(cfg.listen_addr, cloned.listen_addr);
    }
}
