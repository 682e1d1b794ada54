use crate::adapters::storage::DEFAULT_CART_KEY;
use crate::core::checkout::DEFAULT_PROCESSING_DELAY;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MAX_PROCESSING_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    pub catalog: Option<CatalogConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_store_key")]
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default = "default_processing_delay_ms")]
    pub processing_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

fn default_store_path() -> String {
    "./cart-store.json".to_string()
}

fn default_store_key() -> String {
    DEFAULT_CART_KEY.to_string()
}

fn default_processing_delay_ms() -> u64 {
    DEFAULT_PROCESSING_DELAY.as_millis() as u64
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            key: default_store_key(),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            processing_delay_ms: default_processing_delay_ms(),
        }
    }
}

impl CartConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${CART_STORE})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var pattern")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.checkout.processing_delay_ms)
    }

    pub fn catalog_path(&self) -> Option<&str> {
        self.catalog.as_ref().map(|c| c.path.as_str())
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}

impl Validate for CartConfig {
    fn validate(&self) -> Result<()> {
        validate_path("store.path", &self.store.path)?;
        validate_non_empty_string("store.key", &self.store.key)?;
        validate_range(
            "checkout.processing_delay_ms",
            self.checkout.processing_delay_ms,
            0,
            MAX_PROCESSING_DELAY_MS,
        )?;
        if let Some(catalog) = &self.catalog {
            validate_path("catalog.path", &catalog.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CartConfig::from_toml_str("").unwrap();

        assert_eq!(config.store.key, "cart");
        assert_eq!(config.store.path, "./cart-store.json");
        assert_eq!(config.processing_delay(), Duration::from_secs(3));
        assert!(config.catalog_path().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[store]
path = "/tmp/tickets.json"
key = "demo-cart"

[checkout]
processing_delay_ms = 250

[catalog]
path = "./events.toml"

[logging]
level = "debug"
json = true
"#;

        let config = CartConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.store.key, "demo-cart");
        assert_eq!(config.processing_delay(), Duration::from_millis(250));
        assert_eq!(config.catalog_path(), Some("./events.toml"));
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.log_json());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TICKET_CART_TEST_STORE", "/var/tmp/cart.json");

        let config = CartConfig::from_toml_str(
            r#"
[store]
path = "${TICKET_CART_TEST_STORE}"
"#,
        )
        .unwrap();
        assert_eq!(config.store.path, "/var/tmp/cart.json");

        std::env::remove_var("TICKET_CART_TEST_STORE");
    }

    #[test]
    fn test_config_validation() {
        let config = CartConfig::from_toml_str(
            r#"
[store]
key = "  "
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = CartConfig::from_toml_str(
            r#"
[checkout]
processing_delay_ms = 120000
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[store]\npath = \"./from-file.json\"\n")
            .unwrap();

        let config = CartConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.store.path, "./from-file.json");
    }
}
