use serde::Deserialize;
use std::time::Duration;

use crate::payout::PROVIDER_MAX_BATCH_SIZE;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub paypal: PaypalConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub payout: PayoutConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PaypalConfig {
    #[serde(default)]
    pub mode: PaypalMode,
    /// Overrides the endpoint implied by `mode`.
    pub base_url: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaypalMode {
    #[default]
    Sandbox,
    Live,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PayoutConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_busy_timeout_secs() -> u64 {
    10
}

fn default_batch_size() -> usize {
    PROVIDER_MAX_BATCH_SIZE
}

fn default_interval_secs() -> u64 {
    900
}

fn default_timeout_secs() -> u64 {
    20
}

impl Config {
    /// Layer `config/default.toml` (or `path`), then `CASHOUT__*` environment variables.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let file = match path {
            Some(p) => config::File::with_name(p),
            None => config::File::with_name("config/default").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("CASHOUT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.payout.batch_size == 0 {
            anyhow::bail!("payout.batch_size must be at least 1");
        }
        if self.payout.interval_secs == 0 {
            anyhow::bail!("payout.interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Credentials are only needed by commands that talk to PayPal.
    pub fn validate_paypal(&self) -> anyhow::Result<()> {
        if self.paypal.client_id.trim().is_empty() || self.paypal.client_secret.trim().is_empty() {
            anyhow::bail!("paypal.client_id and paypal.client_secret must be set");
        }
        Ok(())
    }

    pub fn paypal_base_url(&self) -> String {
        match (&self.paypal.base_url, self.paypal.mode) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, PaypalMode::Sandbox) => "https://api-m.sandbox.paypal.com".to_string(),
            (None, PaypalMode::Live) => "https://api-m.paypal.com".to_string(),
        }
    }

    /// Configured chunk size, capped at the provider's per-request limit.
    pub fn effective_batch_size(&self) -> usize {
        self.payout.batch_size.clamp(1, PROVIDER_MAX_BATCH_SIZE)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.database.busy_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(mode: PaypalMode, base_url: Option<&str>, batch_size: usize) -> Config {
        Config {
            paypal: PaypalConfig {
                mode,
                base_url: base_url.map(str::to_string),
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            database: DatabaseConfig {
                path: "cashouts.db".to_string(),
                busy_timeout_secs: 10,
            },
            payout: PayoutConfig {
                batch_size,
                interval_secs: 60,
            },
            http: HttpConfig::default(),
        }
    }

    #[test]
    fn base_url_follows_mode_unless_overridden() {
        assert_eq!(
            sample(PaypalMode::Sandbox, None, 500).paypal_base_url(),
            "https://api-m.sandbox.paypal.com"
        );
        assert_eq!(
            sample(PaypalMode::Live, None, 500).paypal_base_url(),
            "https://api-m.paypal.com"
        );
        assert_eq!(
            sample(PaypalMode::Live, Some("http://localhost:9000/"), 500).paypal_base_url(),
            "http://localhost:9000"
        );
    }

    #[test]
    fn batch_size_is_capped_at_provider_limit() {
        assert_eq!(sample(PaypalMode::Sandbox, None, 2_000).effective_batch_size(), 500);
        assert_eq!(sample(PaypalMode::Sandbox, None, 50).effective_batch_size(), 50);
    }

    #[test]
    fn validate_rejects_missing_credentials_and_zero_batch_size() {
        let mut config = sample(PaypalMode::Sandbox, None, 500);
        assert!(config.validate().is_ok());
        config.paypal.client_secret = "  ".to_string();
        assert!(config.validate().is_ok());
        assert!(config.validate_paypal().is_err());

        let config = sample(PaypalMode::Sandbox, None, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_explicit_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cashout.toml");
        std::fs::write(
            &path,
            r#"
[paypal]
mode = "live"
client_id = "abc"
client_secret = "def"

[database]
path = "/tmp/cashouts.db"

[payout]
batch_size = 250
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.paypal.mode, PaypalMode::Live);
        assert_eq!(config.effective_batch_size(), 250);
        assert_eq!(config.payout.interval_secs, 900);
        assert_eq!(config.http.timeout_secs, 20);
        assert_eq!(config.database.busy_timeout_secs, 10);
    }
}
