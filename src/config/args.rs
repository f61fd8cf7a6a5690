use crate::config::toml_config::FileConfig;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use clap::Parser;
use std::fmt;

#[derive(Clone, Parser)]
#[command(about = "Export passive DNS resolutions for a list of indicators to CSV")]
#[command(
    after_help = r"Example: abcdefghijklmnopqrstuvwxyz123456 johndoe@nowhere.com queries.txt results"
)]
pub struct CliConfig {
    /// PassiveTotal API key
    pub api_key: String,

    /// PassiveTotal user name (account e-mail)
    pub username: String,

    /// File with one domain or IP per line
    pub query_file: String,

    /// Directory receiving one CSV per indicator (created if missing)
    pub output_dir: String,

    #[arg(long, help = "Override the API endpoint URL")]
    pub api_url: Option<String>,

    #[arg(long, help = "Optional TOML settings file")]
    pub config: Option<String>,

    #[arg(long, help = "HTTP timeout in seconds (no timeout by default)")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit log lines as JSON")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage after each indicator")]
    pub monitor: bool,
}

impl CliConfig {
    /// Fills unset flags from the `--config` file, if one was given.
    pub fn with_file_overrides(self) -> Result<Self> {
        let Some(path) = self.config.as_deref() else {
            return Ok(self);
        };

        tracing::debug!("Loading settings from: {}", path);
        let file = FileConfig::from_file(path)?;
        file.validate()?;
        Ok(self.merge(&file))
    }

    pub fn merge(mut self, file: &FileConfig) -> Self {
        if self.api_url.is_none() {
            self.api_url = file.base_url().map(str::to_string);
        }
        if self.timeout_seconds.is_none() {
            self.timeout_seconds = file.timeout_seconds();
        }
        self
    }
}

// api_key 不得出現在日誌中
impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("api_key", &"<redacted>")
            .field("username", &self.username)
            .field("query_file", &self.query_file)
            .field("output_dir", &self.output_dir)
            .field("api_url", &self.api_url)
            .field("config", &self.config)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("verbose", &self.verbose)
            .field("log_json", &self.log_json)
            .field("monitor", &self.monitor)
            .finish()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("api_key", &self.api_key)?;
        validate_non_empty_string("username", &self.username)?;
        validate_path("query_file", &self.query_file)?;
        validate_path("output_dir", &self.output_dir)?;
        if let Some(url) = &self.api_url {
            validate_url("api_url", url)?;
        }
        if let Some(timeout) = self.timeout_seconds {
            validate_range("timeout_seconds", timeout, 1, 3600)?;
        }
        Ok(())
    }
}

impl ConfigProvider for CliConfig {
    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn query_file(&self) -> &str {
        &self.query_file
    }

    fn output_path(&self) -> &str {
        &self.output_dir
    }

    fn api_endpoint(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }
}
