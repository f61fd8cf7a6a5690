use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_range, validate_url, Validate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional settings file. Every key may be omitted; command-line flags win over it.
///
/// ```toml
/// [api]
/// base_url = "https://api.passivetotal.org/v2/dns/passive/"
/// timeout_seconds = 60
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub api: Option<ApiSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn base_url(&self) -> Option<&str> {
        self.api.as_ref()?.base_url.as_deref()
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.api.as_ref()?.timeout_seconds
    }
}

/// 替換環境變數 (例如 ${PDNS_API_HOST})；未定義的變數保持原樣
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
        message: format!("Invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.into_owned())
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = self.base_url() {
            validate_url("api.base_url", url)?;
        }
        if let Some(timeout) = self.timeout_seconds() {
            validate_range("api.timeout_seconds", timeout, 1, 3600)?;
        }
        Ok(())
    }
}
