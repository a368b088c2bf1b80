use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_COMPARE_URL: &str = "https://api-cn.faceplusplus.com/facepp/v3/compare";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Face++ client settings, read from the `[facepp]` table of the daemon
/// config and overridden by `FACEPP_*` environment variables.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct FacePlusPlusConfig {
    pub compare_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Whole-request timeout for a comparison call.
    pub timeout_secs: u64,
}

impl Default for FacePlusPlusConfig {
    fn default() -> Self {
        Self {
            compare_url: DEFAULT_COMPARE_URL.to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for FacePlusPlusConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacePlusPlusConfig")
            .field("compare_url", &self.compare_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FacePlusPlusConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `FACEPP_COMPARE_URL`, `FACEPP_API_KEY`, `FACEPP_API_SECRET`
    /// and `FACEPP_TIMEOUT_SECS` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), String> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source. A timeout that is
    /// set but not a whole number of seconds is an error.
    pub fn apply_vars<F>(&mut self, var: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("FACEPP_COMPARE_URL") {
            self.compare_url = url;
        }
        if let Some(key) = var("FACEPP_API_KEY") {
            self.api_key = key;
        }
        if let Some(secret) = var("FACEPP_API_SECRET") {
            self.api_secret = secret;
        }
        if let Some(raw) = var("FACEPP_TIMEOUT_SECS") {
            self.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|e| format!("invalid FACEPP_TIMEOUT_SECS {raw:?}: {e}"))?;
        }
        Ok(())
    }

    /// Both credentials must be present and the timeout non-zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("Face++ API key is not set (FACEPP_API_KEY)".into());
        }
        if self.api_secret.trim().is_empty() {
            return Err("Face++ API secret is not set (FACEPP_API_SECRET)".into());
        }
        if self.compare_url.trim().is_empty() {
            return Err("Face++ compare URL is empty".into());
        }
        if self.timeout_secs == 0 {
            return Err("Face++ timeout must be at least one second".into());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
