use facematch_facepp::FacePlusPlusConfig;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_PORT: u16 = 10000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Daemon configuration: optional TOML file named by `FACEMATCH_CONFIG`,
/// then environment overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interface to bind (default: all interfaces).
    pub host: String,
    /// Listen port (default: 10000, `PORT` overrides).
    pub port: u16,
    /// Directory served under `/static`; preloaded faces live in its
    /// `preloaded_ai_faces` subdirectory.
    pub static_dir: PathBuf,
    /// Maximum accepted request body for uploads.
    pub max_upload_bytes: usize,
    /// Names handed out with matches; empty means the built-in list.
    pub match_names: Vec<String>,
    pub facepp: FacePlusPlusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("static"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            match_names: Vec::new(),
            facepp: FacePlusPlusConfig::default(),
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var("FACEMATCH_CONFIG") {
            Ok(path) => Some(read_file(Path::new(&path))?),
            Err(_) => None,
        };
        let config = Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build from optional TOML text and a variable source.
    pub fn from_sources<F>(toml_text: Option<&str>, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = match toml_text {
            Some(text) => toml::from_str(text)?,
            None => Config::default(),
        };

        if let Some(host) = var("FACEMATCH_HOST") {
            config.host = host;
        }
        config.port = parse_var(&var, "PORT", config.port)?;
        if let Some(dir) = var("FACEMATCH_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        config.max_upload_bytes =
            parse_var(&var, "FACEMATCH_MAX_UPLOAD_BYTES", config.max_upload_bytes)?;
        config
            .facepp
            .apply_vars(&var)
            .map_err(ConfigError::Invalid)?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be non-zero".into()));
        }
        self.bind_addr()?;
        self.facepp.validate().map_err(ConfigError::Invalid)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid host address: {}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Directory listed for preloaded faces.
    pub fn gallery_dir(&self) -> PathBuf {
        self.static_dir.join(facematch_core::PRELOADED_FACES_SUBDIR)
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

// Set-but-malformed values are errors, not defaults.
fn parse_var<F, T>(var: &F, key: &str, current: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("{key}={v} is not a valid value"))),
        None => Ok(current),
    }
}
