use std::env;
use std::io;
use std::net::SocketAddr;
use std::path::Path;

use brackets_core::{AdvancePolicy, BuildOptions};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

macro_rules! from_environment {
    ($config:expr, $($key:expr, $name:tt),*$(,)?) => {{
        $(
            {
                if let Ok(value) = env::var($key) {
                    match value.parse() {
                        Ok(value) => $config.$name = value,
                        Err(_) => log::warn!("Ignoring invalid value for {}: {:?}", $key, value),
                    }
                }
            }
        )*
    }};
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loglevel: LevelFilter,
    pub bind: SocketAddr,
    pub brackets: Brackets,
}

impl Config {
    pub async fn from_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let mut file = File::open(path).await?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await?;

        Ok(toml::from_slice(&buf)?)
    }

    /// Reads the config from `path`, falling back to the defaults if the file does not exist.
    /// Values from the environment take precedence in both cases.
    pub async fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err),
        };

        Ok(config.with_environment())
    }

    pub fn with_environment(mut self) -> Self {
        from_environment!(self, "BRACKETS_LOGLEVEL", loglevel, "BRACKETS_BIND", bind);
        self.brackets = self.brackets.with_environment();

        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: LevelFilter::Info,
            bind: SocketAddr::new([0, 0, 0, 0].into(), 3000),
            brackets: Brackets::default(),
        }
    }
}

/// Settings applied to every bracket managed by the server.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Brackets {
    /// Accept competitor counts that are not a power of two, filling up with byes.
    pub allow_byes: bool,
    pub advance_policy: AdvancePolicy,
}

impl Brackets {
    pub fn with_environment(mut self) -> Self {
        from_environment!(
            self,
            "BRACKETS_ALLOW_BYES",
            allow_byes,
            "BRACKETS_ADVANCE_POLICY",
            advance_policy,
        );

        self
    }

    #[inline]
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            byes: self.allow_byes,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::{Brackets, Config};

    use brackets_core::AdvancePolicy;
    use log::LevelFilter;

    #[test]
    fn test_config_toml() {
        let input = r#"
            loglevel = "debug"
            bind = "127.0.0.1:8080"

            [brackets]
            allow_byes = true
            advance_policy = "replace"
        "#;

        let config: Config = toml::from_str(input).unwrap();

        assert_eq!(config.loglevel, LevelFilter::Debug);
        assert_eq!(config.bind.port(), 8080);
        assert!(config.brackets.allow_byes);
        assert_eq!(config.brackets.advance_policy, AdvancePolicy::Replace);
        assert!(config.brackets.build_options().byes);
    }

    #[test]
    fn test_config_toml_defaults() {
        let config: Config = toml::from_str("loglevel = \"warn\"").unwrap();

        assert_eq!(config.loglevel, LevelFilter::Warn);
        assert_eq!(config.bind.port(), 3000);
        assert!(!config.brackets.allow_byes);
        assert_eq!(config.brackets.advance_policy, AdvancePolicy::Reject);
    }

    #[test]
    fn test_brackets_with_environment() {
        std::env::set_var("BRACKETS_ALLOW_BYES", "true");
        std::env::set_var("BRACKETS_ADVANCE_POLICY", "overwrite");

        let brackets = Brackets::default().with_environment();

        std::env::remove_var("BRACKETS_ALLOW_BYES");
        std::env::remove_var("BRACKETS_ADVANCE_POLICY");

        assert!(brackets.allow_byes);
        // Invalid values are ignored.
        assert_eq!(brackets.advance_policy, AdvancePolicy::Reject);
    }
}
