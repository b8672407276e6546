use std::fs::File;

use anyhow::{Context, Result};
use api::ApiConfig;
use auth::AuthConfig;
use hash::HashConfig;
use log::LogConfig;
use serde::Deserialize;

pub mod api;
pub mod auth;
pub mod hash;
pub mod log;

#[derive(Deserialize)]
pub struct Config {
    #[serde(default)]
    log: LogConfig,
    hash: HashConfig,
    #[serde(default)]
    auth: AuthConfig,
    api: ApiConfig,
}

impl Config {
    pub fn log(&self) -> &LogConfig {
        &self.log
    }

    pub fn hash(&self) -> &HashConfig {
        &self.hash
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }
}

pub fn from_path(path: &str) -> Result<Config> {
    let file = File::open(path).with_context(|| format!("Failed to open config file {path}"))?;
    serde_yaml::from_reader::<_, Config>(file)
        .with_context(|| format!("Failed to parse config file {path}"))
}

pub fn from_str(source: &str) -> Result<Config> {
    Ok(serde_yaml::from_str::<Config>(source)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const FULL: &str = r#"
log:
  display_level: true
  level_filter: debug
hash:
  argon2:
    algorithm: Argon2id
    version: V0x13
auth:
  cookie_name: sid
  cookie_path: /app
  login_path: /app/login
  logout_path: /app/logout
  logout_redirect: /app
  users:
    - login: admin
      password: secret
api:
  http:
    host: 0.0.0.0
    port: 9000
    workers: 2
"#;

    #[test]
    fn parses_full_config() {
        let config = from_str(FULL).unwrap();
        assert!(*config.log().display_level());
        assert_eq!(config.log().level_filter(), "debug");
        assert_eq!(config.hash().argon2().algorithm(), "Argon2id");
        assert_eq!(config.auth().cookie_name(), "sid");
        assert_eq!(config.auth().login_path(), "/app/login");
        assert_eq!(config.auth().users().len(), 1);
        assert_eq!(config.auth().users()[0].login(), "admin");
        assert_eq!(config.api().http().host(), "0.0.0.0");
        assert_eq!(*config.api().http().port(), 9000);
        assert_eq!(*config.api().http().workers(), Some(2));
    }

    #[test]
    fn optional_sections_default() {
        let config = from_str(
            r#"
hash:
  argon2:
    algorithm: Argon2id
    version: V0x13
api:
  http:
    host: 127.0.0.1
    port: 8080
"#,
        )
        .unwrap();
        assert!(*config.log().display_level());
        assert_eq!(config.log().level_filter(), "info");
        assert!(config.api().http().workers().is_none());
        assert_eq!(config.auth().cookie_name(), "auth");
        assert_eq!(config.auth().cookie_path(), "/");
        assert_eq!(config.auth().login_path(), "/login");
        assert_eq!(config.auth().logout_path(), "/logout");
        assert_eq!(config.auth().logout_redirect(), "/");
        assert!(config.auth().users().is_empty());
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.auth().logout_redirect(), "/app");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(from_path("/definitely/not/here.yml").is_err());
    }
}
