use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address for the HTTP server to listen on
    pub http_addr: SocketAddr,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (created when missing)
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// Token lifetime in minutes
    pub token_ttl_minutes: i64,
}

impl Config {
    pub fn load(path: &PathBuf) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                http_addr: "0.0.0.0:8080".parse().unwrap(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("aquafarm.db"),
            },
            auth: AuthSettings {
                jwt_secret: "insecure-development-secret".to_string(),
                token_ttl_minutes: 720,
            },
        }
    }
}
