use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::autoclose::AutoCloseConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tickets: TicketsConfig,
    #[serde(default)]
    pub autoclose: AutoCloseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            tickets: TicketsConfig::default(),
            autoclose: AutoCloseConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("frontdesk.db")
}

/// Ticket policy configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TicketsConfig {
    /// Maximum simultaneously open tickets per user (0 = unlimited).
    #[serde(default = "default_max_open")]
    pub max_open_per_user: u32,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            max_open_per_user: default_max_open(),
        }
    }
}

fn default_max_open() -> u32 {
    1
}
