use std::env;
use std::path::PathBuf;

use crate::stats::WeekStart;
use crate::store::DEFAULT_STORAGE_KEY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    File,
    /// Nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub storage_backend: StorageBackend,
    pub data_dir: PathBuf,
    pub storage_key: String,

    pub week_start: WeekStart,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            // Loopback only: this is a single-user, single-device journal.
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),

            storage_backend: match env::var("STORAGE_BACKEND").as_deref() {
                Ok("memory") => StorageBackend::Memory,
                _ => StorageBackend::File,
            },
            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".into())
                .into(),
            storage_key: env::var("STORAGE_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_STORAGE_KEY.into()),

            week_start: env::var("WEEK_START")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:5173".into(),
            storage_backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
            storage_key: DEFAULT_STORAGE_KEY.into(),
            week_start: WeekStart::Sunday,
        }
    }
}
