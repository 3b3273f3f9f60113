use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Server configuration, read from `SHAREZONE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    /// Base URL clients use to reach this server; prefixes image `media_url`s.
    pub public_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = get("SHAREZONE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("SHAREZONE_PORT")
            .unwrap_or_else(|| "4000".into())
            .parse()
            .context("SHAREZONE_PORT must be a port number")?;
        let public_url = get("SHAREZONE_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Ok(Self {
            jwt_secret: get("SHAREZONE_JWT_SECRET").unwrap_or_else(|| "dev-secret-change-me".into()),
            db_path: get("SHAREZONE_DB_PATH").unwrap_or_else(|| "sharezone.db".into()).into(),
            host,
            port,
            upload_dir: get("SHAREZONE_UPLOAD_DIR").unwrap_or_else(|| "./uploads".into()).into(),
            public_url,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
