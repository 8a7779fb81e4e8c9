use std::{
    fmt::Debug,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
};

use starkeep::{Config, Context};

/// Server configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the upload tree and the JSON metadata documents.
    pub data_dir: PathBuf,
    /// Credential for the remote blob backend. Its presence selects the
    /// remote backend.
    pub blob_token: Option<String>,
    /// Request-scoped deployments set this to skip the in-process sweeper;
    /// retention then relies on an external periodic trigger.
    pub serverless: bool,
    pub ip: IpAddr,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: env_opt("DATA_DIR").unwrap_or_else(|| PathBuf::from("/tmp")),
            blob_token: env_opt("BLOB_READ_WRITE_TOKEN"),
            serverless: env_opt::<String>("SERVERLESS").is_some(),
            ip: env_opt("IP").unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: env_opt("PORT").unwrap_or(5000),
        }
    }
}

impl AppConfig {
    pub fn storage_config(&self) -> Config {
        Config {
            data_dir: self.data_dir.clone(),
            blob_token: self.blob_token.clone(),
        }
    }

    /// Build the storage context. Called once at startup; the context is
    /// injected into every handler.
    pub fn create_context(&self) -> Result<Context, starkeep::errors::Error> {
        Context::initialize(&self.storage_config())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

/// Get an environment variable, or return `None` if it isn't set.
///
/// # Panics
///
/// If the environment variable exists but cannot be parsed, this
/// function panics.
#[track_caller]
pub fn env_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
    <T as FromStr>::Err: Debug,
{
    dotenv::var(key).ok().map(|s| {
        s.parse()
            .unwrap_or_else(|e| panic!("`{key}` was defined but could not be parsed: {e:?}"))
    })
}
