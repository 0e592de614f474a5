use std::net::SocketAddr;

use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // Base URL this server is reachable at
    pub hostname: Url,
    // log level for http tracing
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(listen_addr: SocketAddr) -> Result<Self, ConfigError> {
        let hostname = Url::parse(&format!("http://localhost:{}", listen_addr.port()))?;
        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, hostname={}",
            listen_addr,
            hostname
        );
        Ok(Self {
            listen_addr,
            hostname,
            log_level: tracing::Level::INFO,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid Socket Address: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),
}
