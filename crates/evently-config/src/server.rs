//! HTTP server bind configuration.

use std::env;

/// Where the API listens.
///
/// # Environment Variables
///
/// - `HOST`: interface to bind (default: `0.0.0.0`)
/// - `PORT`: TCP port (default: `8000`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 9000,
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(ServerConfig::default().bind_address(), "0.0.0.0:8000");
    }
}
