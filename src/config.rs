//! Configuration module for botwatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Cadence of the watcher's poll loop (default: 5s)
    pub poll_interval: Duration,
    /// Timeout after which poll and update requests are abandoned (default: 10s)
    pub request_timeout: Duration,
    /// Directory for the watcher's persisted state blobs (default: ".")
    pub state_dir: String,
    /// Reply body for GET /api/ping (default: "ping")
    pub ping_message: String,
    /// When set, run in watch mode against this base URL instead of serving
    pub watch_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            state_dir: ".".to_string(),
            ping_message: "ping".to_string(),
            watch_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BOTWATCH_HTTP_PORT`: HTTP port (default: 8080)
    /// - `BOTWATCH_POLL_INTERVAL_SECS`: watcher poll cadence (default: 5)
    /// - `BOTWATCH_REQUEST_TIMEOUT_SECS`: request timeout (default: 10)
    /// - `BOTWATCH_STATE_DIR`: watcher state directory (default: ".")
    /// - `BOTWATCH_PING_MESSAGE`: /api/ping reply (default: "ping")
    /// - `BOTWATCH_WATCH_URL`: run as watcher against this server
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(port_str) = env::var("BOTWATCH_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Ok(secs_str) = env::var("BOTWATCH_POLL_INTERVAL_SECS") {
            if let Ok(secs) = secs_str.parse() {
                cfg.poll_interval = Duration::from_secs(secs);
            }
        }

        if let Ok(secs_str) = env::var("BOTWATCH_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs_str.parse() {
                cfg.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(dir) = env::var("BOTWATCH_STATE_DIR") {
            cfg.state_dir = dir;
        }

        if let Ok(msg) = env::var("BOTWATCH_PING_MESSAGE") {
            cfg.ping_message = msg;
        }

        if let Ok(url) = env::var("BOTWATCH_WATCH_URL") {
            cfg.watch_url = Some(url);
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.state_dir, ".");
        assert_eq!(cfg.ping_message, "ping");
        assert!(cfg.watch_url.is_none());
    }
}
