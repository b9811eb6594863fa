//! HTTP server configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;

use crate::application::streaming::progress::DEFAULT_STREAM_CAPACITY;

/// HTTP server environment configuration
#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub bind_address: String,
    pub port: u16,
    /// Events buffered between an optimizer run and its SSE subscriber
    pub stream_queue_capacity: usize,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            stream_queue_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}

impl ServerEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let port = match env::var("SERVER_PORT") {
            Ok(v) => v
                .parse::<u16>()
                .with_context(|| format!("Invalid SERVER_PORT: {}", v))?,
            Err(_) => defaults.port,
        };
        let stream_queue_capacity = match env::var("STREAM_QUEUE_CAPACITY") {
            Ok(v) => v
                .parse::<usize>()
                .ok()
                .filter(|c| *c > 0)
                .with_context(|| format!("Invalid STREAM_QUEUE_CAPACITY: {} (must be > 0)", v))?,
            Err(_) => defaults.stream_queue_capacity,
        };

        Ok(Self {
            bind_address: env::var("SERVER_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port,
            stream_queue_capacity,
        })
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
