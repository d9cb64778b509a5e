//! Configuration management for the packet resilience tools

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Jitter buffer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JitterConfig {
    pub target_latency_ms: u64,
    pub queue_capacity: usize,
}

/// FEC configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FecConfig {
    /// Scheme name, resolved by the codec factory
    pub scheme: String,
    pub source_block_length: usize,
    pub repair_block_length: usize,
}

/// Stream shape
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub packet_duration_ms: u32,
}

/// Loss simulation parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    pub loss_rate: f64,
    pub packets: usize,
    /// Seed for payloads and channel loss; derived from the stream SSRC when unset
    pub seed: Option<u64>,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jitter: JitterConfig,
    pub fec: FecConfig,
    pub stream: StreamConfig,
    pub sim: SimConfig,
    pub log_level: Option<String>,
    /// "json" or "console"
    pub log_format: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            jitter: JitterConfig {
                target_latency_ms: parse_var(&lookup, "JITTER_TARGET_LATENCY_MS", 40)?,
                queue_capacity: parse_var(&lookup, "JITTER_QUEUE_CAPACITY", 256)?,
            },
            fec: FecConfig {
                scheme: lookup("FEC_SCHEME").unwrap_or_else(|| "rs8m".to_string()),
                source_block_length: parse_var(&lookup, "FEC_SOURCE_BLOCK_LENGTH", 20)?,
                repair_block_length: parse_var(&lookup, "FEC_REPAIR_BLOCK_LENGTH", 10)?,
            },
            stream: StreamConfig {
                sample_rate: parse_var(&lookup, "STREAM_SAMPLE_RATE", 44100)?,
                packet_duration_ms: parse_var(&lookup, "STREAM_PACKET_MS", 10)?,
            },
            sim: SimConfig {
                loss_rate: parse_var(&lookup, "SIM_LOSS_RATE", 0.05)?,
                packets: parse_var(&lookup, "SIM_PACKETS", 1000)?,
                seed: parse_optional_var(&lookup, "SIM_SEED")?,
            },
            log_level: Some(lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string())),
            log_format: Some(lookup("LOG_FORMAT").unwrap_or_else(|| "console".to_string())),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.fec.source_block_length == 0 {
            return Err(config::ConfigError::Message(
                "FEC_SOURCE_BLOCK_LENGTH must be greater than 0".to_string(),
            ));
        }
        if self.stream.sample_rate == 0 {
            return Err(config::ConfigError::Message(
                "STREAM_SAMPLE_RATE must be greater than 0".to_string(),
            ));
        }
        if self.stream.packet_duration_ms == 0 {
            return Err(config::ConfigError::Message(
                "STREAM_PACKET_MS must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sim.loss_rate) {
            return Err(config::ConfigError::Message(format!(
                "SIM_LOSS_RATE must be within [0, 1], got {}",
                self.sim.loss_rate
            )));
        }
        Ok(())
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Get log format, defaulting to "console"
    pub fn log_format(&self) -> &str {
        self.log_format.as_deref().unwrap_or("console")
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, config::ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional_var(lookup, key)?.unwrap_or(default))
}

fn parse_optional_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, config::ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| {
            config::ConfigError::Message(format!("invalid value for {}: {:?} ({})", key, raw, e))
        }),
    }
}
