//! Server and playback settings.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use netsim_parser::{ParseOptions, SchemaPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::playback::PlaybackSpeed;

/// Unit used when showing simulation time. Event times are always
/// milliseconds internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
}

impl TimeUnit {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ns" | "nanoseconds" => Some(TimeUnit::Nanoseconds),
            "us" | "µs" | "microseconds" => Some(TimeUnit::Microseconds),
            "ms" | "milliseconds" => Some(TimeUnit::Milliseconds),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
        }
    }

    /// Convert milliseconds into this unit.
    pub fn convert(&self, ms: f64) -> f64 {
        match self {
            TimeUnit::Nanoseconds => ms * 1_000_000.0,
            TimeUnit::Microseconds => ms * 1_000.0,
            TimeUnit::Milliseconds => ms,
        }
    }

    pub fn format(&self, ms: f64) -> String {
        format!("{:.3} {}", self.convert(ms), self.suffix())
    }
}

/// Configuration for the visualization server.
#[derive(Debug, Clone)]
pub struct VisConfig {
    /// HTTP listen address
    pub listen_addr: SocketAddr,

    /// Scenario to load at startup
    pub scenario: Option<PathBuf>,

    /// Speed playback starts at
    pub speed: PlaybackSpeed,

    /// What to do with records that fail validation
    pub schema_policy: SchemaPolicy,

    /// Unit for displayed times
    pub time_unit: TimeUnit,

    /// Wall-clock interval between playback ticks
    pub frame_interval: Duration,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000),
            scenario: None,
            speed: PlaybackSpeed::Normal,
            schema_policy: SchemaPolicy::Abort,
            time_unit: TimeUnit::Milliseconds,
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl VisConfig {
    /// Defaults overridden by `NETSIM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let invalid = |key: &str, value: &str| Error::InvalidInput(format!("{key}={value}"));

        if let Some(port) = lookup("NETSIM_PORT") {
            let port = port.parse::<u16>().map_err(|_| invalid("NETSIM_PORT", &port))?;
            config.listen_addr.set_port(port);
        }
        if let Some(speed) = lookup("NETSIM_SPEED") {
            config.speed = PlaybackSpeed::from_name(&speed).ok_or_else(|| invalid("NETSIM_SPEED", &speed))?;
        }
        if let Some(policy) = lookup("NETSIM_SCHEMA_POLICY") {
            config.schema_policy =
                SchemaPolicy::from_name(&policy).ok_or_else(|| invalid("NETSIM_SCHEMA_POLICY", &policy))?;
        }
        if let Some(unit) = lookup("NETSIM_TIME_UNIT") {
            config.time_unit = TimeUnit::from_name(&unit).ok_or_else(|| invalid("NETSIM_TIME_UNIT", &unit))?;
        }
        config.scenario = lookup("NETSIM_SCENARIO").map(PathBuf::from);
        Ok(config)
    }

    /// Apply positional command line arguments: `[scenario] [port]`.
    pub fn with_args<I: IntoIterator<Item = String>>(mut self, args: I) -> Result<Self> {
        let mut args = args.into_iter();
        if let Some(path) = args.next() {
            self.scenario = Some(PathBuf::from(path));
        }
        if let Some(port) = args.next() {
            let port = port
                .parse::<u16>()
                .map_err(|_| Error::InvalidInput(format!("port {port}")))?;
            self.listen_addr.set_port(port);
        }
        Ok(self)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            schema_policy: self.schema_policy,
        }
    }
}
