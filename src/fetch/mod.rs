pub mod cli;
pub mod netconf;
pub mod restconf;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::models::{DeviceDescriptor, ParsedConfig};

pub use cli::CliSource;
pub use netconf::NetconfSource;
pub use restconf::RestconfSource;

/// How configuration is retrieved from devices for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Cli,
    Restconf,
    Netconf,
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchMethod::Cli => "cli",
            FetchMethod::Restconf => "restconf",
            FetchMethod::Netconf => "netconf",
        };
        f.write_str(s)
    }
}

/// Typed error for an unrecognized fetch method selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMethod(pub String);

impl fmt::Display for InvalidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid fetch method '{}' (expected cli, restconf or netconf)",
            self.0
        )
    }
}

impl std::error::Error for InvalidMethod {}

impl FromStr for FetchMethod {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cli" => Ok(FetchMethod::Cli),
            "restconf" => Ok(FetchMethod::Restconf),
            "netconf" => Ok(FetchMethod::Netconf),
            _ => Err(InvalidMethod(s.to_string())),
        }
    }
}

/// A way of retrieving a device's running configuration
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn method(&self) -> FetchMethod;

    /// Retrieve the raw configuration text of a device
    async fn fetch(&self, device: &DeviceDescriptor) -> Result<String>;

    /// Structured form of the fetched data, when this source can produce one
    fn parse(&self, _raw: &str) -> Option<ParsedConfig> {
        None
    }
}

/// Build the config source selected for this run
pub fn build_source(method: FetchMethod, cfg: &Config) -> Result<Box<dyn ConfigSource>> {
    let source: Box<dyn ConfigSource> = match method {
        FetchMethod::Cli => Box::new(CliSource::new(cfg.cli_command.clone(), cfg.ssh_timeout_secs)),
        FetchMethod::Restconf => Box::new(RestconfSource::new(cfg.ssh_timeout_secs)?),
        FetchMethod::Netconf => Box::new(NetconfSource::new(cfg.netconf_port, cfg.ssh_timeout_secs)),
    };
    Ok(source)
}
