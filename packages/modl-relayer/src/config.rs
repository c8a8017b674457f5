//! Relayer configuration.
//!
//! Loaded from an optional `relayer.toml` plus `RELAYER_*` environment
//! variables. Defaults also honour the variable names older deployments
//! used (`RPC_URL`, `PRIVATE_KEY`, `RELAY_HUB_ADDRESS`, ...).

use crate::relay::{GasPolicy, RelaySettings, DEFAULT_GAS_BUFFER};
use crate::Error;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Configuration for the MODL relayer.
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::rpc_url")]
    pub rpc_url: String,

    /// Appended to `rpc_url` as a path segment (thirdweb-style gateways).
    #[serde(default = "defaults::rpc_api_key")]
    pub rpc_api_key: Option<String>,

    /// Relayer signing key, hex.
    #[serde(default = "defaults::private_key")]
    pub private_key: String,

    #[serde(default = "defaults::relay_hub_address")]
    pub relay_hub_address: String,

    /// Default paymaster reported by `/status`.
    #[serde(default = "defaults::paymaster_address")]
    pub paymaster_address: Option<String>,

    /// When unset, each request's `target` is treated as the deployment manager.
    #[serde(default)]
    pub deployment_manager_address: Option<String>,

    #[serde(default)]
    pub hub_abi_path: Option<String>,

    #[serde(default)]
    pub paymaster_abi_path: Option<String>,

    #[serde(default)]
    pub manager_abi_path: Option<String>,

    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// Comma-separated allow-list. Empty allows any origin.
    #[serde(default = "defaults::cors_origins")]
    pub cors_origins: String,

    #[serde(default = "defaults::gas_buffer")]
    pub gas_buffer: u64,

    /// Switches the gas policy from flat to percentage when set.
    #[serde(default)]
    pub gas_buffer_percent: Option<u64>,

    #[serde(default = "defaults::simulation_gas_cap")]
    pub simulation_gas_cap: u64,

    #[serde(default = "defaults::receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,

    #[serde(default)]
    pub eip1559: bool,

    #[serde(default = "defaults::max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: defaults::rpc_url(),
            rpc_api_key: defaults::rpc_api_key(),
            private_key: defaults::private_key(),
            relay_hub_address: defaults::relay_hub_address(),
            paymaster_address: defaults::paymaster_address(),
            deployment_manager_address: None,
            hub_abi_path: None,
            paymaster_abi_path: None,
            manager_abi_path: None,
            bind_address: defaults::bind_address(),
            cors_origins: defaults::cors_origins(),
            gas_buffer: defaults::gas_buffer(),
            gas_buffer_percent: None,
            simulation_gas_cap: defaults::simulation_gas_cap(),
            receipt_timeout_secs: defaults::receipt_timeout_secs(),
            eip1559: false,
            max_body_bytes: defaults::max_body_bytes(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("rpc_api_key", &self.rpc_api_key.as_ref().map(|_| "<redacted>"))
            .field("private_key", &"<redacted>")
            .field("relay_hub_address", &self.relay_hub_address)
            .field("paymaster_address", &self.paymaster_address)
            .field("deployment_manager_address", &self.deployment_manager_address)
            .field("bind_address", &self.bind_address)
            .field("cors_origins", &self.cors_origins)
            .field("gas_buffer", &self.gas_buffer)
            .field("gas_buffer_percent", &self.gas_buffer_percent)
            .field("simulation_gas_cap", &self.simulation_gas_cap)
            .field("receipt_timeout_secs", &self.receipt_timeout_secs)
            .field("eip1559", &self.eip1559)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// RPC endpoint with the API key appended, if one is configured.
    pub fn rpc_endpoint(&self) -> String {
        match self.rpc_api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => format!("{}/{key}", self.rpc_url.trim_end_matches('/')),
            None => self.rpc_url.clone(),
        }
    }

    pub fn signer(&self) -> Result<PrivateKeySigner, Error> {
        let key = self.private_key.trim();
        if key.is_empty() {
            return Err(Error::Config(
                "private key not set (RELAYER_PRIVATE_KEY or PRIVATE_KEY)".into(),
            ));
        }
        key.trim_start_matches("0x")
            .parse()
            .map_err(|_| Error::Config("private key is not a valid secp256k1 key".into()))
    }

    pub fn relay_hub(&self) -> Result<Address, Error> {
        if self.relay_hub_address.trim().is_empty() {
            return Err(Error::Config(
                "relay hub address not set (RELAYER_RELAY_HUB_ADDRESS or RELAY_HUB_ADDRESS)".into(),
            ));
        }
        parse_address("relay_hub_address", &self.relay_hub_address)
    }

    pub fn paymaster(&self) -> Result<Option<Address>, Error> {
        optional_address("paymaster_address", self.paymaster_address.as_deref())
    }

    pub fn deployment_manager(&self) -> Result<Option<Address>, Error> {
        optional_address(
            "deployment_manager_address",
            self.deployment_manager_address.as_deref(),
        )
    }

    pub fn gas_policy(&self) -> GasPolicy {
        match self.gas_buffer_percent {
            Some(pct) => GasPolicy::Percent(pct),
            None => GasPolicy::Flat(self.gas_buffer),
        }
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Pipeline settings. Fails on a missing or malformed hub/manager address.
    pub fn relay_settings(&self) -> Result<RelaySettings, Error> {
        Ok(RelaySettings {
            relay_hub: self.relay_hub()?,
            deployment_manager: self.deployment_manager()?,
            gas_policy: self.gas_policy(),
            simulation_gas_cap: self.simulation_gas_cap,
            receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
        })
    }
}

fn parse_address(name: &str, value: &str) -> Result<Address, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} is not a valid address: {value}")))
}

fn optional_address(name: &str, value: Option<&str>) -> Result<Option<Address>, Error> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_address(name, v).map(Some),
        None => Ok(None),
    }
}

mod defaults {
    use super::DEFAULT_GAS_BUFFER;

    fn legacy(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    pub fn rpc_url() -> String {
        legacy("RPC_URL").unwrap_or_else(|| "http://127.0.0.1:8545".into())
    }

    pub fn rpc_api_key() -> Option<String> {
        legacy("THIRDWEB_API_KEY")
    }

    pub fn private_key() -> String {
        legacy("PRIVATE_KEY").unwrap_or_default()
    }

    pub fn relay_hub_address() -> String {
        legacy("RELAY_HUB_ADDRESS").unwrap_or_default()
    }

    pub fn paymaster_address() -> Option<String> {
        legacy("PAYMASTER_ADDRESS")
    }

    pub fn cors_origins() -> String {
        legacy("CORS_ORIGINS").unwrap_or_default()
    }

    pub fn bind_address() -> String {
        match legacy("PORT") {
            Some(port) => format!("0.0.0.0:{port}"),
            None => "0.0.0.0:8080".into(),
        }
    }

    pub fn gas_buffer() -> u64 {
        DEFAULT_GAS_BUFFER
    }

    pub fn simulation_gas_cap() -> u64 {
        10_000_000
    }

    pub fn receipt_timeout_secs() -> u64 {
        120
    }

    pub fn max_body_bytes() -> usize {
        64 * 1024
    }
}
