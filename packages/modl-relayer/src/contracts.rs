//! Contract bindings and interface definitions.
//!
//! Calls the relayer makes are bound statically with `sol!`. Decoding of
//! revert data and receipt logs goes through [`Interface`], which wraps a
//! runtime [`JsonAbi`] supplied by configuration (ABI files), so new contract
//! errors and events are picked up without a rebuild.

use alloy::dyn_abi::{DynSolValue, EventExt, JsonAbiExt};
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, Log};
use alloy::sol;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::warn;

sol! {
    interface IRelayHub {
        function relayCall(address paymaster, address target, bytes data, uint256 gasLimit, address user) external;
        function deposits(address paymaster) external view returns (uint256);
    }

    interface IPaymaster {
        function relayHub() external view returns (address);
        function trustedForwarder() external view returns (address);
        function preRelayedCall(address user, uint256 gasLimit) external returns (bytes);
    }

    interface IDeploymentManager {
        function isTrustedForwarder(address forwarder) external view returns (bool);
    }
}

/// Emitted by the deployment manager with the sender it recovered from forwarded calldata.
pub const DEBUG_SENDER_EVENT: &str = "DebugMsgSender";

const HUB_SIGNATURES: &[&str] = &[
    "function relayCall(address paymaster, address target, bytes data, uint256 gasLimit, address user)",
    "function deposits(address paymaster) view returns (uint256)",
    "function deposit() payable",
];

const PAYMASTER_SIGNATURES: &[&str] = &[
    "function relayHub() view returns (address)",
    "function trustedForwarder() view returns (address)",
    "function preRelayedCall(address user, uint256 gasLimit) returns (bytes)",
    "function postRelayedCall(address user, bytes context, uint256 gasUsed)",
];

const MANAGER_SIGNATURES: &[&str] = &[
    "function isTrustedForwarder(address forwarder) view returns (bool)",
    "event DebugMsgSender(address sender)",
];

/// A named contract interface usable for error and event decoding.
#[derive(Debug, Clone)]
pub struct Interface {
    name: String,
    abi: JsonAbi,
}

/// A custom error decoded from revert data.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedError {
    pub name: String,
    pub args: Vec<DynSolValue>,
}

impl fmt::Display for DecodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(format_value).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}

/// One decoded event argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedArg {
    pub name: String,
    pub value: String,
}

/// One decoded receipt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedLog {
    /// Interface that recognized the log.
    pub contract: String,
    /// Emitting contract.
    pub address: Address,
    pub event_name: String,
    pub args: Vec<DecodedArg>,
}

impl Interface {
    pub fn new(name: impl Into<String>, abi: JsonAbi) -> Self {
        Self {
            name: name.into(),
            abi,
        }
    }

    /// Build from human-readable signatures, e.g. `"error Unauthorized(address caller)"`.
    pub fn from_signatures(name: &str, signatures: &[&str]) -> Result<Self, crate::Error> {
        let abi = JsonAbi::parse(signatures.iter().copied()).map_err(|e| {
            crate::Error::Config(format!("Invalid {name} interface signatures: {e}"))
        })?;
        Ok(Self::new(name, abi))
    }

    /// Parse either a bare ABI array or a build artifact with an `abi` key.
    pub fn from_json(name: &str, json: &str) -> Result<Self, crate::Error> {
        let mut value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| crate::Error::Config(format!("Invalid {name} ABI JSON: {e}")))?;
        if let Some(abi) = value.get_mut("abi") {
            value = abi.take();
        }
        let abi: JsonAbi = serde_json::from_value(value)
            .map_err(|e| crate::Error::Config(format!("Invalid {name} ABI: {e}")))?;
        Ok(Self::new(name, abi))
    }

    pub fn from_file(name: &str, path: &Path) -> Result<Self, crate::Error> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::Config(format!("Failed to read {name} ABI {}: {e}", path.display()))
        })?;
        Self::from_json(name, &json)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Match the 4-byte selector against the interface's custom errors and decode.
    pub fn decode_error(&self, data: &[u8]) -> Option<DecodedError> {
        if data.len() < 4 {
            return None;
        }
        let (selector, payload) = data.split_at(4);
        self.abi
            .errors()
            .filter(|error| error.selector().as_slice() == selector)
            .find_map(|error| {
                let args = error.abi_decode_input(payload).ok()?;
                Some(DecodedError {
                    name: error.name.clone(),
                    args,
                })
            })
    }

    /// Decode a log against this interface's (non-anonymous) events.
    pub fn decode_log(&self, log: &Log) -> Option<DecodedLog> {
        let topic0 = log.data.topics().first()?;
        self.abi
            .events()
            .filter(|event| !event.anonymous && event.selector() == *topic0)
            .find_map(|event| {
                let decoded = event.decode_log(&log.data).ok()?;
                let mut indexed = decoded.indexed.into_iter();
                let mut body = decoded.body.into_iter();
                let args = event
                    .inputs
                    .iter()
                    .map(|param| {
                        let value = if param.indexed {
                            indexed.next()
                        } else {
                            body.next()
                        }?;
                        Some(DecodedArg {
                            name: param.name.clone(),
                            value: format_value(&value),
                        })
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(DecodedLog {
                    contract: self.name.clone(),
                    address: log.address,
                    event_name: event.name.clone(),
                    args,
                })
            })
    }
}

/// The three interfaces the relayer decodes against.
#[derive(Debug, Clone)]
pub struct ContractInterfaces {
    pub hub: Interface,
    pub paymaster: Interface,
    pub manager: Interface,
}

impl ContractInterfaces {
    /// Load each interface from its ABI file, or fall back to the built-in signatures.
    pub fn load(config: &crate::Config) -> Result<Self, crate::Error> {
        Ok(Self {
            hub: load_interface("RelayHub", config.hub_abi_path.as_deref(), HUB_SIGNATURES)?,
            paymaster: load_interface(
                "Paymaster",
                config.paymaster_abi_path.as_deref(),
                PAYMASTER_SIGNATURES,
            )?,
            manager: load_interface(
                "DeploymentManager",
                config.manager_abi_path.as_deref(),
                MANAGER_SIGNATURES,
            )?,
        })
    }

    /// Built-in signatures only.
    pub fn builtin() -> Result<Self, crate::Error> {
        Ok(Self {
            hub: Interface::from_signatures("RelayHub", HUB_SIGNATURES)?,
            paymaster: Interface::from_signatures("Paymaster", PAYMASTER_SIGNATURES)?,
            manager: Interface::from_signatures("DeploymentManager", MANAGER_SIGNATURES)?,
        })
    }

    /// Log decoders in probing order.
    pub fn decoders(&self) -> [&Interface; 3] {
        [&self.hub, &self.paymaster, &self.manager]
    }
}

fn load_interface(
    name: &str,
    path: Option<&str>,
    fallback: &[&str],
) -> Result<Interface, crate::Error> {
    match path {
        Some(path) => Interface::from_file(name, Path::new(path)),
        None => {
            let interface = Interface::from_signatures(name, fallback)?;
            if interface.abi.errors().next().is_none() {
                warn!(
                    interface = name,
                    "No ABI file configured; custom errors from this contract will not decode"
                );
            }
            Ok(interface)
        }
    }
}

/// Render a decoded ABI value for humans: checksummed addresses, decimal
/// integers, 0x-hex bytes, raw strings, bracketed sequences.
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(addr) => addr.to_checksum(None),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => alloy::hex::encode_prefixed(&word[..*size]),
        DynSolValue::Bytes(bytes) => alloy::hex::encode_prefixed(bytes),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Function(f) => alloy::hex::encode_prefixed(f.as_slice()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}
