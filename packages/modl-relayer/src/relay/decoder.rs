//! Revert-reason decoding shared by simulation and dispatch.

use crate::chain::ChainError;
use crate::contracts::Interface;
use alloy::primitives::Bytes;
use alloy::sol_types::{Panic, Revert, SolError};

/// Returned when nothing better can be derived from a failure.
pub const FALLBACK_REASON: &str = "Relay error";

/// Everything known about a failed call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevertInfo {
    /// Raw revert payload.
    pub data: Option<Bytes>,
    /// Structured reason supplied by the caller, used when `data` has no standard encoding.
    pub reason: Option<String>,
    /// Node error message.
    pub message: Option<String>,
}

impl RevertInfo {
    pub fn from_chain(err: &ChainError) -> Self {
        match err {
            ChainError::Revert { data, message } => Self {
                data: data.clone(),
                reason: None,
                message: Some(message.clone()),
            },
            ChainError::Transport(message) | ChainError::Timeout(message) => Self {
                data: None,
                reason: None,
                message: Some(message.clone()),
            },
        }
    }
}

/// Best-effort human-readable reason. Never empty.
///
/// Order: custom error from `iface` (`Name(a, b)`), then `Error(string)` or
/// `Panic(uint256)` from the data (or the explicit reason), then the node
/// message, then [`FALLBACK_REASON`].
pub fn decode_revert(iface: &Interface, info: &RevertInfo) -> String {
    let data: &[u8] = info.data.as_ref().map_or(&[][..], |d| &d[..]);

    if let Some(custom) = iface.decode_error(data) {
        return custom.to_string();
    }

    [standard_reason(data), info.reason.clone(), info.message.clone()]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_REASON.to_string())
}

fn standard_reason(data: &[u8]) -> Option<String> {
    if let Ok(revert) = Revert::abi_decode(data) {
        return Some(revert.reason);
    }
    if let Ok(panic) = Panic::abi_decode(data) {
        return Some(match panic.kind() {
            Some(kind) => format!("Panic({})", kind.as_str()),
            None => format!("Panic({})", panic.code),
        });
    }
    None
}
