//! Error types for the relayer.

use alloy::primitives::{TxHash, U256};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;

/// Message returned to callers when the trust chain does not line up.
/// The specific mismatch is logged, never echoed.
pub const CONFIG_MISMATCH_MESSAGE: &str = "Trusted contract configuration error";

/// Relayer error type.
///
/// Every stage of the relay pipeline produces exactly one of these; the
/// handler maps them to HTTP without inspecting anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Startup configuration error.
    Config(String),
    /// Malformed or missing request fields. Raised before any network call.
    InvalidRequest(String),
    /// On-chain forwarder/hub wiring differs from local configuration.
    ConfigMismatch(String),
    /// The read-only pre-execution reverted.
    SimulationReverted(String),
    /// The node could not quote a gas price.
    FeeDataUnavailable(String),
    /// Relayer cannot cover the gas budget at the quoted price.
    InsufficientRelayerBalance { required: U256, available: U256 },
    /// Broadcast was accepted (or rejected with revert data) but execution failed.
    ExecutionReverted {
        reason: String,
        tx_hash: Option<TxHash>,
    },
    /// Broadcast succeeded but no receipt arrived before the deadline.
    InclusionTimeout { tx_hash: TxHash },
    /// RPC/network failure at any stage.
    Transport(String),
}

impl Error {
    /// Stable short label, used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::InvalidRequest(_) => "invalid_request",
            Error::ConfigMismatch(_) => "config_mismatch",
            Error::SimulationReverted(_) => "simulation_reverted",
            Error::FeeDataUnavailable(_) => "fee_data_unavailable",
            Error::InsufficientRelayerBalance { .. } => "insufficient_relayer_balance",
            Error::ExecutionReverted { .. } => "execution_reverted",
            Error::InclusionTimeout { .. } => "inclusion_timeout",
            Error::Transport(_) => "transport",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::InclusionTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::Config(_)
            | Error::ConfigMismatch(_)
            | Error::SimulationReverted(_)
            | Error::FeeDataUnavailable(_)
            | Error::InsufficientRelayerBalance { .. }
            | Error::ExecutionReverted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message a caller sees in `{ "error": ... }`.
    pub fn public_message(&self) -> String {
        match self {
            Error::Config(_) => "Relayer misconfigured".into(),
            Error::InvalidRequest(msg) => msg.clone(),
            Error::ConfigMismatch(_) => CONFIG_MISMATCH_MESSAGE.into(),
            Error::SimulationReverted(reason) => reason.clone(),
            Error::FeeDataUnavailable(_) => "Network fee data unavailable".into(),
            Error::InsufficientRelayerBalance { .. } => "Insufficient relayer balance".into(),
            Error::ExecutionReverted { reason, .. } => reason.clone(),
            Error::InclusionTimeout { .. } => "Timed out waiting for transaction inclusion".into(),
            Error::Transport(_) => "RPC temporarily unavailable".into(),
        }
    }

    fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Error::ExecutionReverted { tx_hash, .. } => *tx_hash,
            Error::InclusionTimeout { tx_hash } => Some(*tx_hash),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Error::ConfigMismatch(msg) => write!(f, "trust configuration mismatch: {msg}"),
            Error::SimulationReverted(reason) => write!(f, "simulation reverted: {reason}"),
            Error::FeeDataUnavailable(msg) => write!(f, "fee data unavailable: {msg}"),
            Error::InsufficientRelayerBalance {
                required,
                available,
            } => write!(
                f,
                "insufficient relayer balance: required {required} wei, available {available} wei"
            ),
            Error::ExecutionReverted {
                reason,
                tx_hash: Some(hash),
            } => write!(f, "transaction {hash} reverted on-chain: {reason}"),
            Error::ExecutionReverted {
                reason,
                tx_hash: None,
            } => write!(f, "transaction rejected: {reason}"),
            Error::InclusionTimeout { tx_hash } => {
                write!(f, "transaction {tx_hash} not included before deadline")
            }
            Error::Transport(msg) => write!(f, "rpc error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "error": self.public_message() });
        if let Some(hash) = self.tx_hash() {
            body["txHash"] = serde_json::Value::String(hash.to_string());
        }
        (self.status_code(), Json(body)).into_response()
    }
}
