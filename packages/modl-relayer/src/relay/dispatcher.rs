//! Gas budgeting, broadcast and bounded wait for inclusion.

use super::decoder::{decode_revert, RevertInfo};
use super::simulator::RelayCall;
use crate::chain::{ChainClient, ChainError, MinedReceipt};
use crate::contracts::Interface;
use crate::Error;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tracing::{info, warn};

/// Flat buffer added on top of the caller's gas limit.
pub const DEFAULT_GAS_BUFFER: u64 = 100_000;

/// How the effective gas limit is derived from the declared one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPolicy {
    /// `declared + n`.
    Flat(u64),
    /// `declared + declared * n / 100`.
    Percent(u64),
}

impl Default for GasPolicy {
    fn default() -> Self {
        GasPolicy::Flat(DEFAULT_GAS_BUFFER)
    }
}

impl GasPolicy {
    /// Never below `declared`.
    pub fn effective_gas_limit(&self, declared: u64) -> u64 {
        let buffer = match *self {
            GasPolicy::Flat(n) => n,
            GasPolicy::Percent(pct) => {
                let extra = u128::from(declared) * u128::from(pct) / 100;
                u64::try_from(extra).unwrap_or(u64::MAX)
            }
        };
        declared.saturating_add(buffer)
    }
}

/// Send `call` to the hub and wait for its receipt.
pub async fn dispatch<C: ChainClient + ?Sized>(
    chain: &C,
    hub_iface: &Interface,
    relay_hub: Address,
    call: &RelayCall,
    policy: GasPolicy,
    timeout: Duration,
    req_id: &str,
) -> Result<MinedReceipt, Error> {
    let gas = policy.effective_gas_limit(call.gas_limit);

    let fee = chain
        .fee_quote()
        .await
        .map_err(|e| Error::FeeDataUnavailable(e.to_string()))?;

    let relayer = chain.relayer_address();
    let available = chain
        .balance(relayer)
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;
    let required = U256::from(gas).saturating_mul(U256::from(fee.max_price()));
    if available < required {
        warn!(req_id = %req_id, relayer = %relayer, %required, %available, "Relayer balance too low");
        return Err(Error::InsufficientRelayerBalance {
            required,
            available,
        });
    }

    let tx = fee.apply(
        TransactionRequest::default()
            .with_from(relayer)
            .with_to(relay_hub)
            .with_input(call.calldata())
            .with_gas_limit(gas),
    );

    let tx_hash = chain.send_transaction(tx).await.map_err(|e| match e {
        ChainError::Revert { .. } => Error::ExecutionReverted {
            reason: decode_revert(hub_iface, &RevertInfo::from_chain(&e)),
            tx_hash: None,
        },
        other => Error::Transport(other.to_string()),
    })?;
    info!(req_id = %req_id, tx_hash = %tx_hash, gas_limit = gas, "Relay transaction sent");

    let receipt = chain
        .wait_for_receipt(tx_hash, timeout)
        .await
        .map_err(|e| match e {
            ChainError::Timeout(_) => Error::InclusionTimeout { tx_hash },
            other => Error::Transport(other.to_string()),
        })?;

    if !receipt.success {
        warn!(req_id = %req_id, tx_hash = %tx_hash, "Relay transaction reverted on-chain");
        return Err(Error::ExecutionReverted {
            reason: "Transaction reverted on-chain".into(),
            tx_hash: Some(receipt.tx_hash),
        });
    }

    info!(
        req_id = %req_id,
        tx_hash = %receipt.tx_hash,
        gas_used = receipt.gas_used,
        block = ?receipt.block_number,
        "Relay transaction mined"
    );
    Ok(receipt)
}
