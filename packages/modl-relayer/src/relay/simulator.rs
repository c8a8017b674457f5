//! Read-only pre-execution of the relay call.

use super::decoder::{decode_revert, RevertInfo};
use crate::chain::{ChainClient, ChainError};
use crate::contracts::{ContractInterfaces, IPaymaster, IRelayHub};
use crate::Error;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use tracing::{info, warn};

/// Arguments of `relayCall`, with `data` already carrying the user suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCall {
    pub paymaster: Address,
    pub target: Address,
    pub data: Bytes,
    pub gas_limit: u64,
    pub user: Address,
}

impl RelayCall {
    pub fn calldata(&self) -> Bytes {
        IRelayHub::relayCallCall {
            paymaster: self.paymaster,
            target: self.target,
            data: self.data.clone(),
            gasLimit: U256::from(self.gas_limit),
            user: self.user,
        }
        .abi_encode()
        .into()
    }
}

/// `eth_call` the relay from the relayer address. A revert becomes
/// [`Error::SimulationReverted`] with the decoded reason; diagnostics run only then.
pub async fn simulate<C: ChainClient + ?Sized>(
    chain: &C,
    interfaces: &ContractInterfaces,
    relay_hub: Address,
    call: &RelayCall,
    gas_cap: u64,
    req_id: &str,
) -> Result<(), Error> {
    let tx = TransactionRequest::default()
        .with_from(chain.relayer_address())
        .with_to(relay_hub)
        .with_input(call.calldata())
        .with_gas_limit(gas_cap);

    match chain.call(tx).await {
        Ok(_) => {
            info!(req_id = %req_id, "Simulation passed");
            Ok(())
        }
        Err(err @ ChainError::Revert { .. }) => {
            let reason = decode_revert(&interfaces.hub, &RevertInfo::from_chain(&err));
            warn!(req_id = %req_id, reason = %reason, "Simulation reverted");
            run_diagnostics(chain, interfaces, relay_hub, call, req_id).await;
            Err(Error::SimulationReverted(reason))
        }
        Err(err) => Err(Error::Transport(err.to_string())),
    }
}

/// Diagnostic calls for operators. Outcomes are logged only.
async fn run_diagnostics<C: ChainClient + ?Sized>(
    chain: &C,
    interfaces: &ContractInterfaces,
    relay_hub: Address,
    call: &RelayCall,
    req_id: &str,
) {
    let pre_relayed = TransactionRequest::default()
        .with_from(relay_hub)
        .with_to(call.paymaster)
        .with_input(
            IPaymaster::preRelayedCallCall {
                user: call.user,
                gasLimit: U256::from(call.gas_limit),
            }
            .abi_encode(),
        );
    let target = TransactionRequest::default()
        .with_from(relay_hub)
        .with_to(call.target)
        .with_input(call.data.clone());

    let (pre_relayed, target) = tokio::join!(chain.call(pre_relayed), chain.call(target));
    report_diagnostic("preRelayedCall", &interfaces.paymaster, pre_relayed, req_id);
    report_diagnostic("target call", &interfaces.manager, target, req_id);
}

fn report_diagnostic(
    name: &str,
    iface: &crate::contracts::Interface,
    result: Result<Bytes, ChainError>,
    req_id: &str,
) {
    match result {
        Ok(_) => info!(req_id = %req_id, check = name, "Diagnostic call passed"),
        Err(err) => {
            let reason = decode_revert(iface, &RevertInfo::from_chain(&err));
            warn!(req_id = %req_id, check = name, reason = %reason, "Diagnostic call failed");
        }
    }
}
