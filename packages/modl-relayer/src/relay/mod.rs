//! The relay pipeline.
//!
//! compose -> verify trust -> simulate -> dispatch -> interpret receipt.
//! Each stage returns a [`crate::Error`]; a failing stage stops the pipeline,
//! so nothing is broadcast unless trust and simulation both passed.

pub mod composer;
pub mod decoder;
pub mod dispatcher;
pub mod receipt;
pub mod simulator;
pub mod trust;

pub use dispatcher::{GasPolicy, DEFAULT_GAS_BUFFER};
pub use simulator::RelayCall;
pub use trust::TrustConfig;

use crate::chain::{view_call, ChainClient, ChainError};
use crate::contracts::{ContractInterfaces, DecodedLog, IPaymaster, IRelayHub};
use crate::request::RelayRequest;
use crate::Error;
use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// Pipeline settings derived from configuration.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub relay_hub: Address,
    /// Falls back to the request's target when unset.
    pub deployment_manager: Option<Address>,
    pub gas_policy: GasPolicy,
    pub simulation_gas_cap: u64,
    pub receipt_timeout: Duration,
}

/// Successful relay outcome returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReceipt {
    pub tx_hash: TxHash,
    pub status: &'static str,
    pub gas_used: u64,
    pub block_number: Option<u64>,
    pub logs: Vec<DecodedLog>,
}

/// Read-only view of the paymaster/hub wiring and balances.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub paymaster: Address,
    pub relay_hub: Address,
    pub relayer: Address,
    /// Trust configuration, or `{ "error": ... }` if it could not be read.
    pub trust: Value,
    /// `relayHub.deposits(paymaster)` in wei, as a decimal string.
    pub deposit: Value,
    /// Relayer native balance in wei, as a decimal string.
    pub relayer_balance: Value,
}

/// The relay pipeline bound to one chain client.
pub struct Relayer<C: ChainClient> {
    chain: C,
    interfaces: ContractInterfaces,
    settings: RelaySettings,
}

impl<C: ChainClient> Relayer<C> {
    pub fn new(chain: C, interfaces: ContractInterfaces, settings: RelaySettings) -> Self {
        Self {
            chain,
            interfaces,
            settings,
        }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Run one request through the whole pipeline.
    pub async fn relay(&self, req: &RelayRequest, req_id: &str) -> Result<RelayReceipt, Error> {
        let hub = self.settings.relay_hub;
        let manager = self.settings.deployment_manager.unwrap_or(req.target);

        let call = RelayCall {
            paymaster: req.paymaster,
            target: req.target,
            data: composer::compose(&req.encoded_data, req.user),
            gas_limit: req.gas_limit,
            user: req.user,
        };

        trust::verify(&self.chain, req.paymaster, manager, hub, req_id).await?;

        simulator::simulate(
            &self.chain,
            &self.interfaces,
            hub,
            &call,
            self.settings.simulation_gas_cap,
            req_id,
        )
        .await?;

        let mined = dispatcher::dispatch(
            &self.chain,
            &self.interfaces.hub,
            hub,
            &call,
            self.settings.gas_policy,
            self.settings.receipt_timeout,
            req_id,
        )
        .await?;

        let logs = receipt::interpret(&self.interfaces, &mined.logs, req_id);
        info!(req_id = %req_id, tx_hash = %mined.tx_hash, decoded_logs = logs.len(), "Relay complete");

        Ok(RelayReceipt {
            tx_hash: mined.tx_hash,
            status: "success",
            gas_used: mined.gas_used,
            block_number: mined.block_number,
            logs,
        })
    }

    /// Snapshot for `/status`. Read failures are reported inline.
    pub async fn status(&self, paymaster: Address) -> StatusSnapshot {
        let hub = self.settings.relay_hub;
        let relayer = self.chain.relayer_address();

        let trust = self.trust_snapshot(paymaster);
        let deposits_call = IRelayHub::depositsCall { paymaster };
        let deposit = view_call(&self.chain, hub, &deposits_call);
        let balance = self.chain.balance(relayer);

        let (trust, deposit, balance) = tokio::join!(trust, deposit, balance);

        StatusSnapshot {
            paymaster,
            relay_hub: hub,
            relayer,
            trust: inline(trust),
            deposit: inline(deposit.map(wei)),
            relayer_balance: inline(balance.map(wei)),
        }
    }

    async fn trust_snapshot(&self, paymaster: Address) -> Result<Value, ChainError> {
        let hub = self.settings.relay_hub;
        if let Some(manager) = self.settings.deployment_manager {
            let trust = trust::read_trust(&self.chain, paymaster, manager, hub).await?;
            let mut json = serde_json::to_value(trust).unwrap_or(Value::Null);
            json["consistent"] = Value::Bool(trust.mismatch().is_none());
            return Ok(json);
        }

        // Without a configured manager only the paymaster side can be checked.
        let (hub_call, forwarder_call) = (
            IPaymaster::relayHubCall {},
            IPaymaster::trustedForwarderCall {},
        );
        let (relay_hub, forwarder) = tokio::try_join!(
            view_call(&self.chain, paymaster, &hub_call),
            view_call(&self.chain, paymaster, &forwarder_call),
        )?;
        Ok(serde_json::json!({
            "paymasterRelayHub": relay_hub,
            "paymasterTrustedForwarder": forwarder,
            "isTrustedForwarderOnManager": null,
            "resolvedRelayHubAddress": hub,
            "consistent": relay_hub == hub,
        }))
    }
}

fn wei(amount: U256) -> Value {
    Value::String(amount.to_string())
}

fn inline(result: Result<Value, ChainError>) -> Value {
    result.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
}
