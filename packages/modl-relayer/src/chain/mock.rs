//! Scripted in-memory [`ChainClient`] for pipeline and endpoint tests.
//!
//! Read calls are routed by 4-byte selector: the trust reads answer from the
//! configured wiring, `relayCall` answers with the scripted simulation result,
//! and every other call (the diagnostic calls) answers with `diagnostic`.

use super::{ChainClient, ChainError, FeeQuote, MinedReceipt};
use crate::contracts::{IDeploymentManager, IPaymaster, IRelayHub};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub struct MockChain {
    relayer: Address,
    paymaster_hub: Address,
    forwarder: Address,
    manager_trusts_forwarder: bool,
    trust_read_error: Option<ChainError>,
    simulation: Result<(), ChainError>,
    diagnostic: Result<Bytes, ChainError>,
    fee: Result<FeeQuote, ChainError>,
    balance: U256,
    deposit: U256,
    send_error: Option<ChainError>,
    receipt: Result<MinedReceipt, ChainError>,
    calls: Mutex<Vec<TransactionRequest>>,
    sent: Mutex<Vec<TransactionRequest>>,
    fee_queries: AtomicUsize,
}

impl MockChain {
    /// A chain whose wiring is consistent with `hub` and where everything succeeds.
    pub fn healthy(hub: Address, forwarder: Address) -> Self {
        Self {
            relayer: Address::repeat_byte(0xaa),
            paymaster_hub: hub,
            forwarder,
            manager_trusts_forwarder: true,
            trust_read_error: None,
            simulation: Ok(()),
            diagnostic: Ok(Bytes::new()),
            fee: Ok(FeeQuote::Legacy {
                gas_price: 1_000_000_000,
            }),
            balance: U256::from(10u64).pow(U256::from(18u64)),
            deposit: U256::from(10u64).pow(U256::from(17u64)),
            send_error: None,
            receipt: Ok(MinedReceipt {
                tx_hash: TxHash::repeat_byte(0x11),
                success: true,
                gas_used: 84_000,
                block_number: Some(1),
                logs: Vec::new(),
            }),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            fee_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_relayer(mut self, relayer: Address) -> Self {
        self.relayer = relayer;
        self
    }

    pub fn with_paymaster_hub(mut self, hub: Address) -> Self {
        self.paymaster_hub = hub;
        self
    }

    pub fn with_manager_trust(mut self, trusted: bool) -> Self {
        self.manager_trusts_forwarder = trusted;
        self
    }

    pub fn with_trust_read_error(mut self, err: ChainError) -> Self {
        self.trust_read_error = Some(err);
        self
    }

    pub fn with_simulation(mut self, result: Result<(), ChainError>) -> Self {
        self.simulation = result;
        self
    }

    pub fn with_diagnostic(mut self, result: Result<Bytes, ChainError>) -> Self {
        self.diagnostic = result;
        self
    }

    pub fn with_fee(mut self, fee: Result<FeeQuote, ChainError>) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_deposit(mut self, deposit: U256) -> Self {
        self.deposit = deposit;
        self
    }

    pub fn with_send_error(mut self, err: ChainError) -> Self {
        self.send_error = Some(err);
        self
    }

    pub fn with_receipt(mut self, receipt: Result<MinedReceipt, ChainError>) -> Self {
        self.receipt = receipt;
        self
    }

    /// Every read call seen, in order.
    pub fn calls(&self) -> Vec<TransactionRequest> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every broadcast request seen, in order.
    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Read calls that were `relayCall` simulations.
    pub fn relay_call_simulations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|tx| selector(tx) == Some(IRelayHub::relayCallCall::SELECTOR))
            .count()
    }

    pub fn broadcasts(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn fee_queries(&self) -> usize {
        self.fee_queries.load(Ordering::Relaxed)
    }
}

fn selector(tx: &TransactionRequest) -> Option<[u8; 4]> {
    let input = tx.input.input()?;
    input.get(..4)?.try_into().ok()
}

#[async_trait]
impl ChainClient for MockChain {
    fn relayer_address(&self) -> Address {
        self.relayer
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ChainError> {
        let sel = selector(&tx);
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);

        let trust_read = |value: Bytes| match &self.trust_read_error {
            Some(err) => Err(err.clone()),
            None => Ok(value),
        };

        match sel {
            Some(s) if s == IPaymaster::relayHubCall::SELECTOR => {
                trust_read(self.paymaster_hub.abi_encode().into())
            }
            Some(s) if s == IPaymaster::trustedForwarderCall::SELECTOR => {
                trust_read(self.forwarder.abi_encode().into())
            }
            Some(s) if s == IDeploymentManager::isTrustedForwarderCall::SELECTOR => {
                trust_read(self.manager_trusts_forwarder.abi_encode().into())
            }
            Some(s) if s == IRelayHub::relayCallCall::SELECTOR => {
                self.simulation.clone().map(|_| Bytes::new())
            }
            Some(s) if s == IRelayHub::depositsCall::SELECTOR => {
                Ok(self.deposit.abi_encode().into())
            }
            _ => self.diagnostic.clone(),
        }
    }

    async fn fee_quote(&self) -> Result<FeeQuote, ChainError> {
        self.fee_queries.fetch_add(1, Ordering::Relaxed);
        self.fee.clone()
    }

    async fn balance(&self, _address: Address) -> Result<U256, ChainError> {
        Ok(self.balance)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ChainError> {
        if let Some(err) = &self.send_error {
            return Err(err.clone());
        }
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(tx);
        match &self.receipt {
            Ok(receipt) => Ok(receipt.tx_hash),
            Err(_) => Ok(TxHash::repeat_byte(0x22)),
        }
    }

    async fn wait_for_receipt(
        &self,
        _tx_hash: TxHash,
        _timeout: Duration,
    ) -> Result<MinedReceipt, ChainError> {
        self.receipt.clone()
    }
}
