//! Chain collaborator: the narrow RPC surface the relay pipeline consumes.
//!
//! The pipeline never talks to a provider directly. Everything it needs
//! (read calls, fee quotes, balances, broadcast, inclusion wait) goes through
//! [`ChainClient`], which keeps the pipeline testable and makes every
//! suspension point explicit.

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod nonce;
mod rpc;

pub use nonce::PendingNonceManager;
pub use rpc::RpcChain;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Failure reported by the chain collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Execution reverted. `data` is the raw revert payload when the node returned one.
    Revert {
        data: Option<Bytes>,
        message: String,
    },
    /// Connectivity, serialization or node-side failure without revert semantics.
    Transport(String),
    /// A bounded wait expired.
    Timeout(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::Revert {
                data: Some(data),
                message,
            } => write!(f, "{message} (data: {data})"),
            ChainError::Revert {
                data: None,
                message,
            } => write!(f, "{message}"),
            ChainError::Transport(msg) => write!(f, "{msg}"),
            ChainError::Timeout(msg) => write!(f, "timeout: {msg}"),
        }
    }
}

impl std::error::Error for ChainError {}

/// Network fee quote, fetched once per relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeQuote {
    Legacy {
        gas_price: u128,
    },
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
}

impl FeeQuote {
    /// Upper bound on the per-gas price the relayer may pay.
    pub fn max_price(&self) -> u128 {
        match self {
            FeeQuote::Legacy { gas_price } => *gas_price,
            FeeQuote::Eip1559 {
                max_fee_per_gas, ..
            } => *max_fee_per_gas,
        }
    }

    /// Set the quoted fee fields on a transaction request.
    pub fn apply(&self, tx: TransactionRequest) -> TransactionRequest {
        match *self {
            FeeQuote::Legacy { gas_price } => tx.with_gas_price(gas_price),
            FeeQuote::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => tx
                .with_max_fee_per_gas(max_fee_per_gas)
                .with_max_priority_fee_per_gas(max_priority_fee_per_gas),
        }
    }
}

/// The parts of a mined receipt the relayer reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedReceipt {
    pub tx_hash: TxHash,
    pub success: bool,
    pub gas_used: u64,
    pub block_number: Option<u64>,
    /// Receipt logs, in emission order.
    pub logs: Vec<Log>,
}

/// RPC client + relayer signer, as seen by the relay pipeline.
///
/// Implementations must serialize nonce assignment for concurrent
/// `send_transaction` calls; the pipeline does not.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Address of the relayer key that signs broadcasts.
    fn relayer_address(&self) -> Address;

    /// Read-only `eth_call` against latest state.
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ChainError>;

    /// Current gas price or fee-market parameters.
    async fn fee_quote(&self) -> Result<FeeQuote, ChainError>;

    /// Native balance of `address`.
    async fn balance(&self, address: Address) -> Result<U256, ChainError>;

    /// Sign with the relayer key and broadcast. Returns once the node accepted it.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ChainError>;

    /// Wait until `tx_hash` is included, or fail with [`ChainError::Timeout`].
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> Result<MinedReceipt, ChainError>;
}

/// Typed view call: encode `call`, `eth_call` it against `to`, decode the return.
pub async fn view_call<C, T>(chain: &C, to: Address, call: &T) -> Result<T::Return, ChainError>
where
    C: ChainClient + ?Sized,
    T: SolCall + Sync,
{
    let tx = TransactionRequest::default()
        .with_to(to)
        .with_input(call.abi_encode());
    let out = chain.call(tx).await?;
    T::abi_decode_returns(&out).map_err(|e| {
        ChainError::Transport(format!(
            "undecodable {} return from {to}: {e}",
            T::SIGNATURE
        ))
    })
}
