//! Alloy-backed [`ChainClient`]: HTTP provider with the relayer wallet attached.

use super::{ChainClient, ChainError, FeeQuote, MinedReceipt, PendingNonceManager};
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::fillers::NonceFiller;
use alloy::providers::{
    DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider, ProviderBuilder,
    WatchTxError,
};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

/// Chain client over a single HTTP RPC endpoint.
///
/// Nonces come from a [`PendingNonceManager`] shared with the provider's
/// nonce filler, which serializes assignment per sender across concurrent
/// relays. A rejected broadcast resets the relayer's cached nonce.
pub struct RpcChain {
    provider: DynProvider,
    nonce_manager: PendingNonceManager,
    relayer: Address,
    eip1559: bool,
}

impl RpcChain {
    pub fn new(rpc_url: &str, signer: PrivateKeySigner, eip1559: bool) -> Result<Self, crate::Error> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| crate::Error::Config(format!("Invalid RPC URL: {e}")))?;
        let relayer = signer.address();

        let nonce_manager = PendingNonceManager::default();
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .with_gas_estimation()
            .filler(NonceFiller::new(nonce_manager.clone()))
            .fetch_chain_id()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        info!(relayer = %relayer, eip1559, "RPC client initialized");
        Ok(Self {
            provider,
            nonce_manager,
            relayer,
            eip1559,
        })
    }

    /// Chain id reported by the node. Used as a startup connectivity check.
    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider.get_chain_id().await.map_err(classify)
    }
}

#[async_trait]
impl ChainClient for RpcChain {
    fn relayer_address(&self) -> Address {
        self.relayer
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ChainError> {
        self.provider.call(tx).await.map_err(classify)
    }

    async fn fee_quote(&self) -> Result<FeeQuote, ChainError> {
        if self.eip1559 {
            let fees = self
                .provider
                .estimate_eip1559_fees()
                .await
                .map_err(classify)?;
            Ok(FeeQuote::Eip1559 {
                max_fee_per_gas: fees.max_fee_per_gas,
                max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            })
        } else {
            let gas_price = self.provider.get_gas_price().await.map_err(classify)?;
            Ok(FeeQuote::Legacy { gas_price })
        }
    }

    async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider.get_balance(address).await.map_err(classify)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ChainError> {
        match self.provider.send_transaction(tx).await {
            Ok(pending) => Ok(*pending.tx_hash()),
            Err(e) => {
                // The filler already consumed a nonce for this attempt.
                self.nonce_manager.reset_nonce(self.relayer).await;
                warn!(relayer = %self.relayer, error = %e, "Broadcast rejected, nonce cache reset");
                Err(classify(e))
            }
        }
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> Result<MinedReceipt, ChainError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_timeout(Some(timeout))
            .get_receipt()
            .await
            .map_err(|e| match e {
                PendingTransactionError::TxWatcher(WatchTxError::Timeout) => ChainError::Timeout(
                    format!("no receipt for {tx_hash} after {}s", timeout.as_secs()),
                ),
                other => ChainError::Transport(other.to_string()),
            })?;

        Ok(MinedReceipt {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        })
    }
}

/// Split node errors into reverts (with payload when present) and plain transport failures.
fn classify(err: TransportError) -> ChainError {
    if let Some(payload) = err.as_error_resp() {
        let message = payload.message.to_string();
        if let Some(data) = payload.as_revert_data() {
            return ChainError::Revert {
                data: Some(data),
                message,
            };
        }
        if message.to_ascii_lowercase().contains("revert") {
            return ChainError::Revert {
                data: None,
                message,
            };
        }
    }
    ChainError::Transport(err.to_string())
}
