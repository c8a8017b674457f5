//! Relayer nonce allocation.
//!
//! Nonces are cached per sender and handed out sequentially. The first
//! allocation (and the first one after a reset) asks the node for the pending
//! transaction count so transactions still in the mempool are accounted for.
//! A failed broadcast must reset the cache, otherwise the next relay signs
//! with a nonce one past the last one the node actually accepted.

use alloy::network::Network;
use alloy::primitives::Address;
use alloy::providers::fillers::NonceManager;
use alloy::providers::Provider;
use alloy::transports::TransportResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Marks a sender whose nonce must be fetched from the node.
const UNKNOWN: u64 = u64::MAX;

#[derive(Clone, Debug, Default)]
pub struct PendingNonceManager {
    nonces: Arc<DashMap<Address, Arc<Mutex<u64>>>>,
}

impl PendingNonceManager {
    /// Forget the cached nonce for `address`; the next allocation re-queries the node.
    pub async fn reset_nonce(&self, address: Address) {
        let slot = self.nonces.get(&address).map(|entry| Arc::clone(entry.value()));
        if let Some(slot) = slot {
            *slot.lock().await = UNKNOWN;
            debug!(%address, "nonce cache reset");
        }
    }
}

#[async_trait]
impl NonceManager for PendingNonceManager {
    async fn get_next_nonce<P, N>(&self, provider: &P, address: Address) -> TransportResult<u64>
    where
        P: Provider<N>,
        N: Network,
    {
        // Clone the slot out so the map shard is not locked across the await below.
        let slot = {
            let entry = self
                .nonces
                .entry(address)
                .or_insert_with(|| Arc::new(Mutex::new(UNKNOWN)));
            Arc::clone(entry.value())
        };

        let mut nonce = slot.lock().await;
        let next = if *nonce == UNKNOWN {
            match provider.get_transaction_count(address).pending().await {
                Ok(pending) => {
                    info!(%address, nonce = pending, block_tag = "pending", "Nonce fetched");
                    pending
                }
                Err(e) => {
                    warn!(%address, error = %e, "Pending block tag unsupported, falling back to latest");
                    provider.get_transaction_count(address).latest().await?
                }
            }
        } else {
            *nonce + 1
        };
        *nonce = next;
        debug!(%address, nonce = next, "Nonce allocated");
        Ok(next)
    }
}
