//! Shared application state.

use crate::chain::{ChainClient, RpcChain};
use crate::config::Config;
use crate::contracts::ContractInterfaces;
use crate::relay::Relayer;
use crate::Error;
use std::sync::atomic::AtomicU64;
use std::time::Instant;
use tracing::{info, warn};

/// Shared state across all request handlers.
pub struct AppState<C: ChainClient = RpcChain> {
    pub config: Config,
    pub relayer: Relayer<C>,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState<RpcChain> {
    /// Build the RPC client, signer and contract interfaces from configuration.
    pub async fn new(config: Config) -> Result<Self, Error> {
        let signer = config.signer()?;
        let settings = config.relay_settings()?;
        if let Some(paymaster) = config.paymaster()? {
            info!(paymaster = %paymaster, "Default paymaster for /status");
        }

        let chain = RpcChain::new(&config.rpc_endpoint(), signer, config.eip1559)?;
        match chain.chain_id().await {
            Ok(chain_id) => info!(chain_id, "Connected to RPC"),
            Err(e) => warn!(error = %e, "RPC not reachable at startup, continuing"),
        }

        let interfaces = ContractInterfaces::load(&config)?;
        info!(
            relay_hub = %settings.relay_hub,
            gas_policy = ?settings.gas_policy,
            "Relay pipeline configured"
        );

        Ok(Self::with_chain(config, chain, interfaces, settings))
    }
}

impl<C: ChainClient> AppState<C> {
    /// Assemble state around an already-built chain client.
    pub fn with_chain(
        config: Config,
        chain: C,
        interfaces: ContractInterfaces,
        settings: crate::relay::RelaySettings,
    ) -> Self {
        Self {
            config,
            relayer: Relayer::new(chain, interfaces, settings),
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }
}
