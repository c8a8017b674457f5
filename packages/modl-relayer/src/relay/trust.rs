//! Trust-chain verification: paymaster -> hub, paymaster -> forwarder -> manager.

use crate::chain::{view_call, ChainClient, ChainError};
use crate::contracts::{IDeploymentManager, IPaymaster};
use crate::Error;
use alloy::primitives::Address;
use serde::Serialize;
use tracing::{debug, warn};

/// On-chain wiring read for one relay. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustConfig {
    pub paymaster_relay_hub: Address,
    pub paymaster_trusted_forwarder: Address,
    pub is_trusted_forwarder_on_manager: bool,
    pub resolved_relay_hub_address: Address,
}

impl TrustConfig {
    /// Describe the first broken link, if any.
    pub fn mismatch(&self) -> Option<String> {
        if self.paymaster_relay_hub != self.resolved_relay_hub_address {
            return Some(format!(
                "paymaster relay hub {} != configured hub {}",
                self.paymaster_relay_hub, self.resolved_relay_hub_address
            ));
        }
        if !self.is_trusted_forwarder_on_manager {
            return Some(format!(
                "deployment manager does not trust forwarder {}",
                self.paymaster_trusted_forwarder
            ));
        }
        None
    }
}

/// Read the trust configuration without judging it.
pub async fn read_trust<C: ChainClient + ?Sized>(
    chain: &C,
    paymaster: Address,
    manager: Address,
    relay_hub: Address,
) -> Result<TrustConfig, ChainError> {
    let (hub_call, forwarder_call) = (
        IPaymaster::relayHubCall {},
        IPaymaster::trustedForwarderCall {},
    );
    let (paymaster_relay_hub, paymaster_trusted_forwarder) = tokio::try_join!(
        view_call(chain, paymaster, &hub_call),
        view_call(chain, paymaster, &forwarder_call),
    )?;
    let is_trusted_forwarder_on_manager = view_call(
        chain,
        manager,
        &IDeploymentManager::isTrustedForwarderCall {
            forwarder: paymaster_trusted_forwarder,
        },
    )
    .await?;

    Ok(TrustConfig {
        paymaster_relay_hub,
        paymaster_trusted_forwarder,
        is_trusted_forwarder_on_manager,
        resolved_relay_hub_address: relay_hub,
    })
}

/// Read and check the trust chain. Mismatch details are logged, not returned to callers.
pub async fn verify<C: ChainClient + ?Sized>(
    chain: &C,
    paymaster: Address,
    manager: Address,
    relay_hub: Address,
    req_id: &str,
) -> Result<TrustConfig, Error> {
    let trust = read_trust(chain, paymaster, manager, relay_hub)
        .await
        .map_err(|e| match e {
            ChainError::Revert { message, .. } => {
                Error::ConfigMismatch(format!("trust read reverted: {message}"))
            }
            other => Error::Transport(other.to_string()),
        })?;

    if let Some(detail) = trust.mismatch() {
        warn!(req_id = %req_id, paymaster = %paymaster, manager = %manager, "Trust check failed: {detail}");
        return Err(Error::ConfigMismatch(detail));
    }

    debug!(req_id = %req_id, forwarder = %trust.paymaster_trusted_forwarder, "Trust check passed");
    Ok(trust)
}
