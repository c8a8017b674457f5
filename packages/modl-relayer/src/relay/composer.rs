//! ERC-2771 calldata composition.

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolValue;

/// Append the ABI word of `user` to `encoded`.
///
/// The target contract recovers the forwarded caller from the trailing
/// bytes, so no function signature needs an explicit user parameter.
pub fn compose(encoded: &[u8], user: Address) -> Bytes {
    let mut out = Vec::with_capacity(encoded.len() + 32);
    out.extend_from_slice(encoded);
    out.extend_from_slice(&user.abi_encode());
    out.into()
}
