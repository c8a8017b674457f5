//! Receipt log interpretation.

use crate::contracts::{ContractInterfaces, DecodedLog, DEBUG_SENDER_EVENT};
use alloy::primitives::Log;
use tracing::info;

/// Decode `logs` in receipt order. The first interface that decodes a log
/// claims it; logs no interface recognizes are dropped.
pub fn interpret(interfaces: &ContractInterfaces, logs: &[Log], req_id: &str) -> Vec<DecodedLog> {
    let decoded: Vec<DecodedLog> = logs
        .iter()
        .filter_map(|log| {
            interfaces
                .decoders()
                .into_iter()
                .find_map(|iface| iface.decode_log(log))
        })
        .collect();

    for log in decoded.iter().filter(|l| l.event_name == DEBUG_SENDER_EVENT) {
        let sender = log.args.first().map(|a| a.value.as_str()).unwrap_or("?");
        info!(req_id = %req_id, sender = %sender, emitter = %log.address, "DebugMsgSender");
    }

    decoded
}
