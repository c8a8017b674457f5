use crate::utils::*;
use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolError, SolEvent};
use axum::http::StatusCode;
use modl_relayer::chain::mock::MockChain;
use modl_relayer::chain::{ChainError, FeeQuote, MinedReceipt};
use modl_relayer::contracts::{ContractInterfaces, IPaymaster, Interface};
use modl_relayer::CONFIG_MISMATCH_MESSAGE;

sol! {
    error PaymasterNotApproved(address paymaster, uint256 required);
    event DebugMsgSender(address sender);
}

#[tokio::test]
async fn test_relay_success_uses_flat_buffer() -> anyhow::Result<()> {
    let chain = MockChain::healthy(HUB, FORWARDER).with_receipt(Ok(MinedReceipt {
        tx_hash: TxHash::repeat_byte(0x11),
        success: true,
        gas_used: 91_234,
        block_number: Some(42),
        logs: vec![Log {
            address: TARGET,
            data: DebugMsgSender { sender: USER }.encode_log_data(),
        }],
    }));
    let (router, state) = app(chain)?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());

    let json = res.json()?;
    assert_eq!(json["txHash"], TxHash::repeat_byte(0x11).to_string());
    assert_eq!(json["gasUsed"], 91_234);
    assert_eq!(json["blockNumber"], 42);
    assert_eq!(json["logs"][0]["eventName"], "DebugMsgSender");
    assert_eq!(json["logs"][0]["contract"], "DeploymentManager");
    assert_eq!(json["logs"][0]["args"][0]["value"], USER.to_checksum(None));

    let sent = state.relayer.chain().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].gas, Some(300_000));
    Ok(())
}

#[tokio::test]
async fn test_relay_accepts_data_alias() -> anyhow::Result<()> {
    let (router, state) = app(MockChain::healthy(HUB, FORWARDER))?;
    let mut body = relay_body();
    let data = body["encodedData"].take();
    if let Some(obj) = body.as_object_mut() {
        obj.remove("encodedData");
    }
    body["data"] = data;

    let res = post_json(router, "/relay", &body).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    assert_eq!(state.relayer.chain().broadcasts(), 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_fields_is_400_without_network() -> anyhow::Result<()> {
    let (router, state) = app(MockChain::healthy(HUB, FORWARDER))?;
    let mut body = relay_body();
    if let Some(obj) = body.as_object_mut() {
        obj.remove("gasLimit");
    }

    let res = post_json(router, "/relay", &body).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()?["error"], "Missing required fields");
    assert!(state.relayer.chain().calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_400() -> anyhow::Result<()> {
    let (router, _) = app(MockChain::healthy(HUB, FORWARDER))?;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/relay")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"paymaster\":"))?;

    let res = send(router, request).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()?["error"], "Invalid JSON body");
    Ok(())
}

#[tokio::test]
async fn test_missing_content_type_is_415() -> anyhow::Result<()> {
    let (router, state) = app(MockChain::healthy(HUB, FORWARDER))?;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/relay")
        .body(axum::body::Body::from(serde_json::to_vec(&relay_body())?))?;

    let res = send(router, request).await?;
    assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(res.json()?["error"].is_string());
    assert!(state.relayer.chain().calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_trust_is_read_for_every_relay() -> anyhow::Result<()> {
    let (router, state) = app(MockChain::healthy(HUB, FORWARDER))?;

    let first = post_json(router.clone(), "/relay", &relay_body()).await?;
    let second = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);

    let hub_reads = state
        .relayer
        .chain()
        .calls()
        .iter()
        .filter(|tx| {
            tx.input
                .input()
                .is_some_and(|data| data.starts_with(&IPaymaster::relayHubCall::SELECTOR))
        })
        .count();
    assert_eq!(hub_reads, 2);
    assert_eq!(state.relayer.chain().broadcasts(), 2);
    Ok(())
}

#[tokio::test]
async fn test_hub_mismatch_is_500_and_skips_simulation() -> anyhow::Result<()> {
    let chain = MockChain::healthy(HUB, FORWARDER).with_paymaster_hub(Address::repeat_byte(0x99));
    let (router, state) = app(chain)?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()?["error"], CONFIG_MISMATCH_MESSAGE);

    let chain = state.relayer.chain();
    assert_eq!(chain.relay_call_simulations(), 0);
    assert_eq!(chain.broadcasts(), 0);
    Ok(())
}

#[tokio::test]
async fn test_untrusted_forwarder_is_500() -> anyhow::Result<()> {
    let (router, state) = app(MockChain::healthy(HUB, FORWARDER).with_manager_trust(false))?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()?["error"], CONFIG_MISMATCH_MESSAGE);
    assert_eq!(state.relayer.chain().broadcasts(), 0);
    Ok(())
}

#[tokio::test]
async fn test_custom_error_is_decoded() -> anyhow::Result<()> {
    let revert = PaymasterNotApproved {
        paymaster: PAYMASTER,
        required: U256::from(1_000_000u64),
    }
    .abi_encode();
    let chain = MockChain::healthy(HUB, FORWARDER).with_simulation(Err(ChainError::Revert {
        data: Some(Bytes::from(revert)),
        message: "execution reverted".into(),
    }));

    let mut interfaces = ContractInterfaces::builtin()?;
    interfaces.hub = Interface::from_signatures(
        "RelayHub",
        &[
            "function relayCall(address paymaster, address target, bytes data, uint256 gasLimit, address user)",
            "error PaymasterNotApproved(address paymaster, uint256 required)",
        ],
    )?;
    let (router, state) = app_with(test_config(), chain, interfaces)?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json()?["error"],
        format!("PaymasterNotApproved({}, 1000000)", PAYMASTER.to_checksum(None))
    );
    assert_eq!(state.relayer.chain().broadcasts(), 0);
    assert_eq!(state.relayer.chain().fee_queries(), 0);
    Ok(())
}

#[tokio::test]
async fn test_revert_without_data_uses_node_message() -> anyhow::Result<()> {
    let chain = MockChain::healthy(HUB, FORWARDER).with_simulation(Err(ChainError::Revert {
        data: None,
        message: "execution reverted: target paused".into(),
    }));
    let (router, _) = app(chain)?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()?["error"], "execution reverted: target paused");
    Ok(())
}

#[tokio::test]
async fn test_onchain_revert_reports_tx_hash() -> anyhow::Result<()> {
    let hash = TxHash::repeat_byte(0x55);
    let chain = MockChain::healthy(HUB, FORWARDER).with_receipt(Ok(MinedReceipt {
        tx_hash: hash,
        success: false,
        gas_used: 300_000,
        block_number: Some(9),
        logs: vec![],
    }));
    let (router, state) = app(chain)?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    let json = res.json()?;
    assert_eq!(json["error"], "Transaction reverted on-chain");
    assert_eq!(json["txHash"], hash.to_string());
    assert_eq!(state.relayer.chain().broadcasts(), 1);
    Ok(())
}

#[tokio::test]
async fn test_fee_data_unavailable_is_500() -> anyhow::Result<()> {
    let chain = MockChain::healthy(HUB, FORWARDER)
        .with_fee(Err(ChainError::Transport("eth_gasPrice unsupported".into())));
    let (router, state) = app(chain)?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()?["error"], "Network fee data unavailable");
    assert_eq!(state.relayer.chain().broadcasts(), 0);
    Ok(())
}

#[tokio::test]
async fn test_insufficient_relayer_balance_is_500() -> anyhow::Result<()> {
    let chain = MockChain::healthy(HUB, FORWARDER)
        .with_fee(Ok(FeeQuote::Eip1559 {
            max_fee_per_gas: 50_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        }))
        .with_balance(U256::from(1_000u64));
    let (router, state) = app(chain)?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()?["error"], "Insufficient relayer balance");
    assert_eq!(state.relayer.chain().broadcasts(), 0);
    Ok(())
}

#[tokio::test]
async fn test_inclusion_timeout_is_504() -> anyhow::Result<()> {
    let chain = MockChain::healthy(HUB, FORWARDER)
        .with_receipt(Err(ChainError::Timeout("no receipt after 120s".into())));
    let (router, _) = app(chain)?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::GATEWAY_TIMEOUT);
    assert!(res.json()?["txHash"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_trust_read_transport_failure_is_502() -> anyhow::Result<()> {
    let chain = MockChain::healthy(HUB, FORWARDER)
        .with_trust_read_error(ChainError::Transport("connection refused".into()));
    let (router, _) = app(chain)?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert_eq!(res.json()?["error"], "RPC temporarily unavailable");
    Ok(())
}

#[tokio::test]
async fn test_percent_policy_from_config() -> anyhow::Result<()> {
    let config = modl_relayer::Config {
        gas_buffer_percent: Some(20),
        ..test_config()
    };
    let (router, state) = app_with(
        config,
        MockChain::healthy(HUB, FORWARDER),
        ContractInterfaces::builtin()?,
    )?;

    let res = post_json(router, "/relay", &relay_body()).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    assert_eq!(state.relayer.chain().sent()[0].gas, Some(240_000));
    Ok(())
}
