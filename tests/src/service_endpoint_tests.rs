use crate::utils::*;
use alloy::primitives::U256;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use modl_relayer::chain::mock::MockChain;
use modl_relayer::chain::{ChainClient, ChainError};
use modl_relayer::contracts::ContractInterfaces;

#[tokio::test]
async fn test_health() -> anyhow::Result<()> {
    let (router, state) = app(MockChain::healthy(HUB, FORWARDER))?;

    let res = get(router, "/health").await?;
    assert_eq!(res.status, StatusCode::OK);
    let json = res.json()?;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["relayHub"], HUB.to_string());
    assert_eq!(
        json["relayer"],
        state.relayer.chain().relayer_address().to_string()
    );
    assert_eq!(json["requests"], 0);
    Ok(())
}

#[tokio::test]
async fn test_status_snapshot() -> anyhow::Result<()> {
    let chain = MockChain::healthy(HUB, FORWARDER)
        .with_deposit(U256::from(7_000_000_000_000_000u64))
        .with_balance(U256::from(123u64));
    let (router, _) = app(chain)?;

    let res = get(router, "/status").await?;
    assert_eq!(res.status, StatusCode::OK);
    let json = res.json()?;
    assert_eq!(json["paymaster"], PAYMASTER.to_string());
    assert_eq!(json["deposit"], "7000000000000000");
    assert_eq!(json["relayerBalance"], "123");
    assert_eq!(json["trust"]["paymasterTrustedForwarder"], FORWARDER.to_string());
    assert_eq!(json["trust"]["consistent"], true);
    Ok(())
}

#[tokio::test]
async fn test_status_with_manager_configured() -> anyhow::Result<()> {
    let config = modl_relayer::Config {
        deployment_manager_address: Some(TARGET.to_string()),
        ..test_config()
    };
    let chain = MockChain::healthy(HUB, FORWARDER).with_manager_trust(false);
    let (router, _) = app_with(config, chain, ContractInterfaces::builtin()?)?;

    let json = get(router, "/status").await?.json()?;
    assert_eq!(json["trust"]["isTrustedForwarderOnManager"], false);
    assert_eq!(json["trust"]["consistent"], false);
    Ok(())
}

#[tokio::test]
async fn test_status_reports_read_errors_inline() -> anyhow::Result<()> {
    let chain = MockChain::healthy(HUB, FORWARDER)
        .with_trust_read_error(ChainError::Transport("node down".into()));
    let (router, _) = app(chain)?;

    let res = get(router, "/status").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()?["trust"]["error"], "node down");
    Ok(())
}

#[tokio::test]
async fn test_status_without_paymaster_is_503() -> anyhow::Result<()> {
    let config = modl_relayer::Config {
        paymaster_address: None,
        ..test_config()
    };
    let (router, _) = app_with(
        config,
        MockChain::healthy(HUB, FORWARDER),
        ContractInterfaces::builtin()?,
    )?;

    let res = get(router, "/status").await?;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn test_metrics_exposition() -> anyhow::Result<()> {
    let (router, _) = app(MockChain::healthy(HUB, FORWARDER))?;
    post_json(router.clone(), "/relay", &relay_body()).await?;

    let res = get(router, "/metrics").await?;
    assert_eq!(res.status, StatusCode::OK);
    let text = res.text();
    assert!(text.contains("# TYPE relayer_relay_total counter"));
    assert!(text.contains("relayer_relay_errors_total{kind=\"config_mismatch\"}"));
    Ok(())
}

#[tokio::test]
async fn test_request_id_propagated() -> anyhow::Result<()> {
    let (router, _) = app(MockChain::healthy(HUB, FORWARDER))?;
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "client-abc")
        .body(Body::empty())?;

    let res = send(router, request).await?;
    assert_eq!(res.headers["x-request-id"], "client-abc");
    Ok(())
}

#[tokio::test]
async fn test_request_id_generated() -> anyhow::Result<()> {
    let (router, _) = app(MockChain::healthy(HUB, FORWARDER))?;

    let res = get(router, "/health").await?;
    let id = res.headers["x-request-id"].to_str()?;
    assert!(id.starts_with("rel-"));
    assert_eq!(id.len(), 4 + 16);
    Ok(())
}

#[tokio::test]
async fn test_error_responses_carry_request_id() -> anyhow::Result<()> {
    let (router, _) = app(MockChain::healthy(HUB, FORWARDER))?;

    let res = post_json(router, "/relay", &serde_json::json!({})).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.headers.contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn test_cors_allow_list() -> anyhow::Result<()> {
    let config = modl_relayer::Config {
        cors_origins: "https://app.modl.xyz".into(),
        ..test_config()
    };
    let (router, _) = app_with(
        config,
        MockChain::healthy(HUB, FORWARDER),
        ContractInterfaces::builtin()?,
    )?;

    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/relay")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
    };

    let allowed = send(router.clone(), preflight("https://app.modl.xyz")?).await?;
    assert_eq!(
        allowed.headers["access-control-allow-origin"],
        "https://app.modl.xyz"
    );

    let denied = send(router, preflight("https://evil.example")?).await?;
    assert!(!denied.headers.contains_key("access-control-allow-origin"));
    Ok(())
}

#[tokio::test]
async fn test_oversized_body_rejected() -> anyhow::Result<()> {
    let config = modl_relayer::Config {
        max_body_bytes: 256,
        ..test_config()
    };
    let (router, state) = app_with(
        config,
        MockChain::healthy(HUB, FORWARDER),
        ContractInterfaces::builtin()?,
    )?;
    let mut body = relay_body();
    body["encodedData"] = serde_json::json!(format!("0x{}", "ab".repeat(512)));

    // No Content-Length header: the limit trips while the body is buffered.
    let res = post_json(router, "/relay", &body).await?;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(res.json()?["error"].is_string());
    assert_eq!(state.relayer.chain().broadcasts(), 0);
    assert!(state.relayer.chain().calls().is_empty());
    Ok(())
}
