use alloy::primitives::{address, Address};
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use modl_relayer::chain::mock::MockChain;
use modl_relayer::contracts::ContractInterfaces;
use modl_relayer::{create_router, AppState, Config};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const HUB: Address = address!("1111111111111111111111111111111111111111");
pub const FORWARDER: Address = address!("2222222222222222222222222222222222222222");
pub const PAYMASTER: Address = address!("3333333333333333333333333333333333333333");
pub const TARGET: Address = address!("4444444444444444444444444444444444444444");
pub const USER: Address = address!("52f7b438b3c72d9a834fe7cbc00d78e948d706d5");

// Hardhat account #0; never funded anywhere real.
const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn test_config() -> Config {
    Config {
        private_key: TEST_KEY.into(),
        relay_hub_address: HUB.to_string(),
        paymaster_address: Some(PAYMASTER.to_string()),
        deployment_manager_address: None,
        cors_origins: String::new(),
        gas_buffer_percent: None,
        ..Config::default()
    }
}

pub fn relay_body() -> Value {
    serde_json::json!({
        "paymaster": PAYMASTER.to_string(),
        "target": TARGET.to_string(),
        "encodedData": "0xabcdef",
        "gasLimit": 200000,
        "user": USER.to_string(),
    })
}

pub fn app(chain: MockChain) -> anyhow::Result<(Router, Arc<AppState<MockChain>>)> {
    app_with(test_config(), chain, ContractInterfaces::builtin()?)
}

pub fn app_with(
    config: Config,
    chain: MockChain,
    interfaces: ContractInterfaces,
) -> anyhow::Result<(Router, Arc<AppState<MockChain>>)> {
    let settings = config.relay_settings()?;
    let state = Arc::new(AppState::with_chain(config, chain, interfaces, settings));
    Ok((create_router(state.clone()), state))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> anyhow::Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub async fn send(router: Router, request: Request<Body>) -> anyhow::Result<TestResponse> {
    let response = router.oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(TestResponse {
        status,
        headers,
        body: body.to_vec(),
    })
}

pub async fn post_json(router: Router, path: &str, body: &Value) -> anyhow::Result<TestResponse> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?;
    send(router, request).await
}

pub async fn get(router: Router, path: &str) -> anyhow::Result<TestResponse> {
    let request = Request::builder().uri(path).body(Body::empty())?;
    send(router, request).await
}
