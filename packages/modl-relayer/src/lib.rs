//! # MODL Relayer
//!
//! Sponsored meta-transaction relayer. Accepts a user-authorized call over
//! HTTP, checks the paymaster/forwarder trust chain on-chain, simulates the
//! relay, then submits it through the relay hub from the relayer key.
//!
//! ## Quick Start
//! ```bash
//! RELAYER_PRIVATE_KEY=0x... RELAYER_RELAY_HUB_ADDRESS=0x... cargo run --bin modl-relayer
//! ```
//!
//! ## Endpoints
//! - `POST /relay` - Verify, simulate and dispatch a sponsored call
//! - `GET /health` - Liveness with uptime and request count
//! - `GET /status` - Trust and deposit snapshot for the default paymaster
//! - `GET /metrics` - Prometheus metrics

pub mod chain;
pub mod config;
pub mod contracts;
mod error;
mod handlers;
pub mod metrics;
pub mod middleware;
pub mod relay;
pub mod request;
mod response;
mod router;
mod state;

pub use config::Config;
pub use error::{Error, CONFIG_MISMATCH_MESSAGE};
pub use router::create as create_router;
pub use state::AppState;
