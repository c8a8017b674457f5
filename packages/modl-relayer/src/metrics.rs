//! Prometheus metrics (lock-free atomics, zero allocation on hot path).

use crate::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Traffic ---
    pub relay_total: AtomicU64,
    pub relay_success: AtomicU64,

    // --- Failures by stage ---
    pub invalid_request: AtomicU64,
    pub config_mismatch: AtomicU64,
    pub simulation_reverted: AtomicU64,
    pub fee_data_unavailable: AtomicU64,
    pub insufficient_balance: AtomicU64,
    pub execution_reverted: AtomicU64,
    pub inclusion_timeout: AtomicU64,
    pub transport_errors: AtomicU64,

    // --- Latency (μs, updated via CAS) ---
    pub relay_duration_us_sum: AtomicU64,
    pub relay_duration_us_max: AtomicU64,

    // --- Gas ---
    pub gas_used_total: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            relay_total: AtomicU64::new(0),
            relay_success: AtomicU64::new(0),
            invalid_request: AtomicU64::new(0),
            config_mismatch: AtomicU64::new(0),
            simulation_reverted: AtomicU64::new(0),
            fee_data_unavailable: AtomicU64::new(0),
            insufficient_balance: AtomicU64::new(0),
            execution_reverted: AtomicU64::new(0),
            inclusion_timeout: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            relay_duration_us_sum: AtomicU64::new(0),
            relay_duration_us_max: AtomicU64::new(0),
            gas_used_total: AtomicU64::new(0),
        }
    }

    pub fn record_error(&self, err: &Error) {
        let counter = match err {
            Error::InvalidRequest(_) => &self.invalid_request,
            Error::ConfigMismatch(_) => &self.config_mismatch,
            Error::SimulationReverted(_) => &self.simulation_reverted,
            Error::FeeDataUnavailable(_) => &self.fee_data_unavailable,
            Error::InsufficientRelayerBalance { .. } => &self.insufficient_balance,
            Error::ExecutionReverted { .. } => &self.execution_reverted,
            Error::InclusionTimeout { .. } => &self.inclusion_timeout,
            Error::Transport(_) | Error::Config(_) => &self.transport_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, gas_used: u64) {
        self.relay_success.fetch_add(1, Ordering::Relaxed);
        self.gas_used_total.fetch_add(gas_used, Ordering::Relaxed);
    }

    pub fn record_relay_duration(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.relay_duration_us_sum.fetch_add(us, Ordering::Relaxed);
        // CAS loop for max tracking
        let mut cur = self.relay_duration_us_max.load(Ordering::Relaxed);
        while us > cur {
            match self.relay_duration_us_max.compare_exchange_weak(
                cur,
                us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let relay_total = self.relay_total.load(Ordering::Relaxed);
        let relay_success = self.relay_success.load(Ordering::Relaxed);
        let dur_sum = self.relay_duration_us_sum.load(Ordering::Relaxed);
        let dur_max = self.relay_duration_us_max.swap(0, Ordering::Relaxed);
        let gas_used = self.gas_used_total.load(Ordering::Relaxed);

        // Convert μs to seconds for Prometheus conventions
        let dur_sum_s = dur_sum as f64 / 1_000_000.0;
        let dur_max_s = dur_max as f64 / 1_000_000.0;

        let errors = [
            ("invalid_request", &self.invalid_request),
            ("config_mismatch", &self.config_mismatch),
            ("simulation_reverted", &self.simulation_reverted),
            ("fee_data_unavailable", &self.fee_data_unavailable),
            ("insufficient_relayer_balance", &self.insufficient_balance),
            ("execution_reverted", &self.execution_reverted),
            ("inclusion_timeout", &self.inclusion_timeout),
            ("transport", &self.transport_errors),
        ];
        let mut error_lines = String::new();
        for (kind, counter) in errors {
            error_lines.push_str(&format!(
                "relayer_relay_errors_total{{kind=\"{kind}\"}} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }

        format!(
            "\
# HELP relayer_relay_total Total relay requests received.\n\
# TYPE relayer_relay_total counter\n\
relayer_relay_total {relay_total}\n\
# HELP relayer_relay_success_total Relays mined with success status.\n\
# TYPE relayer_relay_success_total counter\n\
relayer_relay_success_total {relay_success}\n\
# HELP relayer_relay_errors_total Failed relays by stage.\n\
# TYPE relayer_relay_errors_total counter\n\
{error_lines}\
# HELP relayer_gas_used_total Gas used by successful relays.\n\
# TYPE relayer_gas_used_total counter\n\
relayer_gas_used_total {gas_used}\n\
# HELP relayer_relay_duration_seconds_sum Total handler time (seconds).\n\
# TYPE relayer_relay_duration_seconds_sum counter\n\
relayer_relay_duration_seconds_sum {dur_sum_s:.6}\n\
# HELP relayer_relay_duration_seconds_max Max handler time since last scrape (seconds).\n\
# TYPE relayer_relay_duration_seconds_max gauge\n\
relayer_relay_duration_seconds_max {dur_max_s:.6}\n"
        )
    }
}
