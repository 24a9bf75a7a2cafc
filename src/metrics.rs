use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, HistogramVec, register_counter, register_counter_vec,
    register_gauge, register_histogram_vec,
};


lazy_static! {
    pub static ref ADMIN_WRITES_TOTAL: CounterVec = register_counter_vec!(
        "recontrol_admin_writes_total",
        "Admin write attempts that passed the rate limiter",
        &["operation"]
    )
    .unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("recontrol_rate_limited_total", "Admin writes rejected by the rate limiter").unwrap();
    pub static ref RATE_LIMIT_ENTRIES: Gauge =
        register_gauge!("recontrol_rate_limit_entries", "Identities currently tracked by the rate limiter").unwrap();
    pub static ref RATE_LIMIT_SWEPT: Counter =
        register_counter!("recontrol_rate_limit_swept_total", "Expired rate limit entries removed by the sweeper").unwrap();
    pub static ref RPC_LATENCY: HistogramVec = register_histogram_vec!(
        "recontrol_rpc_latency_seconds",
        "Admin RPC latency in seconds",
        &["function"]
    )
    .unwrap();
    pub static ref ANOMALIES_DETECTED: CounterVec = register_counter_vec!(
        "recontrol_anomalies_detected_total",
        "Anomalies returned by detection passes",
        &["severity"]
    )
    .unwrap();
}
