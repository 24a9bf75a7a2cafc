use std::sync::Arc;
use crate::rate_limit::RateLimiter;
use crate::rpc::AdminRpc;
// app's shared state

pub struct AppState {
    pub rpc: AdminRpc,                  // admin database client
    pub rate_limiter: Arc<RateLimiter>, // shared with the sweeper task
}
