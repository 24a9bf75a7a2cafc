use clap::Parser;
use std::time::Duration;
use thiserror::Error;

use crate::rate_limit::RateLimitConfig;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "recontrol-gateway")]
#[command(about = "Rate-limited admin gateway and anomaly feed for REcontrol")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Base url of the admin database (PostgREST rpc surface)
    #[arg(short, long, env = "RECONTROL_DATABASE_URL", default_value = "http://localhost:54321")]
    pub database_url: String,

    // Service key, sent as apikey and as bearer when the caller has no token
    #[arg(long, env = "RECONTROL_SERVICE_KEY", default_value = "", hide_env_values = true)]
    pub service_key: String,

    // Max admin writes per window, per identity
    #[arg(long, default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in milliseconds
    #[arg(long, default_value_t = 60_000)]
    pub rate_window_ms: u64,

    // How often expired rate limit entries are swept, seconds
    #[arg(long, default_value_t = 300)]
    pub sweep_interval: u64,

    // Timeout for calls to the admin database, seconds
    #[arg(long, default_value_t = 10)]
    pub upstream_timeout: u64,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,
}

// one day
const MAX_RATE_WINDOW_MS: u64 = 86_400_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--rate-limit must be at least 1")]
    ZeroRateLimit,
    #[error("--rate-window-ms must be at least 1")]
    ZeroRateWindow,
    #[error("--rate-window-ms must be at most 86400000 (one day)")]
    RateWindowTooLarge,
    #[error("--sweep-interval must be at least 1")]
    ZeroSweepInterval,
}

impl Args {
    pub fn rate_limit_config(&self) -> Result<RateLimitConfig, ConfigError> {
        if self.rate_limit == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }
        if self.rate_window_ms == 0 {
            return Err(ConfigError::ZeroRateWindow);
        }
        if self.rate_window_ms > MAX_RATE_WINDOW_MS {
            return Err(ConfigError::RateWindowTooLarge);
        }
        Ok(RateLimitConfig {
            max_requests: self.rate_limit,
            window: Duration::from_millis(self.rate_window_ms),
        })
    }

    pub fn sweep_every(&self) -> Result<Duration, ConfigError> {
        if self.sweep_interval == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }
        Ok(Duration::from_secs(self.sweep_interval))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["recontrol-gateway"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_match_admin_write_policy() {
        let args = parse(&[]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.rate_limit_config().unwrap(), RateLimitConfig::default());
        assert_eq!(args.sweep_every().unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn overrides_are_applied() {
        let args = parse(&["--rate-limit", "3", "--rate-window-ms", "1500", "-p", "9000"]);
        let cfg = args.rate_limit_config().unwrap();
        assert_eq!(cfg.max_requests, 3);
        assert_eq!(cfg.window, Duration::from_millis(1500));
        assert_eq!(args.port, 9000);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert_eq!(
            parse(&["--rate-limit", "0"]).rate_limit_config(),
            Err(ConfigError::ZeroRateLimit)
        );
        assert_eq!(
            parse(&["--rate-window-ms", "0"]).rate_limit_config(),
            Err(ConfigError::ZeroRateWindow)
        );
        assert_eq!(
            parse(&["--rate-window-ms", "18446744073709551615"]).rate_limit_config(),
            Err(ConfigError::RateWindowTooLarge)
        );
        assert!(parse(&["--rate-window-ms", "86400000"]).rate_limit_config().is_ok());
        assert_eq!(
            parse(&["--sweep-interval", "0"]).sweep_every(),
            Err(ConfigError::ZeroSweepInterval)
        );
    }
}
