use std::env;

use booking_engine::AvailabilityFailMode;
use hbg_common::helpers::parse_boolean_flag;
use log::*;
use momo_gateway::MomoConfig;

const DEFAULT_HBG_HOST: &str = "127.0.0.1";
const DEFAULT_HBG_PORT: u16 = 8360;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// What the availability probe reports when the lookup itself fails. The default is fail-closed;
    /// `HBG_AVAILABILITY_FAIL_OPEN=1` restores the legacy fail-open behaviour.
    pub availability_fail_mode: AvailabilityFailMode,
    /// Wallet gateway credentials and endpoints, injected into the payment adapter at construction.
    pub momo: MomoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HBG_HOST.to_string(),
            port: DEFAULT_HBG_PORT,
            database_url: String::default(),
            availability_fail_mode: AvailabilityFailMode::default(),
            momo: MomoConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("HBG_HOST").ok().unwrap_or_else(|| DEFAULT_HBG_HOST.into());
        let port = env::var("HBG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for HBG_PORT. {e} Using the default, {DEFAULT_HBG_PORT}, instead."
                    );
                    DEFAULT_HBG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_HBG_PORT);
        let database_url = env::var("HBG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ HBG_DATABASE_URL is not set. Please set it to the URL for the booking database.");
            String::default()
        });
        let fail_open = parse_boolean_flag(env::var("HBG_AVAILABILITY_FAIL_OPEN").ok(), false);
        let availability_fail_mode = if fail_open {
            warn!(
                "🪛️ HBG_AVAILABILITY_FAIL_OPEN is set. Storage faults during availability checks will report rooms \
                 as available, which risks double bookings."
            );
            AvailabilityFailMode::FailOpen
        } else {
            AvailabilityFailMode::FailClosed
        };
        let momo = MomoConfig::from_env_or_default();
        Self { host, port, database_url, availability_fail_mode, momo }
    }
}
