use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::planner::LayoutConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub layout: LayoutSettings,
    pub packing_service: PackingServiceConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            layout: LayoutSettings::from_env(),
            packing_service: PackingServiceConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "TRUCK_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "TRUCK_PLANNER_API_PORT";

    fn from_env() -> Self {
        let host_value =
            env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                log::warn!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = load_with_warning(
            Self::PORT_VAR,
            Self::DEFAULT_PORT,
            |value| value != 0,
            "must not be 0",
        );

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Truck bed settings for the layout pipeline.
#[derive(Clone, Debug)]
pub struct LayoutSettings {
    layout: LayoutConfig,
}

impl LayoutSettings {
    const BED_WIDTH_VAR: &'static str = "TRUCK_PLANNER_BED_WIDTH_CM";
    const BED_LENGTH_VAR: &'static str = "TRUCK_PLANNER_BED_LENGTH_CM";

    fn from_env() -> Self {
        let bed_width = load_with_warning(
            Self::BED_WIDTH_VAR,
            LayoutConfig::DEFAULT_BED_WIDTH,
            |value| value > 0,
            "must be greater than 0",
        );
        let bed_length = load_with_warning(
            Self::BED_LENGTH_VAR,
            LayoutConfig::DEFAULT_BED_LENGTH,
            |value| value > 0,
            "must be greater than 0",
        );

        let layout = match LayoutConfig::builder()
            .bed_width(bed_width)
            .bed_length(bed_length)
            .build()
        {
            Ok(layout) => layout,
            Err(err) => {
                log::warn!("⚠️ {}. Using default truck bed.", err);
                LayoutConfig::default()
            }
        };

        Self::from_layout(layout)
    }

    pub fn from_layout(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Returns the configured LayoutConfig.
    pub fn layout_config(&self) -> LayoutConfig {
        self.layout
    }
}

/// Location of the external packing service.
#[derive(Clone, Debug)]
pub struct PackingServiceConfig {
    base_url: String,
    timeout_secs: u64,
}

impl PackingServiceConfig {
    const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const URL_VAR: &'static str = "TRUCK_PLANNER_PACKING_URL";
    const TIMEOUT_VAR: &'static str = "TRUCK_PLANNER_PACKING_TIMEOUT_SECS";

    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs,
        }
    }

    fn from_env() -> Self {
        let base_url =
            env_string(Self::URL_VAR).unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());
        let timeout_secs = load_with_warning(
            Self::TIMEOUT_VAR,
            Self::DEFAULT_TIMEOUT_SECS,
            |value| value > 0,
            "must be greater than 0",
        );
        Self::new(base_url, timeout_secs)
    }

    /// Returns the URL where orders are turned into packed boxes.
    pub fn process_orders_endpoint(&self) -> String {
        format!("{}/process-orders", self.base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => non_empty(&value),
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            log::warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name,
                err
            );
            None
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn load_with_warning<T>(
    var_name: &str,
    default: T,
    validator: impl Fn(T) -> bool,
    invalid_hint: &str,
) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    match env_string(var_name) {
        Some(raw) => parse_with_fallback(var_name, &raw, default, validator, invalid_hint),
        None => default,
    }
}

fn parse_with_fallback<T>(
    var_name: &str,
    raw: &str,
    default: T,
    validator: impl Fn(T) -> bool,
    invalid_hint: &str,
) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    match raw.parse::<T>() {
        Ok(value) if validator(value) => value,
        Ok(_) => {
            log::warn!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name,
                raw,
                invalid_hint,
                default
            );
            default
        }
        Err(err) => {
            log::warn!(
                "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_trims_values() {
        assert_eq!(non_empty("  240 "), Some("240".to_string()));
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("   "), None);
    }

    #[test]
    fn parse_with_fallback_accepts_valid_values() {
        let value = parse_with_fallback("TEST_VAR", "240", 200u32, |v| v > 0, "positive");
        assert_eq!(value, 240);
    }

    #[test]
    fn parse_with_fallback_rejects_invalid_values() {
        assert_eq!(
            parse_with_fallback("TEST_VAR", "0", 200u32, |v| v > 0, "positive"),
            200
        );
        assert_eq!(
            parse_with_fallback("TEST_VAR", "-5", 200u32, |v| v > 0, "positive"),
            200
        );
        assert_eq!(
            parse_with_fallback("TEST_VAR", "wide", 8080u16, |v| v != 0, "not 0"),
            8080
        );
    }

    #[test]
    fn process_orders_endpoint_joins_path() {
        let config = PackingServiceConfig::new("http://localhost:8000/", 30);
        assert_eq!(
            config.process_orders_endpoint(),
            "http://localhost:8000/process-orders"
        );
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn default_layout_settings_use_default_bed() {
        let settings = LayoutSettings::from_layout(LayoutConfig::default());
        let bed = settings.layout_config().bed;
        assert_eq!((bed.width, bed.length), (200, 500));
    }
}
