use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// Fallback values, also used when a merged field is still unset.
pub const DEFAULT_PORT: u16 = 9003;
pub const DEFAULT_DB_POOL_SIZE: u32 = 16;
pub const DEFAULT_MACHINE_COUNT: i32 = 20;
pub const DEFAULT_MACHINE_START_ID: i32 = 81_258_856;
pub const DEFAULT_TOOL_CAPACITY: i32 = 24;
pub const DEFAULT_MAX_ACCELERATION: f64 = 200.0;
pub const DEFAULT_MAX_VELOCITY: f64 = 60.0;
pub const DEFAULT_TOOL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_TOOL_USAGE_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_AXIS_INTERVAL_MS: u64 = 10;
pub const DEFAULT_PUSH_INTERVAL_SECS: u64 = 1;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "CNC Fleet Telemetry Simulator", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "MACHINESIM_PORT", help = "Port to listen on for subscriber connections.")]
    pub port: Option<u16>,

    #[clap(long, env = "MACHINESIM_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "DATABASE_URL", help = "PostgreSQL connection URL for the fleet store.")]
    pub database_url: Option<String>,

    #[clap(long, env = "MACHINESIM_DB_POOL_SIZE", help = "Maximum number of pooled store connections.")]
    pub db_pool_size: Option<u32>,

    #[clap(long, env = "MACHINESIM_MACHINE_COUNT", help = "Number of machines in the simulated fleet.")]
    pub machine_count: Option<i32>,

    #[clap(long, env = "MACHINESIM_MACHINE_START_ID", help = "External machine id of the first machine; ids are contiguous from here.")]
    pub machine_start_id: Option<i32>,

    #[clap(long, env = "MACHINESIM_TOOL_CAPACITY", help = "Tool slots per machine; bounds the tool-in-use index.")]
    pub tool_capacity: Option<i32>,

    #[clap(long, env = "MACHINESIM_MAX_ACCELERATION", help = "Static max acceleration written to every axis definition.")]
    pub max_acceleration: Option<f64>,

    #[clap(long, env = "MACHINESIM_MAX_VELOCITY", help = "Static max velocity written to every axis definition.")]
    pub max_velocity: Option<f64>,

    #[clap(long, env = "MACHINESIM_TOOL_INTERVAL_SECS", help = "Seconds between tool-sample rounds.")]
    pub tool_interval_secs: Option<u64>,

    #[clap(long, env = "MACHINESIM_TOOL_USAGE_INTERVAL_SECS", help = "Seconds between tool-usage rounds.")]
    pub tool_usage_interval_secs: Option<u64>,

    #[clap(long, env = "MACHINESIM_AXIS_INTERVAL_MS", help = "Milliseconds between axis-sample rounds.")]
    pub axis_interval_ms: Option<u64>,

    #[clap(long, env = "MACHINESIM_PUSH_INTERVAL_SECS", help = "Seconds between snapshot pushes to each subscriber.")]
    pub push_interval_secs: Option<u64>,

    #[clap(long, env = "TLS_CERT_PATH", help = "Path to the TLS certificate file.")]
    pub tls_cert_path: Option<PathBuf>,

    #[clap(long, env = "TLS_KEY_PATH", help = "Path to the TLS private key file.")]
    pub tls_key_path: Option<PathBuf>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            database_url: other.database_url.or(self.database_url),
            db_pool_size: other.db_pool_size.or(self.db_pool_size),
            machine_count: other.machine_count.or(self.machine_count),
            machine_start_id: other.machine_start_id.or(self.machine_start_id),
            tool_capacity: other.tool_capacity.or(self.tool_capacity),
            max_acceleration: other.max_acceleration.or(self.max_acceleration),
            max_velocity: other.max_velocity.or(self.max_velocity),
            tool_interval_secs: other.tool_interval_secs.or(self.tool_interval_secs),
            tool_usage_interval_secs: other.tool_usage_interval_secs.or(self.tool_usage_interval_secs),
            axis_interval_ms: other.axis_interval_ms.or(self.axis_interval_ms),
            push_interval_secs: other.push_interval_secs.or(self.push_interval_secs),
            tls_cert_path: other.tls_cert_path.or(self.tls_cert_path),
            tls_key_path: other.tls_key_path.or(self.tls_key_path),
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or("")
    }

    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_DB_POOL_SIZE)
    }

    pub fn machine_count(&self) -> i32 {
        self.machine_count.unwrap_or(DEFAULT_MACHINE_COUNT)
    }

    pub fn machine_start_id(&self) -> i32 {
        self.machine_start_id.unwrap_or(DEFAULT_MACHINE_START_ID)
    }

    /// The contiguous external ids of the simulated fleet.
    pub fn machine_ids(&self) -> std::ops::Range<i32> {
        let start = self.machine_start_id();
        start..start + self.machine_count()
    }

    pub fn tool_capacity(&self) -> i32 {
        self.tool_capacity.unwrap_or(DEFAULT_TOOL_CAPACITY)
    }

    pub fn max_acceleration(&self) -> f64 {
        self.max_acceleration.unwrap_or(DEFAULT_MAX_ACCELERATION)
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity.unwrap_or(DEFAULT_MAX_VELOCITY)
    }

    pub fn tool_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tool_interval_secs.unwrap_or(DEFAULT_TOOL_INTERVAL_SECS))
    }

    pub fn tool_usage_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.tool_usage_interval_secs
                .unwrap_or(DEFAULT_TOOL_USAGE_INTERVAL_SECS),
        )
    }

    pub fn axis_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.axis_interval_ms.unwrap_or(DEFAULT_AXIS_INTERVAL_MS))
    }

    pub fn push_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.push_interval_secs.unwrap_or(DEFAULT_PUSH_INTERVAL_SECS))
    }
}

pub fn load_config() -> Config {
    // 1. Load defaults
    let default_config = Config {
        port: Some(DEFAULT_PORT),
        db_pool_size: Some(DEFAULT_DB_POOL_SIZE),
        machine_count: Some(DEFAULT_MACHINE_COUNT),
        machine_start_id: Some(DEFAULT_MACHINE_START_ID),
        tool_capacity: Some(DEFAULT_TOOL_CAPACITY),
        max_acceleration: Some(DEFAULT_MAX_ACCELERATION),
        max_velocity: Some(DEFAULT_MAX_VELOCITY),
        tool_interval_secs: Some(DEFAULT_TOOL_INTERVAL_SECS),
        tool_usage_interval_secs: Some(DEFAULT_TOOL_USAGE_INTERVAL_SECS),
        axis_interval_ms: Some(DEFAULT_AXIS_INTERVAL_MS),
        push_interval_secs: Some(DEFAULT_PUSH_INTERVAL_SECS),
        ..Default::default()
    };

    // 2. Load from config file (server_machines.conf) if present.
    //    Allow overriding default config file path with CLI arg.
    let cli_args_for_path = Config::parse(); // Parse CLI to get potential config_path override early

    let config_file_path = cli_args_for_path
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("server_machines.conf"));

    let mut current_config = default_config;

    if config_file_path.exists() {
        if let Ok(config_str) = fs::read_to_string(&config_file_path) {
            if let Ok(file_config) = serde_json::from_str::<Config>(&config_str) {
                current_config = current_config.merge(file_config);
            } else {
                tracing::warn!(
                    "Failed to parse config file: {}. Falling back to other sources.",
                    config_file_path.display()
                );
            }
        } else {
            tracing::warn!(
                "Failed to read config file: {}. Falling back to other sources.",
                config_file_path.display()
            );
        }
    } else {
        tracing::info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            config_file_path.display()
        );
    }

    // 3. Override with environment variables and CLI arguments.
    //    clap::Parser handles env vars and CLI args; merge them over the file config.
    let cli_args_final = Config::parse();
    current_config.merge(cli_args_final)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other_when_set() {
        let base = Config {
            port: Some(1),
            machine_count: Some(5),
            ..Default::default()
        };
        let overlay = Config {
            port: Some(2),
            ..Default::default()
        };
        let merged = base.merge(overlay);
        assert_eq!(merged.port, Some(2));
        // None in the overlay falls through to the base value
        assert_eq!(merged.machine_count, Some(5));
    }

    #[test]
    fn test_machine_ids_are_contiguous_from_start() {
        let cfg = Config {
            machine_start_id: Some(100),
            machine_count: Some(3),
            ..Default::default()
        };
        let ids: Vec<i32> = cfg.machine_ids().collect();
        assert_eq!(ids, vec![100, 101, 102]);
    }

    #[test]
    fn test_interval_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.tool_interval().as_secs(), DEFAULT_TOOL_INTERVAL_SECS);
        assert_eq!(cfg.axis_interval().as_millis(), DEFAULT_AXIS_INTERVAL_MS as u128);
        assert_eq!(cfg.push_interval().as_secs(), DEFAULT_PUSH_INTERVAL_SECS);
    }
}
