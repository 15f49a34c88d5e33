use alloy_primitives::Address;
use config::{NetworkConfig, NetworkConfigBuilder, NetworkType};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Top-level tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network preset (mainnet or testnet)
    pub network: NetworkType,

    /// RPC endpoint url
    pub rpc_url: String,

    /// Chain id override for forks and local devnets
    pub chain_id: Option<u64>,

    /// Block time override in seconds
    pub block_time_secs: Option<u64>,

    /// Token to track; defaults to the network's USDC
    pub token_address: Option<Address>,

    /// Counterpart whose allowance is tracked and granted
    pub spender_address: Option<Address>,

    /// Block poll interval; defaults to the network block time
    pub poll_interval_secs: Option<u64>,

    /// Port for the Prometheus exporter; disabled when unset
    pub metrics_port: Option<u16>,

    /// Log the allowance grant instead of sending it
    #[serde(default)]
    pub dry_run: bool,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Network preset with the file's overrides applied.
    pub fn network_config(&self) -> NetworkConfig {
        let mut builder = NetworkConfigBuilder::new(self.network);
        if let Some(chain_id) = self.chain_id {
            builder = builder.chain_id(chain_id);
        }
        if let Some(secs) = self.block_time_secs {
            builder = builder.block_time_secs(secs);
        }
        builder.build()
    }

    pub fn token_address(&self) -> Address {
        self.token_address
            .unwrap_or_else(|| self.network_config().usdc)
    }

    pub fn poll_interval(&self) -> Duration {
        let secs = self
            .poll_interval_secs
            .unwrap_or_else(|| self.network_config().block_time_secs);
        Duration::from_secs(secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_minimal_config_uses_network_defaults() {
        let config: Config = toml::from_str(
            r#"
            network = "testnet"
            rpc_url = "http://localhost:8545"
            "#,
        )
        .unwrap();

        assert_eq!(config.token_address(), NetworkConfig::sepolia().usdc);
        assert_eq!(config.poll_interval(), Duration::from_secs(12));
        assert!(config.spender_address.is_none());
        assert!(config.metrics_port.is_none());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_overrides() {
        let config: Config = toml::from_str(
            r#"
            network = "mainnet"
            rpc_url = "http://localhost:8545"
            token_address = "0x1111111111111111111111111111111111111111"
            spender_address = "0x2222222222222222222222222222222222222222"
            poll_interval_secs = 3
            metrics_port = 9100
            dry_run = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config.token_address(),
            address!("1111111111111111111111111111111111111111")
        );
        assert_eq!(
            config.spender_address,
            Some(address!("2222222222222222222222222222222222222222"))
        );
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.metrics_port, Some(9100));
        assert!(config.dry_run);
    }

    #[test]
    fn test_network_overrides() {
        let config: Config = toml::from_str(
            r#"
            network = "mainnet"
            rpc_url = "http://localhost:8545"
            chain_id = 31337
            block_time_secs = 2
            "#,
        )
        .unwrap();

        let network = config.network_config();
        assert_eq!(network.chain_id, 31337);
        assert_eq!(network.block_time_secs, 2);
        assert_eq!(config.token_address(), NetworkConfig::mainnet().usdc);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config: Config = toml::from_str(
            r#"
            network = "testnet"
            rpc_url = "http://localhost:8545"
            poll_interval_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_unknown_network_rejected() {
        let result = toml::from_str::<Config>(
            r#"
            network = "goerli"
            rpc_url = "http://localhost:8545"
            "#,
        );
        assert!(result.is_err());
    }
}
