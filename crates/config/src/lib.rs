//! Configuration types for the token tracker.
//!
//! This crate provides:
//! - Network presets (mainnet, testnet)
//! - Default token addresses per chain

pub mod network;

pub use network::{NetworkConfig, NetworkConfigBuilder, NetworkType};
