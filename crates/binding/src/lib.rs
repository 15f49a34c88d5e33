//! Contract bindings for the token tracker.
//!
//! Only the ERC20 surface is needed: metadata, balance and allowance reads
//! plus `approve`. Bindings are generated using alloy's `sol!` macro.

pub mod token;
