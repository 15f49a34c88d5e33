//! Live view of a single ERC20 token for a connected account.
//!
//! The tracker binds a token contract to the current signer, keeps the token
//! metadata, the account balance and the allowance granted to a counterpart
//! address up to date as blocks arrive, and exposes one write: granting that
//! counterpart an unlimited allowance.
//!
//! Upstream inputs (signer, token address, spender address, block feed) are
//! injected as `tokio::sync::watch` receivers; consumers read an atomically
//! replaced [`TokenSnapshot`] through a [`TokenHandle`].

pub mod amount;
pub mod binder;
pub mod erc20;
pub mod error;
pub mod feed;
pub mod grant;
pub mod refresh;
pub mod snapshot;
pub mod tracker;

pub use amount::{format_units, Allowance};
pub use binder::{Binder, BindingKey, ContractBinding};
pub use erc20::{Erc20Contract, WalletSigner};
pub use error::TokenError;
pub use feed::{spawn_block_poller, BlockEvent, BlockFeed};
pub use grant::{grant_unlimited_allowance, GrantOutcome, SkipReason};
pub use refresh::refresh;
pub use snapshot::{TokenInfo, TokenSnapshot};
pub use tracker::{TokenHandle, TokenTracker, Upstream};

use alloy_primitives::{Address, TxHash, U256};
use std::future::Future;

/// Call transport for a token contract bound to a signer.
pub trait TokenContract: Send + Sync + 'static {
    /// Address of the token contract.
    fn address(&self) -> Address;

    fn symbol(&self) -> impl Future<Output = eyre::Result<String>> + Send;

    fn name(&self) -> impl Future<Output = eyre::Result<String>> + Send;

    fn decimals(&self) -> impl Future<Output = eyre::Result<u8>> + Send;

    /// Raw allowance granted by `owner` to `spender`.
    fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = eyre::Result<U256>> + Send;

    /// Raw balance of `owner`.
    fn balance_of(&self, owner: Address) -> impl Future<Output = eyre::Result<U256>> + Send;

    /// Set the allowance of `spender` to `amount`.
    ///
    /// Resolves once the transaction is mined. A reverted transaction is an error.
    fn approve(
        &self,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = eyre::Result<TxHash>> + Send;
}

/// The connected account a token contract is bound to.
pub trait Signer: Clone + Send + Sync + 'static {
    type Contract: TokenContract;

    /// Account address; owner for balance and allowance reads.
    fn address(&self) -> Address;

    fn chain_id(&self) -> u64;

    /// Bind the token at `token` to this signer.
    fn bind(&self, token: Address) -> Self::Contract;
}
