//! [`TokenContract`] and [`Signer`] over an alloy provider.

use crate::{Signer, TokenContract};
use ::binding::token::IERC20;
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::Provider;
use eyre::Result;
use tracing::debug;

/// ERC20 contract reached through `P`.
///
/// Writes are signed by whatever wallet `P` carries.
pub struct Erc20Contract<P> {
    inner: IERC20::IERC20Instance<P>,
}

impl<P> Erc20Contract<P>
where
    P: Provider + Clone,
{
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            inner: IERC20::new(address, provider),
        }
    }
}

impl<P> TokenContract for Erc20Contract<P>
where
    P: Provider + Clone + 'static,
{
    fn address(&self) -> Address {
        *self.inner.address()
    }

    async fn symbol(&self) -> Result<String> {
        Ok(self.inner.symbol().call().await?)
    }

    async fn name(&self) -> Result<String> {
        Ok(self.inner.name().call().await?)
    }

    async fn decimals(&self) -> Result<u8> {
        Ok(self.inner.decimals().call().await?)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        Ok(self.inner.allowance(owner, spender).call().await?)
    }

    async fn balance_of(&self, owner: Address) -> Result<U256> {
        Ok(self.inner.balanceOf(owner).call().await?)
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<TxHash> {
        let pending_tx = self.inner.approve(spender, amount).send().await?;

        let tx_hash = *pending_tx.tx_hash();
        debug!("Approval sent: token={}, tx={}", self.address(), tx_hash);

        // Wait for confirmation
        let receipt = pending_tx.get_receipt().await?;

        if !receipt.status() {
            eyre::bail!("Approval transaction {} reverted", tx_hash);
        }

        Ok(tx_hash)
    }
}

/// A wallet-enabled provider together with the account it signs for.
#[derive(Debug, Clone)]
pub struct WalletSigner<P> {
    provider: P,
    address: Address,
    chain_id: u64,
}

impl<P> WalletSigner<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, address: Address, chain_id: u64) -> Self {
        Self {
            provider,
            address,
            chain_id,
        }
    }

    /// Build a signer, asking the node for its chain id.
    pub async fn connect(provider: P, address: Address) -> Result<Self> {
        let chain_id = provider.get_chain_id().await?;
        Ok(Self::new(provider, address, chain_id))
    }
}

impl<P> Signer for WalletSigner<P>
where
    P: Provider + Clone + 'static,
{
    type Contract = Erc20Contract<P>;

    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn bind(&self, token: Address) -> Erc20Contract<P> {
        Erc20Contract::new(token, self.provider.clone())
    }
}
