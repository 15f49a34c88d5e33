pub mod config;
pub mod metrics;

use crate::{config::Config, metrics::Metrics};
use alloy_primitives::Address;
use alloy_provider::Provider;
use std::{future::Future, time::Duration};
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time,
};
use token::{
    spawn_block_poller, BlockFeed, Erc20Contract, TokenHandle, TokenSnapshot, TokenTracker,
    Upstream, WalletSigner,
};
use tracing::{info, warn};

/// A running tracker together with the upstream sources feeding it.
pub struct Session<P>
where
    P: Provider + Clone + 'static,
{
    handle: TokenHandle<Erc20Contract<P>>,
    signer_tx: watch::Sender<Option<WalletSigner<P>>>,
    token_tx: watch::Sender<Option<Address>>,
    spender_tx: watch::Sender<Option<Address>>,
    blocks_tx: watch::Sender<Option<BlockFeed>>,
    poller: JoinHandle<()>,
    tracker: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl<P> Session<P>
where
    P: Provider + Clone + 'static,
{
    /// Start polling blocks through `reader` and tracking the configured token.
    pub fn start<R>(signer: WalletSigner<P>, reader: R, config: &Config) -> Self
    where
        R: Provider + Clone + 'static,
    {
        let feed = BlockFeed::default();
        let poller = spawn_block_poller(reader, feed.clone(), config.poll_interval());

        let (signer_tx, signer) = watch::channel(Some(signer));
        let (token_tx, token) = watch::channel(Some(config.token_address()));
        let (spender_tx, spender) = watch::channel(config.spender_address);
        let (blocks_tx, blocks) = watch::channel(Some(feed));

        let (tracker, handle) = TokenTracker::new(Upstream {
            signer,
            token,
            spender,
            blocks,
        });
        let (stop, stop_rx) = oneshot::channel::<()>();
        let tracker = tokio::spawn(tracker.run(async move {
            let _ = stop_rx.await;
        }));

        Self {
            handle,
            signer_tx,
            token_tx,
            spender_tx,
            blocks_tx,
            poller,
            tracker,
            stop,
        }
    }

    pub const fn handle(&self) -> &TokenHandle<Erc20Contract<P>> {
        &self.handle
    }

    /// Replace the connected account. `None` keeps the current binding.
    pub fn set_signer(&self, signer: Option<WalletSigner<P>>) {
        self.signer_tx.send_replace(signer);
    }

    /// Switch the tracked token.
    pub fn set_token(&self, token: Option<Address>) {
        self.token_tx.send_replace(token);
    }

    /// Switch the counterpart whose allowance is tracked and granted.
    pub fn set_spender(&self, spender: Option<Address>) {
        self.spender_tx.send_replace(spender);
    }

    /// Block feed the tracker is subscribed to.
    pub fn feed(&self) -> Option<BlockFeed> {
        self.blocks_tx.borrow().clone()
    }

    /// Wait until the current binding has been refreshed, successfully or not.
    pub async fn wait_settled(&self, timeout: Duration) -> eyre::Result<TokenSnapshot> {
        self.wait_until(timeout, |s| s.is_ready() || s.last_error.is_some())
            .await
    }

    /// Wait until a contract is bound.
    pub async fn wait_bound(&self, timeout: Duration) -> eyre::Result<TokenSnapshot> {
        self.wait_until(timeout, |s| s.bound).await
    }

    async fn wait_until(
        &self,
        timeout: Duration,
        f: impl FnMut(&TokenSnapshot) -> bool,
    ) -> eyre::Result<TokenSnapshot> {
        let mut rx = self.handle.subscribe();
        let snapshot = time::timeout(timeout, rx.wait_for(f))
            .await
            .map_err(|_| eyre::eyre!("Timed out after {:?} waiting for token state", timeout))??;
        Ok(snapshot.clone())
    }

    /// Stop the tracker and the block poller.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.tracker.await {
            warn!("Tracker task ended abnormally: {}", e);
        }
        self.poller.abort();
    }
}

/// Log and record every snapshot change until `shutdown` resolves.
pub async fn watch_snapshots<C, F>(
    handle: &TokenHandle<C>,
    metrics: &Metrics,
    shutdown: F,
) -> eyre::Result<()>
where
    C: token::TokenContract,
    F: Future<Output = ()>,
{
    let mut rx = handle.subscribe();
    let mut shutdown = std::pin::pin!(shutdown);

    let snapshot = rx.borrow_and_update().clone();
    log_snapshot(&snapshot);

    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            changed = rx.changed() => {
                changed?;
                let snapshot = rx.borrow_and_update().clone();
                log_snapshot(&snapshot);
                metrics.record_snapshot(&snapshot);
            }
        }
    }
}

pub fn log_snapshot(snapshot: &TokenSnapshot) {
    match (&snapshot.info, &snapshot.last_error) {
        (_, Some(error)) => {
            warn!(token = ?snapshot.token_address, "Token state unavailable: {}", error);
        }
        (Some(info), None) => {
            info!(
                symbol = %info.symbol,
                balance = %info.balance,
                allowance = %info.allowance,
                "Token state updated"
            );
        }
        (None, None) if snapshot.bound => {
            info!(token = ?snapshot.token_address, "Contract bound, waiting for first refresh");
        }
        (None, None) => info!("Waiting for signer and token address"),
    }
}
