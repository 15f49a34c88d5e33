//! Reactive driver keeping a [`TokenSnapshot`] in sync with its inputs.
//!
//! Three reactions run on one task:
//! 1. signer or token address changed: rebind the contract when the
//!    [`BindingKey`] differs from the current one;
//! 2. binding replaced: reset the snapshot to unknown, then refresh once;
//! 3. block arrived: refresh without reset.
//!
//! Refreshes run concurrently. Each carries the generation of the binding it
//! was issued against and a sequence number; a result is applied only if its
//! binding is still current and nothing newer has been applied.

use crate::{
    refresh, Binder, BindingKey, BlockEvent, BlockFeed, ContractBinding, GrantOutcome, Signer,
    TokenContract, TokenError, TokenInfo, TokenSnapshot,
};
use alloy_primitives::Address;
use std::{future::Future, sync::Arc};
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        watch,
    },
    task::{JoinError, JoinSet},
};
use tracing::{debug, info, warn};

type SharedBinding<C> = Arc<ContractBinding<C>>;

/// Inputs owned by other components.
pub struct Upstream<S> {
    /// Connected account, absent until a wallet is connected
    pub signer: watch::Receiver<Option<S>>,
    /// Token to track
    pub token: watch::Receiver<Option<Address>>,
    /// Counterpart whose allowance is tracked and granted
    pub spender: watch::Receiver<Option<Address>>,
    /// Block-arrival stream
    pub blocks: watch::Receiver<Option<BlockFeed>>,
}

struct Refreshed {
    generation: u64,
    seq: u64,
    result: Result<TokenInfo, TokenError>,
}

enum Event {
    Shutdown,
    Identity,
    SignerClosed,
    TokenClosed,
    Feed,
    FeedClosed,
    Block(Result<BlockEvent, RecvError>),
    Refreshed(Result<Refreshed, JoinError>),
}

/// Owns the binding and the snapshot writer. Consumed by [`TokenTracker::run`].
pub struct TokenTracker<S: Signer> {
    upstream: Upstream<S>,
    binder: Binder,
    binding: Option<SharedBinding<S::Contract>>,
    binding_tx: watch::Sender<Option<SharedBinding<S::Contract>>>,
    snapshot_tx: watch::Sender<TokenSnapshot>,
    subscription: Option<broadcast::Receiver<BlockEvent>>,
    refreshes: JoinSet<Refreshed>,
    next_seq: u64,
    applied_seq: u64,
}

impl<S: Signer> TokenTracker<S> {
    pub fn new(upstream: Upstream<S>) -> (Self, TokenHandle<S::Contract>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(TokenSnapshot::default());
        let (binding_tx, binding_rx) = watch::channel(None);

        let handle = TokenHandle {
            snapshot: snapshot_rx,
            binding: binding_rx,
            spender: upstream.spender.clone(),
        };

        let tracker = Self {
            upstream,
            binder: Binder::new(),
            binding: None,
            binding_tx,
            snapshot_tx,
            subscription: None,
            refreshes: JoinSet::new(),
            next_seq: 0,
            applied_seq: 0,
        };

        (tracker, handle)
    }

    /// Run until `shutdown` resolves.
    ///
    /// On exit the block subscription is dropped and in-flight refreshes are
    /// aborted.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        let mut signer_open = true;
        let mut token_open = true;
        let mut feed_open = true;

        info!("Token tracker started");
        self.on_identity_change();

        loop {
            let event = tokio::select! {
                biased;

                _ = &mut shutdown => Event::Shutdown,
                res = self.upstream.signer.changed(), if signer_open => match res {
                    Ok(()) => Event::Identity,
                    Err(_) => Event::SignerClosed,
                },
                res = self.upstream.token.changed(), if token_open => match res {
                    Ok(()) => Event::Identity,
                    Err(_) => Event::TokenClosed,
                },
                res = self.upstream.blocks.changed(), if feed_open => match res {
                    Ok(()) => Event::Feed,
                    Err(_) => Event::FeedClosed,
                },
                res = next_block(&mut self.subscription) => Event::Block(res),
                Some(res) = self.refreshes.join_next() => Event::Refreshed(res),
            };

            match event {
                Event::Shutdown => break,
                Event::Identity => self.on_identity_change(),
                Event::SignerClosed => {
                    debug!("Signer source closed");
                    signer_open = false;
                }
                Event::TokenClosed => {
                    debug!("Token address source closed");
                    token_open = false;
                }
                Event::Feed => self.resubscribe(),
                Event::FeedClosed => {
                    debug!("Block feed source closed");
                    feed_open = false;
                }
                Event::Block(Ok(block)) => self.on_block(Some(block.number)),
                Event::Block(Err(RecvError::Lagged(skipped))) => {
                    debug!(skipped, "Block subscription lagged");
                    self.on_block(None);
                }
                Event::Block(Err(RecvError::Closed)) => {
                    debug!("Block feed closed");
                    self.subscription = None;
                }
                Event::Refreshed(res) => self.on_refreshed(res),
            }
        }

        self.subscription = None;
        self.refreshes.shutdown().await;
        info!("Token tracker stopped");
    }

    /// Rebind if the signer/token pair changed, then resubscribe to blocks.
    ///
    /// A missing signer or token keeps the current binding.
    fn on_identity_change(&mut self) {
        let signer = self.upstream.signer.borrow_and_update().clone();
        let token = *self.upstream.token.borrow_and_update();

        let rebind = match (&signer, token) {
            (Some(signer), Some(token)) => {
                let key = BindingKey::new(signer, token);
                (self.binding.as_ref().map(|b| b.key()) != Some(key))
                    .then(|| Arc::new(self.binder.bind(signer, token)))
            }
            _ => {
                debug!(
                    has_signer = signer.is_some(),
                    has_token = token.is_some(),
                    "Not ready to bind"
                );
                None
            }
        };

        match rebind {
            Some(binding) => self.adopt(binding),
            None => {
                self.snapshot_tx.send_if_modified(|snapshot| {
                    let changed = snapshot.token_address != token;
                    snapshot.token_address = token;
                    changed
                });
            }
        }

        self.resubscribe();
    }

    /// Make `binding` current: reset the snapshot in one write, then refresh.
    fn adopt(&mut self, binding: SharedBinding<S::Contract>) {
        info!(
            token = %binding.token(),
            owner = %binding.owner(),
            generation = binding.generation(),
            "Contract bound"
        );

        // The reset is visible before the binding it belongs to.
        self.snapshot_tx.send_replace(TokenSnapshot {
            bound: true,
            token_address: Some(binding.token()),
            info: None,
            last_error: None,
        });
        self.binding = Some(Arc::clone(&binding));
        self.binding_tx.send_replace(Some(Arc::clone(&binding)));

        self.spawn_refresh(binding);
    }

    /// Drop the current block subscription and subscribe to the current feed.
    fn resubscribe(&mut self) {
        self.subscription = None;
        let feed = self.upstream.blocks.borrow_and_update().clone();
        self.subscription = feed.map(|feed| feed.subscribe());
        debug!(
            subscribed = self.subscription.is_some(),
            "Block subscription reset"
        );
    }

    fn on_block(&mut self, number: Option<u64>) {
        let Some(binding) = self.binding.clone() else {
            return;
        };
        debug!(block = ?number, generation = binding.generation(), "Refreshing on new block");
        self.spawn_refresh(binding);
    }

    fn spawn_refresh(&mut self, binding: SharedBinding<S::Contract>) {
        let spender = *self.upstream.spender.borrow();
        self.next_seq += 1;
        let seq = self.next_seq;

        self.refreshes.spawn(async move {
            Refreshed {
                generation: binding.generation(),
                seq,
                result: refresh(&binding, spender).await,
            }
        });
    }

    fn on_refreshed(&mut self, joined: Result<Refreshed, JoinError>) {
        let done = match joined {
            Ok(done) => done,
            Err(e) => {
                warn!("Refresh task failed: {}", e);
                return;
            }
        };

        let current = self.binding.as_ref().map(|b| b.generation());
        if current != Some(done.generation) {
            debug!(
                generation = done.generation,
                current = ?current,
                "Discarding refresh of a replaced binding"
            );
            return;
        }
        if done.seq < self.applied_seq {
            debug!(seq = done.seq, "Discarding out-of-order refresh");
            return;
        }
        self.applied_seq = done.seq;

        match done.result {
            Ok(info) => {
                self.snapshot_tx.send_if_modified(|snapshot| {
                    if snapshot.info.as_ref() == Some(&info) && snapshot.last_error.is_none() {
                        return false;
                    }
                    snapshot.info = Some(info);
                    snapshot.last_error = None;
                    true
                });
            }
            Err(e) => {
                warn!(generation = done.generation, "Token refresh failed: {}", e);
                let reason = e.to_string();
                self.snapshot_tx.send_if_modified(|snapshot| {
                    if snapshot.last_error.as_deref() == Some(reason.as_str()) {
                        return false;
                    }
                    snapshot.last_error = Some(reason);
                    true
                });
            }
        }
    }
}

async fn next_block(
    subscription: &mut Option<broadcast::Receiver<BlockEvent>>,
) -> Result<BlockEvent, RecvError> {
    match subscription {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Consumer side of a [`TokenTracker`].
pub struct TokenHandle<C> {
    snapshot: watch::Receiver<TokenSnapshot>,
    binding: watch::Receiver<Option<SharedBinding<C>>>,
    spender: watch::Receiver<Option<Address>>,
}

impl<C> Clone for TokenHandle<C> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            binding: self.binding.clone(),
            spender: self.spender.clone(),
        }
    }
}

impl<C: TokenContract> TokenHandle<C> {
    /// Current snapshot.
    pub fn snapshot(&self) -> TokenSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<TokenSnapshot> {
        self.snapshot.clone()
    }

    /// Current contract binding, if any.
    pub fn binding(&self) -> Option<SharedBinding<C>> {
        self.binding.borrow().clone()
    }

    /// Grant the current spender an unlimited allowance with the bound signer.
    pub async fn grant_unlimited_allowance(&self) -> GrantOutcome {
        let binding = self.binding();
        let spender = *self.spender.borrow();
        crate::grant_unlimited_allowance(binding.as_deref(), spender).await
    }
}
