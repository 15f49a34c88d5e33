//! Block-arrival notifications.

use alloy_provider::Provider;
use serde::Serialize;
use std::time::Duration;
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

/// A newly observed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockEvent {
    pub number: u64,
}

/// Fan-out of block events to any number of subscribers.
///
/// Dropping the receiver returned by [`BlockFeed::subscribe`] unsubscribes.
#[derive(Debug, Clone)]
pub struct BlockFeed {
    sender: broadcast::Sender<BlockEvent>,
}

impl BlockFeed {
    /// Create a feed buffering up to `capacity` events per slow subscriber.
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Deliver `event` to every subscriber. Returns how many received it.
    pub fn publish(&self, event: BlockEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BlockEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BlockFeed {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Poll the chain head every `interval` and publish each new height once.
///
/// Failed polls are logged and retried on the next tick.
pub fn spawn_block_poller<P>(provider: P, feed: BlockFeed, interval: Duration) -> JoinHandle<()>
where
    P: Provider + Clone + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_seen: Option<u64> = None;

        loop {
            ticker.tick().await;

            match provider.get_block_number().await {
                Ok(number) if last_seen.is_none_or(|last| number > last) => {
                    last_seen = Some(number);
                    let delivered = feed.publish(BlockEvent { number });
                    debug!(block = number, subscribers = delivered, "New block");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to poll block number: {}", e);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let feed = BlockFeed::default();
        assert_eq!(feed.publish(BlockEvent { number: 1 }), 0);
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let feed = BlockFeed::default();
        let mut rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        assert_eq!(feed.publish(BlockEvent { number: 7 }), 1);
        assert_eq!(rx.recv().await.unwrap(), BlockEvent { number: 7 });

        drop(rx);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let feed = BlockFeed::default();
        let _rx = feed.clone().subscribe();
        assert_eq!(feed.subscriber_count(), 1);
        assert_eq!(BlockFeed::default().subscriber_count(), 0);
    }
}
