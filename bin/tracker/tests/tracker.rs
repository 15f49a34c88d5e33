//! Integration tests against a live RPC endpoint.
//!
//! These tests require `tests/test-config.toml` and a private key (see `setup.rs`).
//!
//! Run with:
//! ```bash
//! cargo test --package tracker --test tracker -- --ignored
//! ```

#[path = "setup.rs"]
mod setup;

use setup::{load_private_key, load_test_config};
use std::time::Duration;
use token::{Signer as _, WalletSigner};
use tracker::Session;

const TIMEOUT: Duration = Duration::from_secs(60);

async fn start_session() -> Option<Session<impl alloy_provider::Provider + Clone + 'static>> {
    let config = load_test_config();
    let private_key = load_private_key()?;

    let key = client::local_signer(&private_key).expect("Invalid private key");
    let owner = key.address();
    let provider =
        client::create_wallet_provider(&config.rpc_url, key).expect("Failed to create provider");
    let signer = WalletSigner::connect(provider.clone(), owner)
        .await
        .expect("Failed to query chain id");

    assert_eq!(signer.chain_id(), config.network_config().chain_id);

    Some(Session::start(signer, provider, &config))
}

#[tokio::test]
#[ignore = "requires a live RPC endpoint and a funded test key"]
async fn test_show_token_state() {
    let Some(session) = start_session().await else {
        return;
    };

    let snapshot = session
        .wait_settled(TIMEOUT)
        .await
        .expect("Token state never settled");

    println!("✓ Token state: {:?}", snapshot);

    assert!(snapshot.bound);
    assert!(snapshot.last_error.is_none());
    let info = snapshot.info.expect("missing token info");
    assert_eq!(info.symbol, "USDC");
    assert_eq!(info.decimals, 6);

    session.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a live RPC endpoint and a funded test key"]
async fn test_block_feed_is_subscribed() {
    let Some(session) = start_session().await else {
        return;
    };

    session
        .wait_settled(TIMEOUT)
        .await
        .expect("Token state never settled");

    let feed = session.feed().expect("block feed missing");
    assert_eq!(feed.subscriber_count(), 1);

    session.shutdown().await;
    assert_eq!(feed.subscriber_count(), 0);
}
