//! Granting the counterpart an unlimited allowance.

use crate::{ContractBinding, TokenContract};
use alloy_primitives::{Address, TxHash, U256};
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info};

/// Why a grant was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// No contract binding (signer or token address missing)
    Unbound,
    /// No counterpart address
    NoSpender,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => f.write_str("no token contract is bound"),
            Self::NoSpender => f.write_str("spender address is not set"),
        }
    }
}

/// Result of an allowance grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GrantOutcome {
    /// Approval transaction mined successfully.
    Submitted {
        /// Transaction hash
        tx_hash: TxHash,
    },
    /// Nothing was sent.
    Skipped(SkipReason),
    /// The approval was rejected, reverted or could not be sent.
    Failed {
        /// Error message
        reason: String,
    },
}

impl GrantOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::Skipped(_) => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Set the spender's allowance to `U256::MAX` using the bound signer.
///
/// Never fails: errors are logged and reported as [`GrantOutcome::Failed`].
/// The tracked allowance is not touched; it catches up on the next refresh.
pub async fn grant_unlimited_allowance<C: TokenContract>(
    binding: Option<&ContractBinding<C>>,
    spender: Option<Address>,
) -> GrantOutcome {
    let Some(binding) = binding else {
        debug!("Skipping allowance grant: no contract bound");
        return GrantOutcome::Skipped(SkipReason::Unbound);
    };
    let Some(spender) = spender else {
        debug!("Skipping allowance grant: no spender");
        return GrantOutcome::Skipped(SkipReason::NoSpender);
    };

    info!(
        token = %binding.token(),
        owner = %binding.owner(),
        %spender,
        "Granting unlimited allowance"
    );

    match binding.contract().approve(spender, U256::MAX).await {
        Ok(tx_hash) => {
            info!(%tx_hash, "Allowance granted");
            GrantOutcome::Submitted { tx_hash }
        }
        Err(e) => {
            error!("Allowance grant failed: {:#}", e);
            GrantOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
