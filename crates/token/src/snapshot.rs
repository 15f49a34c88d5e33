use crate::Allowance;
use alloy_primitives::Address;
use serde::Serialize;

/// Token state produced by one successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Allowance granted by the owner to the spender
    pub allowance: Allowance,
    /// Owner balance as an exact decimal string
    pub balance: String,
}

/// Read-only view handed to consumers.
///
/// `info` and `last_error` always come from the same refresh of the current
/// binding. `token_address` follows upstream even while a missing signer keeps
/// an older binding in place, so it can name a token other than the one `info`
/// describes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenSnapshot {
    /// A contract binding exists
    pub bound: bool,
    /// Token address as last supplied upstream
    pub token_address: Option<Address>,
    /// `None` until the first refresh of the current binding completes
    pub info: Option<TokenInfo>,
    /// Reason the latest refresh of the current binding failed
    pub last_error: Option<String>,
}

impl TokenSnapshot {
    pub const fn is_ready(&self) -> bool {
        self.info.is_some()
    }
}
