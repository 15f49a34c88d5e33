use thiserror::Error;

/// Failure of a single refresh cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No counterpart address is known, so the allowance cannot be read.
    #[error("spender address is not set")]
    MissingSpender,

    /// A contract read failed.
    #[error("failed to read {call}: {reason}")]
    Read {
        /// Contract call that failed
        call: &'static str,
        /// Transport or revert message
        reason: String,
    },

    /// The token reports more decimals than a 256-bit amount can be scaled by.
    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(u8),
}

impl TokenError {
    pub(crate) fn read(call: &'static str, error: eyre::Report) -> Self {
        Self::Read {
            call,
            reason: format!("{error:#}"),
        }
    }
}
