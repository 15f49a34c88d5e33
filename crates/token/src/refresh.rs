//! The refresh routine: one full read of the tracked token.

use crate::{format_units, Allowance, ContractBinding, TokenContract, TokenError, TokenInfo};
use alloy_primitives::Address;
use tracing::debug;

/// Read symbol, name, decimals, allowance and balance, in that order.
///
/// The result is all-or-nothing: any failed read fails the whole refresh so
/// callers never publish a partially updated [`TokenInfo`].
pub async fn refresh<C: TokenContract>(
    binding: &ContractBinding<C>,
    spender: Option<Address>,
) -> Result<TokenInfo, TokenError> {
    let spender = spender.ok_or(TokenError::MissingSpender)?;
    let contract = binding.contract();
    let owner = binding.owner();

    debug!(
        "Refreshing token {}: owner={}, spender={}, generation={}",
        binding.token(),
        owner,
        spender,
        binding.generation()
    );

    let symbol = contract
        .symbol()
        .await
        .map_err(|e| TokenError::read("symbol", e))?;
    let name = contract
        .name()
        .await
        .map_err(|e| TokenError::read("name", e))?;
    let decimals = contract
        .decimals()
        .await
        .map_err(|e| TokenError::read("decimals", e))?;
    let allowance = contract
        .allowance(owner, spender)
        .await
        .map_err(|e| TokenError::read("allowance", e))?;
    let balance = contract
        .balance_of(owner)
        .await
        .map_err(|e| TokenError::read("balanceOf", e))?;

    Ok(TokenInfo {
        symbol,
        name,
        decimals,
        allowance: Allowance::from_raw(allowance, decimals)?,
        balance: format_units(balance, decimals)?,
    })
}
