//! Binding a token contract to the connected signer.

use crate::Signer;
use alloy_primitives::Address;
use serde::Serialize;
use tracing::debug;

/// Inputs a binding is derived from.
///
/// Two bindings with equal keys are interchangeable, so a rebind only happens
/// when the key changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BindingKey {
    pub chain_id: u64,
    pub owner: Address,
    pub token: Address,
}

impl BindingKey {
    pub fn new<S: Signer>(signer: &S, token: Address) -> Self {
        Self {
            chain_id: signer.chain_id(),
            owner: signer.address(),
            token,
        }
    }
}

/// A token contract bound to a specific signer.
///
/// Never mutated; a change of signer or token produces a new binding with a
/// higher generation.
pub struct ContractBinding<C> {
    key: BindingKey,
    generation: u64,
    contract: C,
}

impl<C> ContractBinding<C> {
    pub const fn key(&self) -> BindingKey {
        self.key
    }

    pub const fn token(&self) -> Address {
        self.key.token
    }

    pub const fn owner(&self) -> Address {
        self.key.owner
    }

    /// Stamp used to recognise results that belong to a replaced binding.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn contract(&self) -> &C {
        &self.contract
    }
}

/// Produces bindings with strictly increasing generations.
#[derive(Debug)]
pub struct Binder {
    next_generation: u64,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    pub const fn new() -> Self {
        Self { next_generation: 1 }
    }

    pub fn bind<S: Signer>(&mut self, signer: &S, token: Address) -> ContractBinding<S::Contract> {
        let key = BindingKey::new(signer, token);
        let generation = self.next_generation;
        self.next_generation += 1;

        debug!(
            "Binding token {} to signer {} (chain {}, generation {})",
            key.token, key.owner, key.chain_id, generation
        );

        ContractBinding {
            key,
            generation,
            contract: signer.bind(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{MockChain, MockSigner, DAI, OWNER, USDC},
        TokenContract,
    };

    #[test]
    fn test_bind_uses_signer_and_token() {
        let signer = MockSigner::new(MockChain::default());
        let binding = Binder::new().bind(&signer, USDC);

        assert_eq!(binding.token(), USDC);
        assert_eq!(binding.owner(), OWNER);
        assert_eq!(binding.contract().address(), USDC);
    }

    #[test]
    fn test_generations_increase() {
        let signer = MockSigner::new(MockChain::default());
        let mut binder = Binder::new();

        let first = binder.bind(&signer, USDC);
        let second = binder.bind(&signer, USDC);

        assert!(second.generation() > first.generation());
        assert_eq!(first.key(), second.key());
    }

    #[test]
    fn test_key_compares_by_value() {
        let chain = MockChain::default();
        let signer = MockSigner::new(chain.clone());
        let same_identity = MockSigner::new(chain);

        assert_eq!(
            BindingKey::new(&signer, USDC),
            BindingKey::new(&same_identity, USDC)
        );
        assert_ne!(BindingKey::new(&signer, USDC), BindingKey::new(&signer, DAI));

        let other = MockSigner {
            address: Address::repeat_byte(0x33),
            ..signer.clone()
        };
        assert_ne!(BindingKey::new(&signer, USDC), BindingKey::new(&other, USDC));
    }
}
