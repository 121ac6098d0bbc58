//! Local nonce sequencing for a single identity.

use alloy_primitives::Address;
use tracing::debug;

use crate::{ChainClient, LoadError};

/// Hands out gap-free nonces for one identity after a single chain query.
///
/// The tracker is owned by exactly one worker and advanced through `&mut self`, so two
/// streams can never draw from the same sequence.
#[derive(Debug)]
pub struct NonceTracker {
    address: Address,
    primed: u64,
    next: u64,
}

impl NonceTracker {
    /// Reads the pending nonce of `address` once. Later nonces never touch the chain.
    pub async fn prime<C: ChainClient + ?Sized>(
        client: &C,
        address: Address,
    ) -> Result<Self, LoadError> {
        let nonce = client
            .pending_nonce(address)
            .await
            .map_err(|e| LoadError::NonceQuery { address, reason: e.to_string() })?;
        debug!(%address, nonce, "Primed nonce tracker");
        Ok(Self::starting_at(address, nonce))
    }

    /// Creates a tracker whose first nonce is `nonce`.
    pub const fn starting_at(address: Address, nonce: u64) -> Self {
        Self { address, primed: nonce, next: nonce }
    }

    /// Address the nonces belong to.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Nonce the next call to [`NonceTracker::next`] returns.
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Returns the current nonce and advances the sequence.
    ///
    /// `u64::MAX` is never handed out, no transaction may carry it (EIP-2681).
    pub fn next(&mut self) -> Result<u64, LoadError> {
        let nonce = self.next;
        self.next =
            nonce.checked_add(1).ok_or(LoadError::NonceExhausted { address: self.address })?;
        Ok(nonce)
    }

    /// Number of nonces handed out since priming.
    pub const fn issued(&self) -> u64 {
        self.next - self.primed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryChain;

    #[tokio::test]
    async fn primed_value_starts_the_sequence() {
        let address = Address::repeat_byte(0x05);
        let chain = InMemoryChain::new().with_nonce(address, 5);

        let mut tracker = NonceTracker::prime(&chain, address).await.unwrap();
        assert_eq!(tracker.peek(), 5);
        let issued: Vec<_> = (0..4).map(|_| tracker.next().unwrap()).collect();
        assert_eq!(issued, vec![5, 6, 7, 8]);
        assert_eq!(tracker.issued(), 4);
        assert_eq!(tracker.address(), address);
    }

    #[tokio::test]
    async fn failed_query_is_a_nonce_error() {
        let address = Address::repeat_byte(0x06);
        let chain = InMemoryChain::new().with_nonce_failure(address);

        let err = NonceTracker::prime(&chain, address).await.unwrap_err();
        assert!(matches!(err, LoadError::NonceQuery { address: a, .. } if a == address));
    }

    #[test]
    fn peek_does_not_advance() {
        let mut tracker = NonceTracker::starting_at(Address::ZERO, 0);
        assert_eq!(tracker.peek(), 0);
        assert_eq!(tracker.peek(), 0);
        assert_eq!(tracker.next().unwrap(), 0);
        assert_eq!(tracker.peek(), 1);
    }

    #[test]
    fn sequence_stops_before_u64_max() {
        let address = Address::repeat_byte(0x07);
        let mut tracker = NonceTracker::starting_at(address, u64::MAX - 1);
        assert_eq!(tracker.next().unwrap(), u64::MAX - 1);

        let err = tracker.next().unwrap_err();
        assert!(matches!(err, LoadError::NonceExhausted { address: a } if a == address));
        assert_eq!(tracker.peek(), u64::MAX);
        assert_eq!(tracker.issued(), 1);
    }
}
