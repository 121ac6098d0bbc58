//! Signer identities derived from a mnemonic.

use alloy_primitives::{Address, B256};
use alloy_signer_local::{
    MnemonicBuilder, PrivateKeySigner,
    coins_bip39::{English, Mnemonic},
};
use coins_bip32::prelude::{Parent, SigningKey, XPriv};
use tracing::debug;

use crate::{DERIVATION_PATH_PREFIX, LoadError};

/// A derived address together with the key that signs for it.
#[derive(Debug, Clone)]
pub struct Identity {
    index: u32,
    address: Address,
    signer: PrivateKeySigner,
}

impl Identity {
    /// Wraps an existing signer under the given pool index.
    pub fn new(index: u32, signer: PrivateKeySigner) -> Self {
        Self { index, address: signer.address(), signer }
    }

    /// Derives the identity at `m/44'/60'/0'/0/{index}` from `mnemonic`.
    pub fn derive(mnemonic: &str, index: u32) -> Result<Self, LoadError> {
        let path = derivation_path(index);
        let signer = MnemonicBuilder::<English>::default()
            .phrase(mnemonic)
            .derivation_path(&path)
            .map_err(|e| LoadError::Derivation { path: path.clone(), reason: e.to_string() })?
            .build()
            .map_err(|e| LoadError::Derivation { path, reason: e.to_string() })?;
        Ok(Self::new(index, signer))
    }

    /// Builds an identity from a hex encoded private key, with or without `0x` prefix.
    pub fn from_private_key_hex(index: u32, key: &str) -> Result<Self, LoadError> {
        let bytes: B256 = key.trim().parse().map_err(|e| LoadError::InvalidKey(format!("{e}")))?;
        let signer =
            PrivateKeySigner::from_bytes(&bytes).map_err(|e| LoadError::InvalidKey(e.to_string()))?;
        Ok(Self::new(index, signer))
    }

    /// Position of this identity in its pool.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Address the identity signs for.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Signing capability of the identity.
    pub const fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Raw private key bytes. Only used for explicit key export.
    pub fn private_key(&self) -> B256 {
        B256::from_slice(self.signer.credential().to_bytes().as_slice())
    }
}

/// Returns the derivation path for the account at `index`.
pub fn derivation_path(index: u32) -> String {
    format!("{DERIVATION_PATH_PREFIX}{index}")
}

/// The extended key every pool account is a direct child of.
fn account_parent(mnemonic: &str) -> Result<XPriv, LoadError> {
    let path = DERIVATION_PATH_PREFIX.trim_end_matches('/');
    let derivation = |reason: String| LoadError::Derivation { path: path.to_string(), reason };
    Mnemonic::<English>::new_from_phrase(mnemonic)
        .and_then(|m| m.master_key(None))
        .map_err(|e| derivation(e.to_string()))?
        .derive_path(path)
        .map_err(|e| derivation(e.to_string()))
}

fn child_signer(child: &XPriv, index: u32) -> Result<PrivateKeySigner, LoadError> {
    let key: &SigningKey = child.as_ref();
    PrivateKeySigner::from_bytes(&B256::from_slice(&key.to_bytes()))
        .map_err(|e| LoadError::Derivation { path: derivation_path(index), reason: e.to_string() })
}

/// An ordered set of identities derived from a single mnemonic.
#[derive(Debug, Clone, Default)]
pub struct IdentityPool {
    identities: Vec<Identity>,
}

impl IdentityPool {
    /// Derives identities `0..count`.
    pub fn derive(mnemonic: &str, count: u32) -> Result<Self, LoadError> {
        Self::derive_range(mnemonic, 0, count)
    }

    /// Derives identities `start..start + count`.
    ///
    /// The seed and the `m/44'/60'/0'/0` parent key are computed once, each identity is a
    /// single child step from there.
    pub fn derive_range(mnemonic: &str, start: u32, count: u32) -> Result<Self, LoadError> {
        let end = start.checked_add(count).ok_or_else(|| {
            LoadError::InvalidConfig(format!("identity range {start}+{count} overflows"))
        })?;
        if count == 0 {
            return Ok(Self::default());
        }

        let parent = account_parent(mnemonic)?;
        let identities = (start..end)
            .map(|index| {
                let child = parent.derive_child(index).map_err(|e| LoadError::Derivation {
                    path: derivation_path(index),
                    reason: e.to_string(),
                })?;
                Ok(Identity::new(index, child_signer(&child, index)?))
            })
            .collect::<Result<Vec<_>, LoadError>>()?;
        debug!(start, count, "Derived identity pool");
        Ok(Self { identities })
    }

    /// Number of identities in the pool.
    pub const fn len(&self) -> usize {
        self.identities.len()
    }

    /// Returns `true` if the pool holds no identities.
    pub const fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Iterates the identities in derivation order.
    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    /// Addresses of every identity, in derivation order.
    pub fn addresses(&self) -> Vec<Address> {
        self.identities.iter().map(Identity::address).collect()
    }

    /// Consumes the pool, handing out the identities.
    pub fn into_identities(self) -> Vec<Identity> {
        self.identities
    }
}

impl IntoIterator for IdentityPool {
    type Item = Identity;
    type IntoIter = std::vec::IntoIter<Identity>;

    fn into_iter(self) -> Self::IntoIter {
        self.identities.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use rstest::rstest;

    use super::*;
    use crate::{DEFAULT_FAUCET_KEY, DEFAULT_MNEMONIC};

    const ANVIL_MNEMONIC: &str = "test test test test test test test test test test test junk";

    #[rstest]
    #[case::first(0, address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"))]
    #[case::second(1, address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"))]
    #[case::third(2, address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"))]
    fn derives_known_addresses(#[case] index: u32, #[case] expected: Address) {
        let identity = Identity::derive(ANVIL_MNEMONIC, index).unwrap();
        assert_eq!(identity.address(), expected);
        assert_eq!(identity.index(), index);
    }

    #[test]
    fn faucet_key_matches_first_anvil_account() {
        let faucet = Identity::from_private_key_hex(0, DEFAULT_FAUCET_KEY).unwrap();
        let derived = Identity::derive(ANVIL_MNEMONIC, 0).unwrap();
        assert_eq!(faucet.address(), derived.address());
        assert_eq!(faucet.private_key(), derived.private_key());
    }

    #[test]
    fn hex_key_accepts_prefix() {
        let plain = Identity::from_private_key_hex(0, DEFAULT_FAUCET_KEY).unwrap();
        let prefixed = Identity::from_private_key_hex(0, &format!("0x{DEFAULT_FAUCET_KEY}")).unwrap();
        assert_eq!(plain.address(), prefixed.address());
    }

    #[test]
    fn invalid_key_is_rejected() {
        let err = Identity::from_private_key_hex(0, "0xzz").unwrap_err();
        assert!(matches!(err, LoadError::InvalidKey(_)));
    }

    #[test]
    fn invalid_mnemonic_is_a_derivation_error() {
        let err = IdentityPool::derive("definitely not a valid mnemonic phrase", 1).unwrap_err();
        assert!(matches!(err, LoadError::Derivation { .. }));
    }

    #[test]
    fn rederiving_yields_identical_addresses() {
        let first = IdentityPool::derive(DEFAULT_MNEMONIC, 4).unwrap();
        let second = IdentityPool::derive(DEFAULT_MNEMONIC, 4).unwrap();
        assert_eq!(first.addresses(), second.addresses());
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn range_matches_full_pool_slice() {
        let full = IdentityPool::derive(ANVIL_MNEMONIC, 4).unwrap();
        let shard = IdentityPool::derive_range(ANVIL_MNEMONIC, 2, 2).unwrap();
        assert_eq!(shard.addresses(), full.addresses()[2..].to_vec());
        let indices: Vec<_> = shard.iter().map(Identity::index).collect();
        assert_eq!(indices, vec![2, 3]);
    }

    #[test]
    fn pool_derivation_matches_per_index_derivation() {
        let pool = IdentityPool::derive_range(DEFAULT_MNEMONIC, 5, 3).unwrap();
        for identity in pool.iter() {
            let single = Identity::derive(DEFAULT_MNEMONIC, identity.index()).unwrap();
            assert_eq!(identity.address(), single.address());
            assert_eq!(identity.private_key(), single.private_key());
        }
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn empty_range_skips_derivation() {
        let pool = IdentityPool::derive_range("not even a mnemonic", 3, 0).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn derivation_path_pattern() {
        assert_eq!(derivation_path(17), "m/44'/60'/0'/0/17");
    }
}
