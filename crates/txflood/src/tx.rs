//! Construction and signing of plain value transfers.

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, B256, Bytes, TxKind, U256};
use alloy_signer::SignerSync;

use crate::{Identity, LoadError};

/// Everything needed to build one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    /// Sender address; must match the signing identity.
    pub from: Address,
    /// Recipient address.
    pub to: Address,
    /// Transferred value in wei.
    pub amount: U256,
    /// Sender nonce.
    pub nonce: u64,
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Chain id used for replay protection.
    pub chain_id: u64,
}

/// A signed transfer ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransfer {
    /// Transaction hash.
    pub hash: B256,
    /// Nonce the transfer was signed with.
    pub nonce: u64,
    /// EIP-2718 encoded bytes.
    pub raw: Bytes,
}

/// Turns [`TransferRequest`]s into signed, encoded transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionBuilder;

impl TransactionBuilder {
    /// Builds the unsigned replay-protected legacy transaction for `req`.
    pub fn build(req: &TransferRequest) -> TxLegacy {
        TxLegacy {
            chain_id: Some(req.chain_id),
            nonce: req.nonce,
            gas_price: req.gas_price,
            gas_limit: req.gas_limit,
            to: TxKind::Call(req.to),
            value: req.amount,
            input: Bytes::new(),
        }
    }

    /// Signs `tx` with the key of `identity`.
    pub fn sign(tx: TxLegacy, identity: &Identity) -> Result<SignedTransfer, LoadError> {
        let nonce = tx.nonce;
        if tx.gas_limit == 0 {
            return Err(LoadError::Signing { nonce, reason: "gas limit is zero".into() });
        }
        if tx.chain_id.is_none_or(|id| id == 0) {
            return Err(LoadError::Signing { nonce, reason: "missing chain id".into() });
        }

        let signature = identity
            .signer()
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| LoadError::Signing { nonce, reason: e.to_string() })?;
        let signed = tx.into_signed(signature);
        let hash = *signed.hash();
        let raw: Bytes = TxEnvelope::from(signed).encoded_2718().into();

        Ok(SignedTransfer { hash, nonce, raw })
    }

    /// Builds and signs `req`, checking that `identity` owns the sender address.
    pub fn build_signed(
        req: &TransferRequest,
        identity: &Identity,
    ) -> Result<SignedTransfer, LoadError> {
        if req.from != identity.address() {
            return Err(LoadError::Signing {
                nonce: req.nonce,
                reason: format!("sender {} is not signed for by {}", req.from, identity.address()),
            });
        }
        Self::sign(Self::build(req), identity)
    }
}
