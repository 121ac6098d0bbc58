//! [`ChainClient`] over an alloy HTTP provider.

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use async_trait::async_trait;
use url::Url;

use super::{BlockSummary, ChainClient, Dialer};
use crate::LoadError;

/// A JSON-RPC connection backed by [`RootProvider`].
#[derive(Debug, Clone)]
pub struct AlloyClient {
    provider: RootProvider,
}

impl AlloyClient {
    /// Connects to `url` without any fillers; every field of a transfer is set explicitly.
    pub fn connect(url: Url) -> Self {
        let provider = ProviderBuilder::new().disable_recommended_fillers().connect_http(url);
        Self { provider }
    }
}

fn transport(err: impl std::fmt::Display) -> LoadError {
    LoadError::Transport(err.to_string())
}

#[async_trait]
impl ChainClient for AlloyClient {
    async fn pending_nonce(&self, address: Address) -> Result<u64, LoadError> {
        self.provider
            .get_transaction_count(address)
            .block_id(BlockNumberOrTag::Pending.into())
            .await
            .map_err(transport)
    }

    async fn balance(&self, address: Address) -> Result<U256, LoadError> {
        self.provider.get_balance(address).await.map_err(transport)
    }

    async fn gas_price(&self) -> Result<u128, LoadError> {
        self.provider.get_gas_price().await.map_err(transport)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, LoadError> {
        let pending = self.provider.send_raw_transaction(&raw).await.map_err(transport)?;
        Ok(*pending.tx_hash())
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<BlockSummary>, LoadError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await
            .map_err(transport)?;

        Ok(block.map(|block| BlockSummary {
            number: block.header.number,
            timestamp: block.header.timestamp,
            tx_count: block.transactions.len(),
        }))
    }
}

/// Dials a fresh [`AlloyClient`] to a fixed HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpDialer {
    url: Url,
}

impl HttpDialer {
    /// Validates `endpoint` and returns a dialer for it.
    pub fn new(endpoint: &str) -> Result<Self, LoadError> {
        let url = endpoint
            .parse::<Url>()
            .map_err(|e| LoadError::InvalidConfig(format!("invalid rpc url {endpoint}: {e}")))?;
        Ok(Self { url })
    }

    /// Endpoint this dialer connects to.
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl Dialer for HttpDialer {
    type Client = AlloyClient;

    fn dial(&self) -> Result<Self::Client, LoadError> {
        Ok(AlloyClient::connect(self.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialer_rejects_malformed_url() {
        let err = HttpDialer::new("not a url").unwrap_err();
        assert!(matches!(err, LoadError::InvalidConfig(_)));
    }

    #[test]
    fn dialer_keeps_endpoint() {
        let dialer = HttpDialer::new("http://localhost:9545").unwrap();
        assert_eq!(dialer.url().as_str(), "http://localhost:9545/");
        assert!(dialer.dial().is_ok());
    }
}
