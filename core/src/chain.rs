use alloy::{
    consensus::Transaction,
    network::TransactionResponse,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::Block,
};
use async_trait::async_trait;
use url::Url;

use crate::{ens, units};

/// A mined block with hydrated transactions, reduced to the fields the
/// search and scan paths read.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainBlock {
    pub height: u64,
    pub timestamp: u64,
    pub transactions: Vec<ChainTx>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChainTx {
    pub hash: TxHash,
    pub from: Address,
    /// None for contract-creation transactions.
    pub to: Option<Address>,
    pub value_wei: U256,
}

/// Chain access for the locator, scanner and name cache. One implementor
/// talks JSON-RPC; tests substitute an in-memory chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Block at the given height with full transactions, or None if the
    /// node has no block there. Absence is a normal outcome, not an error.
    async fn get_block(&self, height: u64) -> crate::Result<Option<ChainBlock>>;

    /// Current best block height.
    async fn get_head_height(&self) -> crate::Result<u64>;

    /// Balance of the address at the given height, as a decimal ether
    /// string.
    async fn get_balance_at(&self, address: Address, height: u64) -> crate::Result<String>;

    /// Reverse ENS name of the address, if a verified record exists.
    async fn reverse_lookup(&self, address: Address) -> crate::Result<Option<String>>;
}

/// `ChainClient` over an HTTP JSON-RPC endpoint.
pub struct RpcChainClient {
    provider: DynProvider,
    ens_registry: Address,
}

impl RpcChainClient {
    pub fn new(rpc_url: Url, ens_registry: Address) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        Self {
            provider,
            ens_registry,
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_block(&self, height: u64) -> crate::Result<Option<ChainBlock>> {
        let block = self
            .provider
            .get_block_by_number(height.into())
            .full()
            .await?;
        Ok(block.map(convert_block))
    }

    async fn get_head_height(&self) -> crate::Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn get_balance_at(&self, address: Address, height: u64) -> crate::Result<String> {
        let wei = self
            .provider
            .get_balance(address)
            .block_id(height.into())
            .await?;
        units::format_wei(wei)
    }

    async fn reverse_lookup(&self, address: Address) -> crate::Result<Option<String>> {
        ens::reverse_lookup(&self.provider, self.ens_registry, address).await
    }
}

fn convert_block(block: Block) -> ChainBlock {
    let height = block.header.number;
    let timestamp = block.header.timestamp;
    let transactions = block
        .transactions
        .into_transactions()
        .map(|tx| ChainTx {
            hash: tx.tx_hash(),
            from: tx.from(),
            to: tx.to(),
            value_wei: tx.value(),
        })
        .collect();
    ChainBlock {
        height,
        timestamp,
        transactions,
    }
}

pub trait StringExt {
    fn parse_as_address(&self) -> crate::Result<Address>;
}

impl StringExt for str {
    fn parse_as_address(&self) -> crate::Result<Address> {
        self.parse::<Address>()
            .map_err(|_| crate::Error::InvalidAddress(self.to_string()))
    }
}

impl StringExt for String {
    fn parse_as_address(&self) -> crate::Result<Address> {
        self.as_str().parse_as_address()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_as_address_any_case() {
        let lower = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045"
            .parse_as_address()
            .unwrap();
        let upper = "0xD8DA6BF26964AF9D7EED9E03E53415D37AA96045"
            .parse_as_address()
            .unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_parse_as_address_rejects_malformed() {
        assert!("0x123".parse_as_address().is_err());
        assert!("d8da6bf26964af9d7eed9e03e53415d37aa9604".parse_as_address().is_err());
        assert!("0xzzda6bf26964af9d7eed9e03e53415d37aa96045"
            .parse_as_address()
            .is_err());
    }

    #[test]
    fn test_convert_block_without_transactions() {
        let converted = convert_block(Block::default());
        assert_eq!(converted.height, 0);
        assert_eq!(converted.timestamp, 0);
        assert!(converted.transactions.is_empty());
    }
}
