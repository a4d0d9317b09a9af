use crate::traits::ChainQueryHandler;
use alloy::eips::BlockNumberOrTag;
use alloy::network::TransactionBuilder;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use anyhow::Context;

/// Answers factory queries from a JSON-RPC node.
#[async_trait::async_trait]
impl ChainQueryHandler for DynProvider {
    async fn estimate_gas(&self, args: &[u8], gas_cap: u64) -> anyhow::Result<u64> {
        let request: TransactionRequest =
            serde_json::from_slice(args).context("failed to decode estimation request")?;
        // The gas limit of the request bounds the node's binary search.
        let request = request.with_gas_limit(gas_cap);
        let gas = Provider::estimate_gas(self, request).await?;
        Ok(gas)
    }

    async fn get_base_fee(&self) -> anyhow::Result<u128> {
        let block = self
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?
            .context("latest block is not available")?;
        let base_fee = block
            .header
            .inner
            .base_fee_per_gas
            .context("latest block has no base fee")?;
        Ok(base_fee as u128)
    }

    async fn get_nonce(&self, address: Address) -> anyhow::Result<u64> {
        Ok(self.get_transaction_count(address).await?)
    }

    async fn get_max_priority_fee(&self) -> anyhow::Result<u128> {
        Ok(self.get_max_priority_fee_per_gas().await?)
    }
}
