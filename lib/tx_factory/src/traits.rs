use alloy::primitives::Address;
use std::fmt::Debug;

/// Chain-side queries the factory needs to fill in transaction defaults.
///
/// Implementations own their timeouts and retries; the factory calls each method at most once
/// per field it defaults and never retries.
#[async_trait::async_trait]
pub trait ChainQueryHandler: Send + Sync + Debug + 'static {
    /// Estimates gas for a JSON-encoded `eth_estimateGas` transaction request.
    ///
    /// The estimate must not exceed `gas_cap`.
    async fn estimate_gas(&self, args: &[u8], gas_cap: u64) -> anyhow::Result<u64>;

    /// Base fee per gas of the latest block.
    async fn get_base_fee(&self) -> anyhow::Result<u128>;

    /// Next nonce of `address`.
    async fn get_nonce(&self, address: Address) -> anyhow::Result<u64>;

    /// Suggested max priority fee per gas.
    async fn get_max_priority_fee(&self) -> anyhow::Result<u128>;
}

/// Static description of the chain transactions are built for.
pub trait NetworkDescriptor: Send + Sync + Debug + 'static {
    fn chain_id(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedChainId(pub u64);

impl NetworkDescriptor for FixedChainId {
    fn chain_id(&self) -> u64 {
        self.0
    }
}
