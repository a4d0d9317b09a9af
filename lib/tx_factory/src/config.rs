use smart_config::{DescribeConfig, DeserializeConfig};

/// Configuration of the transaction factory.
#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct TxFactoryConfig {
    /// Upper bound on the gas a single estimation may simulate.
    /// Matches the default `eth_estimateGas` gas cap of the node.
    #[config(default_t = 25_000_000)]
    pub gas_cap: u64,
}
