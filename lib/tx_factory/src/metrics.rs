use std::time::Duration;
use vise::{Buckets, Counter, Histogram, Metrics, Unit};

#[derive(Debug, Metrics)]
#[metrics(prefix = "tx_factory")]
pub struct TxFactoryMetrics {
    /// Number of transactions signed and validated
    pub signed_transactions: Counter,
    /// Number of gas estimations requested from the chain
    pub gas_estimations: Counter,
    /// Number of gas estimations rejected by the chain
    pub failed_gas_estimations: Counter,
    /// Number of requests for transaction types without a defaulting policy
    pub unsupported_tx_types: Counter,

    #[metrics(unit = Unit::Seconds, buckets = Buckets::LATENCIES)]
    pub gas_estimation_latency: Histogram<Duration>,
}

#[vise::register]
pub(crate) static TX_FACTORY_METRICS: vise::Global<TxFactoryMetrics> = vise::Global::new();
