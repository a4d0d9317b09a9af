use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use anyhow::Context;
use evm_testutil_tx_factory::ChainQueryHandler;
use std::collections::HashSet;
use std::sync::Mutex;

/// Kind of query answered by [`StubChainQueryHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    EstimateGas,
    BaseFee,
    Nonce,
    MaxPriorityFee,
}

/// Values returned by [`StubChainQueryHandler`] for successful queries.
#[derive(Debug, Clone)]
pub struct StubValues {
    pub nonce: u64,
    pub base_fee: u128,
    pub max_priority_fee: u128,
    pub estimated_gas: u64,
}

impl Default for StubValues {
    fn default() -> Self {
        Self {
            nonce: 3,
            base_fee: 875_000_000,
            max_priority_fee: 1_000_000,
            estimated_gas: 21_000,
        }
    }
}

/// Estimation request as decoded by the stub.
#[derive(Debug, Clone)]
pub struct EstimationRequest {
    pub request: TransactionRequest,
    pub gas_cap: u64,
}

/// In-memory chain that answers every query with a fixed value and records what was asked.
#[derive(Debug, Default)]
pub struct StubChainQueryHandler {
    values: StubValues,
    failing: Mutex<HashSet<QueryKind>>,
    calls: Mutex<Vec<QueryKind>>,
    estimation_requests: Mutex<Vec<EstimationRequest>>,
}

impl StubChainQueryHandler {
    pub fn new(values: StubValues) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }

    pub fn values(&self) -> &StubValues {
        &self.values
    }

    /// Makes every following query of `kind` fail.
    pub fn fail(&self, kind: QueryKind) {
        self.failing.lock().unwrap().insert(kind);
    }

    /// Queries received so far, in order.
    pub fn calls(&self) -> Vec<QueryKind> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn estimation_requests(&self) -> Vec<EstimationRequest> {
        self.estimation_requests.lock().unwrap().clone()
    }

    fn record(&self, kind: QueryKind) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(kind);
        if self.failing.lock().unwrap().contains(&kind) {
            anyhow::bail!("stubbed {kind:?} failure");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChainQueryHandler for StubChainQueryHandler {
    async fn estimate_gas(&self, args: &[u8], gas_cap: u64) -> anyhow::Result<u64> {
        self.record(QueryKind::EstimateGas)?;
        let request: TransactionRequest =
            serde_json::from_slice(args).context("malformed estimation request")?;
        self.estimation_requests
            .lock()
            .unwrap()
            .push(EstimationRequest { request, gas_cap });
        Ok(self.values.estimated_gas.min(gas_cap))
    }

    async fn get_base_fee(&self) -> anyhow::Result<u128> {
        self.record(QueryKind::BaseFee)?;
        Ok(self.values.base_fee)
    }

    async fn get_nonce(&self, address: Address) -> anyhow::Result<u64> {
        self.record(QueryKind::Nonce)?;
        tracing::trace!(%address, nonce = self.values.nonce, "stubbed nonce");
        Ok(self.values.nonce)
    }

    async fn get_max_priority_fee(&self) -> anyhow::Result<u128> {
        self.record(QueryKind::MaxPriorityFee)?;
        Ok(self.values.max_priority_fee)
    }
}
