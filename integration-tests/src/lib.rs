use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Context;
use evm_testutil_tx_factory::{FixedChainId, TxFactory, TxFactoryConfig};
use std::str::FromStr;
use std::sync::Arc;

pub mod assert_traits;
mod stub;

pub use stub::{EstimationRequest, QueryKind, StubChainQueryHandler, StubValues};

/// Chain id of the stubbed network.
pub const CHAIN_ID: u64 = 9000;

// address 0x36615Cf349d7F6344891B1e7CA7C72883F5dc049
const SENDER_PRIVATE_KEY: &str =
    "0x7726827caac94a7f9e1b160f7ea819f172f7b6f9d2a97f992c38edeab82d4110";

/// Transaction factory wired to a [`StubChainQueryHandler`], plus the key transactions are
/// signed with.
#[derive(Debug)]
pub struct Tester {
    pub factory: TxFactory,
    pub handler: Arc<StubChainQueryHandler>,
    pub signer: PrivateKeySigner,
}

impl Tester {
    pub fn setup() -> anyhow::Result<Self> {
        Self::setup_with(StubValues::default(), TxFactoryConfig::default())
    }

    pub fn setup_with(values: StubValues, config: TxFactoryConfig) -> anyhow::Result<Self> {
        let signer = PrivateKeySigner::from_str(SENDER_PRIVATE_KEY)
            .context("failed to parse sender private key")?;
        let handler = Arc::new(StubChainQueryHandler::new(values));
        let factory = TxFactory::new(handler.clone(), Arc::new(FixedChainId(CHAIN_ID)), config);
        tracing::debug!(sender = %signer.address(), chain_id = CHAIN_ID, "tester set up");
        Ok(Self {
            factory,
            handler,
            signer,
        })
    }

    pub fn sender(&self) -> Address {
        self.signer.address()
    }
}
