use crate::signed::SignedTransaction;
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2930::AccessList;
use alloy::primitives::{Address, Bytes, SignatureError, TxKind, U256};

/// Chain-bound rules for recovering the sender of a signed transaction.
///
/// Accepts every envelope type the chain knows about, as long as the transaction is either bound
/// to the context's chain id or carries none at all (pre-EIP-155 legacy).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignerContext {
    chain_id: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SignerContextError {
    #[error("transaction is bound to chain {actual}, signer expects chain {expected}")]
    ChainIdMismatch { expected: u64, actual: u64 },
    #[error("failed to recover sender")]
    Recovery(#[from] SignatureError),
}

impl SignerContext {
    pub fn latest_for_chain_id(chain_id: u64) -> Self {
        Self { chain_id }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn sender(&self, tx: &TxEnvelope) -> Result<Address, SignerContextError> {
        if let Some(actual) = tx.chain_id() {
            if actual != self.chain_id {
                return Err(SignerContextError::ChainIdMismatch {
                    expected: self.chain_id,
                    actual,
                });
            }
        }
        Ok(tx
            .signature()
            .recover_address_from_prehash(&tx.signature_hash())?)
    }
}

/// Execution message used to dry-run a transaction against chain state.
///
/// Unlike the signed envelope it carries the sender explicitly and a single effective gas price
/// already resolved against a base fee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainMessage {
    pub from: Address,
    pub to: TxKind,
    pub nonce: u64,
    pub value: U256,
    pub gas_limit: u64,
    /// Price actually paid per gas unit.
    pub gas_price: u128,
    pub gas_fee_cap: u128,
    pub gas_tip_cap: u128,
    pub input: Bytes,
    pub access_list: AccessList,
}

impl SignedTransaction {
    /// Converts the transaction into an execution message.
    ///
    /// The sender is recovered through `signer` rather than taken from the recorded one. For
    /// dynamic-fee transactions the gas price is `min(fee_cap, base_fee + tip)`; without a base
    /// fee it is the fee cap.
    pub fn as_message(
        &self,
        signer: &SignerContext,
        base_fee: Option<u128>,
    ) -> Result<ChainMessage, SignerContextError> {
        let tx = self.envelope();
        let from = signer.sender(tx)?;

        let gas_fee_cap = tx.max_fee_per_gas();
        let (gas_price, gas_tip_cap) = match tx.max_priority_fee_per_gas() {
            Some(tip) => {
                let price = match base_fee {
                    Some(base_fee) => gas_fee_cap.min(base_fee.saturating_add(tip)),
                    None => gas_fee_cap,
                };
                (price, tip)
            }
            // Legacy pricing: the gas price is both the cap and the tip.
            None => (gas_fee_cap, gas_fee_cap),
        };

        Ok(ChainMessage {
            from,
            to: tx.kind(),
            nonce: tx.nonce(),
            value: tx.value(),
            gas_limit: tx.gas_limit(),
            gas_price,
            gas_fee_cap,
            gas_tip_cap,
            input: tx.input().clone(),
            access_list: tx.access_list().cloned().unwrap_or_default(),
        })
    }
}
