use crate::tx_args::{SupportedTxType, TxTypeArgs};
use alloy::consensus::{
    SignableTransaction, Transaction, TxEip1559, TxEip2930, TxEnvelope, TxLegacy, TxType,
};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, Bytes, SignatureError, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;

/// Gas charged for any transaction before execution starts.
pub const MIN_TRANSACTION_GAS: u64 = 21_000;

/// A field that must be set before an envelope can be assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("missing `{0}` in transaction args")]
pub struct IncompleteTxArgs(pub &'static str);

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("gas limit {gas_limit} is below the intrinsic cost of {MIN_TRANSACTION_GAS}")]
    GasLimitBelowIntrinsic { gas_limit: u64 },
    #[error("max priority fee per gas {tip} exceeds max fee per gas {fee_cap}")]
    TipAboveFeeCap { tip: u128, fee_cap: u128 },
    #[error("gas limit * fee cap + value overflows 256 bits")]
    CostOverflow,
    #[error("transaction chain id {actual:?} does not match {expected}")]
    ChainIdMismatch { expected: u64, actual: Option<u64> },
    #[error("invalid signature")]
    InvalidSignature(#[source] SignatureError),
    #[error("signature recovers to {recovered}, expected {expected}")]
    SenderMismatch { expected: Address, recovered: Address },
}

/// Unsigned envelope built from fully populated [`TxTypeArgs`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnsignedTransaction {
    Legacy(TxLegacy),
    AccessList(TxEip2930),
    DynamicFee(TxEip1559),
}

impl UnsignedTransaction {
    /// Assembles the envelope type implied by the fee fields of `args`.
    pub fn from_args(args: &TxTypeArgs) -> Result<Self, IncompleteTxArgs> {
        let chain_id = args.chain_id.ok_or(IncompleteTxArgs("chain_id"))?;
        let nonce = args.nonce.ok_or(IncompleteTxArgs("nonce"))?;
        let gas_limit = args.gas_limit.ok_or(IncompleteTxArgs("gas_limit"))?;
        let to = args.to.map_or(TxKind::Create, TxKind::Call);

        let tx = match args.implied_tx_type() {
            SupportedTxType::Legacy => Self::Legacy(TxLegacy {
                chain_id: Some(chain_id),
                nonce,
                gas_price: args.gas_price.ok_or(IncompleteTxArgs("gas_price"))?,
                gas_limit,
                to,
                value: args.value,
                input: args.input.clone(),
            }),
            SupportedTxType::AccessList => Self::AccessList(TxEip2930 {
                chain_id,
                nonce,
                gas_price: args.gas_price.ok_or(IncompleteTxArgs("gas_price"))?,
                gas_limit,
                to,
                value: args.value,
                access_list: args.access_list.clone().unwrap_or_default(),
                input: args.input.clone(),
            }),
            SupportedTxType::DynamicFee => Self::DynamicFee(TxEip1559 {
                chain_id,
                nonce,
                gas_limit,
                max_fee_per_gas: args
                    .max_fee_per_gas
                    .ok_or(IncompleteTxArgs("max_fee_per_gas"))?,
                max_priority_fee_per_gas: args
                    .max_priority_fee_per_gas
                    .ok_or(IncompleteTxArgs("max_priority_fee_per_gas"))?,
                to,
                value: args.value,
                access_list: args.access_list.clone().unwrap_or_default(),
                input: args.input.clone(),
            }),
        };
        Ok(tx)
    }

    pub fn tx_type(&self) -> SupportedTxType {
        match self {
            Self::Legacy(_) => SupportedTxType::Legacy,
            Self::AccessList(_) => SupportedTxType::AccessList,
            Self::DynamicFee(_) => SupportedTxType::DynamicFee,
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Self::Legacy(tx) => tx.chain_id,
            Self::AccessList(tx) => Some(tx.chain_id),
            Self::DynamicFee(tx) => Some(tx.chain_id),
        }
    }

    /// Signs the envelope. Does not validate the result, see [`SignedTransaction::validate`].
    pub fn sign(self, signer: &PrivateKeySigner) -> alloy::signers::Result<SignedTransaction> {
        let chain_id = self.chain_id();
        let envelope = match self {
            Self::Legacy(mut tx) => {
                let signature = signer.sign_transaction_sync(&mut tx)?;
                TxEnvelope::Legacy(tx.into_signed(signature))
            }
            Self::AccessList(mut tx) => {
                let signature = signer.sign_transaction_sync(&mut tx)?;
                TxEnvelope::Eip2930(tx.into_signed(signature))
            }
            Self::DynamicFee(mut tx) => {
                let signature = signer.sign_transaction_sync(&mut tx)?;
                TxEnvelope::Eip1559(tx.into_signed(signature))
            }
        };
        Ok(SignedTransaction {
            from: signer.address(),
            // Legacy transactions are always built with an EIP-155 chain id.
            chain_id: chain_id.unwrap_or_default(),
            envelope,
        })
    }
}

/// Signed transaction together with the sender it was signed by and the chain it targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    from: Address,
    chain_id: u64,
    envelope: TxEnvelope,
}

impl SignedTransaction {
    /// Wraps an already signed envelope. Nothing is checked until [`Self::validate`] is called.
    pub fn from_parts(from: Address, chain_id: u64, envelope: TxEnvelope) -> Self {
        Self {
            from,
            chain_id,
            envelope,
        }
    }

    pub fn into_parts(self) -> (Address, u64, TxEnvelope) {
        (self.from, self.chain_id, self.envelope)
    }

    pub fn from(&self) -> Address {
        self.from
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn envelope(&self) -> &TxEnvelope {
        &self.envelope
    }

    pub fn tx_type(&self) -> TxType {
        self.envelope.tx_type()
    }

    pub fn hash(&self) -> B256 {
        *self.envelope.tx_hash()
    }

    /// EIP-2718 encoding, ready for `eth_sendRawTransaction`.
    pub fn encoded_2718(&self) -> Bytes {
        self.envelope.encoded_2718().into()
    }

    /// Recovers the address that produced the signature.
    pub fn recover_signer(&self) -> Result<Address, SignatureError> {
        self.envelope
            .signature()
            .recover_address_from_prehash(&self.envelope.signature_hash())
    }

    /// Structural and signature checks performed before a transaction is handed out.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let gas_limit = self.envelope.gas_limit();
        if gas_limit < MIN_TRANSACTION_GAS {
            return Err(ValidationError::GasLimitBelowIntrinsic { gas_limit });
        }

        let fee_cap = self.envelope.max_fee_per_gas();
        if let Some(tip) = self.envelope.max_priority_fee_per_gas() {
            if tip > fee_cap {
                return Err(ValidationError::TipAboveFeeCap { tip, fee_cap });
            }
        }

        U256::from(gas_limit)
            .checked_mul(U256::from(fee_cap))
            .and_then(|fee| fee.checked_add(self.envelope.value()))
            .ok_or(ValidationError::CostOverflow)?;

        let actual = self.envelope.chain_id();
        if actual != Some(self.chain_id) {
            return Err(ValidationError::ChainIdMismatch {
                expected: self.chain_id,
                actual,
            });
        }

        let recovered = self
            .recover_signer()
            .map_err(ValidationError::InvalidSignature)?;
        if recovered != self.from {
            return Err(ValidationError::SenderMismatch {
                expected: self.from,
                recovered,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx_args::placeholder_access_list;
    use alloy::consensus::Signed;
    use alloy::primitives::address;
    use assert_matches::assert_matches;

    const CHAIN_ID: u64 = 270;

    fn signer() -> PrivateKeySigner {
        "0x7726827caac94a7f9e1b160f7ea819f172f7b6f9d2a97f992c38edeab82d4110"
            .parse()
            .unwrap()
    }

    fn populated_args() -> TxTypeArgs {
        TxTypeArgs::default()
            .with_chain_id(CHAIN_ID)
            .with_nonce(3)
            .with_gas_limit(21_000)
            .with_to(address!("0x000000000000000000000000000000000000dEaD"))
            .with_value(U256::from(1_000))
    }

    #[test]
    fn from_args_requires_populated_fields() {
        assert_eq!(
            UnsignedTransaction::from_args(&TxTypeArgs::default()),
            Err(IncompleteTxArgs("chain_id"))
        );
        assert_eq!(
            UnsignedTransaction::from_args(&populated_args()),
            Err(IncompleteTxArgs("gas_price"))
        );
        assert_eq!(
            UnsignedTransaction::from_args(&populated_args().with_max_fee_per_gas(10)),
            Err(IncompleteTxArgs("max_priority_fee_per_gas"))
        );
    }

    #[test]
    fn builds_envelope_from_fee_fields() {
        let legacy = UnsignedTransaction::from_args(&populated_args().with_gas_price(7)).unwrap();
        assert_matches!(&legacy, UnsignedTransaction::Legacy(tx) if tx.chain_id == Some(CHAIN_ID));

        let sender = signer().address();
        let access_list = UnsignedTransaction::from_args(
            &populated_args()
                .with_gas_price(7)
                .with_access_list(placeholder_access_list(sender)),
        )
        .unwrap();
        assert_eq!(access_list.tx_type(), SupportedTxType::AccessList);

        let dynamic = UnsignedTransaction::from_args(
            &populated_args()
                .with_max_fee_per_gas(10)
                .with_max_priority_fee_per_gas(2),
        )
        .unwrap();
        assert_matches!(
            dynamic,
            UnsignedTransaction::DynamicFee(tx) if tx.max_fee_per_gas == 10 && tx.max_priority_fee_per_gas == 2
        );
    }

    #[test]
    fn signed_transaction_validates() {
        let signer = signer();
        for args in [
            populated_args().with_gas_price(1_000_000_000),
            populated_args()
                .with_gas_price(1_000_000_000)
                .with_access_list(placeholder_access_list(signer.address())),
            populated_args()
                .with_max_fee_per_gas(2_000_000_000)
                .with_max_priority_fee_per_gas(1),
        ] {
            let signed = UnsignedTransaction::from_args(&args)
                .unwrap()
                .sign(&signer)
                .unwrap();
            assert_eq!(signed.from(), signer.address());
            assert_eq!(signed.chain_id(), CHAIN_ID);
            assert_eq!(signed.recover_signer().unwrap(), signer.address());
            signed.validate().unwrap();
        }
    }

    fn sign_args(args: TxTypeArgs) -> SignedTransaction {
        UnsignedTransaction::from_args(&args)
            .unwrap()
            .sign(&signer())
            .unwrap()
    }

    #[test]
    fn corrupted_value_fails_validation() {
        let signed = sign_args(populated_args().with_gas_price(1_000_000_000));
        let (from, chain_id, envelope) = signed.into_parts();
        let TxEnvelope::Legacy(signed) = envelope else {
            panic!("expected legacy envelope");
        };
        let (mut tx, signature, _) = signed.into_parts();
        tx.value = U256::MAX;
        let corrupted = SignedTransaction::from_parts(
            from,
            chain_id,
            TxEnvelope::Legacy(Signed::new_unhashed(tx, signature)),
        );
        assert_matches!(corrupted.validate(), Err(ValidationError::CostOverflow));
    }

    #[test]
    fn corrupted_nonce_changes_recovered_sender() {
        let signed = sign_args(populated_args().with_gas_price(1_000_000_000));
        let (from, chain_id, envelope) = signed.into_parts();
        let TxEnvelope::Legacy(signed) = envelope else {
            panic!("expected legacy envelope");
        };
        let (mut tx, signature, _) = signed.into_parts();
        tx.nonce += 1;
        let corrupted = SignedTransaction::from_parts(
            from,
            chain_id,
            TxEnvelope::Legacy(Signed::new_unhashed(tx, signature)),
        );
        assert_matches!(
            corrupted.validate(),
            Err(ValidationError::SenderMismatch { expected, .. }) if expected == from
        );
    }

    #[test]
    fn wrong_sender_or_chain_fails_validation() {
        let signed = sign_args(populated_args().with_gas_price(1_000_000_000));

        let mut wrong_sender = signed.clone();
        wrong_sender.from = Address::ZERO;
        assert_matches!(
            wrong_sender.validate(),
            Err(ValidationError::SenderMismatch { recovered, .. }) if recovered == signed.from()
        );

        let mut wrong_chain = signed;
        wrong_chain.chain_id = CHAIN_ID + 1;
        assert_matches!(
            wrong_chain.validate(),
            Err(ValidationError::ChainIdMismatch { expected, actual: Some(CHAIN_ID) }) if expected == CHAIN_ID + 1
        );
    }

    #[test]
    fn fee_and_gas_limits_are_checked() {
        let tiny_gas = sign_args(
            populated_args()
                .with_gas_price(1_000_000_000)
                .with_gas_limit(20_999),
        );
        assert_matches!(
            tiny_gas.validate(),
            Err(ValidationError::GasLimitBelowIntrinsic { gas_limit: 20_999 })
        );

        let tip_above_cap = sign_args(
            populated_args()
                .with_max_fee_per_gas(1)
                .with_max_priority_fee_per_gas(2),
        );
        assert_matches!(
            tip_above_cap.validate(),
            Err(ValidationError::TipAboveFeeCap { tip: 2, fee_cap: 1 })
        );
    }

    #[test]
    fn encoding_round_trips_through_envelope_type() {
        let signed = sign_args(
            populated_args()
                .with_max_fee_per_gas(2_000_000_000)
                .with_max_priority_fee_per_gas(1),
        );
        assert_eq!(signed.tx_type(), TxType::Eip1559);
        let encoded = signed.encoded_2718();
        // Typed transactions are prefixed with their type byte.
        assert_eq!(encoded[0], 0x02);
        assert_ne!(signed.hash(), B256::ZERO);
    }
}
