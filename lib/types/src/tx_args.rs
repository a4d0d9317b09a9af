use alloy::consensus::TxType;
use alloy::eips::eip2930::{AccessList, AccessListItem};
use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction types that have a defaulting policy.
///
/// Blob (EIP-4844) and set-code (EIP-7702) transactions are valid on the chain but cannot be
/// produced by the factory; converting them yields [`UnsupportedTxType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedTxType {
    Legacy,
    AccessList,
    DynamicFee,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedTxType {
    #[error("transaction type {0:?} is not supported")]
    Known(TxType),
    #[error("unknown transaction type {0:#04x}")]
    Unknown(u8),
}

impl TryFrom<TxType> for SupportedTxType {
    type Error = UnsupportedTxType;

    fn try_from(tx_type: TxType) -> Result<Self, Self::Error> {
        match tx_type {
            TxType::Legacy => Ok(Self::Legacy),
            TxType::Eip2930 => Ok(Self::AccessList),
            TxType::Eip1559 => Ok(Self::DynamicFee),
            other => Err(UnsupportedTxType::Known(other)),
        }
    }
}

impl TryFrom<u8> for SupportedTxType {
    type Error = UnsupportedTxType;

    fn try_from(ty: u8) -> Result<Self, Self::Error> {
        let tx_type = TxType::try_from(ty).map_err(|_| UnsupportedTxType::Unknown(ty))?;
        Self::try_from(tx_type)
    }
}

impl From<SupportedTxType> for TxType {
    fn from(value: SupportedTxType) -> Self {
        match value {
            SupportedTxType::Legacy => TxType::Legacy,
            SupportedTxType::AccessList => TxType::Eip2930,
            SupportedTxType::DynamicFee => TxType::Eip1559,
        }
    }
}

impl fmt::Display for SupportedTxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportedTxType::Legacy => write!(f, "legacy"),
            SupportedTxType::AccessList => write!(f, "access_list"),
            SupportedTxType::DynamicFee => write!(f, "dynamic_fee"),
        }
    }
}

/// Partially specified transaction request.
///
/// Every `None` field is a candidate for defaulting. Which fee fields are meaningful depends on
/// the fee model: `gas_price` for legacy and access-list transactions, `max_fee_per_gas` and
/// `max_priority_fee_per_gas` for dynamic-fee ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxTypeArgs {
    pub chain_id: Option<u64>,
    pub nonce: Option<u64>,
    /// `None` deploys `input` as contract init code.
    pub to: Option<Address>,
    #[serde(default)]
    pub input: Bytes,
    #[serde(default)]
    pub value: U256,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub access_list: Option<AccessList>,
}

impl TxTypeArgs {
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn with_input(mut self, input: impl Into<Bytes>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn with_max_fee_per_gas(mut self, max_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self
    }

    pub fn with_max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: u128) -> Self {
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    pub fn with_access_list(mut self, access_list: AccessList) -> Self {
        self.access_list = Some(access_list);
        self
    }

    /// Transaction type the populated fields describe.
    ///
    /// Any dynamic-fee field wins over an access list, which wins over the legacy format.
    pub fn implied_tx_type(&self) -> SupportedTxType {
        if self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some() {
            SupportedTxType::DynamicFee
        } else if self.access_list.is_some() {
            SupportedTxType::AccessList
        } else {
            SupportedTxType::Legacy
        }
    }
}

/// Access list used when an access-list transaction is requested without one.
///
/// The single zero slot of the sender carries no meaning; it only makes the list non-empty so the
/// transaction exercises access-list encoding and pricing.
pub fn placeholder_access_list(sender: Address) -> AccessList {
    AccessList(vec![AccessListItem {
        address: sender,
        storage_keys: vec![B256::ZERO],
    }])
}
