use evm_testutil_types::{
    IncompleteTxArgs, SignerContextError, SupportedTxType, UnsupportedTxType, ValidationError,
};
use std::fmt;

/// Pipeline stage a [`TxFactoryError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryStage {
    UnsupportedType,
    InvalidArgs,
    Defaulting,
    Assembly,
    Encoding,
    Estimation,
    Signing,
    Validation,
    Conversion,
}

/// Transaction field that was being defaulted when a chain query failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultedField {
    Nonce,
    MaxPriorityFeePerGas,
    MaxFeePerGas,
    GasLimit,
}

impl fmt::Display for DefaultedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultedField::Nonce => write!(f, "nonce"),
            DefaultedField::MaxPriorityFeePerGas => write!(f, "max priority fee per gas"),
            DefaultedField::MaxFeePerGas => write!(f, "max fee per gas"),
            DefaultedField::GasLimit => write!(f, "gas limit"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TxFactoryError {
    #[error(transparent)]
    UnsupportedType(#[from] UnsupportedTxType),
    #[error("`{field}` cannot be set on a {tx_type} transaction")]
    FieldNotAllowed {
        tx_type: SupportedTxType,
        field: &'static str,
    },
    #[error("failed to populate tx args: cannot default {field}")]
    Defaulting {
        field: DefaultedField,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to create ethereum tx")]
    Assembly(#[source] IncompleteTxArgs),
    #[error("failed to marshal tx args")]
    Encoding(#[source] serde_json::Error),
    #[error("failed to estimate gas")]
    Estimation(#[source] anyhow::Error),
    #[error("failed to sign ethereum tx")]
    Signing(#[source] alloy::signers::Error),
    #[error("failed to validate transaction")]
    Validation(#[source] ValidationError),
    #[error("failed to get base fee")]
    BaseFee(#[source] anyhow::Error),
    #[error("failed to convert transaction into a chain message")]
    SignerContext(#[source] SignerContextError),
}

impl TxFactoryError {
    pub fn stage(&self) -> FactoryStage {
        match self {
            TxFactoryError::UnsupportedType(_) => FactoryStage::UnsupportedType,
            TxFactoryError::FieldNotAllowed { .. } => FactoryStage::InvalidArgs,
            TxFactoryError::Defaulting { .. } => FactoryStage::Defaulting,
            TxFactoryError::Assembly(_) => FactoryStage::Assembly,
            TxFactoryError::Encoding(_) => FactoryStage::Encoding,
            TxFactoryError::Estimation(_) => FactoryStage::Estimation,
            TxFactoryError::Signing(_) => FactoryStage::Signing,
            TxFactoryError::Validation(_) => FactoryStage::Validation,
            TxFactoryError::BaseFee(_) | TxFactoryError::SignerContext(_) => {
                FactoryStage::Conversion
            }
        }
    }
}
