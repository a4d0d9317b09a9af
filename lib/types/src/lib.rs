mod chain_message;
pub use chain_message::{ChainMessage, SignerContext, SignerContextError};

mod signed;
pub use signed::{
    IncompleteTxArgs, MIN_TRANSACTION_GAS, SignedTransaction, UnsignedTransaction,
    ValidationError,
};

mod tx_args;
pub use tx_args::{SupportedTxType, TxTypeArgs, UnsupportedTxType, placeholder_access_list};

// Re-export alloy types that show up in the public API.
pub use alloy::consensus::{TxEnvelope, TxType};
pub use alloy::eips::eip2930::{AccessList, AccessListItem};
