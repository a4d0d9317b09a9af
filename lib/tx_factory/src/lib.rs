//! Builds fully populated, signed EVM transactions for integration tests without broadcasting
//! them.

use crate::metrics::TX_FACTORY_METRICS;
use alloy::consensus::TxType;
use alloy::consensus::constants::GWEI_TO_WEI;
use alloy::primitives::{Address, TxKind};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use evm_testutil_types::{
    ChainMessage, IncompleteTxArgs, SignedTransaction, SignerContext, SupportedTxType,
    TxTypeArgs, UnsignedTransaction, placeholder_access_list,
};
use std::sync::Arc;

mod config;
mod error;
mod metrics;
mod provider;
mod traits;

pub use config::TxFactoryConfig;
pub use error::{DefaultedField, FactoryStage, TxFactoryError};
pub use traits::{ChainQueryHandler, FixedChainId, NetworkDescriptor};

/// Gas price of legacy and access-list transactions requested without one (1 gwei).
pub const DEFAULT_GAS_PRICE: u128 = GWEI_TO_WEI as u128;

/// Rejects caller-set fields that have no place in a `tx_type` transaction.
fn check_fields_match(tx_type: SupportedTxType, args: &TxTypeArgs) -> Result<(), TxFactoryError> {
    let field = match tx_type {
        SupportedTxType::DynamicFee => args.gas_price.map(|_| "gas_price"),
        SupportedTxType::Legacy | SupportedTxType::AccessList => {
            if args.max_fee_per_gas.is_some() {
                Some("max_fee_per_gas")
            } else if args.max_priority_fee_per_gas.is_some() {
                Some("max_priority_fee_per_gas")
            } else if tx_type == SupportedTxType::Legacy && args.access_list.is_some() {
                Some("access_list")
            } else {
                None
            }
        }
    };
    match field {
        Some(field) => Err(TxFactoryError::FieldNotAllowed { tx_type, field }),
        None => Ok(()),
    }
}

/// Assembles and signs transactions, querying the chain for every field the caller left unset.
///
/// The factory holds no mutable state; concurrent calls are as safe as the collaborators are.
#[derive(Debug, Clone)]
pub struct TxFactory {
    handler: Arc<dyn ChainQueryHandler>,
    network: Arc<dyn NetworkDescriptor>,
    config: TxFactoryConfig,
}

impl TxFactory {
    pub fn new(
        handler: Arc<dyn ChainQueryHandler>,
        network: Arc<dyn NetworkDescriptor>,
        config: TxFactoryConfig,
    ) -> Self {
        Self {
            handler,
            network,
            config,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id()
    }

    /// Fills `args` with the defaults of `tx_type` and then with chain-derived values.
    ///
    /// Legacy and access-list transactions get a 1 gwei gas price; access-list transactions
    /// without a list also get [`placeholder_access_list`]. Dynamic-fee transactions have no
    /// literal defaults. Fields already set are never overwritten.
    ///
    /// `tx_type` alone decides the fee model. Caller-set fields that do not belong to it
    /// (dynamic fees on a legacy or access-list transaction, a gas price on a dynamic-fee one,
    /// an access list on a legacy one) are rejected before any chain query.
    pub async fn generate_default_tx_type_args(
        &self,
        sender: Address,
        tx_type: TxType,
        mut args: TxTypeArgs,
    ) -> Result<TxTypeArgs, TxFactoryError> {
        let tx_type = SupportedTxType::try_from(tx_type).inspect_err(|_| {
            TX_FACTORY_METRICS.unsupported_tx_types.inc();
        })?;
        check_fields_match(tx_type, &args)?;
        match tx_type {
            SupportedTxType::DynamicFee => {}
            SupportedTxType::AccessList => {
                args.access_list
                    .get_or_insert_with(|| placeholder_access_list(sender));
                args.gas_price.get_or_insert(DEFAULT_GAS_PRICE);
            }
            SupportedTxType::Legacy => {
                args.gas_price.get_or_insert(DEFAULT_GAS_PRICE);
            }
        }
        self.populate_for_type(sender, tx_type, args).await
    }

    /// Fills every unset field `sender` needs to sign `args`: chain id, nonce, dynamic fees
    /// and gas limit, in that order.
    ///
    /// Args with a gas price and no dynamic-fee field are populated as the type they imply;
    /// everything else is populated as a dynamic-fee transaction.
    pub async fn populate_tx_args(
        &self,
        sender: Address,
        args: TxTypeArgs,
    ) -> Result<TxTypeArgs, TxFactoryError> {
        let tx_type = match args.gas_price {
            Some(_) => args.implied_tx_type(),
            None => SupportedTxType::DynamicFee,
        };
        check_fields_match(tx_type, &args)?;
        self.populate_for_type(sender, tx_type, args).await
    }

    async fn populate_for_type(
        &self,
        sender: Address,
        tx_type: SupportedTxType,
        mut args: TxTypeArgs,
    ) -> Result<TxTypeArgs, TxFactoryError> {
        if args.chain_id.is_none() {
            args.chain_id = Some(self.network.chain_id());
        }

        if args.nonce.is_none() {
            let nonce = self.handler.get_nonce(sender).await.map_err(|source| {
                TxFactoryError::Defaulting {
                    field: DefaultedField::Nonce,
                    source,
                }
            })?;
            tracing::debug!(%sender, nonce, "defaulted nonce");
            args.nonce = Some(nonce);
        }

        match tx_type {
            SupportedTxType::DynamicFee => self.populate_dynamic_fees(sender, &mut args).await?,
            SupportedTxType::Legacy | SupportedTxType::AccessList => {
                if args.gas_price.is_none() {
                    return Err(TxFactoryError::Assembly(IncompleteTxArgs("gas_price")));
                }
            }
        }

        if args.gas_limit.is_none() {
            let gas_limit = self
                .estimate_gas_limit(Some(sender), &args)
                .await
                .map_err(|err| TxFactoryError::Defaulting {
                    field: DefaultedField::GasLimit,
                    source: err.into(),
                })?;
            args.gas_limit = Some(gas_limit);
        }

        Ok(args)
    }

    async fn populate_dynamic_fees(
        &self,
        sender: Address,
        args: &mut TxTypeArgs,
    ) -> Result<(), TxFactoryError> {
        let tip = match args.max_priority_fee_per_gas {
            Some(tip) => tip,
            None => {
                let tip = self.handler.get_max_priority_fee().await.map_err(|source| {
                    TxFactoryError::Defaulting {
                        field: DefaultedField::MaxPriorityFeePerGas,
                        source,
                    }
                })?;
                tracing::debug!(%sender, tip, "defaulted max priority fee per gas");
                args.max_priority_fee_per_gas = Some(tip);
                tip
            }
        };
        if args.max_fee_per_gas.is_none() {
            let base_fee = self.handler.get_base_fee().await.map_err(|source| {
                TxFactoryError::Defaulting {
                    field: DefaultedField::MaxFeePerGas,
                    source,
                }
            })?;
            let max_fee_per_gas = base_fee.saturating_add(tip);
            tracing::debug!(%sender, base_fee, max_fee_per_gas, "defaulted max fee per gas");
            args.max_fee_per_gas = Some(max_fee_per_gas);
        }
        Ok(())
    }

    /// Estimates gas for a call from `from` with the payload, recipient and access list of
    /// `args`. Fee fields, nonce and value are not part of the estimation request.
    pub async fn estimate_gas_limit(
        &self,
        from: Option<Address>,
        args: &TxTypeArgs,
    ) -> Result<u64, TxFactoryError> {
        let request = TransactionRequest {
            from,
            to: args.to.map(TxKind::Call),
            input: TransactionInput::new(args.input.clone()),
            access_list: args.access_list.clone(),
            ..Default::default()
        };
        let encoded = serde_json::to_vec(&request).map_err(TxFactoryError::Encoding)?;

        TX_FACTORY_METRICS.gas_estimations.inc();
        let latency = TX_FACTORY_METRICS.gas_estimation_latency.start();
        let result = self
            .handler
            .estimate_gas(&encoded, self.config.gas_cap)
            .await;
        latency.observe();

        match result {
            Ok(gas) => {
                tracing::debug!(?from, to = ?args.to, gas, "estimated gas");
                Ok(gas)
            }
            Err(err) => {
                TX_FACTORY_METRICS.failed_gas_estimations.inc();
                tracing::warn!(?from, to = ?args.to, "gas estimation failed: {err:#}");
                Err(TxFactoryError::Estimation(err))
            }
        }
    }

    /// Populates `args` for the signer's address and assembles the envelope type implied by its
    /// fee fields.
    pub async fn generate_unsigned_tx(
        &self,
        signer: &PrivateKeySigner,
        args: TxTypeArgs,
    ) -> Result<UnsignedTransaction, TxFactoryError> {
        let args = self.populate_tx_args(signer.address(), args).await?;
        UnsignedTransaction::from_args(&args).map_err(TxFactoryError::Assembly)
    }

    pub fn sign_tx(
        &self,
        signer: &PrivateKeySigner,
        tx: UnsignedTransaction,
    ) -> Result<SignedTransaction, TxFactoryError> {
        tx.sign(signer).map_err(TxFactoryError::Signing)
    }

    /// Same as [`Self::generate_signed_tx`] but skips validation, so that tests can produce
    /// transactions the chain is expected to reject.
    pub async fn generate_signed_tx_unchecked(
        &self,
        signer: &PrivateKeySigner,
        args: TxTypeArgs,
    ) -> Result<SignedTransaction, TxFactoryError> {
        let tx = self.generate_unsigned_tx(signer, args).await?;
        self.sign_tx(signer, tx)
    }

    /// Generates a validated transaction signed by `signer`. Nothing is broadcast.
    pub async fn generate_signed_tx(
        &self,
        signer: &PrivateKeySigner,
        args: TxTypeArgs,
    ) -> Result<SignedTransaction, TxFactoryError> {
        let signed = self.generate_signed_tx_unchecked(signer, args).await?;
        signed.validate().map_err(TxFactoryError::Validation)?;

        TX_FACTORY_METRICS.signed_transactions.inc();
        tracing::debug!(
            from = %signed.from(),
            hash = %signed.hash(),
            tx_type = ?signed.tx_type(),
            "generated signed transaction"
        );
        Ok(signed)
    }

    /// Generates a signed transaction and converts it into a message for dry-run execution,
    /// priced against the current base fee.
    pub async fn generate_chain_message(
        &self,
        signer: &PrivateKeySigner,
        args: TxTypeArgs,
    ) -> Result<ChainMessage, TxFactoryError> {
        let signed = self.generate_signed_tx(signer, args).await?;

        let base_fee = self
            .handler
            .get_base_fee()
            .await
            .map_err(TxFactoryError::BaseFee)?;
        let context = SignerContext::latest_for_chain_id(self.network.chain_id());
        signed
            .as_message(&context, Some(base_fee))
            .map_err(TxFactoryError::SignerContext)
    }
}
