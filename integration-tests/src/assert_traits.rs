use evm_testutil_tx_factory::{FactoryStage, TxFactoryError};
use std::fmt::Debug;

pub trait FactoryResultAssert {
    /// Asserts that the factory failed at `stage` and returns the error for further inspection.
    fn expect_stage(self, stage: FactoryStage) -> TxFactoryError;
}

impl<T: Debug> FactoryResultAssert for Result<T, TxFactoryError> {
    #[track_caller]
    fn expect_stage(self, stage: FactoryStage) -> TxFactoryError {
        match self {
            Ok(value) => panic!("expected failure at {stage:?}, got {value:?}"),
            Err(err) => {
                assert_eq!(err.stage(), stage, "unexpected error: {err:?}");
                err
            }
        }
    }
}
