use thiserror::Error;

use crate::{
    db_types::{OrderId, TxnId},
    traits::ReconciliationDbError,
};

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("No order with id {0} exists")]
    OrderNotFound(OrderId),
    #[error("No wallet top-up with id {0} exists")]
    WalletTxNotFound(TxnId),
    #[error("Could not reconcile payment. {0}")]
    DatabaseError(#[from] ReconciliationDbError),
}
