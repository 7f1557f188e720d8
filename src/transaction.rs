//! Types describing the outcome of contract transactions and the polling
//! loop that waits for them to be mined.

pub mod confirm;

use crate::contract::event::DecodedLog;
use web3::types::{TransactionReceipt, H256};

/// Represents the result of a sent transaction that can either be a
/// transaction hash, in the case the transaction was not confirmed, or a full
/// transaction receipt with its decoded logs if it was.
#[derive(Clone, Debug)]
pub enum TransactionResult {
    /// A transaction hash, this variant happens if and only if confirmation
    /// was not requested.
    Hash(H256),
    /// A mined transaction, this variant happens if and only if the binding
    /// waits for receipts.
    Mined(MinedTransaction),
}

impl TransactionResult {
    /// Returns true if the `TransactionResult` is a `Hash` variant, i.e. it is
    /// only a hash and does not contain the transaction receipt.
    pub fn is_hash(&self) -> bool {
        matches!(self, TransactionResult::Hash(_))
    }

    /// Get the transaction hash.
    pub fn hash(&self) -> H256 {
        match self {
            TransactionResult::Hash(hash) => *hash,
            TransactionResult::Mined(mined) => mined.hash,
        }
    }

    /// Returns true if the `TransactionResult` is a `Mined` variant.
    pub fn is_mined(&self) -> bool {
        matches!(self, TransactionResult::Mined(_))
    }

    /// Extract the mined transaction if there is one.
    pub fn into_mined(self) -> Option<MinedTransaction> {
        match self {
            TransactionResult::Mined(mined) => Some(mined),
            _ => None,
        }
    }
}

/// A mined transaction with the logs it emitted.
#[derive(Clone, Debug)]
pub struct MinedTransaction {
    /// The transaction hash.
    pub hash: H256,
    /// The transaction receipt.
    pub receipt: TransactionReceipt,
    /// The receipt logs emitted by known events, in emission order.
    pub logs: Vec<DecodedLog>,
}
