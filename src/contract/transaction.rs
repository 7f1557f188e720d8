//! Submission of state mutating transactions and resolution of their result
//! once mined.

use crate::args::TransactionOptions;
use crate::contract::event::EventIndexExt;
use crate::contract::instance::Context;
use crate::errors::ExecutionError;
use crate::transaction::confirm;
use crate::transaction::{MinedTransaction, TransactionResult};
use crate::transport::Provider;
use web3::api::Web3;
use web3::types::{Address, Bytes, H256};

/// Uses the explicit sender or else the first account of the node. Failing to
/// list the accounts is a submission error since no transaction exists yet.
pub(crate) async fn resolve_from(
    web3: &Web3<Provider>,
    from: Option<Address>,
) -> Result<Address, ExecutionError> {
    match from {
        Some(address) => Ok(address),
        None => web3
            .eth()
            .accounts()
            .await
            .map_err(ExecutionError::Submission)?
            .first()
            .copied()
            .ok_or(ExecutionError::NoLocalAccounts),
    }
}

/// Sends a transaction to be signed by the node and returns its hash. A
/// `to` of `None` creates a contract.
pub(crate) async fn submit(
    web3: &Web3<Provider>,
    to: Option<Address>,
    data: Bytes,
    options: &TransactionOptions,
) -> Result<H256, ExecutionError> {
    let from = resolve_from(web3, options.from).await?;
    let request = options.transaction_request(from, to, data);
    let hash = web3
        .eth()
        .send_transaction(request)
        .await
        .map_err(ExecutionError::Submission)?;

    tracing::debug!(?hash, ?from, ?to, "transaction submitted");
    Ok(hash)
}

/// Waits for a submitted transaction to be mined. Returns the full receipt
/// with decoded logs in next generation mode and just the hash otherwise.
pub(crate) async fn wait_for_result(
    context: &Context,
    web3: &Web3<Provider>,
    hash: H256,
) -> Result<TransactionResult, ExecutionError> {
    let receipt =
        confirm::wait_for_receipt(web3, hash, &context.confirm, context.clock.as_ref()).await?;
    if !context.next_gen {
        return Ok(TransactionResult::Hash(hash));
    }

    let logs = context.events.decode_all(&receipt.logs)?;
    Ok(TransactionResult::Mined(MinedTransaction {
        hash,
        receipt,
        logs,
    }))
}
