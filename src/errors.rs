//! Module with common error types.

use crate::tokens::Error as TokenError;
use ethbind_common::abi::Error as AbiError;
use std::time::Duration;
use thiserror::Error;
use web3::error::Error as Web3Error;
use web3::types::H256;

pub use ethbind_common::errors::*;

/// Error that can occur while configuring a binding or creating contract
/// instances from it.
#[derive(Debug, Error)]
pub enum BindingError {
    /// The binding has no provider to talk to a node.
    #[error("no provider configured, call `set_provider` first")]
    NotConfigured,

    /// A contract address string was not a 42 character hex address.
    #[error("invalid contract address '{0}'")]
    InvalidAddress(String),

    /// The contract has no recorded address on the current network.
    #[error("cannot find deployed address: {0} not deployed or address not set")]
    NotDeployed(String),

    /// The bytecode still references libraries that were never linked.
    #[error("contract contains unresolved libraries: {}", .0.join(", "))]
    UnresolvedLibraries(Vec<String>),

    /// The network table has no record for the network.
    #[error("{contract} has no artifacts for network id '{network_id}'")]
    UnknownNetwork {
        /// The contract name.
        contract: String,
        /// The requested or detected network ID.
        network_id: String,
    },

    /// The contract cannot be deployed because it has no bytecode.
    #[error("{0} has no bytecode, it cannot be deployed")]
    MissingBytecode(String),

    /// The deployment transaction was mined but did not create a contract.
    #[error("deployment transaction {0:?} did not create a contract")]
    MissingContractAddress(H256),

    /// The linked bytecode could not be decoded.
    #[error("invalid contract bytecode: {0}")]
    Bytecode(#[from] BytecodeError),

    /// An error occurred while talking to the node.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Error that can occur while executing a contract call or transaction.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// An error occured while performing a web3 call.
    #[error("web3 error: {0}")]
    Transport(#[from] Web3Error),

    /// The node rejected a transaction.
    #[error("failed to submit transaction: {0}")]
    Submission(Web3Error),

    /// Querying the receipt of a submitted transaction failed.
    #[error("failed to query transaction receipt: {0}")]
    ReceiptQuery(Web3Error),

    /// The transaction was not mined before the confirmation timeout elapsed.
    #[error("transaction {hash:?} wasn't processed in {} seconds", .elapsed.as_secs())]
    ConfirmationTimeout {
        /// The hash of the pending transaction.
        hash: H256,
        /// The time spent waiting for the receipt.
        elapsed: Duration,
    },

    /// Output or log data did not match the ABI.
    #[error("failed to decode contract data: {0}")]
    Decode(AbiError),

    /// Arguments could not be ABI encoded.
    #[error("failed to encode contract data: {0}")]
    Abi(AbiError),

    /// An argument did not match the type of its parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] TokenError),

    /// Transaction options could not be interpreted.
    #[error("invalid transaction options: {0}")]
    InvalidOptions(String),

    /// The contract has no member with this name.
    #[error("contract has no member named '{0}'")]
    UnknownMember(String),

    /// The member exists but cannot be invoked.
    #[error("contract member '{0}' is not a function")]
    NotAFunction(String),

    /// The instance was created before a provider was set on its binding.
    #[error("no provider configured, call `set_provider` first")]
    NotConfigured,

    /// No `from` address was given and the node has no local accounts.
    #[error("no local accounts")]
    NoLocalAccounts,
}
