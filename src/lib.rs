#![deny(missing_docs, unsafe_code)]

//! Runtime bindings for Ethereum contracts compiled with truffle.
//!
//! A [`Binding`] is created from a contract name and its network table, the
//! per-network ABI, bytecode, address and link records. It creates
//! [`BoundContract`] instances at an address, either the one recorded for the
//! current network, an explicit one, or the address of a freshly deployed
//! contract. Instances dispatch members by name once a provider is set:
//! constant functions are evaluated with `eth_call` and all other functions
//! are sent as transactions that are polled until mined. Events can be
//! queried from past logs or streamed through a node filter.
//!
//! ```no_run
//! use ethbind::json::json;
//! use ethbind::web3::Transport;
//! use ethbind::Binding;
//!
//! async fn fly<T>(transport: T) -> Result<(), Box<dyn std::error::Error>>
//! where
//!     T: Transport + Send + Sync + 'static,
//!     T::Out: Send + 'static,
//! {
//!     let mut drone = Binding::load("Drone", "build/contracts/Drone.json")?;
//!     drone.set_provider(transport);
//!     drone.detect_network().await?;
//!
//!     let instance = drone.deployed()?;
//!     let _owner = instance.invoke("owner", vec![]).await?;
//!     instance
//!         .invoke(
//!             "changeAPIURL",
//!             vec![json!("https://drone.example"), json!({ "gas": 100_000 })],
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

#[cfg(test)]
#[allow(missing_docs)]
#[macro_use]
#[path = "test/macros.rs"]
mod test_macros;

pub mod args;
pub mod contract;
pub mod errors;
pub mod tokens;
pub mod transaction;
pub mod transport;

pub use crate::contract::{Binding, BoundContract};
pub use crate::prelude::*;
pub use ethbind_common as common;
pub use futures;
pub use jsonrpc_core as jsonrpc;
pub use serde_json as json;
pub use web3;

pub mod prelude {
    //! A prelude module for importing commonly used types when interacting
    //! with contract bindings.

    pub use crate::args::Options;
    pub use crate::contract::{DecodedLog, Dispatch, Invocation, LibraryInstance};
    pub use crate::transaction::confirm::ConfirmParams;
    pub use crate::transaction::TransactionResult;
    pub use crate::transport::Provider;
    pub use ethbind_common::abi::Token;
    pub use ethbind_common::NetworkTable;
    pub use web3::api::Web3;
    pub use web3::types::{Address, BlockNumber, H256, U256};
}
