#![deny(missing_docs, unsafe_code)]

//! Crate for common types shared by the `ethbind` runtime: contract
//! interfaces, deployment bytecode and truffle network tables.

pub mod abiext;
pub mod bytecode;
pub mod errors;
pub mod hash;
pub mod interface;
pub mod truffle;

pub use crate::bytecode::Bytecode;
pub use crate::interface::{Interface, Member};
pub use crate::truffle::{EventIndex, NetworkRecord, NetworkTable};
pub use ethabi as abi;
pub use web3::types::{Address, H256};
