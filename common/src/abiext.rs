//! This module implements extensions to the `ethabi` API.

use crate::hash;
use ethabi::{Event, ParamType};
use web3::types::H256;

/// Extension trait for `ethabi::Event`.
pub trait EventExt {
    /// Compute the event signature in the standard ABI format, for example
    /// `Transfer(address,address,uint256)`.
    fn abi_signature(&self) -> String;

    /// Compute the topic identifying logs emitted by this event.
    fn topic(&self) -> H256;
}

impl EventExt for Event {
    fn abi_signature(&self) -> String {
        format_signature(&self.name, self.inputs.iter().map(|input| &input.kind))
    }

    fn topic(&self) -> H256 {
        hash::event_topic(self.abi_signature())
    }
}

fn format_signature<'a, I>(name: &str, kinds: I) -> String
where
    I: Iterator<Item = &'a ParamType>,
{
    format!(
        "{}({})",
        name,
        kinds
            .map(|kind| kind.to_string())
            .collect::<Vec<_>>()
            .join(","),
    )
}
