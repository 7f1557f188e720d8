//! Keccak256 hash utilities.

use tiny_keccak::{Hasher, Keccak};
use web3::types::H256;

/// Perform a Keccak256 hash of data and return its 32-byte result.
pub fn keccak256<B>(data: B) -> [u8; 32]
where
    B: AsRef<[u8]>,
{
    let mut output = [0u8; 32];
    let mut hasher = Keccak::v256();
    hasher.update(data.as_ref());
    hasher.finalize(&mut output);
    output
}

/// Calculate the topic of an event, that is the full Keccak256 hash of its
/// canonical signature. Non-anonymous events emit this as their first topic.
pub fn event_topic<S>(signature: S) -> H256
where
    S: AsRef<str>,
{
    H256(keccak256(signature.as_ref()))
}
