//! Normalization of positional contract arguments.
//!
//! Contract members are invoked with a list of JSON arguments where the last
//! one may be a map of transaction options instead of a real parameter. This
//! module separates the two and merges the options over the class defaults.

use crate::errors::ExecutionError;
use serde_json::{Map, Value};
use web3::types::{Address, Bytes, CallRequest, TransactionRequest, U256};

/// String keyed transaction options such as `from`, `gas` or `value`.
pub type Options = Map<String, Value>;

/// Returns `true` if a value is an object encoded big integer, that is either
/// `{"type": "BigNumber", "hex": "0x.."}` or `{"_hex": "0x.."}` with a payload
/// that fits into 256 bits.
pub fn is_big_number(value: &Value) -> bool {
    big_number_hex(value)
        .map(|hex| parse_hex_u256(hex).is_some())
        .unwrap_or(false)
}

fn big_number_hex(value: &Value) -> Option<&str> {
    let object = value.as_object()?;
    let hex = match object.get("type").and_then(Value::as_str) {
        Some("BigNumber") => object.get("hex"),
        _ => object.get("_hex"),
    };
    hex.and_then(Value::as_str)
}

/// Returns `true` if a trailing argument is a map of transaction options.
pub fn is_options(value: &Value) -> bool {
    value.is_object() && !is_big_number(value)
}

/// Splits transaction options off the end of an argument list and merges
/// them over the defaults. Without trailing options the defaults are
/// returned unchanged.
///
/// Note that this means a plain JSON object can never be passed as the last
/// real parameter, as it is always taken to be options.
pub fn normalize(mut args: Vec<Value>, defaults: &Options) -> (Vec<Value>, Options) {
    let options = match args.last() {
        Some(last) if is_options(last) => match args.pop() {
            Some(Value::Object(options)) => options,
            _ => Options::new(),
        },
        _ => Options::new(),
    };
    (args, merge(defaults, options))
}

/// Copies `base` and overwrites it key by key with `overrides`.
pub fn merge(base: &Options, overrides: Options) -> Options {
    let mut merged = base.clone();
    merged.extend(overrides);
    merged
}

/// Parses an unsigned 256-bit integer from a JSON number, a decimal or `0x`
/// prefixed hex string, or a big number object.
pub(crate) fn parse_u256(value: &Value) -> Option<U256> {
    match value {
        Value::Number(number) => number.as_u64().map(U256::from),
        Value::String(s) if s.starts_with("0x") => parse_hex_u256(s),
        Value::String(s) => U256::from_dec_str(s).ok(),
        Value::Object(_) => big_number_hex(value).and_then(parse_hex_u256),
        _ => None,
    }
}

fn parse_hex_u256(s: &str) -> Option<U256> {
    let hex = s.strip_prefix("0x")?;
    if hex.is_empty() {
        return None;
    }
    U256::from_str_radix(hex, 16).ok()
}

/// Transaction options resolved from an options map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionOptions {
    /// The sender.
    pub from: Option<Address>,
    /// The receiver, overridden by the contract address for member calls.
    pub to: Option<Address>,
    /// The gas limit.
    pub gas: Option<U256>,
    /// The gas price.
    pub gas_price: Option<U256>,
    /// The value to transfer.
    pub value: Option<U256>,
    /// Raw call data.
    pub data: Option<Bytes>,
    /// The sender nonce.
    pub nonce: Option<U256>,
}

impl TransactionOptions {
    /// Interprets an options map. Unknown keys are ignored, `null` values are
    /// treated as absent.
    pub fn from_map(options: &Options) -> Result<Self, ExecutionError> {
        Ok(TransactionOptions {
            from: address_option(options, "from")?,
            to: address_option(options, "to")?,
            gas: uint_option(options, "gas")?,
            gas_price: uint_option(options, "gasPrice")?,
            value: uint_option(options, "value")?,
            data: bytes_option(options, "data")?,
            nonce: uint_option(options, "nonce")?,
        })
    }

    /// Builds a call request to a contract.
    pub fn call_request(&self, to: Address, data: Bytes) -> CallRequest {
        CallRequest {
            from: self.from,
            to: Some(to),
            gas: self.gas,
            gas_price: self.gas_price,
            value: self.value,
            data: Some(data),
            ..Default::default()
        }
    }

    /// Builds a transaction request. A `to` of `None` creates a contract.
    pub fn transaction_request(
        &self,
        from: Address,
        to: Option<Address>,
        data: Bytes,
    ) -> TransactionRequest {
        TransactionRequest {
            from,
            to,
            gas: self.gas,
            gas_price: self.gas_price,
            value: self.value,
            data: Some(data),
            nonce: self.nonce,
            ..Default::default()
        }
    }
}

fn present<'a>(options: &'a Options, key: &str) -> Option<&'a Value> {
    options.get(key).filter(|value| !value.is_null())
}

fn address_option(options: &Options, key: &str) -> Result<Option<Address>, ExecutionError> {
    present(options, key)
        .map(|value| {
            value
                .as_str()
                .and_then(parse_address)
                .ok_or_else(|| invalid(key, value))
        })
        .transpose()
}

fn uint_option(options: &Options, key: &str) -> Result<Option<U256>, ExecutionError> {
    present(options, key)
        .map(|value| parse_u256(value).ok_or_else(|| invalid(key, value)))
        .transpose()
}

fn bytes_option(options: &Options, key: &str) -> Result<Option<Bytes>, ExecutionError> {
    present(options, key)
        .map(|value| {
            value
                .as_str()
                .and_then(|s| s.strip_prefix("0x"))
                .and_then(|hex| hex::decode(hex).ok())
                .map(Bytes)
                .ok_or_else(|| invalid(key, value))
        })
        .transpose()
}

fn invalid(key: &str, value: &Value) -> ExecutionError {
    ExecutionError::InvalidOptions(format!("invalid value {} for '{}'", value, key))
}

/// Parses a `0x` prefixed 40 digit hex address.
pub(crate) fn parse_address(s: &str) -> Option<Address> {
    let hex = s.strip_prefix("0x")?;
    if hex.len() != 40 {
        return None;
    }
    hex.parse().ok()
}
