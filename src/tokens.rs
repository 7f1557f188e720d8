//! Conversion of JSON arguments into ABI tokens.
//!
//! Arguments arrive as loosely typed JSON values, so conversion is driven by
//! the declared parameter type: integers accept numbers, decimal and hex
//! strings or big number objects, byte types accept `0x` hex strings and
//! arrays and tuples accept JSON arrays.

use crate::args;
use ethbind_common::abi::{Param, ParamType, Token};
use serde_json::Value;
use web3::types::U256;

/// A tokenization related error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The JSON value cannot represent the parameter type.
    #[error("expected a value of type {expected}, got {value}")]
    TypeMismatch {
        /// The declared parameter type.
        expected: ParamType,
        /// The offending value.
        value: Value,
    },
    /// The integer does not fit into the declared bit width.
    #[error("integer {0} does not fit into {1}")]
    IntegerOverflow(Value, ParamType),
    /// Fixed bytes value is longer than the declared size.
    #[error("expected at most {0} bytes")]
    FixedBytesLengthMismatch(usize),
    /// Fixed array or tuple has the wrong number of elements.
    #[error("expected {expected} elements, got {actual}")]
    LengthMismatch {
        /// The declared length.
        expected: usize,
        /// The number of supplied elements.
        actual: usize,
    },
    /// The wrong number of arguments was supplied.
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount {
        /// The number of declared parameters.
        expected: usize,
        /// The number of supplied arguments.
        actual: usize,
    },
}

/// Converts a positional argument list into tokens for the declared
/// parameters.
pub fn tokenize_all(params: &[Param], args: &[Value]) -> Result<Vec<Token>, Error> {
    if params.len() != args.len() {
        return Err(Error::ArgumentCount {
            expected: params.len(),
            actual: args.len(),
        });
    }
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| tokenize(&param.kind, arg))
        .collect()
}

/// Converts a single JSON value into a token of the given type.
pub fn tokenize(kind: &ParamType, value: &Value) -> Result<Token, Error> {
    let mismatch = || Error::TypeMismatch {
        expected: kind.clone(),
        value: value.clone(),
    };

    match kind {
        ParamType::Address => value
            .as_str()
            .and_then(args::parse_address)
            .map(Token::Address)
            .ok_or_else(mismatch),
        ParamType::Bool => value.as_bool().map(Token::Bool).ok_or_else(mismatch),
        ParamType::String => value
            .as_str()
            .map(|s| Token::String(s.to_owned()))
            .ok_or_else(mismatch),
        ParamType::Bytes => hex_bytes(value).map(Token::Bytes).ok_or_else(mismatch),
        ParamType::FixedBytes(size) => {
            let mut bytes = hex_bytes(value).ok_or_else(mismatch)?;
            if bytes.len() > *size {
                return Err(Error::FixedBytesLengthMismatch(*size));
            }
            bytes.resize(*size, 0);
            Ok(Token::FixedBytes(bytes))
        }
        ParamType::Uint(bits) => {
            let uint = args::parse_u256(value).ok_or_else(mismatch)?;
            if uint.bits() > *bits {
                return Err(Error::IntegerOverflow(value.clone(), kind.clone()));
            }
            Ok(Token::Uint(uint))
        }
        ParamType::Int(bits) => {
            let (negative, magnitude) = signed(value).ok_or_else(mismatch)?;
            // the magnitude of the minimum value is one larger than the maximum
            let limit = U256::one() << (*bits - 1);
            if magnitude > limit || (!negative && magnitude == limit) {
                return Err(Error::IntegerOverflow(value.clone(), kind.clone()));
            }
            let int = if negative {
                magnitude.overflowing_neg().0
            } else {
                magnitude
            };
            Ok(Token::Int(int))
        }
        ParamType::Array(inner) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            let tokens = items
                .iter()
                .map(|item| tokenize(inner, item))
                .collect::<Result<_, _>>()?;
            Ok(Token::Array(tokens))
        }
        ParamType::FixedArray(inner, len) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            check_length(*len, items.len())?;
            let tokens = items
                .iter()
                .map(|item| tokenize(inner, item))
                .collect::<Result<_, _>>()?;
            Ok(Token::FixedArray(tokens))
        }
        ParamType::Tuple(kinds) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            check_length(kinds.len(), items.len())?;
            let tokens = kinds
                .iter()
                .zip(items)
                .map(|(kind, item)| tokenize(kind, item))
                .collect::<Result<_, _>>()?;
            Ok(Token::Tuple(tokens))
        }
    }
}

fn check_length(expected: usize, actual: usize) -> Result<(), Error> {
    if expected != actual {
        return Err(Error::LengthMismatch { expected, actual });
    }
    Ok(())
}

fn hex_bytes(value: &Value) -> Option<Vec<u8>> {
    let hex = value.as_str()?.strip_prefix("0x")?;
    hex::decode(hex).ok()
}

/// Splits a signed integer value into its sign and magnitude.
fn signed(value: &Value) -> Option<(bool, U256)> {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(int) => Some((int < 0, U256::from(int.unsigned_abs()))),
            None => number.as_u64().map(|uint| (false, U256::from(uint))),
        },
        Value::String(s) => match s.strip_prefix('-') {
            Some(magnitude) => {
                args::parse_u256(&Value::String(magnitude.to_owned())).map(|m| (true, m))
            }
            None => args::parse_u256(value).map(|m| (false, m)),
        },
        _ => args::parse_u256(value).map(|m| (false, m)),
    }
}
