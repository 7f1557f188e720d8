//! Encoding of contract function inputs and evaluation of read-only calls.

use crate::errors::ExecutionError;
use crate::tokens;
use crate::transport::Provider;
use ethbind_common::abi::{Function, Token};
use serde_json::Value;
use web3::api::Web3;
use web3::types::{Bytes, CallRequest};

/// ABI encodes a function call from positional arguments.
pub(crate) fn encode_input(function: &Function, args: &[Value]) -> Result<Bytes, ExecutionError> {
    let tokens = tokens::tokenize_all(&function.inputs, args)?;
    let data = function
        .encode_input(&tokens)
        .map_err(ExecutionError::Abi)?;
    Ok(Bytes(data))
}

/// Evaluates a call against the latest block and decodes its output. The
/// call is made exactly once.
pub(crate) async fn call(
    web3: &Web3<Provider>,
    function: &Function,
    request: CallRequest,
) -> Result<Token, ExecutionError> {
    tracing::debug!(function = %function.name, to = ?request.to, "calling contract");
    let output = web3.eth().call(request, None).await?;
    decode_output(function, &output.0)
}

/// Decodes call output: no outputs yield an empty tuple, a single output
/// yields its value and multiple outputs yield a tuple.
pub(crate) fn decode_output(function: &Function, data: &[u8]) -> Result<Token, ExecutionError> {
    let mut tokens = function
        .decode_output(data)
        .map_err(ExecutionError::Decode)?;
    let token = match tokens.len() {
        0 => Token::Tuple(Vec::new()),
        1 => tokens.remove(0),
        _ => Token::Tuple(tokens),
    };
    Ok(token)
}
