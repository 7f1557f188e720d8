//! Deployment of new contract instances from the linked bytecode.

use crate::args::{self, TransactionOptions};
use crate::contract::{transaction, Binding, BoundContract};
use crate::errors::{BindingError, ExecutionError};
use crate::tokens::{self, Error as TokenError};
use crate::transaction::confirm;
use serde_json::Value;
use web3::types::Bytes;

impl Binding {
    /// Deploys a new instance of the contract and waits for the deployment
    /// transaction to be mined.
    ///
    /// The positional arguments are passed to the constructor and may be
    /// followed by transaction options. A `data` option replaces the linked
    /// bytecode. Every library the bytecode references must be linked first.
    pub async fn deploy_new(&self, args: Vec<Value>) -> Result<BoundContract, BindingError> {
        let web3 = self.web3.as_ref().ok_or(BindingError::NotConfigured)?;
        if self.state.unlinked_binary.is_empty() {
            return Err(BindingError::MissingBytecode(self.name.clone()));
        }

        let binary = self.binary();
        let unresolved = binary.undefined_libraries();
        if !unresolved.is_empty() {
            return Err(BindingError::UnresolvedLibraries(unresolved));
        }

        let (args, options) = args::normalize(args, &self.defaults);
        let options = TransactionOptions::from_map(&options)?;
        let code = match &options.data {
            Some(data) => data.clone(),
            None => binary.to_bytes()?,
        };
        let data = self.encode_constructor(code, &args)?;

        let hash = transaction::submit(web3, None, data, &options).await?;
        tracing::debug!(contract = %self.name, ?hash, "waiting for deployment");
        let receipt =
            confirm::wait_for_receipt(web3, hash, &self.confirm, self.clock.as_ref()).await?;
        let address = receipt
            .contract_address
            .ok_or(BindingError::MissingContractAddress(hash))?;

        tracing::info!(contract = %self.name, ?address, "contract deployed");
        Ok(self.instance(address, Some(hash)))
    }

    fn encode_constructor(&self, code: Bytes, args: &[Value]) -> Result<Bytes, ExecutionError> {
        let constructor = match self.state.interface.constructor() {
            Some(constructor) => &constructor.constructor,
            None if args.is_empty() => return Ok(code),
            None => {
                return Err(TokenError::ArgumentCount {
                    expected: 0,
                    actual: args.len(),
                }
                .into())
            }
        };

        let tokens = tokens::tokenize_all(&constructor.inputs, args)?;
        let data = constructor
            .encode_input(code.0, &tokens)
            .map_err(ExecutionError::Abi)?;
        Ok(Bytes(data))
    }
}
