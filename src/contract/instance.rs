//! Contract instances bound to an address and their member handles.

use crate::args::{self, Options, TransactionOptions};
use crate::contract::event::{EventHandle, EventIndexExt};
use crate::contract::{call, transaction, DecodedLog};
use crate::errors::ExecutionError;
use crate::transaction::confirm::{Clock, ConfirmParams};
use crate::transaction::TransactionResult;
use crate::transport::Provider;
use ethbind_common::abi::{Function, Token};
use ethbind_common::interface::{EventDescriptor, Member};
use ethbind_common::{EventIndex, Interface};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use web3::api::Web3;
use web3::helpers;
use web3::types::{Address, BlockNumber, Log, H256, U256};

/// How a contract member is invoked.
#[derive(Clone, Debug)]
pub enum Dispatch {
    /// A constant function evaluated with `eth_call`.
    Call(Function),
    /// A function that is sent as a transaction.
    Transaction(Function),
    /// An event.
    Event(EventDescriptor),
}

/// Binding state shared by all clones of an instance.
#[derive(Debug)]
pub(crate) struct Context {
    pub(crate) name: String,
    pub(crate) interface: Interface,
    pub(crate) events: EventIndex,
    pub(crate) members: HashMap<String, Dispatch>,
    pub(crate) defaults: Options,
    pub(crate) confirm: ConfirmParams,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) next_gen: bool,
}

impl Context {
    pub(crate) fn new(
        name: String,
        interface: Interface,
        events: EventIndex,
        defaults: Options,
        confirm: ConfirmParams,
        clock: Arc<dyn Clock>,
        next_gen: bool,
    ) -> Self {
        let members = create_members(&name, &interface);
        Context {
            name,
            interface,
            events,
            members,
            defaults,
            confirm,
            clock,
            next_gen,
        }
    }
}

/// Builds the member table. Later declarations replace earlier ones with the
/// same name.
fn create_members(contract: &str, interface: &Interface) -> HashMap<String, Dispatch> {
    let mut members = HashMap::new();
    for member in interface.members() {
        let (name, dispatch) = match member {
            Member::Function(function) if function.constant => (
                function.name(),
                Dispatch::Call(function.function.clone()),
            ),
            Member::Function(function) => (
                function.name(),
                Dispatch::Transaction(function.function.clone()),
            ),
            Member::Event(event) => (event.name(), Dispatch::Event(event.clone())),
            Member::Constructor(_) => continue,
        };
        if members.insert(name.to_owned(), dispatch).is_some() {
            tracing::warn!(
                contract,
                member = name,
                "member declared more than once, using the last declaration"
            );
        }
    }
    members
}

/// Represents a contract instance at an address. Provides methods for
/// contract interaction by member name.
///
/// Instances are cheap to clone and keep the class defaults and confirmation
/// settings the binding had when they were created.
#[derive(Clone, Debug)]
pub struct BoundContract {
    web3: Option<Web3<Provider>>,
    context: Arc<Context>,
    address: Address,
    transaction_hash: Option<H256>,
}

impl BoundContract {
    pub(crate) fn new(
        web3: Option<Web3<Provider>>,
        context: Arc<Context>,
        address: Address,
        transaction_hash: Option<H256>,
    ) -> Self {
        BoundContract {
            web3,
            context,
            address,
            transaction_hash,
        }
    }

    pub(crate) fn web3(&self) -> Result<&Web3<Provider>, ExecutionError> {
        self.web3.as_ref().ok_or(ExecutionError::NotConfigured)
    }

    /// Returns `true` if the binding had a provider when this instance was
    /// created.
    pub fn has_provider(&self) -> bool {
        self.web3.is_some()
    }

    /// Returns the contract address being used by this instance.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the hash of the transaction that deployed the contract if the
    /// instance was created by deploying it.
    pub fn transaction_hash(&self) -> Option<H256> {
        self.transaction_hash
    }

    /// The name of the contract.
    pub fn contract_name(&self) -> &str {
        &self.context.name
    }

    /// The contract interface.
    pub fn interface(&self) -> &Interface {
        &self.context.interface
    }

    /// The events this instance can decode.
    pub fn events(&self) -> &EventIndex {
        &self.context.events
    }

    /// Looks up how a member is dispatched.
    pub fn member(&self, name: &str) -> Option<&Dispatch> {
        self.context.members.get(name)
    }

    /// Returns a handle for invoking a contract function.
    pub fn method(&self, name: &str) -> Result<MethodHandle, ExecutionError> {
        let (function, constant) = match self.member(name) {
            Some(Dispatch::Call(function)) => (function.clone(), true),
            Some(Dispatch::Transaction(function)) => (function.clone(), false),
            Some(Dispatch::Event(_)) => {
                return Err(ExecutionError::NotAFunction(name.to_owned()))
            }
            None => return Err(ExecutionError::UnknownMember(name.to_owned())),
        };
        Ok(MethodHandle {
            contract: self.clone(),
            function,
            constant,
        })
    }

    /// Invokes a function by name, evaluating constant functions as calls and
    /// sending all others as transactions.
    pub async fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Invocation, ExecutionError> {
        self.method(name)?.invoke(args).await
    }

    /// Returns a handle for querying the logs of an event.
    pub fn event(&self, name: &str) -> Result<EventHandle, ExecutionError> {
        match self.member(name) {
            Some(Dispatch::Event(event)) => Ok(EventHandle::new(self.clone(), vec![event.topic])),
            _ => Err(ExecutionError::UnknownMember(name.to_owned())),
        }
    }

    /// Returns a handle for querying the logs of every known event.
    pub fn all_events(&self) -> EventHandle {
        let mut topics = self.context.events.topics().copied().collect::<Vec<_>>();
        topics.sort();
        EventHandle::new(self.clone(), topics)
    }

    /// Decodes a log with the events known to this instance.
    pub fn decode_log(&self, log: &Log) -> Result<Option<DecodedLog>, ExecutionError> {
        self.context.events.decode(log)
    }
}

/// The outcome of invoking a contract function.
#[derive(Clone, Debug)]
pub enum Invocation {
    /// The decoded return value of a constant function.
    Value(Token),
    /// The result of a transaction.
    Transaction(TransactionResult),
}

impl Invocation {
    /// The return value if the function was evaluated as a call.
    pub fn into_value(self) -> Option<Token> {
        match self {
            Invocation::Value(token) => Some(token),
            _ => None,
        }
    }

    /// The transaction result if the function was sent as a transaction.
    pub fn into_transaction(self) -> Option<TransactionResult> {
        match self {
            Invocation::Transaction(result) => Some(result),
            _ => None,
        }
    }
}

/// An unsent JSON-RPC request.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedRequest {
    /// The RPC method.
    pub method: &'static str,
    /// The RPC parameters.
    pub params: Vec<Value>,
}

/// A handle for invoking one contract function. Arguments are positional
/// JSON values, optionally followed by an object of transaction options that
/// is merged over the class defaults.
#[derive(Clone, Debug)]
pub struct MethodHandle {
    contract: BoundContract,
    function: Function,
    constant: bool,
}

impl MethodHandle {
    /// The function being invoked.
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Returns `true` if the function is evaluated with a call.
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    fn prepare(&self, args: Vec<Value>) -> Result<(web3::types::Bytes, TransactionOptions), ExecutionError> {
        let (args, options) = args::normalize(args, &self.contract.context.defaults);
        let data = call::encode_input(&self.function, &args)?;
        let options = TransactionOptions::from_map(&options)?;
        Ok((data, options))
    }

    /// Dispatches to `call` for constant functions and to `transact`
    /// otherwise.
    pub async fn invoke(&self, args: Vec<Value>) -> Result<Invocation, ExecutionError> {
        if self.constant {
            self.call(args).await.map(Invocation::Value)
        } else {
            self.transact(args).await.map(Invocation::Transaction)
        }
    }

    /// Evaluates the function with `eth_call` without creating a
    /// transaction, regardless of whether it is constant.
    pub async fn call(&self, args: Vec<Value>) -> Result<Token, ExecutionError> {
        let (data, options) = self.prepare(args)?;
        let request = options.call_request(self.contract.address, data);
        call::call(self.contract.web3()?, &self.function, request).await
    }

    /// Sends the function as a transaction and returns its hash without
    /// waiting for it to be mined.
    pub async fn send_transaction(&self, args: Vec<Value>) -> Result<H256, ExecutionError> {
        let (data, options) = self.prepare(args)?;
        let web3 = self.contract.web3()?;
        transaction::submit(web3, Some(self.contract.address), data, &options).await
    }

    /// Sends the function as a transaction and waits for it to be mined.
    pub async fn transact(&self, args: Vec<Value>) -> Result<TransactionResult, ExecutionError> {
        let hash = self.send_transaction(args).await?;
        transaction::wait_for_result(&self.contract.context, self.contract.web3()?, hash).await
    }

    /// Estimates the gas needed to execute the function.
    pub async fn estimate_gas(&self, args: Vec<Value>) -> Result<U256, ExecutionError> {
        let (data, options) = self.prepare(args)?;
        let request = options.call_request(self.contract.address, data);
        let gas = self
            .contract
            .web3()?
            .eth()
            .estimate_gas(request, None)
            .await?;
        Ok(gas)
    }

    /// Builds the request `invoke` would send without sending it.
    pub fn request(&self, args: Vec<Value>) -> Result<PreparedRequest, ExecutionError> {
        let (data, options) = self.prepare(args)?;
        let request = helpers::serialize(&options.call_request(self.contract.address, data));
        if self.constant {
            return Ok(PreparedRequest {
                method: "eth_call",
                params: vec![request, helpers::serialize(&BlockNumber::Latest)],
            });
        }

        let mut request = request;
        if let (Some(nonce), Value::Object(fields)) = (options.nonce, &mut request) {
            fields.insert("nonce".to_owned(), helpers::serialize(&nonce));
        }
        Ok(PreparedRequest {
            method: "eth_sendTransaction",
            params: vec![request],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::tests::{drone, drone_with_provider};
    use crate::contract::Binding;
    use crate::test::prelude::*;
    use ethbind_common::abi::{self, Token};
    use ethbind_common::interface::EventDescriptor;
    use web3::types::{Bytes, H2048};

    const INSTANCE: &str = "0x9fac3b52be975567103c4695a2835bba40076da1";

    fn ropsten() -> (Binding, TestTransport, ManualClock) {
        let (binding, transport) = drone_with_provider();
        let mut binding = binding.for_network("3").unwrap();
        let clock = ManualClock::new();
        binding.set_clock(clock.clone());
        (binding, transport, clock)
    }

    fn selector(contract: &BoundContract, name: &str) -> Vec<u8> {
        contract.method(name).unwrap().function().short_signature().to_vec()
    }

    fn receipt(hash: H256, logs: Vec<Value>) -> Value {
        json!({
            "transactionHash": hash,
            "transactionIndex": "0x1",
            "blockNumber": "0x2",
            "blockHash": H256::zero(),
            "cumulativeGasUsed": "0x1337",
            "gasUsed": "0x1337",
            "logsBloom": H2048::zero(),
            "logs": logs,
        })
    }

    fn flight_log(topic: H256, to: Address, uploaded_to: &str) -> Value {
        json!({
            "address": addr!(INSTANCE),
            "topics": [topic],
            "data": Bytes(abi::encode(&[
                Token::Address(to),
                Token::String(uploaded_to.to_owned()),
            ])),
            "blockHash": H256::zero(),
            "blockNumber": "0x2",
            "transactionHash": hash!("0x1111111111111111111111111111111111111111111111111111111111111111"),
            "transactionIndex": "0x1",
            "logIndex": "0x0",
            "transactionLogIndex": "0x0",
            "logType": "",
            "removed": false,
        })
    }

    #[test]
    fn dispatch_table() {
        let (binding, _, _) = ropsten();
        let instance = binding.deployed().unwrap();

        assert!(matches!(instance.member("owner"), Some(Dispatch::Call(_))));
        assert!(matches!(
            instance.member("requestFlight"),
            Some(Dispatch::Transaction(_))
        ));
        assert!(matches!(
            instance.member("flightLog"),
            Some(Dispatch::Event(_))
        ));
        assert!(instance.member("constructor").is_none());

        // last declared overload wins
        match instance.member("__callback") {
            Some(Dispatch::Transaction(function)) => assert_eq!(function.inputs.len(), 3),
            other => panic!("unexpected dispatch {:?}", other),
        }
        assert_eq!(
            instance.interface().functions_named("__callback").count(),
            2
        );
    }

    #[test]
    fn unknown_members() {
        let (binding, _, _) = ropsten();
        let instance = binding.deployed().unwrap();

        assert!(matches!(
            instance.method("fly"),
            Err(ExecutionError::UnknownMember(name)) if name == "fly"
        ));
        assert!(matches!(
            instance.method("flightLog"),
            Err(ExecutionError::NotAFunction(name)) if name == "flightLog"
        ));
        assert!(matches!(
            instance.event("owner"),
            Err(ExecutionError::UnknownMember(_))
        ));
    }

    #[test]
    fn constant_function_is_called_once() {
        let (binding, mut transport, _) = ropsten();
        let instance = binding.deployed().unwrap();
        let owner = Address::repeat_byte(0x42);

        transport.add_response(json!(Bytes(abi::encode(&[Token::Address(owner)]))));
        let result = instance
            .invoke("owner", vec![])
            .immediate()
            .expect("call failed")
            .into_value()
            .unwrap();

        assert_eq!(result, Token::Address(owner));
        transport.assert_request(
            "eth_call",
            &[
                json!({
                    "to": addr!(INSTANCE),
                    "data": Bytes(selector(&instance, "owner")),
                }),
                json!("latest"),
            ],
        );
        transport.assert_no_more_requests();
    }

    #[test]
    fn call_failures_are_not_retried() {
        let (binding, mut transport, _) = ropsten();
        let instance = binding.deployed().unwrap();

        transport.add_error("execution reverted");
        let result = instance.invoke("owner", vec![]).immediate();

        assert!(matches!(result, Err(ExecutionError::Transport(_))));
        transport.assert_method("eth_call");
        transport.assert_no_more_requests();
    }

    #[test]
    fn transaction_waits_for_receipt() {
        let (binding, mut transport, clock) = ropsten();
        let instance = binding.deployed().unwrap();
        let from = Address::repeat_byte(0x01);
        let hash = H256::repeat_byte(0xff);

        transport.add_response(json!(hash));
        transport.add_response(json!(null));
        transport.add_response(receipt(hash, vec![]));

        let result = instance
            .invoke(
                "changeAPIURL",
                vec![json!("https://drone.example"), json!({ "from": from })],
            )
            .wait()
            .expect("transaction failed")
            .into_transaction()
            .unwrap();

        assert!(result.is_hash());
        assert_eq!(result.hash(), hash);
        assert_eq!(clock.sleeps().len(), 1);

        let data = instance
            .method("changeAPIURL")
            .unwrap()
            .function()
            .encode_input(&[Token::String("https://drone.example".to_owned())])
            .unwrap();
        transport.assert_request(
            "eth_sendTransaction",
            &[json!({
                "from": from,
                "to": addr!(INSTANCE),
                "data": Bytes(data),
            })],
        );
        transport.assert_request("eth_getTransactionReceipt", &[json!(hash)]);
        transport.assert_request("eth_getTransactionReceipt", &[json!(hash)]);
        transport.assert_no_more_requests();
    }

    #[test]
    fn transaction_uses_node_account_without_sender() {
        let (binding, mut transport, _) = ropsten();
        let instance = binding.deployed().unwrap();
        let account = Address::repeat_byte(0x07);
        let hash = H256::repeat_byte(0xff);

        transport.add_response(json!([account]));
        transport.add_response(json!(hash));

        let sent = instance
            .method("requestFlight")
            .unwrap()
            .send_transaction(vec![])
            .immediate()
            .expect("transaction failed");

        assert_eq!(sent, hash);
        transport.assert_request("eth_accounts", &[]);
        transport.assert_request(
            "eth_sendTransaction",
            &[json!({
                "from": account,
                "to": addr!(INSTANCE),
                "data": Bytes(selector(&instance, "requestFlight")),
            })],
        );
        transport.assert_no_more_requests();
    }

    #[test]
    fn rejected_transaction() {
        let (binding, mut transport, _) = ropsten();
        let instance = binding.deployed().unwrap();

        transport.add_error("insufficient funds");
        let result = instance
            .invoke("requestFlight", vec![json!({ "from": Address::repeat_byte(0x01) })])
            .immediate();

        assert!(matches!(result, Err(ExecutionError::Submission(_))));
        transport.assert_method("eth_sendTransaction");
        transport.assert_no_more_requests();
    }

    #[test]
    fn failed_account_lookup_is_a_submission_error() {
        let (binding, mut transport, _) = ropsten();
        let instance = binding.deployed().unwrap();

        transport.add_error("accounts unavailable");
        let result = instance.invoke("requestFlight", vec![]).immediate();

        assert!(matches!(result, Err(ExecutionError::Submission(_))));
        transport.assert_method("eth_accounts");
        transport.assert_no_more_requests();
    }

    #[test]
    fn transaction_options_override_class_defaults() {
        let (mut binding, mut transport, _) = ropsten();
        let from = Address::repeat_byte(0x01);
        binding.set_class_defaults(
            json!({ "gas": 100, "from": from })
                .as_object()
                .unwrap()
                .clone(),
        );
        let instance = binding.deployed().unwrap();
        let hash = H256::repeat_byte(0xff);

        transport.add_response(json!(hash));
        transport.add_response(receipt(hash, vec![]));
        instance
            .invoke("resetStateOwner", vec![json!({ "gas": 200 })])
            .immediate()
            .expect("transaction failed");

        transport.assert_request(
            "eth_sendTransaction",
            &[json!({
                "from": from,
                "to": addr!(INSTANCE),
                "gas": U256::from(200),
                "data": Bytes(selector(&instance, "resetStateOwner")),
            })],
        );
        transport.assert_request("eth_getTransactionReceipt", &[json!(hash)]);
        transport.assert_no_more_requests();
    }

    #[test]
    fn instances_snapshot_class_defaults() {
        let (mut binding, _, _) = ropsten();
        let instance = binding.deployed().unwrap();
        binding.set_class_defaults(json!({ "gas": 100 }).as_object().unwrap().clone());

        let request = instance
            .method("resetStateOwner")
            .unwrap()
            .request(vec![json!({ "from": Address::repeat_byte(0x01) })])
            .unwrap();
        assert!(request.params[0].get("gas").is_none());

        let request = binding
            .deployed()
            .unwrap()
            .method("resetStateOwner")
            .unwrap()
            .request(vec![json!({ "from": Address::repeat_byte(0x01) })])
            .unwrap();
        assert_eq!(request.params[0]["gas"], json!(U256::from(100)));
    }

    #[test]
    fn next_gen_transaction_decodes_logs() {
        let (mut binding, mut transport, _) = ropsten();
        binding.set_next_gen(true);
        let instance = binding.deployed().unwrap();
        let hash = H256::repeat_byte(0xff);
        let topic = instance.events().by_name("flightLog").unwrap().topic;
        let pilot = Address::repeat_byte(0x05);

        let unknown = {
            let mut log = flight_log(topic, pilot, "ignored");
            log["topics"] = json!([H256::repeat_byte(0xee)]);
            log
        };
        transport.add_response(json!(hash));
        transport.add_response(receipt(
            hash,
            vec![unknown, flight_log(topic, pilot, "ipfs://QmFlight")],
        ));

        let mined = instance
            .invoke(
                "resetState",
                vec![json!("ipfs://QmFlight"), json!({ "from": pilot })],
            )
            .immediate()
            .expect("transaction failed")
            .into_transaction()
            .unwrap()
            .into_mined()
            .unwrap();

        assert_eq!(mined.hash, hash);
        assert_eq!(mined.receipt.transaction_hash, hash);
        assert_eq!(mined.logs.len(), 1);
        assert_eq!(mined.logs[0].event, "flightLog");
        assert_eq!(mined.logs[0].arg("to"), Some(&Token::Address(pilot)));
        assert_eq!(
            mined.logs[0].arg("uploadedTo"),
            Some(&Token::String("ipfs://QmFlight".to_owned()))
        );
    }

    #[test]
    fn transaction_times_out() {
        let (mut binding, mut transport, clock) = ropsten();
        binding.set_synchronization_timeout(2000);
        binding.set_poll_interval(std::time::Duration::from_millis(100));
        let instance = binding.deployed().unwrap();
        let hash = H256::repeat_byte(0xff);

        transport.add_response(json!(hash));
        for _ in 0..22 {
            transport.add_response(json!(null));
        }

        let err = instance
            .invoke("withdrawfunds", vec![json!({ "from": Address::repeat_byte(0x01) })])
            .wait()
            .unwrap_err();

        assert!(matches!(err, ExecutionError::ConfirmationTimeout { .. }));
        assert_eq!(clock.elapsed(), std::time::Duration::from_millis(2100));
        assert!(err.to_string().contains("2 seconds"));
        transport.assert_method("eth_sendTransaction");
        for _ in 0..22 {
            transport.assert_method("eth_getTransactionReceipt");
        }
        transport.assert_no_more_requests();
    }

    #[test]
    fn invalid_arguments_fail_before_any_request() {
        let (binding, transport, _) = ropsten();
        let instance = binding.deployed().unwrap();

        let result = instance
            .invoke("changeDroneStation", vec![json!(42)])
            .immediate();
        assert!(matches!(result, Err(ExecutionError::InvalidArgument(_))));

        let result = instance
            .invoke("changeDroneStation", vec![json!({ "gas": "lots" })])
            .immediate();
        assert!(matches!(result, Err(ExecutionError::InvalidArgument(_))));

        let result = instance
            .invoke(
                "changeDroneStation",
                vec![json!(format!("0x{}", "1".repeat(40))), json!({ "gas": "lots" })],
            )
            .immediate();
        assert!(matches!(result, Err(ExecutionError::InvalidOptions(_))));
        transport.assert_untouched();
    }

    #[test]
    fn big_number_is_a_parameter() {
        let interface = serde_json::from_value::<Interface>(json!([{
            "constant": true,
            "inputs": [{ "name": "amount", "type": "uint256" }],
            "name": "double",
            "outputs": [{ "name": "", "type": "uint256" }],
            "type": "function"
        }]))
        .unwrap();
        let record = ethbind_common::NetworkRecord {
            abi: interface,
            address: Some(Address::repeat_byte(0x99)),
            ..Default::default()
        };
        let mut binding = Binding::new(
            "Doubler",
            ethbind_common::NetworkTable::with_record("default", record),
        );
        let mut transport = TestTransport::new();
        binding.set_provider(transport.clone());
        let instance = binding.deployed().unwrap();

        transport.add_response(json!(Bytes(abi::encode(&[Token::Uint(98.into())]))));
        let result = instance
            .invoke("double", vec![json!({ "_hex": "0x31" })])
            .immediate()
            .unwrap()
            .into_value();

        assert_eq!(result, Some(Token::Uint(98.into())));
        let expected = instance
            .method("double")
            .unwrap()
            .function()
            .encode_input(&[Token::Uint(49.into())])
            .unwrap();
        transport.assert_request(
            "eth_call",
            &[
                json!({ "to": Address::repeat_byte(0x99), "data": Bytes(expected) }),
                json!("latest"),
            ],
        );
    }

    #[test]
    fn estimate_gas_and_request() {
        let (binding, mut transport, _) = ropsten();
        let instance = binding.deployed().unwrap();
        let method = instance.method("requestFlight").unwrap();
        let from = Address::repeat_byte(0x01);

        transport.add_response(json!("0x5208"));
        let gas = method
            .estimate_gas(vec![json!({ "from": from, "value": 1 })])
            .immediate()
            .unwrap();
        assert_eq!(gas, U256::from(21000));

        let request = method
            .request(vec![json!({ "from": from, "nonce": 3 })])
            .unwrap();
        assert_eq!(
            request,
            PreparedRequest {
                method: "eth_sendTransaction",
                params: vec![json!({
                    "from": from,
                    "to": addr!(INSTANCE),
                    "data": Bytes(selector(&instance, "requestFlight")),
                    "nonce": U256::from(3),
                })],
            }
        );

        transport.assert_request(
            "eth_estimateGas",
            &[json!({
                "from": from,
                "to": addr!(INSTANCE),
                "value": U256::from(1),
                "data": Bytes(selector(&instance, "requestFlight")),
            })],
        );
        transport.assert_no_more_requests();
    }

    #[test]
    fn event_queries() {
        let (binding, mut transport, _) = ropsten();
        let instance = binding.deployed().unwrap();
        let topic = instance.events().by_name("flightLog").unwrap().topic;
        let pilot = Address::repeat_byte(0x05);

        let handle = instance.event("flightLog").unwrap();
        transport.add_response(json!([flight_log(topic, pilot, "ipfs://QmFlight")]));
        let logs = handle.query().immediate().unwrap();

        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].event, "flightLog");
        transport.assert_request("eth_getLogs", &[json!(handle.filter())]);

        let all = instance.all_events().from_block(BlockNumber::Earliest);
        let filter = json!(all.filter());
        assert_eq!(filter["address"], json!(addr!(INSTANCE)));
        assert_eq!(filter["topics"][0].as_array().unwrap().len(), 2);
        transport.assert_no_more_requests();
    }

    #[test]
    fn decode_log_with_merged_library_events() {
        let (binding, _, _) = ropsten();
        let instance = binding.deployed().unwrap();

        let event = EventDescriptor::new(
            serde_json::from_value(json!({
                "name": "Computed",
                "anonymous": false,
                "inputs": [{ "name": "result", "type": "uint256", "indexed": false }]
            }))
            .unwrap(),
        );
        let log: Log = serde_json::from_value(json!({
            "address": addr!(INSTANCE),
            "topics": [event.topic],
            "data": Bytes(abi::encode(&[Token::Uint(3.into())])),
        }))
        .unwrap();
        assert_eq!(instance.decode_log(&log).unwrap(), None);

        let mut library = drone();
        library.state.events = {
            let mut events = EventIndex::default();
            events.insert(event.topic, event);
            events
        };
        library.state.address = Some(Address::repeat_byte(0x44));
        let mut binding = binding;
        binding.link_library(&library).unwrap();

        let decoded = binding.deployed().unwrap().decode_log(&log).unwrap().unwrap();
        assert_eq!(decoded.event, "Computed");
    }

    #[tokio::test]
    async fn concurrent_calls_share_instance() {
        let (binding, mut transport, _) = ropsten();
        let instance = binding.deployed().unwrap();

        for byte in 1..=3u8 {
            transport.add_response(json!(Bytes(abi::encode(&[Token::Address(
                Address::repeat_byte(byte)
            )]))));
        }

        let calls = (0..3).map(|_| {
            let instance = instance.clone();
            async move { instance.invoke("owner", vec![]).await }
        });
        let results = futures::future::join_all(calls).await;

        let owners = results
            .into_iter()
            .map(|result| result.unwrap().into_value().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            owners,
            (1..=3u8)
                .map(|byte| Token::Address(Address::repeat_byte(byte)))
                .collect::<Vec<_>>()
        );
        for _ in 0..3 {
            transport.assert_method("eth_call");
        }
        transport.assert_no_more_requests();
    }
}
