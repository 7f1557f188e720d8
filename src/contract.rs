//! Runtime contract bindings. A [`Binding`] is built from a contract name and
//! its truffle network table and creates [`BoundContract`] instances which
//! dispatch calls, transactions and event queries by member name.

pub(crate) mod call;
mod deploy;
pub mod event;
mod instance;
mod link;
pub(crate) mod transaction;

use crate::args::{self, Options};
use crate::errors::{ArtifactError, BindingError, ExecutionError};
use crate::transaction::confirm::{Clock, ConfirmParams, SystemClock};
use crate::transport::Provider;
use ethbind_common::{Bytecode, EventIndex, Interface, NetworkRecord, NetworkTable};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use web3::api::Web3;
use web3::types::{Address, H256};
use web3::Transport;

pub use self::event::{DecodedLog, EventHandle, EventIndexExt};
pub use self::instance::{BoundContract, Dispatch, Invocation, MethodHandle, PreparedRequest};
pub use self::link::LibraryInstance;

/// The network record loaded before a network is detected.
pub const DEFAULT_NETWORK: &str = "default";

/// Network IDs tried, in order, when the node reports the main network.
const MAINNET_IDS: [&str; 3] = ["1", "live", "default"];

/// The network dependent state of a binding.
#[derive(Clone, Debug, Default)]
struct NetworkState {
    interface: Interface,
    unlinked_binary: Bytecode,
    address: Option<Address>,
    updated_at: Option<u64>,
    links: BTreeMap<String, Address>,
    events: EventIndex,
}

impl NetworkState {
    fn from_record(record: Option<&NetworkRecord>) -> Self {
        match record {
            Some(record) => NetworkState {
                interface: record.abi.clone(),
                unlinked_binary: record.unlinked_binary.clone(),
                address: record.address,
                updated_at: record.updated_at,
                links: record.links.clone(),
                events: record.event_index(),
            },
            None => NetworkState::default(),
        }
    }
}

/// A contract class: the contract interface and deployment records for every
/// network together with the provider and class wide transaction defaults.
///
/// Cloning a binding, including through [`Binding::for_network`], deep copies
/// its network state and defaults so that the copies can be linked and
/// configured independently. The provider is shared.
#[derive(Clone, Debug)]
pub struct Binding {
    name: String,
    networks: Arc<NetworkTable>,
    network_id: Option<String>,
    state: NetworkState,
    defaults: Options,
    confirm: ConfirmParams,
    clock: Arc<dyn Clock>,
    next_gen: bool,
    web3: Option<Web3<Provider>>,
}

impl Binding {
    /// Creates a binding loaded from the `"default"` network record. The
    /// network ID stays unresolved so that it is detected on first use.
    pub fn new<S>(name: S, networks: NetworkTable) -> Self
    where
        S: Into<String>,
    {
        let state = NetworkState::from_record(networks.get(DEFAULT_NETWORK));
        Binding {
            name: name.into(),
            networks: Arc::new(networks),
            network_id: None,
            state,
            defaults: Options::new(),
            confirm: ConfirmParams::default(),
            clock: Arc::new(SystemClock),
            next_gen: false,
            web3: None,
        }
    }

    /// Creates a binding from network table JSON.
    pub fn from_json<S, J>(name: S, json: J) -> Result<Self, ArtifactError>
    where
        S: Into<String>,
        J: AsRef<str>,
    {
        Ok(Binding::new(name, NetworkTable::from_json(json)?))
    }

    /// Creates a binding from a network table file.
    pub fn load<S, P>(name: S, path: P) -> Result<Self, ArtifactError>
    where
        S: Into<String>,
        P: AsRef<Path>,
    {
        Ok(Binding::new(name, NetworkTable::load(path)?))
    }

    /// Sets the transport used to talk to the node.
    pub fn set_provider<F, T>(&mut self, transport: T)
    where
        F: Future<Output = Result<Value, web3::Error>> + Send + 'static,
        T: Transport<Out = F> + Send + Sync + 'static,
    {
        self.web3 = Some(Web3::new(Provider::new(transport)));
    }

    /// Returns `true` if a provider has been set.
    pub fn has_provider(&self) -> bool {
        self.web3.is_some()
    }

    /// The contract name.
    pub fn contract_name(&self) -> &str {
        &self.name
    }

    /// The network IDs with a deployment record.
    pub fn networks(&self) -> Vec<&str> {
        self.networks.ids().collect()
    }

    /// The resolved network ID, `None` until a network is detected or set.
    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    /// The contract interface on the current network.
    pub fn interface(&self) -> &Interface {
        &self.state.interface
    }

    /// The events known on the current network, including events merged in
    /// from linked libraries.
    pub fn events(&self) -> &EventIndex {
        &self.state.events
    }

    /// The recorded contract address on the current network.
    pub fn address(&self) -> Option<Address> {
        self.state.address
    }

    /// When the current network record was last updated, in milliseconds
    /// since the epoch.
    pub fn updated_at(&self) -> Option<u64> {
        self.state.updated_at
    }

    /// The library addresses the bytecode gets linked against.
    pub fn links(&self) -> &BTreeMap<String, Address> {
        &self.state.links
    }

    /// The unlinked bytecode with every known library linked in.
    pub fn binary(&self) -> Bytecode {
        let mut binary = self.state.unlinked_binary.clone();
        for (name, address) in &self.state.links {
            binary.link(name, *address);
        }
        binary
    }

    /// Loads the record for a network. Unlike the JavaScript artifacts an
    /// unknown network is an error.
    pub fn set_network<S>(&mut self, network_id: S) -> Result<(), BindingError>
    where
        S: Into<String>,
    {
        let network_id = network_id.into();
        let record = self
            .networks
            .get(&network_id)
            .ok_or_else(|| BindingError::UnknownNetwork {
                contract: self.name.clone(),
                network_id: network_id.clone(),
            })?;

        tracing::debug!(contract = %self.name, %network_id, "loading network record");
        self.state = NetworkState::from_record(Some(record));
        self.network_id = Some(network_id);
        Ok(())
    }

    /// Returns an independent copy of this binding configured for a network.
    pub fn for_network<S>(&self, network_id: S) -> Result<Binding, BindingError>
    where
        S: Into<String>,
    {
        let mut binding = self.clone();
        binding.set_network(network_id)?;
        Ok(binding)
    }

    /// Resolves the network ID from the provider unless it is already known.
    /// The main network resolves to the first of `"1"`, `"live"` and
    /// `"default"` present in the network table.
    pub async fn detect_network(&mut self) -> Result<(), BindingError> {
        if self.network_id.is_some() {
            return Ok(());
        }

        let web3 = self.web3.as_ref().ok_or(BindingError::NotConfigured)?;
        let mut network_id = web3.net().version().await.map_err(ExecutionError::from)?;
        if network_id == MAINNET_IDS[0] {
            if let Some(id) = MAINNET_IDS.iter().find(|id| self.networks.contains(id)) {
                network_id = (*id).to_owned();
            }
        }

        self.set_network(network_id)
    }

    /// Merges options into the class defaults and returns the result. Later
    /// values overwrite earlier ones.
    pub fn set_class_defaults(&mut self, defaults: Options) -> &Options {
        self.defaults = args::merge(&self.defaults, defaults);
        &self.defaults
    }

    /// The class defaults applied to every call and transaction.
    pub fn class_defaults(&self) -> &Options {
        &self.defaults
    }

    /// Makes transactions resolve to the mined receipt and decoded logs
    /// instead of just the transaction hash.
    pub fn set_next_gen(&mut self, next_gen: bool) {
        self.next_gen = next_gen;
    }

    /// Sets the confirmation timeout in milliseconds. Zero or a negative value
    /// waits forever.
    pub fn set_synchronization_timeout(&mut self, millis: i64) {
        self.confirm = self.confirm.clone().timeout_millis(millis);
    }

    /// Sets the delay between receipt queries.
    pub fn set_poll_interval(&mut self, poll_interval: Duration) {
        self.confirm = self.confirm.clone().poll_interval(poll_interval);
    }

    /// The parameters used to wait for transactions to be mined.
    pub fn confirm_params(&self) -> &ConfirmParams {
        &self.confirm
    }

    /// Replaces the clock driving confirmation loops.
    pub fn set_clock<C>(&mut self, clock: C)
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
    }

    /// Creates an instance at an address given as a `0x` prefixed, 42
    /// character hex string. No request is made to the node, and no provider
    /// is needed until a member is invoked.
    pub fn at(&self, address: &str) -> Result<BoundContract, BindingError> {
        let address = args::parse_address(address)
            .ok_or_else(|| BindingError::InvalidAddress(address.to_owned()))?;
        Ok(self.at_address(address))
    }

    /// Creates an instance at an address. No request is made to the node.
    pub fn at_address(&self, address: Address) -> BoundContract {
        self.instance(address, None)
    }

    /// Creates an instance at the address recorded for the current network.
    pub fn deployed(&self) -> Result<BoundContract, BindingError> {
        let address = self
            .state
            .address
            .ok_or_else(|| BindingError::NotDeployed(self.name.clone()))?;
        Ok(self.at_address(address))
    }

    fn instance(&self, address: Address, transaction_hash: Option<H256>) -> BoundContract {
        BoundContract::new(
            self.web3.clone(),
            self.context(),
            address,
            transaction_hash,
        )
    }

    fn context(&self) -> Arc<instance::Context> {
        Arc::new(instance::Context::new(
            self.name.clone(),
            self.state.interface.clone(),
            self.state.events.clone(),
            self.defaults.clone(),
            self.confirm.clone(),
            self.clock.clone(),
            self.next_gen,
        ))
    }
}
