//! Decoding of raw logs into named event fields, querying of past events
//! emitted by a contract instance and streaming of new ones.

use crate::contract::BoundContract;
use crate::errors::ExecutionError;
use ethbind_common::abi::{RawLog, Token};
use ethbind_common::EventIndex;
use futures::future::{self, TryFutureExt as _};
use futures::stream::{Stream, TryStreamExt as _};
use std::time::Duration;
use web3::types::{Address, BlockNumber, Filter, FilterBuilder, Log, H256, U256, U64};

/// The default interval between `eth_getFilterChanges` calls when streaming
/// events.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A log decoded with the ABI of the event that emitted it.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedLog {
    /// The event name.
    pub event: String,
    /// The address of the contract that emitted the log.
    pub address: Address,
    /// The event fields in declaration order.
    pub args: Vec<(String, Token)>,
    /// The transaction that emitted the log, unless it is pending.
    pub transaction_hash: Option<H256>,
    /// The block containing the log, unless it is pending.
    pub block_number: Option<U64>,
    /// The position of the log in its block.
    pub log_index: Option<U256>,
}

impl DecodedLog {
    /// Looks up an event field by name.
    pub fn arg(&self, name: &str) -> Option<&Token> {
        self.args
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }
}

/// Extension trait for decoding logs with an `EventIndex`.
pub trait EventIndexExt {
    /// Decodes a log with the event registered for its first topic. Logs
    /// without topics or with an unknown first topic yield `None`.
    fn decode(&self, log: &Log) -> Result<Option<DecodedLog>, ExecutionError>;

    /// Decodes every log with a known topic, in order, dropping the rest.
    fn decode_all<'a, I>(&self, logs: I) -> Result<Vec<DecodedLog>, ExecutionError>
    where
        I: IntoIterator<Item = &'a Log>,
    {
        logs.into_iter()
            .filter_map(|log| self.decode(log).transpose())
            .collect()
    }
}

impl EventIndexExt for EventIndex {
    fn decode(&self, log: &Log) -> Result<Option<DecodedLog>, ExecutionError> {
        let descriptor = match log.topics.first().and_then(|topic| self.get(topic)) {
            Some(descriptor) => descriptor,
            None => {
                tracing::trace!(address = ?log.address, "dropping log with unknown topic");
                return Ok(None);
            }
        };

        let parsed = descriptor
            .event
            .parse_log(RawLog {
                topics: log.topics.clone(),
                data: log.data.0.clone(),
            })
            .map_err(ExecutionError::Decode)?;

        Ok(Some(DecodedLog {
            event: descriptor.event.name.clone(),
            address: log.address,
            args: parsed
                .params
                .into_iter()
                .map(|param| (param.name, param.value))
                .collect(),
            transaction_hash: log.transaction_hash,
            block_number: log.block_number,
            log_index: log.log_index,
        }))
    }
}

/// A handle for querying or subscribing to the logs of one event, or of every
/// known event, of a contract instance.
#[derive(Clone, Debug)]
#[must_use = "event handles do nothing unless you `query` or `stream` them"]
pub struct EventHandle {
    contract: BoundContract,
    topics: Vec<H256>,
    from_block: Option<BlockNumber>,
    to_block: Option<BlockNumber>,
    poll_interval: Option<Duration>,
}

impl EventHandle {
    pub(crate) fn new(contract: BoundContract, topics: Vec<H256>) -> Self {
        EventHandle {
            contract,
            topics,
            from_block: None,
            to_block: None,
            poll_interval: None,
        }
    }

    /// Sets the first block from which to query logs.
    pub fn from_block(mut self, block: BlockNumber) -> Self {
        self.from_block = Some(block);
        self
    }

    /// Sets the last block up to which to query logs.
    pub fn to_block(mut self, block: BlockNumber) -> Self {
        self.to_block = Some(block);
        self
    }

    /// The polling interval. This is used as the interval between consecutive
    /// `eth_getFilterChanges` calls when streaming.
    pub fn poll_interval(mut self, value: Duration) -> Self {
        self.poll_interval = Some(value);
        self
    }

    /// The web3 filter matching the handled events of the contract.
    pub fn filter(&self) -> Filter {
        let mut filter = FilterBuilder::default()
            .address(vec![self.contract.address()])
            .topics(Some(self.topics.clone()), None, None, None);
        if let Some(from_block) = self.from_block {
            filter = filter.from_block(from_block);
        }
        if let Some(to_block) = self.to_block {
            filter = filter.to_block(to_block);
        }
        filter.build()
    }

    /// Performs a `eth_getLogs` query for past logs and decodes them.
    pub async fn query(&self) -> Result<Vec<DecodedLog>, ExecutionError> {
        let logs = self.contract.web3()?.eth().logs(self.filter()).await?;
        self.contract.events().decode_all(&logs)
    }

    /// Installs a log filter on the node and returns a stream of decoded logs
    /// for every filter change. Logs with unknown topics are skipped.
    pub fn stream(&self) -> impl Stream<Item = Result<DecodedLog, ExecutionError>> {
        let contract = self.contract.clone();
        let filter = self.filter();
        let poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);

        async move {
            let web3 = contract.web3()?.clone();
            let log_filter = web3
                .eth_filter()
                .create_logs_filter(filter)
                .await
                .map_err(ExecutionError::from)?;
            tracing::debug!(contract = contract.contract_name(), "streaming events");

            let logs = log_filter
                .stream(poll_interval)
                .map_err(ExecutionError::from)
                .try_filter_map(move |log| future::ready(contract.decode_log(&log)));
            Ok::<_, ExecutionError>(logs)
        }
        .try_flatten_stream()
    }
}
