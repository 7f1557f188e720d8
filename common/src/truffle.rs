//! Module for reading and examining network tables produced by truffle.
//!
//! A network table maps network IDs (as strings, with the special `"default"`
//! entry used before a network has been detected) to the deployment record of
//! a contract on that network.

use crate::bytecode::Bytecode;
use crate::errors::ArtifactError;
use crate::interface::{EventDescriptor, Interface};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use web3::types::{Address, H256};

/// The deployment records of a contract keyed by network ID.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct NetworkTable {
    networks: BTreeMap<String, NetworkRecord>,
}

impl NetworkTable {
    /// Parse a network table from JSON.
    pub fn from_json<S>(json: S) -> Result<Self, ArtifactError>
    where
        S: AsRef<str>,
    {
        let table = serde_json::from_str(json.as_ref())?;
        Ok(table)
    }

    /// Loads a network table from disk.
    pub fn load<P>(path: P) -> Result<Self, ArtifactError>
    where
        P: AsRef<Path>,
    {
        let json = File::open(path)?;
        let table = serde_json::from_reader(json)?;
        Ok(table)
    }

    /// Creates a network table with a single record.
    pub fn with_record<S>(network_id: S, record: NetworkRecord) -> Self
    where
        S: Into<String>,
    {
        let mut networks = BTreeMap::new();
        networks.insert(network_id.into(), record);
        NetworkTable { networks }
    }

    /// Returns the record for a network ID.
    pub fn get(&self, network_id: &str) -> Option<&NetworkRecord> {
        self.networks.get(network_id)
    }

    /// Returns `true` if the table has a record for a network ID.
    pub fn contains(&self, network_id: &str) -> bool {
        self.networks.contains_key(network_id)
    }

    /// The network IDs present in the table, in lexicographical order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.networks.keys().map(String::as_str)
    }
}

/// A contract's deployment record for one network.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NetworkRecord {
    /// The contract interface.
    #[serde(default)]
    pub abi: Interface,
    /// The deployment bytecode, possibly containing library placeholders.
    #[serde(default)]
    pub unlinked_binary: Bytecode,
    /// The address at which the contract is deployed on this network.
    #[serde(default)]
    pub address: Option<Address>,
    /// Milliseconds since the epoch at which the record was last updated.
    #[serde(default)]
    pub updated_at: Option<u64>,
    /// Library addresses by library name.
    #[serde(default)]
    pub links: BTreeMap<String, Address>,
    /// Explicitly recorded events keyed by their `0x` prefixed topic.
    #[serde(default, deserialize_with = "deserialize_events")]
    pub events: BTreeMap<H256, EventDescriptor>,
}

impl NetworkRecord {
    /// The events known to this record: every event declared in the ABI
    /// overlaid with the explicitly recorded ones.
    pub fn event_index(&self) -> EventIndex {
        let mut index = EventIndex::from_interface(&self.abi);
        for (topic, event) in &self.events {
            index.insert(*topic, event.clone());
        }
        index
    }
}

fn deserialize_events<'de, D>(deserializer: D) -> Result<BTreeMap<H256, EventDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, EventDescriptor>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(topic, event)| {
            let hex = topic.strip_prefix("0x").unwrap_or(&topic);
            let topic = hex
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid event topic '{}'", topic)))?;
            Ok((topic, event))
        })
        .collect()
}

/// Events keyed by the topic that identifies their logs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventIndex {
    events: HashMap<H256, EventDescriptor>,
}

impl EventIndex {
    /// Builds an index of every event declared in an interface.
    pub fn from_interface(interface: &Interface) -> Self {
        let events = interface
            .events()
            .map(|event| (event.topic, event.clone()))
            .collect();
        EventIndex { events }
    }

    /// Adds an event under a topic, replacing any previous entry.
    pub fn insert(&mut self, topic: H256, event: EventDescriptor) {
        self.events.insert(topic, event);
    }

    /// Merges all events of another index into this one.
    pub fn extend(&mut self, other: &EventIndex) {
        for (topic, event) in &other.events {
            self.events.insert(*topic, event.clone());
        }
    }

    /// Looks up the event for a topic.
    pub fn get(&self, topic: &H256) -> Option<&EventDescriptor> {
        self.events.get(topic)
    }

    /// Looks up an event by name.
    pub fn by_name(&self, name: &str) -> Option<&EventDescriptor> {
        self.events.values().find(|event| event.name() == name)
    }

    /// The indexed topics.
    pub fn topics(&self) -> impl Iterator<Item = &H256> + '_ {
        self.events.keys()
    }

    /// The number of indexed events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if no events are indexed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
