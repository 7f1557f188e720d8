//! Contract interface descriptions parsed from ABI JSON.
//!
//! Unlike `ethabi::Contract`, an [`Interface`] preserves the declaration order
//! of its entries, keeps every overload of a function name, tolerates unknown
//! entry types and remembers the legacy `constant` and `payable` flags that
//! older compilers emit instead of `stateMutability`.

use crate::abiext::EventExt;
use crate::errors::InterfaceError;
use ethabi::{Constructor, Event, Function};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use web3::types::H256;

/// An ordered contract interface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interface {
    members: Vec<Member>,
}

/// A single entry of a contract interface.
#[derive(Clone, Debug, PartialEq)]
pub enum Member {
    /// A contract function.
    Function(FunctionDescriptor),
    /// An event the contract can emit.
    Event(EventDescriptor),
    /// The contract constructor.
    Constructor(ConstructorDescriptor),
}

/// A contract function together with its mutability flags.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDescriptor {
    /// The `ethabi` function used for encoding inputs and decoding outputs.
    pub function: Function,
    /// Whether the function is read-only and can be evaluated with a call.
    pub constant: bool,
    /// Whether the function accepts value.
    pub payable: bool,
}

/// A contract event together with its topic.
#[derive(Clone, Debug, PartialEq)]
pub struct EventDescriptor {
    /// The `ethabi` event used for decoding logs.
    pub event: Event,
    /// The hash of the canonical event signature.
    pub topic: H256,
}

/// A contract constructor.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructorDescriptor {
    /// The `ethabi` constructor used for encoding deployment parameters.
    pub constructor: Constructor,
    /// Whether the constructor accepts value.
    pub payable: bool,
}

impl Interface {
    /// Parse an interface from ABI JSON text.
    pub fn from_json<S>(json: S) -> Result<Self, InterfaceError>
    where
        S: AsRef<str>,
    {
        let value = serde_json::from_str(json.as_ref())?;
        Interface::from_value(value)
    }

    /// Parse an interface from a JSON value holding the ABI array. Entries with
    /// an unknown `type` are skipped, entries without a `type` are functions.
    pub fn from_value(value: Value) -> Result<Self, InterfaceError> {
        let entries = match value {
            Value::Array(entries) => entries,
            _ => return Err(InterfaceError::NotAnArray),
        };

        let mut members = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let mut entry = match entry {
                Value::Object(entry) => entry,
                _ => continue,
            };
            let kind = entry
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("function")
                .to_owned();
            let invalid = |source| InterfaceError::InvalidEntry {
                kind: kind.clone(),
                index,
                source,
            };

            let member = match kind.as_str() {
                "function" => {
                    Member::Function(FunctionDescriptor::from_object(entry).map_err(invalid)?)
                }
                "event" => Member::Event(EventDescriptor::from_object(entry).map_err(invalid)?),
                "constructor" => {
                    let payable = is_payable(&entry);
                    fill_params(&mut entry, "inputs", false);
                    let constructor =
                        Constructor::deserialize(Value::Object(entry)).map_err(invalid)?;
                    Member::Constructor(ConstructorDescriptor {
                        constructor,
                        payable,
                    })
                }
                _ => continue,
            };
            members.push(member);
        }

        Ok(Interface { members })
    }

    /// Returns `true` if the interface has no entries.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// All interface entries in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// All functions in declaration order, including every overload.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDescriptor> + '_ {
        self.members.iter().filter_map(|member| match member {
            Member::Function(function) => Some(function),
            _ => None,
        })
    }

    /// All overloads of a function name in declaration order.
    pub fn functions_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a FunctionDescriptor> + 'a {
        self.functions()
            .filter(move |function| function.function.name == name)
    }

    /// All events in declaration order.
    pub fn events(&self) -> impl Iterator<Item = &EventDescriptor> + '_ {
        self.members.iter().filter_map(|member| match member {
            Member::Event(event) => Some(event),
            _ => None,
        })
    }

    /// The contract constructor if the interface declares one.
    pub fn constructor(&self) -> Option<&ConstructorDescriptor> {
        self.members.iter().find_map(|member| match member {
            Member::Constructor(constructor) => Some(constructor),
            _ => None,
        })
    }
}

impl<'de> Deserialize<'de> for Interface {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Interface::from_value(value).map_err(de::Error::custom)
    }
}

impl FunctionDescriptor {
    fn from_object(mut entry: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mutability = entry.get("stateMutability").and_then(Value::as_str);
        let constant = match entry.get("constant").and_then(Value::as_bool) {
            Some(constant) => constant,
            None => matches!(mutability, Some("view") | Some("pure")),
        };
        let payable = is_payable(&entry);

        fill_params(&mut entry, "inputs", false);
        fill_params(&mut entry, "outputs", false);
        let function = Function::deserialize(Value::Object(entry))?;

        Ok(FunctionDescriptor {
            function,
            constant,
            payable,
        })
    }

    /// The function name.
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

impl EventDescriptor {
    /// Creates an event descriptor, deriving its topic from the signature.
    pub fn new(event: Event) -> Self {
        let topic = event.topic();
        EventDescriptor { event, topic }
    }

    fn from_object(mut entry: Map<String, Value>) -> Result<Self, serde_json::Error> {
        entry
            .entry("anonymous")
            .or_insert(Value::Bool(false));
        fill_params(&mut entry, "inputs", true);
        let event = Event::deserialize(Value::Object(entry))?;
        Ok(EventDescriptor::new(event))
    }

    /// The event name.
    pub fn name(&self) -> &str {
        &self.event.name
    }
}

impl<'de> Deserialize<'de> for EventDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(entry) => EventDescriptor::from_object(entry).map_err(de::Error::custom),
            _ => Err(de::Error::custom("event descriptor must be a JSON object")),
        }
    }
}

fn is_payable(entry: &Map<String, Value>) -> bool {
    match entry.get("payable").and_then(Value::as_bool) {
        Some(payable) => payable,
        None => entry.get("stateMutability").and_then(Value::as_str) == Some("payable"),
    }
}

/// Older compilers omit parameter names and optional flags that `ethabi`
/// requires, so fill them in before handing the entry over.
fn fill_params(entry: &mut Map<String, Value>, key: &str, indexed: bool) {
    let params = entry
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(params) = params {
        for param in params.iter_mut() {
            if let Value::Object(param) = param {
                param
                    .entry("name")
                    .or_insert_with(|| Value::String(String::new()));
                if indexed {
                    param.entry("indexed").or_insert(Value::Bool(false));
                }
            }
        }
    }
}
