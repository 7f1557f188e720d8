//! Unlinked contract bytecode and library placeholder resolution.
//!
//! Truffle emits deployment bytecode as a `0x` prefixed hex string where
//! references to external libraries are left as placeholders of the form
//! `__LibraryName______` (two leading underscores, the library name and
//! trailing underscore padding). These need to be replaced with the hex
//! address of the deployed library before the code can be deployed.

use crate::errors::BytecodeError;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use web3::types::{Address, Bytes};

/// Hex encoded contract bytecode that may contain library placeholders.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Bytecode(String);

impl Bytecode {
    /// Creates bytecode from a hex string. The `0x` prefix is optional.
    pub fn from_hex_str(s: &str) -> Self {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Bytecode(s.to_owned())
    }

    /// Returns the hex string representation of the bytecode, including the
    /// `0x` prefix.
    pub fn to_hex_string(&self) -> String {
        format!("0x{}", self.0)
    }

    /// Returns `true` if the bytecode is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replaces every placeholder for the named library with the specified
    /// address. Placeholders for other libraries are left untouched.
    ///
    /// Returns the number of replaced placeholders.
    pub fn link<S>(&mut self, name: S, address: Address) -> usize
    where
        S: AsRef<str>,
    {
        let name = name.as_ref();
        let address = address.to_fixed_hex();

        let mut linked = String::with_capacity(self.0.len());
        let mut count = 0;
        let mut rest = self.0.as_str();
        while let Some(start) = rest.find("__") {
            linked.push_str(&rest[..start]);
            let candidate = &rest[start..];
            match placeholder_len(candidate) {
                Some((len, library)) if library == name => {
                    linked.push_str(&address);
                    rest = &candidate[len..];
                    count += 1;
                }
                Some((len, _)) => {
                    linked.push_str(&candidate[..len]);
                    rest = &candidate[len..];
                }
                None => {
                    linked.push_str("__");
                    rest = &candidate[2..];
                }
            }
        }
        linked.push_str(rest);

        self.0 = linked;
        count
    }

    /// Returns the sorted and de-duplicated names of all libraries that still
    /// have placeholders in the bytecode.
    pub fn undefined_libraries(&self) -> Vec<String> {
        let mut libraries = BTreeSet::new();
        let mut rest = self.0.as_str();
        while let Some(start) = rest.find("__") {
            let candidate = &rest[start..];
            match placeholder_len(candidate) {
                Some((len, library)) => {
                    libraries.insert(library.to_owned());
                    rest = &candidate[len..];
                }
                None => rest = &candidate[2..],
            }
        }
        libraries.into_iter().collect()
    }

    /// Returns `true` if there are no more library placeholders.
    pub fn is_linked(&self) -> bool {
        self.undefined_libraries().is_empty()
    }

    /// Converts the fully linked bytecode to raw bytes.
    pub fn to_bytes(&self) -> Result<Bytes, BytecodeError> {
        if let Some(library) = self.undefined_libraries().into_iter().next() {
            return Err(BytecodeError::UndefinedLibrary(library));
        }
        Ok(Bytes(hex::decode(&self.0)?))
    }
}

impl<'de> Deserialize<'de> for Bytecode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Bytecode::from_hex_str(&s))
    }
}

/// Matches a placeholder `__[^_]+_+` at the start of `s`, returning its total
/// length and the library name.
fn placeholder_len(s: &str) -> Option<(usize, &str)> {
    let body = s.strip_prefix("__")?;
    let name_len = body.find('_')?;
    if name_len == 0 {
        return None;
    }
    let padding = body[name_len..]
        .bytes()
        .take_while(|b| *b == b'_')
        .count();
    Some((2 + name_len + padding, &body[..name_len]))
}

/// Extension trait for converting an `Address` into a hex string implementation.
pub trait AddressHexExt {
    /// Convert an address into a 40 character representation.
    fn to_fixed_hex(&self) -> String;
}

impl AddressHexExt for Address {
    fn to_fixed_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}
