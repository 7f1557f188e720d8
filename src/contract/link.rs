//! Library linking. Linking records a library address that is substituted
//! for its placeholder whenever the bytecode is rendered and makes the
//! library's events decodable through the linking contract.

use crate::contract::Binding;
use crate::errors::BindingError;
use ethbind_common::EventIndex;
use web3::types::Address;

/// A trait that is implemented by a library used for linking.
pub trait LibraryInstance {
    /// The name of the library, as it appears in bytecode placeholders.
    fn library_name(&self) -> &str;

    /// The address of the library on the current network, if it is deployed.
    fn library_address(&self) -> Option<Address>;

    /// The events the library can emit.
    fn library_events(&self) -> &EventIndex;
}

impl LibraryInstance for Binding {
    fn library_name(&self) -> &str {
        self.contract_name()
    }

    fn library_address(&self) -> Option<Address> {
        self.address()
    }

    fn library_events(&self) -> &EventIndex {
        self.events()
    }
}

impl Binding {
    /// Records the address of a library. Linking the same name again replaces
    /// the address.
    pub fn link<S>(&mut self, name: S, address: Address)
    where
        S: Into<String>,
    {
        let name = name.into();
        tracing::debug!(contract = %self.name, library = %name, ?address, "linking library");
        self.state.links.insert(name, address);
    }

    /// Records the addresses of several libraries.
    pub fn link_all<I, S>(&mut self, libraries: I)
    where
        I: IntoIterator<Item = (S, Address)>,
        S: Into<String>,
    {
        for (name, address) in libraries {
            self.link(name, address);
        }
    }

    /// Links a deployed library and merges its events so that logs it emits
    /// during transactions of this contract can be decoded.
    pub fn link_library<L>(&mut self, library: &L) -> Result<(), BindingError>
    where
        L: LibraryInstance + ?Sized,
    {
        let address = library
            .library_address()
            .ok_or_else(|| BindingError::NotDeployed(library.library_name().to_owned()))?;
        self.link(library.library_name(), address);
        self.state.events.extend(library.library_events());
        Ok(())
    }
}
