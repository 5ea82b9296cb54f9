//! Per-emission record of claimed addresses.

use crate::error::MangleError;
use crate::mangle::{address, Address};
use crate::scheme::NamingScheme;
use std::collections::BTreeMap;
use vigil_signal::{ResolvedPath, SignalPath};

/// Every address an emission has used, with the path that owns it.
///
/// A collision means the naming scheme is not injective for this circuit,
/// which is a design-time fault: it is reported, never recovered.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    claimed: BTreeMap<Address, SignalPath>,
}

impl NameTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `canonical` owns `address`.
    ///
    /// Claiming the same address again for the same path is a no-op.
    pub fn claim(&mut self, address: &Address, canonical: &SignalPath) -> Result<(), MangleError> {
        match self.claimed.get(address) {
            Some(owner) if owner != canonical => Err(MangleError::Collision {
                address: address.to_string(),
                first: owner.to_string(),
                second: canonical.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.claimed.insert(address.clone(), canonical.clone());
                Ok(())
            }
        }
    }

    /// Computes the address of `path` under `scheme` and claims it.
    pub fn address(
        &mut self,
        scheme: &NamingScheme,
        path: &ResolvedPath,
    ) -> Result<Address, MangleError> {
        let addr = address(scheme, path)?;
        self.claim(&addr, path.path())?;
        Ok(addr)
    }

    /// Returns the owner of `address`, if claimed.
    pub fn owner(&self, address: &Address) -> Option<&SignalPath> {
        self.claimed.get(address)
    }

    /// Iterates over claimed addresses in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &SignalPath)> {
        self.claimed.iter()
    }

    /// Returns the number of claimed addresses.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Returns true if nothing has been claimed.
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
