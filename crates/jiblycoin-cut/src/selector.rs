use std::fmt;

use ethers::{abi::Function, utils::hex};
use serde::{Serialize, Serializer};

/// A four byte function selector. This is the key a diamond routes calls by.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// Derives the selector of a canonical signature like
    /// `transfer(address,uint256)`.
    pub fn from_signature(signature: &str) -> Self {
        Self(ethers::utils::id(signature))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<&Function> for Selector {
    fn from(function: &Function) -> Self {
        Self(function.short_signature())
    }
}

impl From<[u8; 4]> for Selector {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
