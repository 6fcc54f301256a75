use std::collections::BTreeMap;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// The addresses produced by a diamond deployment. Facets are keyed by their
/// contract name.
#[derive(Default, Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiamondAddresses {
    pub deployer: Address,
    pub nft: Address,
    pub diamond: Address,
    pub facets: BTreeMap<String, Address>,
}

impl DiamondAddresses {
    /// Gets the address of a deployed facet by name.
    pub fn facet(&self, name: &str) -> Option<Address> {
        self.facets.get(name).copied()
    }
}

/// The addresses produced by an upgradeable proxy deployment.
#[derive(Default, Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyAddresses {
    pub deployer: Address,
    pub implementation: Address,
    pub proxy: Address,
    pub proxy_admin: Address,
}
