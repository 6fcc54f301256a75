/// This module loads the deployment configuration from the environment. A
/// `.env` file in the working directory is loaded first if one exists.
use std::{fmt, path::PathBuf};

use ethers::signers::{LocalWallet, Signer};
use jiblycoin_cut::SelectorFilter;
use serde::Deserialize;
use tracing::info;

use crate::{
    chain::DiamondTarget,
    constants::{
        ANVIL_DEPLOYER, DEFAULT_ARTIFACTS_DIR, DEFAULT_BSC_MAINNET_RPC, DEFAULT_BSC_TESTNET_RPC,
        DEFAULT_ETHEREUM_RPC, DEFAULT_FORK_BLOCK_NUMBER, INITIALIZER,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read the environment: {0}")]
    Env(#[from] envy::Error),
    #[error("PRIVATE_KEY must be set to deploy to {0}")]
    MissingPrivateKey(Network),
    #[error("PRIVATE_KEY is not a valid secp256k1 key")]
    InvalidPrivateKey,
    #[error("artifacts directory {} does not exist", .0.display())]
    MissingArtifacts(PathBuf),
    #[error("{network} expects chain id {expected} but the node reports {actual}")]
    ChainIdMismatch {
        network: Network,
        expected: u64,
        actual: u64,
    },
}

/// The networks a deployment can target.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Network {
    /// A local anvil node, spawned by the deployer.
    #[default]
    Hardhat,
    BscTestnet,
    BscMainnet,
    EthereumMainnet,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Hardhat => 31337,
            Self::BscTestnet => 97,
            Self::BscMainnet => 56,
            Self::EthereumMainnet => 1,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Hardhat)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hardhat => "hardhat",
            Self::BscTestnet => "bscTestnet",
            Self::BscMainnet => "bscMainnet",
            Self::EthereumMainnet => "ethereumMainnet",
        };
        f.write_str(name)
    }
}

/// Where the local node should fork from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fork {
    pub url: String,
    pub block_number: u64,
}

fn default_fork_block_number() -> u64 {
    DEFAULT_FORK_BLOCK_NUMBER
}

fn default_artifacts() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

/// The deployment configuration. Field names double as the (uppercased)
/// environment variable names.
#[derive(Clone, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub jiblycoin_network: Network,
    pub bsc_testnet_rpc: Option<String>,
    pub bsc_mainnet_rpc: Option<String>,
    pub ethereum_rpc: Option<String>,
    pub private_key: Option<String>,
    #[serde(default = "default_fork_block_number")]
    pub fork_block_number: u64,
    /// Overrides the RPC URL of any network, including the local one.
    pub jiblycoin_ethereum_url: Option<String>,
    #[serde(default = "default_artifacts")]
    pub jiblycoin_artifacts: PathBuf,
    #[serde(default)]
    pub jiblycoin_diamond_target: DiamondTarget,
    pub jiblycoin_deployments_path: Option<PathBuf>,
    pub jiblycoin_proxy_params: Option<PathBuf>,
    /// Comma separated function names to keep out of the diamond. Replaces
    /// the target's naming-convention filter when set.
    pub jiblycoin_selector_denylist: Option<String>,
}

impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("jiblycoin_network", &self.jiblycoin_network)
            .field("bsc_testnet_rpc", &self.bsc_testnet_rpc)
            .field("bsc_mainnet_rpc", &self.bsc_mainnet_rpc)
            .field("ethereum_rpc", &self.ethereum_rpc)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("fork_block_number", &self.fork_block_number)
            .field("jiblycoin_ethereum_url", &self.jiblycoin_ethereum_url)
            .field("jiblycoin_artifacts", &self.jiblycoin_artifacts)
            .field("jiblycoin_diamond_target", &self.jiblycoin_diamond_target)
            .field("jiblycoin_deployments_path", &self.jiblycoin_deployments_path)
            .field("jiblycoin_proxy_params", &self.jiblycoin_proxy_params)
            .field("jiblycoin_selector_denylist", &self.jiblycoin_selector_denylist)
            .finish()
    }
}

impl DeployConfig {
    /// Loads `.env` if present and reads the configuration from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Self>()?;
        info!(network = %config.jiblycoin_network, "loaded deployment configuration");
        Ok(config)
    }

    /// Reads the configuration from explicit key/value pairs.
    pub fn from_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Self>(vars)?)
    }

    /// The RPC URL to connect to. `None` means a local anvil node should be
    /// spawned.
    pub fn rpc_url(&self) -> Option<String> {
        if let Some(url) = &self.jiblycoin_ethereum_url {
            return Some(url.clone());
        }
        match self.jiblycoin_network {
            Network::Hardhat => None,
            Network::BscTestnet => Some(
                self.bsc_testnet_rpc
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BSC_TESTNET_RPC.to_string()),
            ),
            Network::BscMainnet => Some(
                self.bsc_mainnet_rpc
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BSC_MAINNET_RPC.to_string()),
            ),
            Network::EthereumMainnet => Some(
                self.ethereum_rpc
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ETHEREUM_RPC.to_string()),
            ),
        }
    }

    /// The fork used by a spawned local node. Forking only happens when a
    /// BSC mainnet RPC URL is configured.
    pub fn fork(&self) -> Option<Fork> {
        if !self.jiblycoin_network.is_local() || self.jiblycoin_ethereum_url.is_some() {
            return None;
        }
        self.bsc_mainnet_rpc.as_ref().map(|url| Fork {
            url: url.clone(),
            block_number: self.fork_block_number,
        })
    }

    /// The filter that decides which facet functions are registered.
    /// `initialize` is always denied.
    pub fn selector_filter(&self) -> SelectorFilter {
        match &self.jiblycoin_selector_denylist {
            Some(names) => SelectorFilter::deny(
                names
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .chain([INITIALIZER]),
            ),
            None => self.jiblycoin_diamond_target.selector_filter(),
        }
    }

    /// The deployer's wallet, bound to the network's chain id. The local
    /// network falls back to the first anvil development account.
    pub fn signer(&self) -> Result<LocalWallet, ConfigError> {
        let network = self.jiblycoin_network;
        let wallet = match &self.private_key {
            Some(key) => key
                .trim_start_matches("0x")
                .parse::<LocalWallet>()
                .map_err(|_| ConfigError::InvalidPrivateKey)?,
            None if network.is_local() => ANVIL_DEPLOYER.clone(),
            None => return Err(ConfigError::MissingPrivateKey(network)),
        };
        Ok(wallet.with_chain_id(network.chain_id()))
    }

    /// Checks the parts of the configuration that don't need a node.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.signer()?;
        if !self.jiblycoin_artifacts.is_dir() {
            return Err(ConfigError::MissingArtifacts(
                self.jiblycoin_artifacts.clone(),
            ));
        }
        Ok(())
    }

    /// Checks the chain id reported by a remote node against the network.
    /// Local networks are exempt so that `JIBLYCOIN_ETHEREUM_URL` can point at
    /// any development node.
    pub fn check_chain_id(&self, actual: u64) -> Result<(), ConfigError> {
        let network = self.jiblycoin_network;
        if network.is_local() || actual == network.chain_id() {
            return Ok(());
        }
        Err(ConfigError::ChainIdMismatch {
            network,
            expected: network.chain_id(),
            actual,
        })
    }
}
