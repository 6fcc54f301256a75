use std::env;

use ethers::signers::LocalWallet;

/// The facets installed in the diamond, in deployment order.
pub const FACET_NAMES: [&str; 8] = [
    "JiblycoinCoreFacet",
    "JiblycoinGovernanceFacet",
    "JiblycoinLoyaltyFacet",
    "JiblycoinStakingFacet",
    "JiblycoinLockEligibilityFacet",
    "JiblycoinUpgradeFacet",
    "JiblycoinBurnFacet",
    "JiblycoinBridgeFacet",
];

/// The facet that needs to know the NFT contract's address.
pub const STAKING_FACET: &str = "JiblycoinStakingFacet";

// NFT contract deployed alongside the diamond.
pub const NFT_CONTRACT: &str = "JiblycoinNFT";
pub const NFT_NAME: &str = "Jiblycoin NFT";
pub const NFT_SYMBOL: &str = "JBNFT";
pub const NFT_BASE_URI: &str = "https://base-uri.com/";

// Upgradeable token deployment.
pub const TOKEN_CONTRACT: &str = "JiblyCoin";
pub const PROXY_CONTRACT: &str = "TransparentUpgradeableProxy";
pub const INITIALIZER: &str = "initialize";

/// The EIP-1967 storage slot holding a transparent proxy's admin.
pub const PROXY_ADMIN_SLOT: &str =
    "0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103";

/// The locker (admin wallet) handed to the token's initializer by default.
pub const DEFAULT_LOCKER: &str = "0x1E885Cf6B4bdb0161632493328066a79d04527cb";

// Public RPC endpoints used when no override is configured.
pub const DEFAULT_BSC_TESTNET_RPC: &str = "https://data-seed-prebsc-1-s1.binance.org:8545/";
pub const DEFAULT_BSC_MAINNET_RPC: &str = "https://bsc-dataseed.binance.org/";
pub const DEFAULT_ETHEREUM_RPC: &str = "https://mainnet.infura.io/v3/YOUR_INFURA_PROJECT_ID";

pub const DEFAULT_FORK_BLOCK_NUMBER: u64 = 5000;
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The first development account of a fresh anvil node.
pub const ANVIL_DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

lazy_static! {
    pub static ref ANVIL_DEPLOYER: LocalWallet = ANVIL_DEV_KEY.parse().unwrap();

    // The Ethereum URL the chain tests should connect to. If None, then the
    // tests will spawn an anvil node.
    pub static ref MAYBE_ETHEREUM_URL: Option<String> = env::var("JIBLYCOIN_ETHEREUM_URL").ok();

    // The directory holding the compiled contract artifacts.
    pub static ref ARTIFACTS_DIR: String = env::var("JIBLYCOIN_ARTIFACTS")
        .unwrap_or_else(|_| DEFAULT_ARTIFACTS_DIR.to_string());
}
